//! JSON message channel between the panel and its host.
//!
//! Outbound posts are fire-and-forget; nothing correlates a response with a
//! request. Every frame is a JSON object tagged by `command`.

use crate::error::BridgeError;
use crate::model::FileEntry;
use crate::reconcile::{HostState, SelectionPayload};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyPhase {
    Started,
    Completed,
    Failed,
}

/// Host → panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum HostEvent {
    #[serde(rename_all = "camelCase")]
    Initialize {
        files: Vec<FileEntry>,
        #[serde(default)]
        saved_state: HostState,
        #[serde(default)]
        token_limit: u64,
        session_id: String,
    },
    UpdateFiles {
        files: Vec<FileEntry>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },
    UpdateState {
        state: HostState,
    },
    #[serde(rename_all = "camelCase")]
    UpdateTokenLimit { token_limit: u64 },
    #[serde(rename_all = "camelCase")]
    CopyStatus {
        status: CopyPhase,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file_count: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        snippet_count: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        total_tokens: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
}

/// Selection and expansion as the panel saves them. Snippet selection is not
/// part of it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelState {
    pub selection_state: SelectionPayload,
    pub expanded_folders: BTreeMap<String, bool>,
}

/// Panel → host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "camelCase")]
pub enum PanelCommand {
    GetFiles,
    SaveState {
        state: PanelState,
    },
    #[serde(rename_all = "camelCase")]
    CopyToClipboard {
        selected_files: Vec<String>,
        selected_snippets: Vec<String>,
    },
}

/// One side of the channel: posts `Out`, receives `In`.
pub struct Endpoint<Out, In> {
    tx: Sender<String>,
    rx: Receiver<String>,
    _direction: PhantomData<fn(Out) -> In>,
}

pub type PanelEndpoint = Endpoint<PanelCommand, HostEvent>;
pub type HostEndpoint = Endpoint<HostEvent, PanelCommand>;

pub fn channel() -> (PanelEndpoint, HostEndpoint) {
    let (to_host, from_panel) = mpsc::channel();
    let (to_panel, from_host) = mpsc::channel();
    (
        Endpoint {
            tx: to_host,
            rx: from_host,
            _direction: PhantomData,
        },
        Endpoint {
            tx: to_panel,
            rx: from_panel,
            _direction: PhantomData,
        },
    )
}

impl<Out: Serialize, In: DeserializeOwned> Endpoint<Out, In> {
    pub fn post(&self, message: &Out) -> Result<(), BridgeError> {
        let frame = serde_json::to_string(message)?;
        self.post_frame(frame)
    }

    pub fn post_frame(&self, frame: String) -> Result<(), BridgeError> {
        self.tx.send(frame).map_err(|_| BridgeError::Disconnected)
    }

    pub fn decode(frame: &str) -> Result<In, BridgeError> {
        Ok(serde_json::from_str(frame)?)
    }

    /// Everything queued right now. Malformed frames are logged and skipped.
    pub fn drain(&self) -> Vec<In> {
        let mut messages = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(frame) => match Self::decode(&frame) {
                    Ok(message) => messages.push(message),
                    Err(e) => tracing::warn!(error = %e, "skipping malformed message"),
                },
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        messages
    }

    /// Blocks for the next frame. A malformed frame surfaces as `Malformed`
    /// so the caller can log it and keep going.
    pub fn recv(&self) -> Result<In, BridgeError> {
        let frame = self.rx.recv().map_err(|_| BridgeError::Disconnected)?;
        Self::decode(&frame)
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<In>, BridgeError> {
        match self.rx.recv_timeout(timeout) {
            Ok(frame) => Self::decode(&frame).map(Some),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(BridgeError::Disconnected),
        }
    }
}
