//! The host side of the bridge: owns the filesystem, the state file and the
//! clipboard, and answers panel commands on its own thread.

pub mod persistence;
pub mod snippets;

use crate::bridge::{self, CopyPhase, HostEndpoint, HostEvent, PanelCommand, PanelEndpoint, PanelState};
use crate::clipboard::ClipboardSink;
use crate::error::BridgeError;
use crate::file_scanner::{self, ScanOptions};
use crate::model::{FileEntry, Snippet};
use crate::reconcile::HostState;
use crate::{utils, workflow};
use anyhow::{Context, Result};
use persistence::PersistedState;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone)]
pub struct HostConfig {
    /// Canonical scan root; its string form is the session id.
    pub root: PathBuf,
    pub types: Vec<String>,
    pub include_ignored: bool,
    pub preselect: Vec<String>,
    pub token_limit: u64,
    pub state_dir: PathBuf,
    pub state_file: PathBuf,
}

impl HostConfig {
    pub fn session_id(&self) -> String {
        self.root.to_string_lossy().into_owned()
    }

    pub fn root_label(&self) -> String {
        self.root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ".".to_string())
    }
}

/// Scans the project the way the host does, leaving out the state dir.
pub fn scan_project(config: &HostConfig) -> Result<FileEntry> {
    let scanned = file_scanner::scan_files(
        &config.root,
        &ScanOptions {
            types_filter: &config.types,
            include_ignored: config.include_ignored,
            skip_dir: Some(&config.state_dir),
        },
    )
    .with_context(|| format!("failed to scan {}", config.root.display()))?;
    Ok(file_scanner::build_file_tree(&config.root, &scanned))
}

pub struct Host<C: ClipboardSink> {
    config: HostConfig,
    bridge: HostEndpoint,
    clipboard: C,
    state: PersistedState,
    /// Relative key -> filesystem path, from the latest scan.
    file_index: HashMap<String, PathBuf>,
    initialized: bool,
}

impl<C: ClipboardSink> Host<C> {
    pub fn new(config: HostConfig, bridge: HostEndpoint, clipboard: C) -> Self {
        let state = PersistedState::load(&config.state_file).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "ignoring unreadable state file");
            PersistedState::default()
        });
        Host {
            config,
            bridge,
            clipboard,
            state,
            file_index: HashMap::new(),
            initialized: false,
        }
    }

    /// Serves commands until the panel hangs up.
    pub fn run(mut self) {
        loop {
            let outcome = match self.bridge.recv() {
                Ok(command) => self.handle(command),
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => {}
                Err(BridgeError::Disconnected) => {
                    tracing::debug!("panel disconnected, host exiting");
                    break;
                }
                Err(e @ BridgeError::Malformed(_)) => {
                    tracing::warn!(error = %e, "host skipping malformed command");
                }
            }
        }
    }

    pub fn handle(&mut self, command: PanelCommand) -> Result<(), BridgeError> {
        match command {
            PanelCommand::GetFiles => self.send_files(),
            PanelCommand::SaveState { state } => {
                self.save_state(state);
                Ok(())
            }
            PanelCommand::CopyToClipboard {
                selected_files,
                selected_snippets,
            } => self.copy(&selected_files, &selected_snippets),
        }
    }

    fn scan(&mut self) -> Vec<FileEntry> {
        match scan_project(&self.config) {
            Ok(tree) => {
                self.file_index = file_scanner::flatten_files(&tree).into_iter().collect();
                vec![tree]
            }
            Err(e) => {
                tracing::error!(error = %e, "scan failed, sending an empty tree");
                self.file_index.clear();
                Vec::new()
            }
        }
    }

    fn send_files(&mut self) -> Result<(), BridgeError> {
        let files = self.scan();
        if self.initialized {
            return self.bridge.post(&HostEvent::UpdateFiles {
                files,
                reason: Some("refresh".to_string()),
            });
        }

        let mut keys: Vec<String> = self.file_index.keys().cloned().collect();
        keys.sort();
        let preselected = file_scanner::match_preselect(&self.config.preselect, &keys)
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "ignoring --preselect");
                Vec::new()
            });
        let selection_state = match (self.state.selection_state.clone(), preselected.is_empty()) {
            (saved, true) => saved,
            (saved, false) => Some(saved.unwrap_or_default().with_files(preselected)),
        };

        self.initialized = true;
        tracing::info!(files = keys.len(), snippets = self.state.snippets.len(), "initializing panel");
        self.bridge.post(&HostEvent::Initialize {
            files,
            saved_state: HostState {
                selection_state,
                ..self.state.to_host_state()
            },
            token_limit: self.config.token_limit,
            session_id: self.config.session_id(),
        })
    }

    fn save_state(&mut self, state: PanelState) {
        self.state.selection_state = Some(state.selection_state);
        self.state.expanded_folders = Some(state.expanded_folders);
        if let Err(e) = self.state.save(&self.config.state_file) {
            tracing::warn!(error = %e, "could not save panel state");
        }
    }

    fn copy(&mut self, selected_files: &[String], selected_snippets: &[String]) -> Result<(), BridgeError> {
        self.bridge.post(&HostEvent::CopyStatus {
            status: CopyPhase::Started,
            file_count: None,
            snippet_count: None,
            total_tokens: None,
            error: None,
        })?;

        let mut files: Vec<(String, PathBuf)> = selected_files
            .iter()
            .filter_map(|key| match self.file_index.get(key) {
                Some(path) => Some((key.clone(), path.clone())),
                None => {
                    tracing::debug!(path = %key, "copy request names an unknown file");
                    None
                }
            })
            .collect();
        files.sort();
        let wanted: HashSet<&str> = selected_snippets.iter().map(String::as_str).collect();
        let snippets: Vec<Snippet> = self
            .state
            .snippets
            .iter()
            .filter(|s| wanted.contains(s.id.as_str()))
            .cloned()
            .collect();

        if files.is_empty() && snippets.is_empty() {
            return self.post_copy_failure("No files or snippets selected".to_string());
        }

        let blob = workflow::render_output(&self.config.root_label(), &files, &snippets);
        match self.clipboard.copy(&blob) {
            Ok(()) => {
                let total_tokens = utils::approx_tokens(&blob);
                tracing::info!(files = files.len(), snippets = snippets.len(), total_tokens, "copied selection");
                self.bridge.post(&HostEvent::CopyStatus {
                    status: CopyPhase::Completed,
                    file_count: Some(files.len()),
                    snippet_count: Some(snippets.len()),
                    total_tokens: Some(total_tokens),
                    error: None,
                })
            }
            Err(e) => self.post_copy_failure(format!("{:#}", e)),
        }
    }

    fn post_copy_failure(&self, reason: String) -> Result<(), BridgeError> {
        tracing::warn!(%reason, "copy failed");
        self.bridge.post(&HostEvent::CopyStatus {
            status: CopyPhase::Failed,
            file_count: None,
            snippet_count: None,
            total_tokens: None,
            error: Some(reason),
        })
    }
}

/// Starts a host thread and returns the panel's end of the bridge.
pub fn spawn<C: ClipboardSink + 'static>(
    config: HostConfig,
    clipboard: C,
) -> Result<(PanelEndpoint, JoinHandle<()>)> {
    let (panel_end, host_end) = bridge::channel();
    let handle = thread::Builder::new()
        .name("yankboard-host".to_string())
        .spawn(move || Host::new(config, host_end, clipboard).run())
        .context("failed to start host thread")?;
    Ok((panel_end, handle))
}
