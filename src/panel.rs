//! The panel's application context: owns the store and wires it to the host
//! bridge, the view-state file, the filter debounce and the copy flow.

use crate::bridge::{CopyPhase, HostEvent, PanelCommand, PanelEndpoint, PanelState};
use crate::controller::{self, Gesture, Outcome};
use crate::debounce::Debouncer;
use crate::error::CopyRejected;
use crate::projection::{Projection, visible_order};
use crate::reconcile::{self, HostState};
use crate::store::{CopyState, InitData, Store};
use crate::ui_state::{UiState, UiStateStore};
use std::time::{Duration, Instant};

pub const FILTER_DEBOUNCE: Duration = Duration::from_millis(300);
/// A copy with no terminal status after this long is abandoned.
pub const COPY_TIMEOUT: Duration = Duration::from_secs(30);
const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    expires_at: Option<Instant>,
}

pub struct Panel {
    store: Store,
    bridge: PanelEndpoint,
    ui_state: UiStateStore,
    filter_debounce: Debouncer<String>,
    status: Option<StatusMessage>,
    initialized: bool,
}

impl Panel {
    pub fn new(bridge: PanelEndpoint, ui_state: UiStateStore) -> Self {
        Panel {
            store: Store::new(),
            bridge,
            ui_state,
            filter_debounce: Debouncer::new(FILTER_DEBOUNCE),
            status: None,
            initialized: false,
        }
    }

    /// Asks the host for the tree; the reply is `initialize` the first time.
    pub fn start(&self) {
        self.post(&PanelCommand::GetFiles);
    }

    pub fn refresh(&self) {
        self.post(&PanelCommand::GetFiles);
    }

    fn post(&self, command: &PanelCommand) {
        if let Err(e) = self.bridge.post(command) {
            tracing::warn!(error = %e, "dropping message to host");
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn projection(&self) -> Projection<'_> {
        Projection::new(&self.store)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn status(&self) -> Option<&StatusMessage> {
        self.status.as_ref()
    }

    /// Handles everything the host has sent so far. Returns whether to re-render.
    pub fn pump(&mut self, now: Instant) -> bool {
        let mut rerender = false;
        for event in self.bridge.drain() {
            rerender |= self.handle_event(event, now);
        }
        rerender
    }

    pub fn handle_event(&mut self, event: HostEvent, now: Instant) -> bool {
        match event {
            HostEvent::Initialize {
                files,
                saved_state,
                token_limit,
                session_id,
            } => {
                let HostState {
                    snippets,
                    selection_state,
                    expanded_folders,
                } = saved_state;
                self.store.initialize(InitData {
                    files,
                    saved_selection: selection_state,
                    saved_expansion: expanded_folders,
                    snippets: snippets.unwrap_or_default(),
                    token_limit,
                    session_id,
                });
                let view = self.ui_state.load_for_session(self.store.session_id());
                self.filter_debounce.cancel();
                self.store.set_filter(&view.filter);
                self.store.set_show_selected_only(view.show_selected_only);
                self.persist_view();
                self.initialized = true;
                tracing::info!(
                    session = %self.store.session_id(),
                    nodes = self.store.tree().len(),
                    snippets = self.store.snippets().len(),
                    "panel initialized"
                );
                true
            }
            HostEvent::UpdateFiles { files, reason } => {
                self.store.replace_files(&files);
                tracing::debug!(?reason, nodes = self.store.tree().len(), "file tree replaced");
                true
            }
            HostEvent::UpdateState { state } => reconcile::reconcile_from_host(&mut self.store, state),
            HostEvent::UpdateTokenLimit { token_limit } => self.store.set_token_limit(token_limit),
            HostEvent::CopyStatus {
                status,
                file_count,
                snippet_count,
                total_tokens,
                error,
            } => {
                match status {
                    CopyPhase::Started => {
                        if !self.store.copy_in_progress() {
                            self.store.begin_copy(now);
                        }
                        self.set_status(StatusLevel::Info, "Copying…".to_string(), None);
                    }
                    CopyPhase::Completed => {
                        self.store.finish_copy();
                        let text = format!(
                            "Copied {} files and {} snippets (≈ {} tokens)",
                            file_count.unwrap_or(0),
                            snippet_count.unwrap_or(0),
                            total_tokens.unwrap_or(0)
                        );
                        self.set_status(StatusLevel::Info, text, Some(now + STATUS_TTL));
                    }
                    CopyPhase::Failed => {
                        self.store.finish_copy();
                        let reason = error.unwrap_or_else(|| "unknown error".to_string());
                        tracing::warn!(%reason, "host reported copy failure");
                        self.set_status(StatusLevel::Error, format!("Copy failed: {}", reason), None);
                    }
                }
                tracing::debug!(?status, "copy status");
                true
            }
        }
    }

    /// Applies a gesture against the current row order, saving when it changed
    /// checked or expanded state.
    pub fn gesture(&mut self, gesture: Gesture) -> Outcome {
        let order = visible_order(&self.projection().rows());
        let outcome = controller::apply(&mut self.store, gesture, &order);
        if outcome.persist {
            self.persist();
        }
        outcome
    }

    fn persist(&mut self) {
        let snapshot = self.store.save_snapshot();
        self.post(&PanelCommand::SaveState {
            state: PanelState {
                selection_state: snapshot.selection,
                expanded_folders: snapshot.expanded_folders,
            },
        });
    }

    fn persist_view(&self) {
        let view = UiState {
            filter: self.store.filter().to_string(),
            show_selected_only: self.store.show_selected_only(),
            session_id: self.store.session_id().to_string(),
        };
        if let Err(e) = self.ui_state.save(&view) {
            tracing::warn!(error = %e, "could not save view state");
        }
    }

    pub fn schedule_filter(&mut self, text: String, now: Instant) {
        self.filter_debounce.schedule(text, now);
    }

    pub fn apply_filter_now(&mut self, text: &str) -> bool {
        self.filter_debounce.cancel();
        self.apply_filter(text)
    }

    fn apply_filter(&mut self, text: &str) -> bool {
        let changed = self.store.set_filter(text);
        if changed {
            self.persist_view();
        }
        changed
    }

    pub fn toggle_show_selected_only(&mut self) -> bool {
        let next = !self.store.show_selected_only();
        let changed = self.store.set_show_selected_only(next);
        if changed {
            self.persist_view();
        }
        changed
    }

    pub fn request_copy(&mut self, now: Instant) -> Result<(), CopyRejected> {
        if self.store.copy_in_progress() {
            tracing::info!("copy requested while another is pending, ignoring");
            return Err(CopyRejected::InProgress);
        }
        let selected_files = self.store.selected_file_paths();
        let selected_snippets = self.store.selected_snippet_ids();
        if selected_files.is_empty() && selected_snippets.is_empty() {
            self.set_status(
                StatusLevel::Info,
                CopyRejected::EmptySelection.to_string(),
                Some(now + STATUS_TTL),
            );
            return Err(CopyRejected::EmptySelection);
        }
        self.store.begin_copy(now);
        self.post(&PanelCommand::CopyToClipboard {
            selected_files,
            selected_snippets,
        });
        Ok(())
    }

    /// Timer work: debounced filter, copy timeout, status expiry.
    pub fn tick(&mut self, now: Instant) -> bool {
        let mut rerender = false;
        if let Some(text) = self.filter_debounce.poll(now) {
            rerender |= self.apply_filter(&text);
        }
        if let CopyState::Pending { since } = self.store.copy_state() {
            if now.duration_since(since) >= COPY_TIMEOUT {
                tracing::warn!("no copy status from host, giving up");
                self.store.finish_copy();
                self.set_status(
                    StatusLevel::Error,
                    "Copy timed out waiting for the host".to_string(),
                    None,
                );
                rerender = true;
            }
        }
        let expired = self
            .status
            .as_ref()
            .and_then(|status| status.expires_at)
            .is_some_and(|deadline| deadline <= now);
        if expired {
            self.status = None;
            rerender = true;
        }
        rerender
    }

    fn set_status(&mut self, level: StatusLevel, text: String, expires_at: Option<Instant>) {
        self.status = Some(StatusMessage {
            text,
            level,
            expires_at,
        });
    }
}
