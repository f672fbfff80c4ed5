//! Panel-local view state (filter text, selected-only toggle), keyed by the
//! session id so one workspace's view never leaks into another.

use crate::error::PersistError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

const DEFAULT_FILE_NAME: &str = "yankboard-ui-state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UiState {
    #[serde(default)]
    pub filter: String,
    #[serde(default)]
    pub show_selected_only: bool,
    #[serde(default)]
    pub session_id: String,
}

#[derive(Debug, Clone)]
pub struct UiStateStore {
    path: Option<PathBuf>,
}

impl UiStateStore {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        UiStateStore {
            path: Some(path.into()),
        }
    }

    /// Nothing is read or written.
    pub fn disabled() -> Self {
        UiStateStore { path: None }
    }

    pub fn default_location() -> Self {
        Self::at(std::env::temp_dir().join(DEFAULT_FILE_NAME))
    }

    /// Stored state when it belongs to `session_id`, defaults otherwise.
    pub fn load_for_session(&self, session_id: &str) -> UiState {
        let fresh = UiState {
            session_id: session_id.to_string(),
            ..Default::default()
        };
        let Some(path) = &self.path else {
            return fresh;
        };
        let stored = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(_) => return fresh,
        };
        match serde_json::from_str::<UiState>(&stored) {
            Ok(state) if state.session_id == session_id => state,
            Ok(state) => {
                tracing::debug!(
                    stored = %state.session_id,
                    current = %session_id,
                    "ignoring view state from another session"
                );
                fresh
            }
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "unreadable view state, starting fresh");
                fresh
            }
        }
    }

    pub fn save(&self, state: &UiState) -> Result<(), PersistError> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(state).map_err(|source| PersistError::Json {
            path: path.clone(),
            source,
        })?;
        fs::write(path, json).map_err(|source| PersistError::Io {
            path: path.clone(),
            source,
        })
    }
}
