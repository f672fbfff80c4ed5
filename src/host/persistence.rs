//! The host's state file: saved selection, expansion and snippets.

use crate::error::PersistError;
use crate::model::Snippet;
use crate::reconcile::{HostState, SelectionPayload};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

pub const STATE_FILE_NAME: &str = "state.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection_state: Option<SelectionPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expanded_folders: Option<BTreeMap<String, bool>>,
    #[serde(default)]
    pub snippets: Vec<Snippet>,
}

impl PersistedState {
    /// A missing file is an empty state, not an error.
    pub fn load(path: &Path) -> Result<Self, PersistError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(PersistError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        serde_json::from_str(&text).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<(), PersistError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| PersistError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| PersistError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        fs::write(path, json).map_err(|source| PersistError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    /// What the panel receives as `savedState` on initialise.
    pub fn to_host_state(&self) -> HostState {
        HostState {
            snippets: Some(self.snippets.clone()),
            selection_state: self.selection_state.clone(),
            expanded_folders: self.expanded_folders.clone(),
        }
    }
}
