//! User-facing summary of a run.

use std::collections::BTreeMap;

use appsync_core::{ApiKeyState, Change, Mode, ResourceKind};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncOutput {
    pub api_id: String,
    pub arn: String,
    pub uris: BTreeMap<String, String>,
    pub api_keys: Vec<ApiKeyState>,
    /// Every resource the run looked at, including untouched ones.
    pub changes: Vec<Change>,
}

impl SyncOutput {
    /// Changes that mutated remote state.
    pub fn mutations(&self) -> impl Iterator<Item = &Change> {
        self.changes.iter().filter(|change| change.mode != Mode::Ignore)
    }

    pub fn is_noop(&self) -> bool {
        self.mutations().next().is_none()
    }

    pub fn count(&self, kind: ResourceKind, mode: Mode) -> usize {
        self.changes
            .iter()
            .filter(|change| change.kind == kind && change.mode == mode)
            .count()
    }
}
