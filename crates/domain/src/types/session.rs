//! Observable session state

use serde::{Deserialize, Serialize};

use super::vehicle::CarSnapshot;

/// What the presentation layer observes.
///
/// Published as a whole on every change; readers never see a half-updated
/// record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub snapshot: Option<CarSnapshot>,
    pub is_loading: bool,
    pub error_message: Option<String>,
}
