use serde::{Deserialize, Serialize};

/// Reachability report delivered by the platform network monitor.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConnectivityEvent {
    pub is_connected: bool,
    #[serde(default)]
    pub is_internet_reachable: Option<bool>,
}

impl ConnectivityEvent {
    /// Unknown reachability is not treated as offline.
    pub fn is_offline(&self) -> bool {
        !(self.is_connected && self.is_internet_reachable != Some(false))
    }
}
