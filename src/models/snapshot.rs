use serde::Serialize;

use crate::models::order::Order;

pub const LOCAL_SECTION_TITLE: &str = "PENDING (LOCAL)";
pub const ALL_SECTION_TITLE: &str = "ALL ORDERS";

/// The published state collaborators read. Replaced whole on every publish.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderSnapshot {
    pub orders: Vec<Order>,
    pub refreshing: bool,
    pub is_offline: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OrderSection<'a> {
    pub title: &'static str,
    pub data: Vec<&'a Order>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OfflineBanner {
    pub title: String,
    pub subtitle: String,
}

impl OrderSnapshot {
    pub fn find(&self, id: &str) -> Option<&Order> {
        self.orders.iter().find(|order| order.id == id)
    }

    pub fn pending_local_count(&self) -> usize {
        self.orders.iter().filter(|order| order.is_local).count()
    }

    /// Local orders first, then everything else. Empty sections are left out.
    pub fn sections(&self) -> Vec<OrderSection<'_>> {
        let (local, others): (Vec<&Order>, Vec<&Order>) =
            self.orders.iter().partition(|order| order.is_local);

        [(LOCAL_SECTION_TITLE, local), (ALL_SECTION_TITLE, others)]
            .into_iter()
            .filter(|(_, data)| !data.is_empty())
            .map(|(title, data)| OrderSection { title, data })
            .collect()
    }

    /// Shown only while offline with unsynced local requests.
    pub fn offline_banner(&self) -> Option<OfflineBanner> {
        let count = self.pending_local_count();
        if !self.is_offline || count == 0 {
            return None;
        }

        let plural = if count == 1 { "" } else { "s" };
        Some(OfflineBanner {
            title: "You're offline.".to_string(),
            subtitle: format!("{count} pending request{plural} - will sync when online"),
        })
    }
}
