use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::location::Coordinates;

pub const LOCAL_ID_PREFIX: &str = "L-";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum OrderStatus {
    Pending,
    #[serde(rename = "In Transit")]
    InTransit,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    /// Share of the delivery timeline shown on the details view.
    pub fn progress_percent(self) -> u8 {
        match self {
            OrderStatus::Pending => 33,
            OrderStatus::InTransit => 66,
            OrderStatus::Delivered => 100,
            OrderStatus::Cancelled => 0,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderRoute {
    Tracking,
    Details,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub sender: String,
    pub recipient: String,
    pub contact: String,
    pub address: String,
    pub status: OrderStatus,
    pub is_local: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eta: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_known_location: Option<Coordinates>,
}

impl Order {
    /// Which view a collaborator opens for this order.
    pub fn route(&self) -> OrderRoute {
        if self.status == OrderStatus::InTransit {
            OrderRoute::Tracking
        } else {
            OrderRoute::Details
        }
    }

    pub fn has_local_id(&self) -> bool {
        self.id.starts_with(LOCAL_ID_PREFIX)
    }
}

/// Input for a locally created delivery request.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderRequest {
    #[serde(default = "default_sender")]
    pub sender: String,
    #[serde(default)]
    pub recipient: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub contact: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_sender() -> String {
    "Me".to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

impl NewOrderRequest {
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let required = [
            ("recipient", &self.recipient, "Recipient name is required"),
            ("address", &self.address, "Address is required"),
            ("contact", &self.contact, "Contact info is required"),
        ];

        let errors: Vec<FieldError> = required
            .into_iter()
            .filter(|(_, value, _)| value.trim().is_empty())
            .map(|(field, _, message)| FieldError { field, message })
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    pub(crate) fn into_local_order(self, id: String, created_at: DateTime<Utc>) -> Order {
        let notes = self.notes.filter(|notes| !notes.trim().is_empty());

        Order {
            id,
            sender: self.sender,
            recipient: self.recipient,
            contact: self.contact,
            address: self.address,
            status: OrderStatus::Pending,
            is_local: true,
            created_at,
            notes,
            eta: None,
            last_known_location: None,
        }
    }
}
