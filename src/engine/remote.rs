use chrono::{DateTime, Duration, Utc};

use crate::models::location::Coordinates;
use crate::models::order::{Order, OrderStatus};

/// Supplier of server-side orders. Read on every merge.
pub trait RemoteOrderSource: Send + Sync {
    fn fetch(&self) -> Vec<Order>;
}

/// Static stand-in for a backend, timestamped relative to when it was built.
#[derive(Debug, Clone)]
pub struct FixtureOrders {
    orders: Vec<Order>,
}

impl FixtureOrders {
    pub fn new() -> Self {
        Self::at(Utc::now())
    }

    pub fn at(now: DateTime<Utc>) -> Self {
        let orders = vec![
            remote_order(
                "A10293",
                "City Mart",
                "Riya Sharma",
                "riya.sharma@email.com",
                "55 Lakeview Road, Kathmandu",
                OrderStatus::InTransit,
                now - Duration::hours(5),
                Some(Coordinates {
                    latitude: 27.7172,
                    longitude: 85.324,
                }),
            ),
            remote_order(
                "A10294",
                "Westside Warehouse",
                "Sameer Khatri",
                "+9779800001122",
                "18 Durbar Marg, Kathmandu",
                OrderStatus::Delivered,
                now - Duration::hours(24),
                None,
            ),
            remote_order(
                "A10295",
                "Metro Supplies",
                "Anita Rai",
                "+9779800003344",
                "12 Boudha Street, Kathmandu",
                OrderStatus::Pending,
                now - Duration::hours(12),
                None,
            ),
            remote_order(
                "A10296",
                "Prime Traders",
                "Rohit Lama",
                "rohit.lama@email.com",
                "71 Lazimpat, Kathmandu",
                OrderStatus::InTransit,
                now - Duration::hours(2),
                Some(Coordinates {
                    latitude: 27.7218,
                    longitude: 85.332,
                }),
            ),
        ];

        Self { orders }
    }

    pub fn from_orders(orders: Vec<Order>) -> Self {
        Self { orders }
    }
}

impl Default for FixtureOrders {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteOrderSource for FixtureOrders {
    fn fetch(&self) -> Vec<Order> {
        self.orders.clone()
    }
}

#[allow(clippy::too_many_arguments)]
fn remote_order(
    id: &str,
    sender: &str,
    recipient: &str,
    contact: &str,
    address: &str,
    status: OrderStatus,
    created_at: DateTime<Utc>,
    last_known_location: Option<Coordinates>,
) -> Order {
    Order {
        id: id.to_string(),
        sender: sender.to_string(),
        recipient: recipient.to_string(),
        contact: contact.to_string(),
        address: address.to_string(),
        status,
        is_local: false,
        created_at,
        notes: None,
        eta: None,
        last_known_location,
    }
}
