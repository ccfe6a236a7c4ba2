use std::cmp::Ordering;
use std::collections::HashSet;

use crate::models::order::{Order, OrderStatus};

/// Display order: local first, then in-transit among remote orders, then newest first.
///
/// Ties keep their incoming position because [`sort_orders`] is stable.
pub fn compare_orders(a: &Order, b: &Order) -> Ordering {
    b.is_local
        .cmp(&a.is_local)
        .then_with(|| {
            if a.is_local || b.is_local {
                Ordering::Equal
            } else {
                in_transit(b).cmp(&in_transit(a))
            }
        })
        .then_with(|| b.created_at.cmp(&a.created_at))
}

fn in_transit(order: &Order) -> bool {
    order.status == OrderStatus::InTransit
}

pub fn sort_orders(orders: &mut [Order]) {
    orders.sort_by(compare_orders);
}

/// Combines both sets, drops repeated ids (first occurrence wins, so local entries shadow
/// remote ones) and sorts the result.
pub fn merge_orders<L, R>(local: L, remote: R) -> Vec<Order>
where
    L: IntoIterator<Item = Order>,
    R: IntoIterator<Item = Order>,
{
    let mut seen = HashSet::new();
    let mut merged: Vec<Order> = local
        .into_iter()
        .chain(remote)
        .filter(|order| seen.insert(order.id.clone()))
        .collect();

    sort_orders(&mut merged);
    merged
}

pub fn local_subset(orders: &[Order]) -> Vec<Order> {
    orders.iter().filter(|order| order.is_local).cloned().collect()
}
