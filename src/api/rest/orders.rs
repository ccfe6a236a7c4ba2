use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::models::order::{NewOrderRequest, Order, OrderRoute, OrderStatus};
use crate::models::snapshot::{OfflineBanner, OrderSection, OrderSnapshot};
use crate::state::AppState;

const SAVED_LOCALLY_MESSAGE: &str = "Your request has been saved and will sync when online.";

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/refresh", post(refresh_orders))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/tracking", get(track_order))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct OrderListResponse<'a> {
    orders: &'a [Order],
    sections: Vec<OrderSection<'a>>,
    refreshing: bool,
    is_offline: bool,
    pending_local_count: usize,
    offline_banner: Option<OfflineBanner>,
}

fn render_list(snapshot: &OrderSnapshot) -> Response {
    Json(OrderListResponse {
        orders: &snapshot.orders,
        sections: snapshot.sections(),
        refreshing: snapshot.refreshing,
        is_offline: snapshot.is_offline,
        pending_local_count: snapshot.pending_local_count(),
        offline_banner: snapshot.offline_banner(),
    })
    .into_response()
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.repository.snapshot();
    render_list(snapshot.as_ref())
}

async fn refresh_orders(State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.repository.refresh().await;
    render_list(snapshot.as_ref())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderResponse {
    pub order: Order,
    pub saved_locally: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<NewOrderRequest>,
) -> Result<Json<CreateOrderResponse>, AppError> {
    payload.validate().map_err(AppError::Validation)?;

    let offline = state.connectivity.is_offline();
    let order = state.repository.add_request(payload).await;

    Ok(Json(CreateOrderResponse {
        order,
        saved_locally: offline,
        message: offline.then_some(SAVED_LOCALLY_MESSAGE),
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetailResponse {
    pub order: Order,
    pub progress_percent: u8,
    pub route: OrderRoute,
}

fn find_order(state: &AppState, id: &str) -> Result<Order, AppError> {
    state
        .repository
        .snapshot()
        .find(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<OrderDetailResponse>, AppError> {
    let order = find_order(&state, &id)?;

    Ok(Json(OrderDetailResponse {
        progress_percent: order.status.progress_percent(),
        route: order.route(),
        order,
    }))
}

#[derive(Deserialize)]
pub struct TrackingQuery {
    pub tick: Option<u64>,
}

async fn track_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<TrackingQuery>,
) -> Result<Response, AppError> {
    let order = find_order(&state, &id)?;
    if order.status != OrderStatus::InTransit {
        return Err(AppError::Conflict(format!("order {id} is not in transit")));
    }

    let tick = query
        .tick
        .unwrap_or_else(|| state.started_at.elapsed().as_secs());

    Ok(Json(state.tracking.frame(&order.id, tick)).into_response())
}
