use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use super::state::AppState;
use super::types::{ApiResponse, error_codes};
use crate::orders::repository::OrderWithDetails;
use crate::orders::service::{
    CreateOrderRequest, CreateWindowRequest, PaymentReceipt, PendingPayment, WindowDetail,
};
use crate::orders::{BulkOrderWindow, Order, OrderError, OrderType, PaymentStatus};
use crate::settlement::{FinalizeReport, SuspensionReport};

type ErrorReply = (StatusCode, Json<ApiResponse<()>>);

/// Identity is injected by the upstream auth proxy; this service never
/// sees credentials or tokens
fn require_user_id(headers: &HeaderMap) -> Result<Uuid, ErrorReply> {
    let raw = headers
        .get("X-User-Id")
        .and_then(|v| v.to_str().ok())
        .ok_or((
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::MISSING_AUTH,
                "Missing X-User-Id header",
            )),
        ))?;
    raw.parse::<Uuid>().map_err(|_| {
        (
            StatusCode::UNAUTHORIZED,
            Json(ApiResponse::<()>::error(
                error_codes::AUTH_FAILED,
                "Invalid X-User-Id header",
            )),
        )
    })
}

fn require_internal_secret(state: &AppState, headers: &HeaderMap) -> Result<(), ErrorReply> {
    let secret = headers
        .get("X-Internal-Secret")
        .and_then(|v| v.to_str().ok());
    if secret != Some(state.internal_secret.as_str()) {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ApiResponse::<()>::error(
                error_codes::AUTH_FAILED,
                "Access Denied: Missing or Invalid X-Internal-Secret",
            )),
        ));
    }
    Ok(())
}

fn order_error_reply(e: OrderError) -> ErrorReply {
    let (status, code) = match &e {
        OrderError::Database(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            error_codes::INTERNAL_ERROR,
        ),
        OrderError::InsufficientBalance { .. } => {
            (StatusCode::BAD_REQUEST, error_codes::INSUFFICIENT_BALANCE)
        }
        OrderError::AccountSuspended => (StatusCode::FORBIDDEN, error_codes::ACCOUNT_SUSPENDED),
        OrderError::NotAVendor | OrderError::PayLaterNotEligible(_) => {
            (StatusCode::FORBIDDEN, error_codes::NOT_ELIGIBLE)
        }
        OrderError::ProfileNotFound
        | OrderError::ProductNotFound(_)
        | OrderError::WindowNotFound
        | OrderError::OrderNotFound => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
        OrderError::WindowClosed | OrderError::WindowExpired => {
            (StatusCode::BAD_REQUEST, error_codes::WINDOW_CLOSED)
        }
        OrderError::ProductInactive
        | OrderError::BelowMinimumQuantity(_, _)
        | OrderError::NoPricing
        | OrderError::NotPending
        | OrderError::NotPayLater
        | OrderError::PaymentOverdue
        | OrderError::InvalidAmount
        | OrderError::InvalidQuantity
        | OrderError::InvalidWindowDuration => {
            (StatusCode::BAD_REQUEST, error_codes::INVALID_PARAMETER)
        }
    };
    (status, Json(ApiResponse::<()>::error(code, e.to_string())))
}

// --- Requests / Responses ---

fn default_page() -> u32 {
    1
}

fn default_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_limit")]
    pub limit: u32,
    pub order_type: Option<String>,
    pub payment_status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct OrderListResponse {
    pub orders: Vec<OrderWithDetails>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[derive(Debug, Serialize)]
pub struct WindowListResponse {
    pub windows: Vec<BulkOrderWindow>,
    pub page: u32,
    pub limit: u32,
    pub total: i64,
}

#[derive(Debug, Deserialize)]
pub struct MockCreditRequest {
    pub user_id: Uuid,
    pub amount: String,
}

#[derive(Debug, Serialize)]
pub struct CreditResponse {
    pub user_id: Uuid,
    pub balance: Decimal,
}

// --- Handlers ---

/// GET /health
pub async fn health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<String>>, ErrorReply> {
    state.db.health_check().await.map_err(|e| {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::<()>::error(
                error_codes::SERVICE_UNAVAILABLE,
                e.to_string(),
            )),
        )
    })?;
    Ok(Json(ApiResponse::success("ok".to_string())))
}

/// Manual trigger for the vendor suspension sweep
/// POST /internal/jobs/suspend-overdue
pub async fn trigger_suspension(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<SuspensionReport>>, ErrorReply> {
    require_internal_secret(&state, &headers)?;

    match state.jobs.run_suspension().await {
        Ok(report) => Ok(Json(ApiResponse::success(report))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(
                error_codes::INTERNAL_ERROR,
                e.to_string(),
            )),
        )),
    }
}

/// Manual trigger for the bulk window finalization sweep
/// POST /internal/jobs/finalize-windows
pub async fn trigger_finalization(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<FinalizeReport>>, ErrorReply> {
    require_internal_secret(&state, &headers)?;

    match state.jobs.run_finalization().await {
        Ok(report) => Ok(Json(ApiResponse::success(report))),
        Err(e) => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse::<()>::error(
                error_codes::INTERNAL_ERROR,
                e.to_string(),
            )),
        )),
    }
}

/// POST /api/v1/orders
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateOrderRequest>,
) -> Result<Json<ApiResponse<Order>>, ErrorReply> {
    let user_id = require_user_id(&headers)?;

    match state.orders.create_order(user_id, req).await {
        Ok(order) => Ok(Json(ApiResponse::success(order))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// GET /api/v1/orders
pub async fn my_orders(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<OrdersQuery>,
) -> Result<Json<ApiResponse<OrderListResponse>>, ErrorReply> {
    let user_id = require_user_id(&headers)?;

    let order_type = match query.order_type.as_deref() {
        Some(s) => Some(OrderType::from_str(s).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(error_codes::INVALID_PARAMETER, e)),
            )
        })?),
        None => None,
    };
    let payment_status = match query.payment_status.as_deref() {
        Some(s) => Some(PaymentStatus::from_str(s).map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::error(error_codes::INVALID_PARAMETER, e)),
            )
        })?),
        None => None,
    };

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);

    match state
        .orders
        .my_orders(user_id, order_type, payment_status, page, limit)
        .await
    {
        Ok((orders, total)) => Ok(Json(ApiResponse::success(OrderListResponse {
            orders,
            page,
            limit,
            total,
        }))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// GET /api/v1/orders/pending-payments
pub async fn pending_payments(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ApiResponse<Vec<PendingPayment>>>, ErrorReply> {
    let user_id = require_user_id(&headers)?;

    match state.orders.pending_payments(user_id).await {
        Ok(payments) => Ok(Json(ApiResponse::success(payments))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// POST /api/v1/orders/{order_id}/pay
pub async fn pay_pending_order(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(order_id): Path<Uuid>,
) -> Result<Json<ApiResponse<PaymentReceipt>>, ErrorReply> {
    let user_id = require_user_id(&headers)?;

    match state.orders.pay_pending_order(user_id, order_id).await {
        Ok(receipt) => Ok(Json(ApiResponse::success(receipt))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// POST /api/v1/bulk-windows
pub async fn create_bulk_window(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<CreateWindowRequest>,
) -> Result<Json<ApiResponse<BulkOrderWindow>>, ErrorReply> {
    let user_id = require_user_id(&headers)?;

    match state.orders.create_bulk_window(user_id, req).await {
        Ok(window) => Ok(Json(ApiResponse::success(window))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// GET /api/v1/bulk-windows
pub async fn list_bulk_windows(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<PageQuery>,
) -> Result<Json<ApiResponse<WindowListResponse>>, ErrorReply> {
    require_user_id(&headers)?;

    let page = query.page.max(1);
    let limit = query.limit.clamp(1, 100);

    match state.orders.open_windows(page, limit).await {
        Ok((windows, total)) => Ok(Json(ApiResponse::success(WindowListResponse {
            windows,
            page,
            limit,
            total,
        }))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// GET /api/v1/bulk-windows/{window_id}
pub async fn bulk_window_detail(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(window_id): Path<Uuid>,
) -> Result<Json<ApiResponse<WindowDetail>>, ErrorReply> {
    require_user_id(&headers)?;

    match state.orders.window_detail(window_id).await {
        Ok(detail) => Ok(Json(ApiResponse::success(detail))),
        Err(e) => Err(order_error_reply(e)),
    }
}

/// Internal Mock Top-Up (Debug/Gateway-Webhook Stand-In)
///
/// [SECURITY WARNING] This endpoint is for development/testing ONLY.
/// It credits vendor balances without a real payment-gateway clearance.
///
/// POST /internal/mock/credit
#[cfg(feature = "mock-api")]
pub async fn mock_credit(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(req): Json<MockCreditRequest>,
) -> Result<Json<ApiResponse<CreditResponse>>, ErrorReply> {
    require_internal_secret(&state, &headers)?;

    let amount = Decimal::from_str(&req.amount).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::error(
                error_codes::INVALID_PARAMETER,
                "Invalid amount",
            )),
        )
    })?;

    match state.orders.credit_balance(req.user_id, amount).await {
        Ok(balance) => Ok(Json(ApiResponse::success(CreditResponse {
            user_id: req.user_id,
            balance,
        }))),
        Err(e) => Err(order_error_reply(e)),
    }
}
