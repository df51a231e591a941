use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{NaiveDate, Utc};
use ladle_core::{
    analytics, ConfigError, ConfirmedInvoice, DataError, Disposition, InvoiceDraft, ItemId,
    LineItem, Money, Window,
};
use ladle_storage::StorageError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route(
            "/api/draft",
            post(create_draft).get(get_draft).delete(abandon_draft),
        )
        .route("/api/draft/items/{id}/quantity", post(adjust_quantity))
        .route("/api/draft/items/{id}/disposition", post(set_disposition))
        .route("/api/draft/confirm", post(confirm_draft))
        .route("/api/dashboard/daily", get(dashboard_daily))
        .route("/api/dashboard/vendors", get(dashboard_vendors))
        .route("/api/dashboard/summary", get(dashboard_summary))
        .route("/api/invoices/recent", get(recent_invoices))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    fn no_draft() -> Self {
        ApiError {
            status: StatusCode::NOT_FOUND,
            message: "No invoice draft in flight".to_string(),
        }
    }

    fn bad_request(message: String) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(serde_json::json!({ "error": self.message }));
        (self.status, body).into_response()
    }
}

impl From<DataError> for ApiError {
    fn from(e: DataError) -> Self {
        ApiError {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: e.to_string(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(e: ConfigError) -> Self {
        ApiError {
            status: StatusCode::BAD_REQUEST,
            message: e.to_string(),
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        tracing::error!("Storage error: {e}");
        ApiError {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: e.to_string(),
        }
    }
}

// ── Draft workflow ────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DraftInput {
    pub vendor: String,
    /// ISO-8601 date of the paper invoice.
    pub invoice_date: String,
    pub items: Vec<DraftItemInput>,
}

#[derive(Debug, Deserialize)]
pub struct DraftItemInput {
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct ItemView {
    pub id: i64,
    pub name: String,
    pub quantity: Decimal,
    pub unit: String,
    pub unit_price: String,
    pub disposition: Disposition,
    pub line_total: String,
    pub line_total_cents: i64,
}

#[derive(Debug, Serialize)]
pub struct DraftView {
    pub vendor: String,
    pub invoice_date: String,
    pub items: Vec<ItemView>,
    pub total: String,
    pub total_cents: i64,
}

impl From<&InvoiceDraft> for DraftView {
    fn from(draft: &InvoiceDraft) -> Self {
        DraftView {
            vendor: draft.vendor.clone(),
            invoice_date: draft.invoice_date.to_string(),
            items: draft.items.iter().map(ItemView::from).collect(),
            total: draft.total().to_string(),
            total_cents: draft.total().to_cents(),
        }
    }
}

impl From<&LineItem> for ItemView {
    fn from(item: &LineItem) -> Self {
        ItemView {
            id: item.id.0,
            name: item.name.clone(),
            quantity: item.quantity,
            unit: item.unit.clone(),
            unit_price: item.unit_price.to_string(),
            disposition: item.disposition,
            line_total: item.line_total().to_string(),
            line_total_cents: item.line_total().to_cents(),
        }
    }
}

/// Accept a parsed capture result as the new in-flight draft. Any previous
/// unconfirmed draft is abandoned — there is one draft at a time.
async fn create_draft(
    State(state): State<Arc<AppState>>,
    Json(input): Json<DraftInput>,
) -> Result<Json<DraftView>, ApiError> {
    let invoice_date = NaiveDate::parse_from_str(&input.invoice_date, "%Y-%m-%d")
        .map_err(|e| ApiError::bad_request(format!("Invalid invoice_date: {e}")))?;

    let mut items = Vec::with_capacity(input.items.len());
    for (i, item) in input.items.iter().enumerate() {
        items.push(LineItem::new(
            ItemId(i as i64 + 1),
            &item.name,
            item.quantity,
            &item.unit,
            Money::from_cents(item.unit_price_cents),
        )?);
    }

    let draft = InvoiceDraft::new(&input.vendor, invoice_date, items);
    let view = DraftView::from(&draft);

    let mut slot = state.draft.lock().await;
    if slot.is_some() {
        tracing::info!("Replacing unconfirmed draft with new capture");
    }
    *slot = Some(draft);

    Ok(Json(view))
}

async fn get_draft(State(state): State<Arc<AppState>>) -> Result<Json<DraftView>, ApiError> {
    let slot = state.draft.lock().await;
    let draft = slot.as_ref().ok_or_else(ApiError::no_draft)?;
    Ok(Json(DraftView::from(draft)))
}

async fn abandon_draft(State(state): State<Arc<AppState>>) -> Result<StatusCode, ApiError> {
    let mut slot = state.draft.lock().await;
    if slot.take().is_none() {
        return Err(ApiError::no_draft());
    }
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
pub struct QuantityInput {
    pub delta: Decimal,
}

async fn adjust_quantity(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<QuantityInput>,
) -> Result<Json<DraftView>, ApiError> {
    let mut slot = state.draft.lock().await;
    let draft = slot.as_mut().ok_or_else(ApiError::no_draft)?;
    draft.update_quantity(ItemId(id), input.delta)?;
    Ok(Json(DraftView::from(&*draft)))
}

#[derive(Debug, Deserialize)]
pub struct DispositionInput {
    pub disposition: Disposition,
}

async fn set_disposition(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Json(input): Json<DispositionInput>,
) -> Result<Json<DraftView>, ApiError> {
    let mut slot = state.draft.lock().await;
    let draft = slot.as_mut().ok_or_else(ApiError::no_draft)?;
    draft.set_disposition(ItemId(id), input.disposition)?;
    Ok(Json(DraftView::from(&*draft)))
}

#[derive(Debug, Serialize)]
pub struct InvoiceView {
    pub id: i64,
    pub vendor: String,
    pub invoice_date: String,
    pub confirmed_at: String,
    pub total: String,
    pub total_cents: i64,
    pub item_count: usize,
}

impl From<&ConfirmedInvoice> for InvoiceView {
    fn from(invoice: &ConfirmedInvoice) -> Self {
        InvoiceView {
            id: invoice.id.unwrap_or(0),
            vendor: invoice.vendor.clone(),
            invoice_date: invoice.invoice_date.to_string(),
            confirmed_at: invoice.confirmed_at.to_rfc3339(),
            total: invoice.confirmed_total.to_string(),
            total_cents: invoice.confirmed_total.to_cents(),
            item_count: invoice.items.len(),
        }
    }
}

/// Freeze the draft's total, persist it, and clear the in-flight slot.
///
/// The slot is held locked across the append and only cleared once the
/// record is durably stored; a failed append leaves the operator's
/// corrections in place for a retry.
async fn confirm_draft(State(state): State<Arc<AppState>>) -> Result<Json<InvoiceView>, ApiError> {
    let mut slot = state.draft.lock().await;
    let draft = slot.as_ref().ok_or_else(ApiError::no_draft)?;

    let mut confirmed = draft.clone().confirm(Utc::now());
    let id = ladle_storage::insert_confirmed_invoice(&state.db, &confirmed).await?;
    confirmed.id = Some(id);
    *slot = None;

    tracing::info!(
        "Confirmed invoice {id} from '{}' at {}",
        confirmed.vendor,
        confirmed.confirmed_total
    );

    Ok(Json(InvoiceView::from(&confirmed)))
}

// ── Dashboard ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct WindowQuery {
    pub window: String,
}

#[derive(Debug, Deserialize)]
pub struct LimitQuery {
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct BucketView {
    pub date: String,
    pub amount: String,
    pub amount_cents: i64,
}

async fn dashboard_daily(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<Vec<BucketView>>, ApiError> {
    let window: Window = query.window.parse()?;
    let invoices = ladle_storage::get_all_confirmed_invoices(&state.db).await?;

    let series = analytics::daily_spend(&invoices, window, Utc::now().date_naive());
    Ok(Json(
        series
            .into_iter()
            .map(|b| BucketView {
                date: b.date.to_string(),
                amount: b.amount.to_string(),
                amount_cents: b.amount.to_cents(),
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct VendorView {
    pub vendor: String,
    pub total: String,
    pub total_cents: i64,
}

async fn dashboard_vendors(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<VendorView>>, ApiError> {
    let invoices = ladle_storage::get_all_confirmed_invoices(&state.db).await?;

    let ranked = analytics::top_vendors(&invoices, query.limit.unwrap_or(5));
    Ok(Json(
        ranked
            .into_iter()
            .map(|v| VendorView {
                vendor: v.vendor,
                total: v.total.to_string(),
                total_cents: v.total.to_cents(),
            })
            .collect(),
    ))
}

#[derive(Debug, Serialize)]
pub struct SummaryView {
    pub total_amount: String,
    pub total_amount_cents: i64,
    pub invoice_count: u64,
    pub average_invoice: String,
    pub average_invoice_cents: i64,
}

async fn dashboard_summary(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindowQuery>,
) -> Result<Json<SummaryView>, ApiError> {
    let window: Window = query.window.parse()?;
    let invoices = ladle_storage::get_all_confirmed_invoices(&state.db).await?;

    let stats = analytics::summary_stats(&invoices, window, Utc::now().date_naive());
    Ok(Json(SummaryView {
        total_amount: stats.total_amount.to_string(),
        total_amount_cents: stats.total_amount.to_cents(),
        invoice_count: stats.invoice_count,
        average_invoice: stats.average_invoice.to_string(),
        average_invoice_cents: stats.average_invoice.to_cents(),
    }))
}

async fn recent_invoices(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LimitQuery>,
) -> Result<Json<Vec<InvoiceView>>, ApiError> {
    let invoices = ladle_storage::get_all_confirmed_invoices(&state.db).await?;
    let recent = analytics::recent_invoices(&invoices, query.limit.unwrap_or(10));
    Ok(Json(recent.iter().map(InvoiceView::from).collect()))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
