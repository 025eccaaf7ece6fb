use crate::enumerate::{PORT_COLUMN, SLOT_COLUMN, distinct_column_values};
use crate::errors::{LookupError, SheetAccessError};
use crate::matcher::{SearchKey, match_records};
use crate::model::{
    SearchRequest, SearchResponse, SheetsQuery, SheetsResponse, SlotsPortsRequest,
    SlotsPortsResponse,
};
use crate::sheets::discover_sheets;
use crate::state::AppState;
use anyhow::Result;
use axum::extract::{Query, State};
use axum::http::header;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/search", post(search))
        .route("/api/sheets", get(list_sheets))
        .route("/api/slots-ports", post(slots_ports))
        .with_state(state)
}

pub async fn serve(state: Arc<AppState>) -> Result<()> {
    let address = state.config().http_bind_address;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!(%address, "splitter lookup service listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install shutdown handler");
        return;
    }
    tracing::info!("shutdown signal received");
}

fn resolve_team(state: &AppState, requested: Option<&str>) -> Result<String, LookupError> {
    match requested.map(str::trim).filter(|team| !team.is_empty()) {
        Some(team) => Ok(team.to_string()),
        None => state
            .config()
            .default_team()
            .map(|team| team.name.clone())
            .ok_or_else(|| {
                LookupError::Configuration(
                    "Cấu hình Google Sheets chưa được thiết lập".to_string(),
                )
            }),
    }
}

/// `POST /api/search` — match rows by OLT/slot/port and return the drawn
/// second-stage splitters. An unreadable worksheet yields an empty result,
/// never an error; zero matches is a normal response.
async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, LookupError> {
    let olt = request.olt.trim();
    let slot = request.slot.trim();
    let port = request.port.trim();
    if olt.is_empty() || slot.is_empty() || port.is_empty() {
        return Err(LookupError::Validation(
            "Vui lòng cung cấp đầy đủ thông tin OLT, Slot và Port".to_string(),
        ));
    }

    let team = resolve_team(&state, request.to_ky_thuat.as_deref())?;
    let client = state.sheets_client(&team).await?;
    let config = state.config();
    tracing::info!(team = %team, olt, slot, port, "search requested");

    let grid = match client.get_range(olt, &config.fetch_range).await {
        Ok(grid) => grid,
        Err(err @ (SheetAccessError::Unsupported(_) | SheetAccessError::NotFound(_))) => {
            tracing::warn!(sheet = olt, error = %err, "worksheet unreadable, returning empty result");
            return Ok(Json(SearchResponse {
                results: Vec::new(),
            }));
        }
        Err(err) => {
            return Err(LookupError::from_access(
                err,
                config.service_account_email().as_deref(),
            ));
        }
    };

    let key = SearchKey::new(olt, slot, port);
    let results = match_records(&grid, &key, &config.fallback_columns);
    tracing::info!(matches = results.len(), "search complete");
    Ok(Json(SearchResponse { results }))
}

/// `GET /api/sheets?toKyThuat=...` — enumerate the team's worksheets (OLTs).
/// Always served with no-store headers so renamed sheets show up immediately.
async fn list_sheets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SheetsQuery>,
) -> Result<impl IntoResponse, LookupError> {
    let team = query
        .to_ky_thuat
        .as_deref()
        .map(str::trim)
        .filter(|team| !team.is_empty())
        .ok_or_else(|| LookupError::Validation("Vui lòng cung cấp Tổ kỹ thuật".to_string()))?
        .to_string();

    let client = state.sheets_client(&team).await?;
    let config = state.config();

    let sheets = discover_sheets(
        client,
        &config.candidate_sheet_names,
        &config.fallback_sheet_names,
    )
    .await
    .map_err(|err| LookupError::from_access(err, config.service_account_email().as_deref()))?;

    tracing::info!(team = %team, sheets = sheets.len(), "sheet list served");
    let no_cache_headers = [
        (
            header::CACHE_CONTROL,
            "no-store, no-cache, must-revalidate, proxy-revalidate",
        ),
        (header::PRAGMA, "no-cache"),
        (header::EXPIRES, "0"),
    ];
    Ok((no_cache_headers, Json(SheetsResponse { sheets })))
}

/// `POST /api/slots-ports` — distinct slot and port values for one OLT
/// worksheet, read from the fixed physical columns B and C. An unreadable
/// worksheet degrades to empty lists plus a warning.
async fn slots_ports(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SlotsPortsRequest>,
) -> Result<Json<SlotsPortsResponse>, LookupError> {
    let olt = request.olt.trim();
    if olt.is_empty() {
        return Err(LookupError::Validation("Vui lòng cung cấp OLT".to_string()));
    }
    let team = request
        .to_ky_thuat
        .as_deref()
        .map(str::trim)
        .filter(|team| !team.is_empty())
        .ok_or_else(|| LookupError::Validation("Vui lòng cung cấp Tổ kỹ thuật".to_string()))?
        .to_string();

    let client = state.sheets_client(&team).await?;
    let config = state.config();

    let grid = match client.get_range(olt, &config.fetch_range).await {
        Ok(grid) => grid,
        Err(err @ (SheetAccessError::Unsupported(_) | SheetAccessError::NotFound(_))) => {
            tracing::warn!(sheet = olt, error = %err, "worksheet unreadable, degrading to empty lists");
            return Ok(Json(SlotsPortsResponse {
                slots: Vec::new(),
                ports: Vec::new(),
                warning: Some(
                    "Không thể đọc trực tiếp từ file Excel. Vui lòng thử tra cứu trực tiếp."
                        .to_string(),
                ),
            }));
        }
        Err(err) => {
            return Err(LookupError::from_access(
                err,
                config.service_account_email().as_deref(),
            ));
        }
    };

    let slots = distinct_column_values(&grid, SLOT_COLUMN);
    let ports = distinct_column_values(&grid, PORT_COLUMN);
    tracing::info!(team = %team, olt, slots = slots.len(), ports = ports.len(), "slots/ports served");
    Ok(Json(SlotsPortsResponse {
        slots,
        ports,
        warning: None,
    }))
}
