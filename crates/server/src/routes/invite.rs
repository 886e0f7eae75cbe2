use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderMap},
    response::IntoResponse,
    Json,
};
use models::{BulkInviteReport, InvitePayload};
use service::csv_import::{parse_csv, TEMPLATE_CSV};
use service::invite::InviteError;
use tracing::{debug, info};

use crate::errors::ApiError;
use crate::metrics::{BULK_ROWS_TOTAL, INVITES_FAILED_TOTAL, INVITES_SENT_TOTAL};
use crate::state::AppState;

/// Header naming the admin on whose behalf a bulk import runs.
pub const ACTOR_HEADER: &str = "x-faxinar-actor";

/// An undecodable or bodyless request is treated as one with no fields.
pub async fn send_invite(
    State(state): State<AppState>,
    payload: Result<Json<InvitePayload>, JsonRejection>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let payload = match payload {
        Ok(Json(payload)) => payload,
        Err(rejection) => {
            debug!(%rejection, "send-invite body not decodable");
            INVITES_FAILED_TOTAL.inc();
            return Err(InviteError::MissingFields.into());
        }
    };
    match state.invites.send_invite(&payload).await {
        Ok(()) => {
            INVITES_SENT_TOTAL.inc();
            Ok(Json(serde_json::json!({ "ok": true })))
        }
        Err(e) => {
            INVITES_FAILED_TOTAL.inc();
            Err(e.into())
        }
    }
}

pub async fn bulk_invite(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<BulkInviteReport>, ApiError> {
    let rows = parse_csv(&body);
    if rows.is_empty() {
        return Err(ApiError::BadRequest("Nenhuma linha válida encontrada no CSV".into()));
    }
    let actor = headers
        .get(ACTOR_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("admin");

    let report = state.bulk.run(&rows, actor).await;
    BULK_ROWS_TOTAL.inc_by(report.total as u64);
    INVITES_SENT_TOTAL.inc_by(report.sent as u64);
    INVITES_FAILED_TOTAL.inc_by(report.errors.len() as u64);
    info!(actor, total = report.total, sent = report.sent, "bulk invite processed");
    Ok(Json(report))
}

pub async fn bulk_invite_template() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (header::CONTENT_DISPOSITION, "attachment; filename=\"bulk-invite-template.csv\""),
        ],
        TEMPLATE_CSV,
    )
}
