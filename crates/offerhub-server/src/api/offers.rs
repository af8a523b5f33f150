use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use offerhub_core::{OfferRecord, OfferSnapshot};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, AppState};

/// One offer as served by `GET /api/v1/offers`.
#[derive(Debug, Serialize)]
pub(super) struct OfferItem {
    store: String,
    cashback: String,
    link: String,
    scraped_at: DateTime<Utc>,
}

/// Returns every current offer as a bare JSON array, ordered by store.
pub(super) async fn list_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<Vec<OfferItem>>, ApiError> {
    let rows = offerhub_db::list_offers(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?;

    let items = rows
        .into_iter()
        .map(|row| OfferItem {
            store: row.store,
            cashback: row.cashback,
            link: row.link,
            scraped_at: row.scraped_at,
        })
        .collect();

    Ok(Json(items))
}

/// Returns the `{ last_updated, offers }` snapshot document.
pub(super) async fn export_offers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<OfferSnapshot>, ApiError> {
    let rows = offerhub_db::list_offers(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0, &e))?;

    let records = rows.into_iter().map(OfferRecord::from).collect();
    Ok(Json(OfferSnapshot::from_records(records, Utc::now())))
}
