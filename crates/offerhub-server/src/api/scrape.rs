use axum::{extract::State, http::StatusCode, Extension, Json};
use offerhub_db::TriggerSource;
use serde::Serialize;
use uuid::Uuid;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ScrapeStarted {
    status: &'static str,
    scrape_run_id: Uuid,
}

/// Starts a background scrape. Rejects with `409 already_running` while one
/// is in flight instead of queueing a second.
pub(super) async fn trigger_scrape(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<(StatusCode, Json<ApiResponse<ScrapeStarted>>), ApiError> {
    let run = state
        .jobs
        .spawn(TriggerSource::Http)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let Some(run) = run else {
        tracing::info!("scrape requested while another is running");
        return Err(ApiError::new(
            req_id.0,
            "already_running",
            "a scrape is already in progress",
        ));
    };

    Ok((
        StatusCode::ACCEPTED,
        Json(ApiResponse {
            data: ScrapeStarted {
                status: "Scrape started",
                scrape_run_id: run.public_id,
            },
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
