// Report endpoints. Reports are placeholders until analyses are persisted.

use axum::{extract::Path, Json};
use serde_json::Value;

use super::{data_response, parse_id, ApiError};
use crate::analysis::Report;

pub(super) async fn index() -> Json<Value> {
    data_response(Vec::<Report>::new(), "Reports retrieved successfully.")
}

pub(super) async fn show(Path(video_id): Path<String>) -> Result<Json<Value>, ApiError> {
    let video_id = parse_id("video_id", &video_id)?;
    Ok(data_response(
        Report::sample(video_id),
        "Report retrieved successfully.",
    ))
}
