// Video upload and management endpoints. Storage and analysis are not wired
// up yet, so these validate input and answer with placeholder records.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use super::{data_response, parse_id, ApiError, ValidationErrors};
use crate::analysis::{Video, VideoDetail, VideoStatus};
use crate::metrics;

/// Largest accepted video, 524288 KB.
pub const MAX_VIDEO_BYTES: u64 = 524_288 * 1024;
/// Request body limit for upload routes: the video plus room for the other
/// multipart fields.
pub const MAX_UPLOAD_BODY_BYTES: usize = MAX_VIDEO_BYTES as usize + 1024 * 1024;
pub const MAX_TITLE_CHARS: usize = 255;

pub const ALLOWED_EXTENSIONS: [&str; 4] = ["mp4", "mov", "avi", "webm"];

const ALLOWED_CONTENT_TYPES: [(&str, &str); 6] = [
    ("video/mp4", "mp4"),
    ("video/quicktime", "mov"),
    ("video/x-msvideo", "avi"),
    ("video/avi", "avi"),
    ("video/msvideo", "avi"),
    ("video/webm", "webm"),
];

/// Work out the video format from the file name, then the declared content type.
pub fn video_format(filename: &str, content_type: Option<&str>) -> Option<&'static str> {
    let extension = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase());
    if let Some(ext) = extension {
        if let Some(allowed) = ALLOWED_EXTENSIONS.into_iter().find(|a| *a == ext) {
            return Some(allowed);
        }
    }
    let content_type = content_type?.split(';').next()?.trim().to_ascii_lowercase();
    ALLOWED_CONTENT_TYPES
        .iter()
        .find(|(mime, _)| *mime == content_type)
        .map(|(_, format)| *format)
}

struct UploadedVideo {
    filename: String,
    size: u64,
    format: Option<&'static str>,
}

/// Read the multipart form, streaming the video through without keeping it.
async fn read_upload(
    mut multipart: Multipart,
    errors: &mut ValidationErrors,
) -> (Option<UploadedVideo>, Option<String>) {
    let mut video = None;
    let mut title = None;

    loop {
        let mut field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Malformed upload: {e}");
                errors.add("video", "The video failed to upload.");
                return (None, title);
            }
        };

        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("video") => {
                let Some(filename) = field.file_name().map(str::to_string) else {
                    errors.add("video", "The video field must be a file.");
                    continue;
                };
                let format = video_format(&filename, field.content_type());
                let mut size: u64 = 0;
                loop {
                    match field.chunk().await {
                        Ok(Some(chunk)) => {
                            size += chunk.len() as u64;
                            if size > MAX_VIDEO_BYTES {
                                break;
                            }
                        }
                        Ok(None) => break,
                        Err(e) => {
                            tracing::warn!("Upload interrupted: {e}");
                            errors.add("video", "The video failed to upload.");
                            return (None, title);
                        }
                    }
                }
                if size > MAX_VIDEO_BYTES {
                    errors.add(
                        "video",
                        format!(
                            "The video field must not be greater than {} kilobytes.",
                            MAX_VIDEO_BYTES / 1024
                        ),
                    );
                    return (None, title);
                }
                video = Some(UploadedVideo {
                    filename,
                    size,
                    format,
                });
            }
            Some("title") => match field.text().await {
                Ok(text) => {
                    let text = text.trim().to_string();
                    title = (!text.is_empty()).then_some(text);
                }
                Err(e) => {
                    tracing::warn!("Unreadable title field: {e}");
                    errors.add("title", "The title field must be a string.");
                }
            },
            _ => {}
        }
    }

    (video, title)
}

pub(super) async fn index() -> Json<Value> {
    data_response(Vec::<Video>::new(), "Videos retrieved successfully.")
}

pub(super) async fn store(
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let mut errors = ValidationErrors::new();

    let (video, title) = match multipart {
        Ok(multipart) => read_upload(multipart, &mut errors).await,
        Err(rejection) => {
            tracing::debug!("Upload without multipart body: {rejection}");
            (None, None)
        }
    };

    match &video {
        None if !errors.has("video") => errors.add("video", "The video field is required."),
        Some(video) if video.format.is_none() => errors.add(
            "video",
            format!(
                "The video field must be a file of type: {}.",
                ALLOWED_EXTENSIONS.join(", ")
            ),
        ),
        _ => {}
    }
    if let Some(title) = &title {
        if title.chars().count() > MAX_TITLE_CHARS {
            errors.add(
                "title",
                format!("The title field must not be greater than {MAX_TITLE_CHARS} characters."),
            );
        }
    }
    // A missing video always leaves an error behind
    let (Some(video), true) = (video, errors.is_empty()) else {
        return Err(ApiError::Validation(errors));
    };

    if let Some(format) = video.format {
        metrics::VIDEO_UPLOADS_TOTAL.with_label_values(&[format]).inc();
    }
    tracing::info!(
        filename = %video.filename,
        size = video.size,
        "Accepted video upload"
    );

    let title = title.unwrap_or_else(|| video.filename.clone());
    let record = Video::pending_upload(title, video.filename, video.size);
    Ok((
        StatusCode::CREATED,
        data_response(
            record,
            "Video uploaded successfully. Analysis will start shortly.",
        ),
    ))
}

pub(super) async fn show(Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = parse_id("id", &id)?;
    Ok(data_response(VideoDetail::sample(id), "Video retrieved successfully."))
}

pub(super) async fn analyze(Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = parse_id("id", &id)?;
    tracing::info!(video_id = id, "Analysis requested");
    Ok(Json(json!({
        "message": "Analysis started. Please check back later.",
        "video_id": id,
        "status": VideoStatus::Processing,
    })))
}

pub(super) async fn destroy(Path(id): Path<String>) -> Result<Json<Value>, ApiError> {
    let id = parse_id("id", &id)?;
    tracing::info!(video_id = id, "Video deletion requested");
    Ok(Json(json!({
        "message": "Video deleted successfully.",
        "video_id": id,
    })))
}
