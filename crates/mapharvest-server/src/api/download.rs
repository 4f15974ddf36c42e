use std::io;

use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    Extension,
};
use futures::{stream, StreamExt};
use tokio_util::io::ReaderStream;

use crate::middleware::RequestId;

use super::{ApiError, AppState};

const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Streams an export as an attachment, then removes it shortly after the
/// stream has been fully sent.
pub(super) async fn download(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(filename): Path<String>,
) -> Result<Response, ApiError> {
    let Some(path) = state.exports.resolve(&filename) else {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "invalid export filename",
        ));
    };

    let file = match tokio::fs::File::open(&path).await {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ApiError::new(req_id.0, "not_found", "File not found"));
        }
        Err(err) => {
            tracing::error!(file = %filename, error = %err, "failed to open export");
            return Err(ApiError::new(
                req_id.0,
                "internal_error",
                "Error downloading file",
            ));
        }
    };
    tracing::info!(file = %filename, "serving export download");

    let exports = state.exports.clone();
    let on_end = stream::once(async move { exports.release_after_download(path) })
        .filter_map(|()| async { None::<io::Result<Bytes>> });
    let body = Body::from_stream(ReaderStream::new(file).chain(on_end));

    Ok((
        [
            (header::CONTENT_TYPE, XLSX_CONTENT_TYPE.to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    )
        .into_response())
}
