//! The extraction endpoint handler.
//!
//! A single linear path: pull the `file` field out of the multipart form,
//! validate it is a usable PDF, hand the bytes to the extractor, return the
//! validated invoice. The outbound extraction call is the only await point
//! of consequence; nothing is written to disk and nothing survives the
//! request.

use crate::error::ExtractError;
use crate::invoice::NfseData;
use crate::state::AppState;
use crate::upload::UploadedDocument;
use axum::extract::{Multipart, State};
use axum::Json;
use tracing::{debug, info};

/// `POST /extract` — multipart form, field `file` = PDF bytes.
///
/// Success: 200 with the extracted [`NfseData`]. Failure: the
/// [`ExtractError`] status/body mapping — client mistakes are 4xx, upstream
/// trouble is 502/504. Never a partial result.
pub async fn extract_invoice(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<NfseData>, ExtractError> {
    let mut document: Option<UploadedDocument> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ExtractError::InvalidInput {
            detail: format!("malformed multipart body: {e}"),
        })?
    {
        let name = field.name().unwrap_or_default().to_string();
        if name != "file" {
            debug!(field = %name, "Ignoring unexpected multipart field");
            continue;
        }

        let content_type = field.content_type().map(str::to_string);
        let filename = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ExtractError::InvalidInput {
                detail: format!("error reading uploaded file: {e}"),
            })?;

        info!(
            filename = filename.as_deref().unwrap_or("unknown"),
            size_kb = %format!("{:.2}", bytes.len() as f64 / 1024.0),
            "Received file"
        );

        document = Some(UploadedDocument {
            bytes,
            content_type,
            filename,
        });
    }

    let document = document.ok_or(ExtractError::MissingInput)?;
    document.validate(state.config.max_upload_bytes)?;

    info!("Starting NFS-e extraction");
    let data = state.extractor.extract(&document.bytes).await?;
    info!(numero_nota = %data.numero_nota, "Extraction complete, data validated");

    Ok(Json(data))
}
