//! Media upload and download.
//!
//! Uploads arrive as multipart `file` fields. Each one is written under a
//! random name, hashed, scanned, and only then recorded in the database.
//! Downloads stream from disk and honour single `Range: bytes=` requests.

use axum::{
    Extension, Json,
    body::Body,
    extract::{
        Multipart, State,
        multipart::MultipartRejection,
    },
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{info, warn};

use radar_db::models::NewMedia;
use radar_types::api::{Claims, Deleted, Media, ProfileMediaResponse, UploadResponse};

use crate::effects::{self, Action};
use crate::error::{ApiError, ApiResult};
use crate::extract::ApiPath;
use crate::scan::ScanVerdict;
use crate::state::{AppState, blocking};
use crate::storage::StoredFile;

/// Upload limit for profile media.
pub const PROFILE_MEDIA_MAX_BYTES: usize = 10 * 1024 * 1024;

const PROFILE_MEDIA_TYPES: &[&str] = &["image/jpeg", "image/png", "video/mp4"];

const READ_BUFFER: usize = 64 * 1024;

/// The `file` part of a multipart upload, fully buffered.
#[derive(Debug)]
pub struct Upload {
    pub original_name: Option<String>,
    pub declared_type: Option<String>,
    pub data: Vec<u8>,
}

// ── Handlers ────────────────────────────────────────────────────────────

/// GET /media
pub async fn list_media(State(state): State<AppState>) -> ApiResult<Json<Vec<Media>>> {
    let rows = blocking(&state, |db| db.list_media()).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST /media: any content type, up to the configured limit.
pub async fn upload_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let upload = read_file_field(multipart?, state.max_upload_bytes).await?;
    let mime_type = sniff_mime(&upload.data)
        .map(str::to_owned)
        .or_else(|| upload.declared_type.clone())
        .unwrap_or_else(|| "application/octet-stream".to_owned());

    let stored = store_upload(&state, &upload).await?;

    let user_id = claims.sub;
    let row = stored.clone();
    let original = upload.original_name.clone();
    let mime = mime_type.clone();
    let inserted = blocking(&state, move |db| {
        db.insert_media(&NewMedia {
            user_id,
            file_name: &row.file_name,
            original_name: original.as_deref(),
            mime_type: &mime,
            size: row.size as i64,
            sha256: &row.sha256,
        })
    })
    .await;

    let id = match inserted {
        Ok(id) => id,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e);
        }
    };

    info!(
        "User {} uploaded media {} ({} bytes, {})",
        claims.username, id, stored.size, mime_type
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            id,
            file: stored.file_name,
            size: stored.size as i64,
            mime_type,
        }),
    ))
}

/// GET /media/{id}: stream the stored bytes.
pub async fn download_media(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<i64>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let media = blocking(&state, move |db| db.get_media(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;

    let path = state.storage.file_path(&media.file_name);
    let file_size = match state.storage.file_size(&media.file_name).await {
        Ok(size) => size,
        Err(e) => {
            warn!("Media {} has no file on disk: {}", id, e);
            return Err(ApiError::not_found("Media file missing"));
        }
    };

    let range_header = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let (status, start, end) = match parse_range(range_header, file_size) {
        ByteRange::Full => (StatusCode::OK, 0, file_size.saturating_sub(1)),
        ByteRange::Partial { start, end } => (StatusCode::PARTIAL_CONTENT, start, end),
        ByteRange::Unsatisfiable => {
            let response = Response::builder()
                .status(StatusCode::RANGE_NOT_SATISFIABLE)
                .header(header::CONTENT_RANGE, format!("bytes */{}", file_size))
                .body(Body::empty())
                .map_err(anyhow::Error::from)?;
            return Ok(response);
        }
    };
    let content_length = if file_size == 0 { 0 } else { end - start + 1 };

    let stream = async_stream::stream! {
        let mut file = match tokio::fs::File::open(&path).await {
            Ok(f) => f,
            Err(e) => {
                yield Err(e);
                return;
            }
        };

        if start > 0 {
            if let Err(e) = file.seek(std::io::SeekFrom::Start(start)).await {
                yield Err(e);
                return;
            }
        }

        let mut remaining = content_length;
        let mut buf = vec![0u8; READ_BUFFER];
        while remaining > 0 {
            let to_read = (remaining as usize).min(buf.len());
            match file.read(&mut buf[..to_read]).await {
                Ok(0) => break,
                Ok(n) => {
                    remaining -= n as u64;
                    yield Ok::<Bytes, std::io::Error>(Bytes::copy_from_slice(&buf[..n]));
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }
    };

    let mut builder = Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, media.mime_type)
        .header(header::CONTENT_LENGTH, content_length)
        .header(header::ACCEPT_RANGES, "bytes");
    if status == StatusCode::PARTIAL_CONTENT {
        builder = builder.header(
            header::CONTENT_RANGE,
            format!("bytes {}-{}/{}", start, end, file_size),
        );
    }

    let response = builder
        .body(Body::from_stream(stream))
        .map_err(anyhow::Error::from)?;
    Ok(response)
}

/// DELETE /media/{id}: owner only. Removes the row, then the file.
pub async fn delete_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    ApiPath(id): ApiPath<i64>,
) -> ApiResult<Json<Deleted>> {
    let media = blocking(&state, move |db| db.get_media(id))
        .await?
        .ok_or_else(|| ApiError::not_found("Media not found"))?;
    if media.user_id != Some(claims.sub) {
        return Err(ApiError::forbidden("Not your media"));
    }

    let deleted = blocking(&state, move |db| db.delete_media(id)).await?;
    if deleted {
        if let Err(e) = state.storage.delete_file(&media.file_name).await {
            warn!("Failed to remove file for media {}: {}", id, e);
        }
    }

    Ok(Json(Deleted { deleted }))
}

/// GET /profile-media/user/{id}
pub async fn list_profile_media(
    State(state): State<AppState>,
    ApiPath(user_id): ApiPath<i64>,
) -> ApiResult<Json<Vec<Media>>> {
    let rows = blocking(&state, move |db| db.profile_media_for_user(user_id)).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// POST /profile-media: JPEG, PNG or MP4 up to 10 MiB, linked to the caller.
pub async fn upload_profile_media(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<impl IntoResponse> {
    let limit = PROFILE_MEDIA_MAX_BYTES.min(state.max_upload_bytes);
    let upload = read_file_field(multipart?, limit).await?;

    let mime_type = sniff_mime(&upload.data)
        .map(str::to_owned)
        .or_else(|| upload.declared_type.clone())
        .filter(|m| PROFILE_MEDIA_TYPES.contains(&m.as_str()))
        .ok_or_else(|| ApiError::bad_request("Invalid MIME type"))?;

    let stored = store_upload(&state, &upload).await?;

    let user_id = claims.sub;
    let row = stored.clone();
    let original = upload.original_name.clone();
    let mime = mime_type.clone();
    let inserted = blocking(&state, move |db| {
        db.insert_profile_media(&NewMedia {
            user_id,
            file_name: &row.file_name,
            original_name: original.as_deref(),
            mime_type: &mime,
            size: row.size as i64,
            sha256: &row.sha256,
        })
    })
    .await;

    let (link_id, media_id) = match inserted {
        Ok(ids) => ids,
        Err(e) => {
            discard(&state, &stored).await;
            return Err(e);
        }
    };

    effects::reward(&state, user_id, Action::ProfileMedia).await;
    info!("User {} added profile media {} ({})", claims.username, media_id, mime_type);

    Ok((
        StatusCode::CREATED,
        Json(ProfileMediaResponse {
            id: link_id,
            media_id,
        }),
    ))
}

// ── Upload pipeline ─────────────────────────────────────────────────────

/// Buffer the `file` field, failing with 413 once it exceeds `limit` bytes.
/// Other fields are skipped.
pub async fn read_file_field(mut multipart: Multipart, limit: usize) -> ApiResult<Upload> {
    while let Some(mut field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }

        let original_name = field.file_name().map(str::to_owned);
        let declared_type = field.content_type().map(str::to_owned);

        let mut data = Vec::new();
        while let Some(chunk) = field.chunk().await? {
            if data.len() + chunk.len() > limit {
                return Err(ApiError::PayloadTooLarge("File too large".into()));
            }
            data.extend_from_slice(&chunk);
        }

        return Ok(Upload {
            original_name,
            declared_type,
            data,
        });
    }

    Err(ApiError::bad_request("File is required"))
}

/// Write the upload to disk and scan it. Infected or unscannable files are
/// removed before returning the error.
async fn store_upload(state: &AppState, upload: &Upload) -> ApiResult<StoredFile> {
    let stored = state
        .storage
        .save(upload.original_name.as_deref(), &upload.data)
        .await?;

    match state.scanner.scan(&stored.path).await {
        Ok(ScanVerdict::Clean) | Ok(ScanVerdict::Skipped) => Ok(stored),
        Ok(ScanVerdict::Infected) => {
            warn!("Rejected infected upload {:?}", upload.original_name);
            discard(state, &stored).await;
            Err(ApiError::bad_request("Infected file"))
        }
        Err(e) => {
            warn!("Virus scan of {} failed: {}", stored.file_name, e);
            discard(state, &stored).await;
            Err(ApiError::Failed("Virus scan failed".into()))
        }
    }
}

async fn discard(state: &AppState, stored: &StoredFile) {
    if let Err(e) = state.storage.delete_file(&stored.file_name).await {
        warn!("Failed to remove {}: {}", stored.file_name, e);
    }
}

/// Identify common media formats from their leading bytes.
pub fn sniff_mime(data: &[u8]) -> Option<&'static str> {
    match data {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("image/png"),
        [b'G', b'I', b'F', b'8', ..] => Some("image/gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("image/webp"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some("audio/wav"),
        [_, _, _, _, b'f', b't', b'y', b'p', a, b, c, d, ..] => ftyp_brand([*a, *b, *c, *d]),
        [b'I', b'D', b'3', ..] | [0xFF, 0xFB, ..] | [0xFF, 0xF3, ..] => Some("audio/mpeg"),
        [b'O', b'g', b'g', b'S', ..] => Some("audio/ogg"),
        [b'f', b'L', b'a', b'C', ..] => Some("audio/flac"),
        [b'%', b'P', b'D', b'F', ..] => Some("application/pdf"),
        _ => None,
    }
}

/// Map an ISO-BMFF major brand to its MIME type. Only the MP4 family
/// counts as `video/mp4`.
fn ftyp_brand(brand: [u8; 4]) -> Option<&'static str> {
    match &brand {
        b"isom" | b"iso2" | b"iso5" | b"iso6" | b"mp41" | b"mp42" | b"avc1" | b"dash"
        | b"M4V " => Some("video/mp4"),
        b"M4A " | b"M4B " => Some("audio/mp4"),
        b"qt  " => Some("video/quicktime"),
        b"heic" | b"heix" | b"mif1" | b"msf1" => Some("image/heic"),
        b"avif" | b"avis" => Some("image/avif"),
        _ => None,
    }
}

#[derive(Debug, PartialEq, Eq)]
pub enum ByteRange {
    Full,
    Partial { start: u64, end: u64 },
    Unsatisfiable,
}

/// Parse a single `bytes=` range against a file of `size` bytes.
/// Missing, malformed or multi-part ranges fall back to the full body.
pub fn parse_range(header: Option<&str>, size: u64) -> ByteRange {
    let Some(range_set) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
        return ByteRange::Full;
    };
    if range_set.contains(',') {
        return ByteRange::Full;
    }
    let Some((start, end)) = range_set.split_once('-') else {
        return ByteRange::Full;
    };
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        // Suffix form: the last N bytes.
        let Ok(suffix) = end.parse::<u64>() else {
            return ByteRange::Full;
        };
        if suffix == 0 || size == 0 {
            return ByteRange::Unsatisfiable;
        }
        return ByteRange::Partial {
            start: size.saturating_sub(suffix),
            end: size - 1,
        };
    }

    let Ok(start) = start.parse::<u64>() else {
        return ByteRange::Full;
    };
    if start >= size {
        return ByteRange::Unsatisfiable;
    }
    let end = if end.is_empty() {
        size - 1
    } else {
        match end.parse::<u64>() {
            Ok(end) if end >= start => end.min(size - 1),
            Ok(_) => return ByteRange::Unsatisfiable,
            Err(_) => return ByteRange::Full,
        }
    };
    ByteRange::Partial { start, end }
}
