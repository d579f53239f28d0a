// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Image endpoints.
//!
//! Payloads travel as standard base64 inside JSON. The raw bytes are served
//! separately so listings stay small.

use axum::{
    extract::{Path, State},
    http::{header::CONTENT_TYPE, HeaderName, StatusCode},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::validation::{self, description, ImageFormat, Name, RecordId, SourceUrl},
    auth::Auth,
    error::ApiError,
    models::{Image, ImageFields},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Where the image came from, if it was fetched from the web.
    #[serde(default)]
    pub url: Option<String>,
    pub file_name: String,
    /// Short format name such as `png` or `jpeg`.
    pub format: String,
    /// Image bytes, standard base64.
    pub raw_image: String,
}

/// Image metadata. The payload is served by the `/raw` endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageResponse {
    pub image_id: String,
    pub account_id: String,
    pub name: String,
    pub description: String,
    pub url: Option<String>,
    pub file_name: String,
    pub format: String,
    /// Payload size in bytes.
    pub size: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Image> for ImageResponse {
    fn from(image: Image) -> Self {
        Self {
            size: image.raw_image.len(),
            image_id: image.image_id,
            account_id: image.account_id,
            name: image.name,
            description: image.description,
            url: image.url,
            file_name: image.file_name,
            format: image.format,
            created_at: image.created_at,
            updated_at: image.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageListResponse {
    pub images: Vec<ImageResponse>,
    pub total: usize,
}

impl TryFrom<ImageRequest> for ImageFields {
    type Error = validation::ValidationError;

    fn try_from(request: ImageRequest) -> Result<Self, Self::Error> {
        Ok(ImageFields {
            name: Name::parse("name", &request.name)?.into_inner(),
            description: description(request.description.as_deref())?,
            url: request
                .url
                .as_deref()
                .map(SourceUrl::parse)
                .transpose()?
                .map(SourceUrl::into_inner),
            file_name: Name::parse("file_name", &request.file_name)?.into_inner(),
            format: ImageFormat::parse(&request.format)?.into_inner(),
            raw_image: validation::payload("raw_image", &request.raw_image)?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/images",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Images of the account", body = ImageListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_images(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<ImageListResponse>, ApiError> {
    let images: Vec<ImageResponse> = state
        .interactor
        .list_images(&session)?
        .into_iter()
        .map(Into::into)
        .collect();
    Ok(Json(ImageListResponse {
        total: images.len(),
        images,
    }))
}

/// Store an image. With blob offloading enabled, a 502 means the record was
/// saved but the payload did not reach the blob store; the body names the
/// image so the upload can be retried with PUT.
#[utoipa::path(
    post,
    path = "/v1/users/{account_id}/images",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    request_body = ImageRequest,
    responses(
        (status = 201, description = "Image stored", body = ImageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 502, description = "Record saved, blob write failed")
    )
)]
pub async fn create_image(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> Result<(StatusCode, Json<ImageResponse>), ApiError> {
    let fields = ImageFields::try_from(request)?;
    let image = state.interactor.create_image(&session, fields)?;
    Ok((StatusCode::CREATED, Json(image.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/images/{image_id}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("image_id" = String, Path, description = "Image identifier")
    ),
    responses(
        (status = 200, description = "Image metadata", body = ImageResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Image not found")
    )
)]
pub async fn get_image(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<ImageResponse>, ApiError> {
    let (_, image_id) = path;
    let image_id = RecordId::parse("image_id", &image_id)?;
    let image = state.interactor.get_image(&session, image_id.as_str())?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/images/{image_id}/raw",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("image_id" = String, Path, description = "Image identifier")
    ),
    responses(
        (status = 200, description = "Image bytes", body = Vec<u8>, content_type = "application/octet-stream"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Image or blob not found")
    )
)]
pub async fn image_raw(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<([(HeaderName, String); 1], Vec<u8>), ApiError> {
    let (_, image_id) = path;
    let image_id = RecordId::parse("image_id", &image_id)?;
    let payload = state.interactor.image_payload(&session, image_id.as_str())?;
    let content_type = format!("image/{}", payload.format);
    Ok(([(CONTENT_TYPE, content_type)], payload.bytes))
}

/// Replace an image. Also the retry path after a 502 on create.
#[utoipa::path(
    put,
    path = "/v1/users/{account_id}/images/{image_id}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("image_id" = String, Path, description = "Image identifier")
    ),
    request_body = ImageRequest,
    responses(
        (status = 200, description = "Image replaced", body = ImageResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Image not found"),
        (status = 502, description = "Record saved, blob write failed")
    )
)]
pub async fn update_image(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<ImageRequest>,
) -> Result<Json<ImageResponse>, ApiError> {
    let (_, image_id) = path;
    let image_id = RecordId::parse("image_id", &image_id)?;
    let fields = ImageFields::try_from(request)?;
    let image = state
        .interactor
        .update_image(&session, image_id.as_str(), fields)?;
    Ok(Json(image.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}/images/{image_id}",
    tag = "Images",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("image_id" = String, Path, description = "Image identifier")
    ),
    responses(
        (status = 204, description = "Image deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Image not found"),
        (status = 502, description = "Record deleted, blob remains")
    )
)]
pub async fn delete_image(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (_, image_id) = path;
    let image_id = RecordId::parse("image_id", &image_id)?;
    state.interactor.delete_image(&session, image_id.as_str())?;
    Ok(StatusCode::NO_CONTENT)
}
