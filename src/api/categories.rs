// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Spending category endpoints. Every category points at an image of the
//! same account.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    api::validation::{self, description, Name, RecordId},
    auth::Auth,
    error::ApiError,
    models::{Category, CategoryFields},
    state::AppState,
};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryRequest {
    /// Image shown for the category.
    pub image_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCategoriesRequest {
    pub categories: Vec<CategoryRequest>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryResponse {
    pub category_id: String,
    pub account_id: String,
    pub image_id: String,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Category> for CategoryResponse {
    fn from(category: Category) -> Self {
        Self {
            category_id: category.category_id,
            account_id: category.account_id,
            image_id: category.image_id,
            name: category.name,
            description: category.description,
            created_at: category.created_at,
            updated_at: category.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CategoryListResponse {
    pub categories: Vec<CategoryResponse>,
    pub total: usize,
}

impl From<Vec<Category>> for CategoryListResponse {
    fn from(categories: Vec<Category>) -> Self {
        let categories: Vec<CategoryResponse> = categories.into_iter().map(Into::into).collect();
        Self {
            total: categories.len(),
            categories,
        }
    }
}

impl TryFrom<CategoryRequest> for CategoryFields {
    type Error = validation::ValidationError;

    fn try_from(request: CategoryRequest) -> Result<Self, Self::Error> {
        Ok(CategoryFields {
            image_id: RecordId::parse("image_id", &request.image_id)?.into_inner(),
            name: Name::parse("name", &request.name)?.into_inner(),
            description: description(request.description.as_deref())?,
        })
    }
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    responses(
        (status = 200, description = "Categories of the account", body = CategoryListResponse),
        (status = 401, description = "Unauthorized")
    )
)]
pub async fn list_categories(
    Auth(session): Auth,
    State(state): State<AppState>,
) -> Result<Json<CategoryListResponse>, ApiError> {
    let categories = state.interactor.list_categories(&session)?;
    Ok(Json(categories.into()))
}

/// Create a batch of categories in one transaction.
#[utoipa::path(
    post,
    path = "/v1/users/{account_id}/categories",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(("account_id" = String, Path, description = "Account identifier")),
    request_body = CreateCategoriesRequest,
    responses(
        (status = 201, description = "Categories created in submission order", body = CategoryListResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "A referenced image does not exist")
    )
)]
pub async fn create_categories(
    Auth(session): Auth,
    State(state): State<AppState>,
    Json(request): Json<CreateCategoriesRequest>,
) -> Result<(StatusCode, Json<CategoryListResponse>), ApiError> {
    let fields = validation::batch(request.categories, CategoryFields::try_from)?;
    let categories = state.interactor.create_categories(&session, fields)?;
    Ok((StatusCode::CREATED, Json(categories.into())))
}

#[utoipa::path(
    get,
    path = "/v1/users/{account_id}/categories/{category_id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("category_id" = String, Path, description = "Category identifier")
    ),
    responses(
        (status = 200, description = "Category", body = CategoryResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn get_category(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let (_, category_id) = path;
    let category_id = RecordId::parse("category_id", &category_id)?;
    let category = state.interactor.get_category(&session, category_id.as_str())?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    put,
    path = "/v1/users/{account_id}/categories/{category_id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("category_id" = String, Path, description = "Category identifier")
    ),
    request_body = CategoryRequest,
    responses(
        (status = 200, description = "Category updated", body = CategoryResponse),
        (status = 400, description = "Invalid input"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found"),
        (status = 409, description = "The referenced image does not exist")
    )
)]
pub async fn update_category(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
    Json(request): Json<CategoryRequest>,
) -> Result<Json<CategoryResponse>, ApiError> {
    let (_, category_id) = path;
    let category_id = RecordId::parse("category_id", &category_id)?;
    let fields = CategoryFields::try_from(request)?;
    let category = state
        .interactor
        .update_category(&session, category_id.as_str(), fields)?;
    Ok(Json(category.into()))
}

#[utoipa::path(
    delete,
    path = "/v1/users/{account_id}/categories/{category_id}",
    tag = "Categories",
    security(("bearer_auth" = [])),
    params(
        ("account_id" = String, Path, description = "Account identifier"),
        ("category_id" = String, Path, description = "Category identifier")
    ),
    responses(
        (status = 204, description = "Category deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Category not found")
    )
)]
pub async fn delete_category(
    Auth(session): Auth,
    Path(path): Path<(String, String)>,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let (_, category_id) = path;
    let category_id = RecordId::parse("category_id", &category_id)?;
    state.interactor.delete_category(&session, category_id.as_str())?;
    Ok(StatusCode::NO_CONTENT)
}
