// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};
use utoipa_swagger_ui::SwaggerUi;

use crate::state::AppState;

pub mod categories;
pub mod health;
pub mod images;
pub mod sessions;
pub mod transactions;
pub mod users;
pub mod validation;
pub mod wallets;

pub fn router(state: AppState) -> Router {
    let image_routes: Router<AppState> = Router::new()
        .route(
            "/users/{account_id}/images",
            get(images::list_images).post(images::create_image),
        )
        .route(
            "/users/{account_id}/images/{image_id}",
            get(images::get_image)
                .put(images::update_image)
                .delete(images::delete_image),
        )
        .route(
            "/users/{account_id}/images/{image_id}/raw",
            get(images::image_raw),
        )
        .layer(DefaultBodyLimit::max(validation::MAX_IMAGE_BODY_BYTES));

    let v1_routes = Router::new()
        .route("/users", post(users::register))
        .route(
            "/users/{account_id}",
            get(users::get_account)
                .put(users::update_account)
                .delete(users::delete_account),
        )
        .route("/sessions", post(sessions::login))
        .route(
            "/users/{account_id}/sessions",
            get(sessions::list_sessions).delete(sessions::logout_all),
        )
        .route("/users/{account_id}/session", delete(sessions::logout))
        .route(
            "/users/{account_id}/wallets",
            get(wallets::list_wallets).post(wallets::create_wallets),
        )
        .route(
            "/users/{account_id}/wallets/{wallet_id}",
            get(wallets::get_wallet)
                .put(wallets::update_wallet)
                .delete(wallets::delete_wallet),
        )
        .route(
            "/users/{account_id}/wallets/{wallet_id}/access",
            post(wallets::verify_wallet_access),
        )
        .route(
            "/users/{account_id}/categories",
            get(categories::list_categories).post(categories::create_categories),
        )
        .route(
            "/users/{account_id}/categories/{category_id}",
            get(categories::get_category)
                .put(categories::update_category)
                .delete(categories::delete_category),
        )
        .merge(image_routes)
        .route(
            "/users/{account_id}/transactions",
            get(transactions::list_transactions),
        )
        .route(
            "/users/{account_id}/wallets/{wallet_id}/transactions",
            post(transactions::create_transactions),
        )
        .route(
            "/users/{account_id}/wallets/{wallet_id}/transactions/{transaction_id}",
            get(transactions::get_transaction)
                .put(transactions::update_transaction)
                .delete(transactions::delete_transaction),
        )
        .with_state(state.clone());

    let health_routes = Router::new()
        .route("/health", get(health::health))
        .route("/health/live", get(health::liveness))
        .route("/health/ready", get(health::readiness))
        .with_state(state);

    Router::new()
        .nest("/v1", v1_routes)
        .merge(health_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
        .layer(CorsLayer::permissive())
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        users::register,
        users::get_account,
        users::update_account,
        users::delete_account,
        sessions::login,
        sessions::list_sessions,
        sessions::logout,
        sessions::logout_all,
        wallets::list_wallets,
        wallets::create_wallets,
        wallets::get_wallet,
        wallets::update_wallet,
        wallets::delete_wallet,
        wallets::verify_wallet_access,
        categories::list_categories,
        categories::create_categories,
        categories::get_category,
        categories::update_category,
        categories::delete_category,
        images::list_images,
        images::create_image,
        images::get_image,
        images::image_raw,
        images::update_image,
        images::delete_image,
        transactions::list_transactions,
        transactions::create_transactions,
        transactions::get_transaction,
        transactions::update_transaction,
        transactions::delete_transaction,
        health::health,
        health::liveness,
        health::readiness
    ),
    components(
        schemas(
            users::RegisterRequest,
            users::UpdateAccountRequest,
            users::AccountResponse,
            sessions::LoginRequest,
            sessions::LoginResponse,
            sessions::SessionResponse,
            sessions::SessionListResponse,
            sessions::LogoutAllResponse,
            wallets::WalletRequest,
            wallets::CreateWalletsRequest,
            wallets::WalletResponse,
            wallets::WalletListResponse,
            wallets::WalletAccessRequest,
            wallets::WalletAccessResponse,
            categories::CategoryRequest,
            categories::CreateCategoriesRequest,
            categories::CategoryResponse,
            categories::CategoryListResponse,
            images::ImageRequest,
            images::ImageResponse,
            images::ImageListResponse,
            transactions::TransactionRequest,
            transactions::CreateTransactionsRequest,
            transactions::TransactionResponse,
            transactions::TransactionListResponse,
            health::ReadyResponse,
            health::HealthChecks,
            health::HealthResponse
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Users", description = "Account registration and profile"),
        (name = "Sessions", description = "Login, logout and session listing"),
        (name = "Wallets", description = "Wallet management"),
        (name = "Categories", description = "Spending categories"),
        (name = "Images", description = "Receipt and icon images"),
        (name = "Transactions", description = "Money movements per wallet"),
        (name = "Health", description = "Liveness and readiness probes")
    )
)]
pub struct ApiDoc;
