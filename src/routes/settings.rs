use axum::{
    Json, Router,
    extract::State,
    routing::{get, put},
};

use crate::{
    dto::settings::{GeneralSettings, HeroContent, Integrations, SettingsBundle},
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    services::settings_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_settings))
        .route("/general", put(put_general))
        .route("/cms", put(put_cms))
        .route("/integrations", put(put_integrations))
}

#[utoipa::path(
    get,
    path = "/api/main/settings",
    responses(
        (status = 200, description = "Store settings, hero content and integrations", body = ApiResponse<SettingsBundle>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_settings(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SettingsBundle>>> {
    let resp = settings_service::get_settings(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/main/settings/general",
    request_body = GeneralSettings,
    responses(
        (status = 200, description = "Replace general settings", body = ApiResponse<GeneralSettings>)
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_general(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<GeneralSettings>,
) -> AppResult<Json<ApiResponse<GeneralSettings>>> {
    let resp = settings_service::put_general(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/main/settings/cms",
    request_body = HeroContent,
    responses(
        (status = 200, description = "Replace storefront hero content", body = ApiResponse<HeroContent>)
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_cms(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<HeroContent>,
) -> AppResult<Json<ApiResponse<HeroContent>>> {
    let resp = settings_service::put_cms(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/main/settings/integrations",
    request_body = Integrations,
    responses(
        (status = 200, description = "Replace integration settings", body = ApiResponse<Integrations>)
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn put_integrations(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<Integrations>,
) -> AppResult<Json<ApiResponse<Integrations>>> {
    let resp = settings_service::put_integrations(&state, &user, payload).await?;
    Ok(Json(resp))
}
