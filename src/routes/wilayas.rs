use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        Deleted,
        wilayas::{
            BaladiaImport, BaladiaImportResult, BaladiaList, CreateWilayaRequest,
            UpdateWilayaRequest, WilayaList,
        },
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::Wilaya,
    response::ApiResponse,
    services::wilaya_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wilayas).post(create_wilaya))
        .route(
            "/{id}",
            get(get_wilaya).put(update_wilaya).delete(delete_wilaya),
        )
        .route("/{id}/baladias", get(list_baladias))
}

pub fn baladia_router() -> Router<AppState> {
    Router::new().route("/import", post(import_baladias))
}

#[utoipa::path(
    get,
    path = "/api/main/wilayas",
    responses(
        (status = 200, description = "List wilayas with delivery prices", body = ApiResponse<WilayaList>)
    ),
    tag = "Wilayas"
)]
pub async fn list_wilayas(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<WilayaList>>> {
    let resp = wilaya_service::list_wilayas(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/main/wilayas/{id}",
    params(("id" = Uuid, Path, description = "Wilaya ID")),
    responses(
        (status = 200, description = "Get wilaya", body = ApiResponse<Wilaya>),
        (status = 404, description = "Wilaya not found")
    ),
    tag = "Wilayas"
)]
pub async fn get_wilaya(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Wilaya>>> {
    let resp = wilaya_service::get_wilaya(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/main/wilayas",
    request_body = CreateWilayaRequest,
    responses(
        (status = 201, description = "Create wilaya", body = ApiResponse<Wilaya>),
        (status = 400, description = "Missing or invalid fields"),
        (status = 409, description = "Name or number already used")
    ),
    security(("bearer_auth" = [])),
    tag = "Wilayas"
)]
pub async fn create_wilaya(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateWilayaRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Wilaya>>)> {
    let resp = wilaya_service::create_wilaya(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/main/wilayas/{id}",
    params(("id" = Uuid, Path, description = "Wilaya ID")),
    request_body = UpdateWilayaRequest,
    responses(
        (status = 200, description = "Updated wilaya", body = ApiResponse<Wilaya>),
        (status = 404, description = "Wilaya not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wilayas"
)]
pub async fn update_wilaya(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateWilayaRequest>,
) -> AppResult<Json<ApiResponse<Wilaya>>> {
    let resp = wilaya_service::update_wilaya(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/main/wilayas/{id}",
    params(("id" = Uuid, Path, description = "Wilaya ID")),
    responses(
        (status = 200, description = "Deleted wilaya", body = ApiResponse<Deleted>),
        (status = 404, description = "Wilaya not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Wilayas"
)]
pub async fn delete_wilaya(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Deleted>>> {
    let resp = wilaya_service::delete_wilaya(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/main/wilayas/{id}/baladias",
    params(("id" = Uuid, Path, description = "Wilaya ID")),
    responses(
        (status = 200, description = "Communes of the wilaya", body = ApiResponse<BaladiaList>),
        (status = 404, description = "Wilaya not found")
    ),
    tag = "Wilayas"
)]
pub async fn list_baladias(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<BaladiaList>>> {
    let resp = wilaya_service::list_baladias(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/main/baladias/import",
    request_body = Vec<BaladiaImport>,
    responses(
        (status = 200, description = "Bulk import communes, duplicates skipped", body = ApiResponse<BaladiaImportResult>),
        (status = 403, description = "Admin access required")
    ),
    security(("bearer_auth" = [])),
    tag = "Wilayas"
)]
pub async fn import_baladias(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<Vec<BaladiaImport>>,
) -> AppResult<Json<ApiResponse<BaladiaImportResult>>> {
    let resp = wilaya_service::import_baladias(&state, &user, payload).await?;
    Ok(Json(resp))
}
