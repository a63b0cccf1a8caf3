use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Deleted,
        users::{CreateUserRequest, UpdateUserRequest, UserList},
    },
    entity::users::{ActiveModel, Column, Entity as Users, Model as UserModel},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Role, User},
    response::{ApiResponse, Meta},
    routes::params::{SearchQuery, contains_pattern, search_term},
    services::auth_service::hash_password,
    state::AppState,
};

const MIN_PASSWORD_LEN: usize = 6;

pub async fn list_users(
    state: &AppState,
    user: &AuthUser,
    query: SearchQuery,
) -> AppResult<ApiResponse<UserList>> {
    ensure_admin(user)?;
    let mut finder = Users::find();
    if let Some(search) = search_term(&query.search) {
        finder = finder.filter(Expr::col(Column::Email).ilike(contains_pattern(&search)));
    }
    let items = finder
        .order_by_asc(Column::Email)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(User::from)
        .collect();
    Ok(ApiResponse::success(
        "Users",
        UserList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_user(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let found = find_user(state, id).await?;
    Ok(ApiResponse::success("User", User::from(found), None))
}

pub async fn create_user(
    state: &AppState,
    user: &AuthUser,
    payload: CreateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let email = normalize_email(&payload.email)?;
    validate_password(&payload.password)?;
    let role = parse_role(payload.role.as_deref())?.unwrap_or(Role::Employee);
    ensure_email_free(state, &email, None).await?;

    let now = Utc::now();
    let created = ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(hash_password(&payload.password)?),
        role: Set(role.as_str().to_string()),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "user_create",
        "users",
        serde_json::json!({ "user_id": created.id, "role": created.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User created successfully",
        User::from(created),
        Some(Meta::empty()),
    ))
}

pub async fn update_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateUserRequest,
) -> AppResult<ApiResponse<User>> {
    ensure_admin(user)?;
    let existing = find_user(state, id).await?;
    let role = parse_role(payload.role.as_deref())?;
    if id == user.user_id && role.is_some_and(|r| r != Role::Admin) {
        return Err(AppError::BadRequest(
            "You cannot remove your own admin role".into(),
        ));
    }

    let mut active: ActiveModel = existing.clone().into();
    if let Some(email) = payload.email.as_deref() {
        let email = normalize_email(email)?;
        if email != existing.email {
            ensure_email_free(state, &email, Some(id)).await?;
        }
        active.email = Set(email);
    }
    if let Some(password) = payload.password.as_deref().filter(|p| !p.is_empty()) {
        validate_password(password)?;
        active.password_hash = Set(hash_password(password)?);
    }
    if let Some(role) = role {
        active.role = Set(role.as_str().to_string());
    }
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "user_update",
        "users",
        serde_json::json!({ "user_id": updated.id, "role": updated.role }),
    )
    .await;

    Ok(ApiResponse::success(
        "User updated successfully",
        User::from(updated),
        Some(Meta::empty()),
    ))
}

pub async fn delete_user(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    if id == user.user_id {
        return Err(AppError::BadRequest(
            "You cannot delete your own account".into(),
        ));
    }
    let result = Users::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("User"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "user_delete",
        "users",
        serde_json::json!({ "user_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "User deleted successfully",
        Deleted { id },
        Some(Meta::empty()),
    ))
}

async fn find_user(state: &AppState, id: Uuid) -> AppResult<UserModel> {
    Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::not_found("User"))
}

async fn ensure_email_free(state: &AppState, email: &str, except: Option<Uuid>) -> AppResult<()> {
    let mut finder = Users::find().filter(Column::Email.eq(email));
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if finder.one(&state.orm).await?.is_some() {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    Ok(())
}

fn normalize_email(raw: &str) -> AppResult<String> {
    let email = raw.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("A valid email is required".into()));
    }
    Ok(email)
}

fn validate_password(password: &str) -> AppResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

fn parse_role(raw: Option<&str>) -> AppResult<Option<Role>> {
    raw.map(str::parse::<Role>)
        .transpose()
        .map_err(AppError::BadRequest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_lowercased_and_checked() {
        assert_eq!(normalize_email(" Staff@Planted.com ").unwrap(), "staff@planted.com");
        assert!(normalize_email("not-an-email").is_err());
        assert!(normalize_email("   ").is_err());
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(validate_password("12345").is_err());
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn unknown_roles_are_a_bad_request() {
        assert_eq!(parse_role(None).unwrap(), None);
        assert_eq!(parse_role(Some("admin")).unwrap(), Some(Role::Admin));
        assert!(matches!(parse_role(Some("owner")), Err(AppError::BadRequest(_))));
    }
}
