use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, Set};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    audit,
    dto::settings::{GeneralSettings, HeroContent, Integrations, SettingsBundle, StorefrontContent},
    entity::settings::{ActiveModel, Column, Entity as Settings},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub const GENERAL_KEY: &str = "general";
pub const CMS_KEY: &str = "cms";
pub const INTEGRATIONS_KEY: &str = "integrations";

pub async fn get_settings(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SettingsBundle>> {
    ensure_admin(user)?;
    let bundle = SettingsBundle {
        general: read_section(&state.orm, GENERAL_KEY).await?,
        cms: read_section(&state.orm, CMS_KEY).await?,
        integrations: read_section(&state.orm, INTEGRATIONS_KEY).await?,
    };
    Ok(ApiResponse::success("Settings", bundle, Some(Meta::empty())))
}

pub async fn put_general(
    state: &AppState,
    user: &AuthUser,
    payload: GeneralSettings,
) -> AppResult<ApiResponse<GeneralSettings>> {
    ensure_admin(user)?;
    if payload.store_name.trim().is_empty() {
        return Err(AppError::BadRequest("Store name is required".into()));
    }
    save_section(state, user, GENERAL_KEY, payload).await
}

pub async fn put_cms(
    state: &AppState,
    user: &AuthUser,
    payload: HeroContent,
) -> AppResult<ApiResponse<HeroContent>> {
    ensure_admin(user)?;
    save_section(state, user, CMS_KEY, payload).await
}

pub async fn put_integrations(
    state: &AppState,
    user: &AuthUser,
    payload: Integrations,
) -> AppResult<ApiResponse<Integrations>> {
    ensure_admin(user)?;
    save_section(state, user, INTEGRATIONS_KEY, payload).await
}

/// Public subset rendered by the storefront.
pub async fn storefront_content(state: &AppState) -> AppResult<ApiResponse<StorefrontContent>> {
    let general: GeneralSettings = read_section(&state.orm, GENERAL_KEY).await?;
    let hero: HeroContent = read_section(&state.orm, CMS_KEY).await?;
    Ok(ApiResponse::success(
        "Storefront content",
        StorefrontContent {
            store_name: general.store_name,
            hero,
        },
        Some(Meta::empty()),
    ))
}

/// Stored section, or its defaults when nothing was saved yet.
async fn read_section<C, T>(conn: &C, key: &str) -> AppResult<T>
where
    C: ConnectionTrait,
    T: DeserializeOwned + Default,
{
    let row = Settings::find()
        .filter(Column::Key.eq(key))
        .one(conn)
        .await?;
    match row {
        Some(row) => serde_json::from_value(row.value)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("settings {key}: {e}"))),
        None => Ok(T::default()),
    }
}

async fn save_section<T>(
    state: &AppState,
    user: &AuthUser,
    key: &str,
    payload: T,
) -> AppResult<ApiResponse<T>>
where
    T: Serialize,
{
    let value = serde_json::to_value(&payload)
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;

    Settings::insert(ActiveModel {
        key: Set(key.to_string()),
        value: Set(value),
        updated_at: Set(Utc::now().into()),
    })
    .on_conflict(
        OnConflict::column(Column::Key)
            .update_columns([Column::Value, Column::UpdatedAt])
            .to_owned(),
    )
    .exec_without_returning(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "settings_update",
        "settings",
        serde_json::json!({ "section": key }),
    )
    .await;

    Ok(ApiResponse::success(
        "Settings saved",
        payload,
        Some(Meta::empty()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_sections_fill_in_defaults() {
        let general: GeneralSettings =
            serde_json::from_value(serde_json::json!({ "store_name": "Green Corner" }))
                .expect("general settings");
        assert_eq!(general.store_name, "Green Corner");
        assert_eq!(general.currency, "DZD");
        assert!(!general.maintenance_mode);

        let integrations: Integrations = serde_json::from_value(serde_json::json!({
            "facebook_pixel": { "enabled": true, "pixel_id": "123" }
        }))
        .expect("integrations");
        assert!(integrations.facebook_pixel.enabled);
        assert!(!integrations.google_sheets.enabled);
    }
}
