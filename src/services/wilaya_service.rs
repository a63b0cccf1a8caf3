use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        Deleted,
        wilayas::{
            BaladiaImport, BaladiaImportResult, BaladiaList, CreateWilayaRequest,
            UpdateWilayaRequest, WilayaList,
        },
    },
    entity::{
        baladias::{ActiveModel as BaladiaActive, Column as BaladiaCol, Entity as Baladias},
        wilayas::{ActiveModel, Column, Entity as Wilayas, Model as WilayaModel},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Baladia, Wilaya},
    response::{ApiResponse, Meta},
    services::product_service::{non_blank, required_text},
    state::AppState,
};

pub async fn list_wilayas(state: &AppState) -> AppResult<ApiResponse<WilayaList>> {
    let items = Wilayas::find()
        .order_by_asc(Column::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Wilaya::from)
        .collect();
    Ok(ApiResponse::success(
        "Wilayas",
        WilayaList { items },
        Some(Meta::empty()),
    ))
}

pub async fn get_wilaya(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Wilaya>> {
    let wilaya = find_wilaya(&state.orm, id).await?;
    Ok(ApiResponse::success("Wilaya", Wilaya::from(wilaya), None))
}

pub async fn create_wilaya(
    state: &AppState,
    user: &AuthUser,
    payload: CreateWilayaRequest,
) -> AppResult<ApiResponse<Wilaya>> {
    ensure_admin(user)?;
    let (Some(name), Some(wilaya_number), Some(delivery_price), Some(agency_name)) = (
        payload.name.as_deref(),
        payload.wilaya_number,
        payload.delivery_price,
        payload.agency_name.as_deref(),
    ) else {
        return Err(AppError::BadRequest(
            "Name, wilaya number, delivery price and agency name are required".into(),
        ));
    };
    let name = required_text(name, "Name")?;
    let agency_name = required_text(agency_name, "Agency name")?;
    validate_number(wilaya_number)?;
    validate_prices(delivery_price, payload.home_delivery_price)?;
    ensure_unique(&state.orm, &name, wilaya_number, None).await?;

    let now = Utc::now();
    let wilaya = ActiveModel {
        id: Set(Uuid::new_v4()),
        name: Set(name),
        wilaya_number: Set(wilaya_number),
        delivery_price: Set(delivery_price),
        home_delivery_price: Set(payload.home_delivery_price),
        agency_name: Set(agency_name),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    }
    .insert(&state.orm)
    .await?;

    audit::record(
        &state.pool,
        user.user_id,
        "wilaya_create",
        "wilayas",
        serde_json::json!({ "wilaya_id": wilaya.id, "name": wilaya.name }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Wilaya {} created successfully", wilaya.name),
        Wilaya::from(wilaya),
        Some(Meta::empty()),
    ))
}

pub async fn update_wilaya(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateWilayaRequest,
) -> AppResult<ApiResponse<Wilaya>> {
    ensure_admin(user)?;
    let existing = find_wilaya(&state.orm, id).await?;

    let name = match payload.name.as_deref() {
        Some(name) => required_text(name, "Name")?,
        None => existing.name.clone(),
    };
    let wilaya_number = payload.wilaya_number.unwrap_or(existing.wilaya_number);
    let delivery_price = payload.delivery_price.unwrap_or(existing.delivery_price);
    let home_delivery_price = payload
        .home_delivery_price
        .unwrap_or(existing.home_delivery_price);
    let agency_name = match payload.agency_name.as_deref() {
        Some(agency) => required_text(agency, "Agency name")?,
        None => existing.agency_name.clone(),
    };
    validate_number(wilaya_number)?;
    validate_prices(delivery_price, home_delivery_price)?;
    if name != existing.name || wilaya_number != existing.wilaya_number {
        ensure_unique(&state.orm, &name, wilaya_number, Some(id)).await?;
    }

    let mut active: ActiveModel = existing.into();
    active.name = Set(name);
    active.wilaya_number = Set(wilaya_number);
    active.delivery_price = Set(delivery_price);
    active.home_delivery_price = Set(home_delivery_price);
    active.agency_name = Set(agency_name);
    active.updated_at = Set(Utc::now().into());
    let wilaya = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        user.user_id,
        "wilaya_update",
        "wilayas",
        serde_json::json!({ "wilaya_id": wilaya.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Wilaya updated successfully",
        Wilaya::from(wilaya),
        Some(Meta::empty()),
    ))
}

/// Orders pointing at the wilaya keep their stored shipping cost; the
/// foreign key nulls their link.
pub async fn delete_wilaya(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Deleted>> {
    ensure_admin(user)?;
    let result = Wilayas::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::not_found("Wilaya"));
    }

    audit::record(
        &state.pool,
        user.user_id,
        "wilaya_delete",
        "wilayas",
        serde_json::json!({ "wilaya_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Wilaya deleted successfully",
        Deleted { id },
        Some(Meta::empty()),
    ))
}

pub async fn list_baladias(state: &AppState, wilaya_id: Uuid) -> AppResult<ApiResponse<BaladiaList>> {
    let wilaya = find_wilaya(&state.orm, wilaya_id).await?;
    let items = Baladias::find()
        .filter(BaladiaCol::WilayaNumber.eq(wilaya.wilaya_number))
        .order_by_asc(BaladiaCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Baladia::from)
        .collect();
    Ok(ApiResponse::success(
        format!("Baladias of {}", wilaya.name),
        BaladiaList { items },
        Some(Meta::empty()),
    ))
}

/// Bulk insert communes; rows already present for the same wilaya are skipped.
pub async fn import_baladias(
    state: &AppState,
    user: &AuthUser,
    payload: Vec<BaladiaImport>,
) -> AppResult<ApiResponse<BaladiaImportResult>> {
    ensure_admin(user)?;
    let received = payload.len();

    let mut rows = Vec::with_capacity(received);
    for entry in payload {
        validate_number(entry.wilaya_number)?;
        rows.push(BaladiaActive {
            id: Set(Uuid::new_v4()),
            wilaya_number: Set(entry.wilaya_number),
            name: Set(required_text(&entry.name, "Baladia name")?),
            ar_name: Set(non_blank(entry.ar_name)),
        });
    }

    let inserted = if rows.is_empty() {
        0
    } else {
        Baladias::insert_many(rows)
            .on_conflict(
                OnConflict::columns([BaladiaCol::WilayaNumber, BaladiaCol::Name])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&state.orm)
            .await?
    };

    audit::record(
        &state.pool,
        user.user_id,
        "baladia_import",
        "baladias",
        serde_json::json!({ "received": received, "inserted": inserted }),
    )
    .await;
    tracing::info!(received, inserted, "baladias imported");

    Ok(ApiResponse::success(
        "Baladias imported",
        BaladiaImportResult { received, inserted },
        Some(Meta::empty()),
    ))
}

async fn find_wilaya<C: ConnectionTrait>(conn: &C, id: Uuid) -> AppResult<WilayaModel> {
    Wilayas::find_by_id(id)
        .one(conn)
        .await?
        .ok_or_else(|| AppError::not_found("Wilaya"))
}

async fn ensure_unique<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    wilaya_number: i32,
    except: Option<Uuid>,
) -> AppResult<()> {
    let mut finder = Wilayas::find().filter(
        sea_orm::Condition::any()
            .add(Column::Name.eq(name))
            .add(Column::WilayaNumber.eq(wilaya_number)),
    );
    if let Some(id) = except {
        finder = finder.filter(Column::Id.ne(id));
    }
    if let Some(clash) = finder.one(conn).await? {
        let field = if clash.wilaya_number == wilaya_number {
            "number"
        } else {
            "name"
        };
        return Err(AppError::Conflict(format!(
            "A wilaya with this {field} already exists"
        )));
    }
    Ok(())
}

fn validate_number(wilaya_number: i32) -> AppResult<()> {
    if wilaya_number <= 0 {
        return Err(AppError::BadRequest(
            "Wilaya number must be greater than 0".into(),
        ));
    }
    Ok(())
}

fn validate_prices(delivery_price: i64, home_delivery_price: Option<i64>) -> AppResult<()> {
    if delivery_price <= 0 {
        return Err(AppError::BadRequest(
            "Delivery price must be greater than 0".into(),
        ));
    }
    if home_delivery_price.is_some_and(|home| home < delivery_price) {
        return Err(AppError::BadRequest(
            "Home delivery price must not be lower than the delivery price".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn home_price_cannot_undercut_office_price() {
        assert!(validate_prices(400, None).is_ok());
        assert!(validate_prices(400, Some(400)).is_ok());
        assert!(validate_prices(400, Some(650)).is_ok());
        assert!(validate_prices(400, Some(300)).is_err());
        assert!(validate_prices(0, None).is_err());
    }

    #[test]
    fn wilaya_numbers_are_positive() {
        assert!(validate_number(16).is_ok());
        assert!(validate_number(0).is_err());
    }
}
