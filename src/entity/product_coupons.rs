use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "product_coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub coupon_id: Uuid,
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::coupons::Entity",
        from = "Column::CouponId",
        to = "super::coupons::Column::Id",
        on_delete = "Cascade"
    )]
    Coupons,
    #[sea_orm(
        belongs_to = "super::products::Entity",
        from = "Column::ProductId",
        to = "super::products::Column::Id",
        on_delete = "Cascade"
    )]
    Products,
}

impl Related<super::coupons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupons.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use sea_orm::{DbBackend, ModelTrait, QueryTrait, prelude::Uuid};

    use crate::entity::{coupons, products};

    #[test]
    fn coupon_products_are_joined_through_links() {
        let now = chrono::Utc::now().fixed_offset();
        let coupon = coupons::Model {
            id: Uuid::nil(),
            code: "SPRING".into(),
            discount: 10,
            is_active: true,
            expires_at: None,
            created_at: now,
            updated_at: now,
        };
        let sql = coupon
            .find_related(products::Entity)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.contains(r#"INNER JOIN "product_coupons""#), "{sql}");
    }
}
