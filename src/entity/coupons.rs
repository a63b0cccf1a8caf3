use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "coupons")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub code: String,
    pub discount: i32,
    pub is_active: bool,
    pub expires_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::product_coupons::Entity")]
    ProductCoupons,
    #[sea_orm(has_many = "super::orders::Entity")]
    Orders,
}

impl Related<super::product_coupons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ProductCoupons.def()
    }
}

impl Related<super::orders::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::products::Entity> for Entity {
    fn to() -> RelationDef {
        super::product_coupons::Relation::Products.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::product_coupons::Relation::Coupons.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
