use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub phone: String,
    pub email: Option<String>,
    pub wilaya_id: Option<Uuid>,
    pub baladia: Option<String>,
    pub house: bool,
    pub status: String,
    pub subtotal: i64,
    pub discount: i64,
    pub shipping_cost: i64,
    pub total: i64,
    pub coupon_id: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::wilayas::Entity",
        from = "Column::WilayaId",
        to = "super::wilayas::Column::Id",
        on_delete = "SetNull"
    )]
    Wilayas,
    #[sea_orm(
        belongs_to = "super::coupons::Entity",
        from = "Column::CouponId",
        to = "super::coupons::Column::Id",
        on_delete = "SetNull"
    )]
    Coupons,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::wilayas::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Wilayas.def()
    }
}

impl Related<super::coupons::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Coupons.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
