pub mod audit_logs;
pub mod baladias;
pub mod categories;
pub mod coupons;
pub mod order_items;
pub mod orders;
pub mod product_coupons;
pub mod product_price_tiers;
pub mod products;
pub mod settings;
pub mod users;
pub mod wilayas;

pub use audit_logs::Entity as AuditLogs;
pub use baladias::Entity as Baladias;
pub use categories::Entity as Categories;
pub use coupons::Entity as Coupons;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use product_coupons::Entity as ProductCoupons;
pub use product_price_tiers::Entity as ProductPriceTiers;
pub use products::Entity as Products;
pub use settings::Entity as Settings;
pub use users::Entity as Users;
pub use wilayas::Entity as Wilayas;
