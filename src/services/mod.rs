pub mod auth_service;
pub mod category_service;
pub mod coupon_service;
pub mod dashboard_service;
pub mod order_service;
pub mod pricing;
pub mod product_service;
pub mod settings_service;
pub mod shop_service;
pub mod stock_service;
pub mod user_service;
pub mod wilaya_service;
