use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    dto::{
        Deleted,
        auth::{LoginRequest, LoginResponse},
        categories::{CategoryList, CategoryRequest},
        coupons::{CouponList, CreateCouponRequest, UpdateCouponRequest},
        dashboard::{DashboardStats, StatusCount},
        orders::{CreateOrderRequest, OrderDetail, OrderLineRequest, OrderList, UpdateOrderRequest},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        settings::{
            FacebookPixelIntegration, GeneralSettings, GoogleAnalyticsIntegration,
            GoogleSheetsIntegration, HeroContent, Integrations, SettingsBundle, StorefrontContent,
        },
        stock::{SetStockRequest, StockItem, StockOverview, StockSummary},
        users::{CreateUserRequest, UpdateUserRequest, UserList},
        wilayas::{
            BaladiaImport, BaladiaImportResult, BaladiaList, CreateWilayaRequest,
            UpdateWilayaRequest, WilayaList,
        },
    },
    error::ErrorBody,
    models::{
        Baladia, Category, Coupon, Order, OrderItem, OrderStatus, PriceTier, Product,
        ProductSummary, Role, User, Wilaya,
    },
    response::{ApiResponse, Meta},
    routes::{
        auth, categories, coupons, dashboard, health, orders, params, products, settings, shop,
        stock, users, wilayas,
    },
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::login,
        auth::logout,
        auth::me,
        categories::list_categories,
        categories::get_category,
        categories::create_category,
        categories::update_category,
        categories::delete_category,
        products::list_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        stock::stock_overview,
        stock::set_stock,
        wilayas::list_wilayas,
        wilayas::get_wilaya,
        wilayas::create_wilaya,
        wilayas::update_wilaya,
        wilayas::delete_wilaya,
        wilayas::list_baladias,
        wilayas::import_baladias,
        orders::list_orders,
        orders::get_order,
        orders::create_order,
        orders::update_order,
        orders::delete_order,
        coupons::list_coupons,
        coupons::get_coupon,
        coupons::create_coupon,
        coupons::update_coupon,
        coupons::delete_coupon,
        users::list_users,
        users::get_user,
        users::create_user,
        users::update_user,
        users::delete_user,
        settings::get_settings,
        settings::put_general,
        settings::put_cms,
        settings::put_integrations,
        dashboard::dashboard,
        shop::list_catalogue,
        shop::catalogue_product,
        shop::storefront_content
    ),
    components(
        schemas(
            User,
            Role,
            Category,
            Product,
            PriceTier,
            ProductSummary,
            Wilaya,
            Baladia,
            Coupon,
            Order,
            OrderItem,
            OrderStatus,
            Deleted,
            ErrorBody,
            LoginRequest,
            LoginResponse,
            CategoryRequest,
            CategoryList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            StockItem,
            StockSummary,
            StockOverview,
            SetStockRequest,
            CreateWilayaRequest,
            UpdateWilayaRequest,
            WilayaList,
            BaladiaImport,
            BaladiaImportResult,
            BaladiaList,
            OrderLineRequest,
            CreateOrderRequest,
            UpdateOrderRequest,
            OrderDetail,
            OrderList,
            CreateCouponRequest,
            UpdateCouponRequest,
            CouponList,
            CreateUserRequest,
            UpdateUserRequest,
            UserList,
            GeneralSettings,
            HeroContent,
            GoogleSheetsIntegration,
            GoogleAnalyticsIntegration,
            FacebookPixelIntegration,
            Integrations,
            SettingsBundle,
            StorefrontContent,
            StatusCount,
            DashboardStats,
            params::Pagination,
            params::ShopSort,
            Meta,
            ApiResponse<Product>,
            ApiResponse<ProductList>,
            ApiResponse<OrderDetail>,
            ApiResponse<OrderList>,
            ApiResponse<Coupon>,
            ApiResponse<CouponList>
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Staff login and session"),
        (name = "Categories", description = "Product categories"),
        (name = "Products", description = "Catalogue management"),
        (name = "Stock", description = "Stock levels"),
        (name = "Wilayas", description = "Shipping zones and communes"),
        (name = "Orders", description = "Order management"),
        (name = "Coupons", description = "Discount coupons"),
        (name = "Users", description = "Staff accounts"),
        (name = "Settings", description = "Store settings, CMS and integrations"),
        (name = "Dashboard", description = "Back-office figures"),
        (name = "Shop", description = "Public storefront"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_back_office_and_shop_paths() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/auth/login",
            "/api/main/orders/{id}",
            "/api/main/coupons",
            "/api/main/baladias/import",
            "/api/shop",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
