use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GeneralSettings {
    pub store_name: String,
    pub store_email: String,
    pub currency: String,
    pub timezone: String,
    pub email_notifications: bool,
    pub order_notifications: bool,
    pub low_stock_alerts: bool,
    pub maintenance_mode: bool,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            store_name: "Planted".into(),
            store_email: "contact@planted.com".into(),
            currency: "DZD".into(),
            timezone: "Africa/Algiers".into(),
            email_notifications: true,
            order_notifications: true,
            low_stock_alerts: true,
            maintenance_mode: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct HeroContent {
    pub title: String,
    pub subtitle: String,
    pub button_text: String,
    pub button_color: String,
    pub hero_image: String,
}

impl Default for HeroContent {
    fn default() -> Self {
        Self {
            title: "Fresh finds for every occasion".into(),
            subtitle: "Explore our latest arrivals, curated to bring you style, functionality, \
                       and inspiration. Shop now and discover your next favorite."
                .into(),
            button_text: "Shop Now".into(),
            button_color: "#ffffff".into(),
            hero_image: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GoogleSheetsIntegration {
    pub enabled: bool,
    pub api_key: String,
    pub sheet_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct GoogleAnalyticsIntegration {
    pub enabled: bool,
    pub tracking_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct FacebookPixelIntegration {
    pub enabled: bool,
    pub pixel_id: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(default)]
pub struct Integrations {
    pub google_sheets: GoogleSheetsIntegration,
    pub google_analytics: GoogleAnalyticsIntegration,
    pub facebook_pixel: FacebookPixelIntegration,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SettingsBundle {
    pub general: GeneralSettings,
    pub cms: HeroContent,
    pub integrations: Integrations,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StorefrontContent {
    pub store_name: String,
    pub hero: HeroContent,
}
