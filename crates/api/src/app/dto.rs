use chrono::{DateTime, Utc};
use serde::Deserialize;

use motorpool_vehicles::ItemDraft;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateShopRequest {
    pub name: String,
    pub details: Option<String>,
    #[serde(default)]
    pub admin_only_lists: bool,
}

#[derive(Debug, Deserialize)]
pub struct GenerateInviteRequest {
    pub max_uses: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
pub struct RedeemInviteRequest {
    pub code: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateVehicleRequest {
    pub niin: String,
    #[serde(default)]
    pub admin: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub serial: String,
    #[serde(default)]
    pub uoc: String,
    #[serde(default)]
    pub mileage: i32,
    #[serde(default)]
    pub hours: i32,
    #[serde(default)]
    pub comment: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateNotificationRequest {
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// One of "M1", "PM", "MW"; anything else is a validation error.
    #[serde(rename = "type")]
    pub notification_type: String,
}

#[derive(Debug, Deserialize)]
pub struct AddItemsRequest {
    pub items: Vec<ItemDraft>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveItemsRequest {
    pub item_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListDescriptionRequest {
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangesQuery {
    pub limit: Option<u32>,
}
