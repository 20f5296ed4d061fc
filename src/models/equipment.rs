//! Equipment model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};

/// Equipment record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Equipment {
    pub id: Uuid,
    /// Upper-case, unique
    pub name: String,
    /// Units owned
    pub total_quantity: i32,
    /// Units not currently on loan
    pub available_quantity: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Equipment {
    pub fn on_loan(&self) -> i32 {
        self.total_quantity - self.available_quantity
    }

    /// Share of the stock currently on loan, 0..=100
    pub fn utilization_percent(&self) -> f64 {
        if self.total_quantity <= 0 {
            return 0.0;
        }
        let ratio = f64::from(self.on_loan()) / f64::from(self.total_quantity) * 100.0;
        (ratio * 10.0).round() / 10.0
    }
}

/// Trim and upper-case an equipment name
pub fn normalize_name(name: &str) -> AppResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(AppError::Validation("Equipment name must not be empty".to_string()));
    }
    Ok(trimmed.to_uppercase())
}

/// Create equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateEquipment {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(range(min = 0))]
    pub total_quantity: i32,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Update equipment request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEquipment {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    /// New physical count; must cover units currently on loan
    #[validate(range(min = 0))]
    pub total_quantity: Option<i32>,
    #[validate(url)]
    pub image_url: Option<String>,
}

/// Inventory line with utilization stats
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InventoryEntry {
    #[serde(flatten)]
    pub equipment: Equipment,
    pub on_loan: i32,
    pub utilization_percent: f64,
}

impl From<Equipment> for InventoryEntry {
    fn from(equipment: Equipment) -> Self {
        Self {
            on_loan: equipment.on_loan(),
            utilization_percent: equipment.utilization_percent(),
            equipment,
        }
    }
}
