//! Borrow request model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::equipment::Equipment;
use super::user::UserShort;

/// Lifecycle status of a borrow request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequestStatus {
    Pending,
    Approved,
    Declined,
    PartiallyReturned,
    Returned,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "PENDING",
            RequestStatus::Approved => "APPROVED",
            RequestStatus::Declined => "DECLINED",
            RequestStatus::PartiallyReturned => "PARTIALLY_RETURNED",
            RequestStatus::Returned => "RETURNED",
        }
    }

    /// Units of an outstanding request are counted as on loan
    pub fn is_outstanding(&self) -> bool {
        matches!(self, RequestStatus::Approved | RequestStatus::PartiallyReturned)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestStatus::Declined | RequestStatus::Returned)
    }

    /// Statuses holding outstanding loans
    pub const OUTSTANDING: [RequestStatus; 2] =
        [RequestStatus::Approved, RequestStatus::PartiallyReturned];
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Ok(RequestStatus::Pending),
            "APPROVED" => Ok(RequestStatus::Approved),
            "DECLINED" => Ok(RequestStatus::Declined),
            "PARTIALLY_RETURNED" => Ok(RequestStatus::PartiallyReturned),
            "RETURNED" => Ok(RequestStatus::Returned),
            other => Err(format!("Unknown request status: {}", other)),
        }
    }
}

impl sqlx::Type<Postgres> for RequestStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for RequestStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for RequestStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Borrow request row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BorrowRequest {
    pub id: Uuid,
    /// Owner (identity-provider subject)
    pub user_id: String,
    pub equipment_id: Uuid,
    /// Equipment name at creation time
    pub equipment_type: String,
    pub quantity: i32,
    pub returned_quantity: i32,
    pub status: RequestStatus,
    pub purpose: String,
    pub campus: String,
    pub pickup_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BorrowRequest {
    pub fn remaining_quantity(&self) -> i32 {
        self.quantity - self.returned_quantity
    }

    /// Units this request currently holds against its equipment
    pub fn on_loan(&self) -> i32 {
        if self.status.is_outstanding() {
            self.remaining_quantity()
        } else {
            0
        }
    }
}

/// Payload for submitting a new request
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_dates"))]
pub struct CreateBorrowRequest {
    /// Equipment name (case-insensitive)
    #[validate(length(min = 1, max = 100))]
    pub equipment_type: String,
    #[validate(range(min = 1))]
    pub quantity: i32,
    #[validate(length(min = 1, max = 1000))]
    pub purpose: String,
    #[validate(length(min = 1, max = 100))]
    pub campus: String,
    pub pickup_date: DateTime<Utc>,
    pub return_date: DateTime<Utc>,
}

fn validate_dates(data: &CreateBorrowRequest) -> Result<(), ValidationError> {
    if data.return_date < data.pickup_date {
        return Err(ValidationError::new("return_date_before_pickup_date"));
    }
    Ok(())
}

/// Query parameters for listing requests
#[derive(Debug, Deserialize, IntoParams)]
pub struct RequestQuery {
    /// Filter by status (case-insensitive)
    pub status: Option<String>,
}

/// One line of a return batch
#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnItem {
    #[serde(alias = "id")]
    pub request_id: Uuid,
    #[serde(alias = "returned")]
    pub returned_now: i32,
}

/// Request with owner contact, for admin listings
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestSummary {
    #[serde(flatten)]
    pub request: BorrowRequest,
    pub user: Option<UserShort>,
}

/// Request with derived fields and related rows
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RequestDetails {
    #[serde(flatten)]
    pub request: BorrowRequest,
    pub remaining_quantity: i32,
    pub equipment: Option<Equipment>,
    pub user: Option<UserShort>,
}

/// Effect a return would have, without committing it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReturnPreview {
    pub request_id: Uuid,
    pub returned_now: i32,
    pub returned_quantity: i32,
    pub remaining_quantity: i32,
    pub status: RequestStatus,
}
