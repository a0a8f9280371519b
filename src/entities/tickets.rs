use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
pub enum TicketType {
    #[sea_orm(string_value = "VIP")]
    #[serde(rename = "VIP")]
    Vip,
    #[sea_orm(string_value = "Standard")]
    #[serde(rename = "Standard")]
    Standard,
    #[sea_orm(string_value = "Early Bird")]
    #[serde(rename = "Early Bird")]
    EarlyBird,
}

impl TicketType {
    /// Fixed price table. A ticket's price is taken from here once, at creation.
    pub fn price(&self) -> i64 {
        match self {
            TicketType::Vip => 250,
            TicketType::Standard => 150,
            TicketType::EarlyBird => 120,
        }
    }
}

impl std::fmt::Display for TicketType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketType::Vip => write!(f, "VIP"),
            TicketType::Standard => write!(f, "Standard"),
            TicketType::EarlyBird => write!(f, "Early Bird"),
        }
    }
}

#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema, DeriveActiveEnum,
    EnumIter, Default,
)]
#[sea_orm(rs_type = "String", db_type = "String(Some(16))")]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "confirmed")]
    Confirmed,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl TicketStatus {
    /// `cancelled` is terminal; any other status may be (re)confirmed.
    pub fn can_confirm(&self) -> bool {
        !matches!(self, TicketStatus::Cancelled)
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::Pending => write!(f, "pending"),
            TicketStatus::Confirmed => write!(f, "confirmed"),
            TicketStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Ticket record.
///
/// - `price` is written once from `TicketType::price()` and never updated
/// - `checked_in` only moves false -> true, together with `check_in_time`
/// - `qr_code` is only ever written while it is still NULL
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "tickets")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub name: String,
    #[sea_orm(column_type = "Text", nullable)]
    pub phone: Option<String>,
    pub ticket_type: TicketType,
    pub price: i64,
    pub status: TicketStatus,
    pub date: NaiveDate,
    #[sea_orm(column_type = "Text", nullable)]
    pub qr_code: Option<String>,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_table() {
        assert_eq!(TicketType::Vip.price(), 250);
        assert_eq!(TicketType::Standard.price(), 150);
        assert_eq!(TicketType::EarlyBird.price(), 120);
    }

    #[test]
    fn test_wire_names() {
        assert_eq!(
            serde_json::to_string(&TicketType::EarlyBird).unwrap(),
            "\"Early Bird\""
        );
        assert_eq!(
            serde_json::from_str::<TicketType>("\"VIP\"").unwrap(),
            TicketType::Vip
        );
        assert_eq!(
            serde_json::from_str::<TicketStatus>("\"cancelled\"").unwrap(),
            TicketStatus::Cancelled
        );
        assert!(serde_json::from_str::<TicketType>("\"Platinum\"").is_err());
        assert!(serde_json::from_str::<TicketStatus>("\"refunded\"").is_err());
    }

    #[test]
    fn test_cancelled_cannot_be_confirmed() {
        assert!(TicketStatus::Pending.can_confirm());
        assert!(TicketStatus::Confirmed.can_confirm());
        assert!(!TicketStatus::Cancelled.can_confirm());
    }
}
