use crate::config::EventConfig;
use crate::entities::{TicketStatus, TicketType, ticket_entity};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TicketResponse {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    pub price: i64,
    pub status: TicketStatus,
    pub date: NaiveDate,
    /// `data:image/png;base64,...`; may be null right after creation
    pub qr_code: Option<String>,
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
}

impl From<ticket_entity::Model> for TicketResponse {
    fn from(m: ticket_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            phone: m.phone,
            ticket_type: m.ticket_type,
            price: m.price,
            status: m.status,
            date: m.date,
            qr_code: m.qr_code,
            checked_in: m.checked_in,
            check_in_time: m.check_in_time,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateTicketRequest {
    #[schema(example = "Ama Boateng")]
    pub name: String,
    #[schema(example = "+233 24 123 4567")]
    pub phone: Option<String>,
    #[serde(rename = "type")]
    pub ticket_type: TicketType,
    /// Defaults to `pending`
    pub status: Option<TicketStatus>,
    /// Accepted for client compatibility but ignored; the server price table wins
    pub price: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct QrCodeResponse {
    pub qr_code: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckInResponse {
    pub success: bool,
    pub time: DateTime<Utc>,
}

/// Outcome of a successful check-in transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckInReceipt {
    pub ticket_id: i64,
    pub time: DateTime<Utc>,
}

/// Dashboard figures for the single event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct TicketStats {
    pub capacity: i64,
    /// Tickets that are not cancelled
    pub sold: i64,
    pub available: i64,
    pub capacity_percent: i64,
    pub revenue: i64,
    pub average_price: i64,
    pub confirmed: i64,
    pub confirmed_percent: i64,
    pub checked_in: i64,
    pub currency: String,
}

fn percent(part: i64, whole: i64) -> i64 {
    if whole <= 0 {
        return 0;
    }
    (part as f64 * 100.0 / whole as f64).round() as i64
}

impl TicketStats {
    pub fn compute(tickets: &[ticket_entity::Model], event: &EventConfig) -> Self {
        let active = tickets
            .iter()
            .filter(|t| t.status != TicketStatus::Cancelled);

        let sold = active.clone().count() as i64;
        let revenue: i64 = active.map(|t| t.price).sum();
        let confirmed = tickets
            .iter()
            .filter(|t| t.status == TicketStatus::Confirmed)
            .count() as i64;
        let checked_in = tickets.iter().filter(|t| t.checked_in).count() as i64;

        let average_price = if sold > 0 {
            (revenue as f64 / sold as f64).round() as i64
        } else {
            0
        };

        Self {
            capacity: event.capacity,
            sold,
            available: event.capacity - sold,
            capacity_percent: percent(sold, event.capacity),
            revenue,
            average_price,
            confirmed,
            confirmed_percent: percent(confirmed, sold),
            checked_in,
            currency: event.currency.clone(),
        }
    }
}
