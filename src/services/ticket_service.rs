use crate::config::EventConfig;
use crate::entities::{TicketStatus, TicketType, ticket_entity as tickets};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::{LifecycleService, QrGenerator};
use crate::utils::validate_optional_phone;
use chrono::{NaiveDate, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, Set,
};

const MAX_NAME_LEN: usize = 100;

/// Ticket store plus the admin-facing operations on it.
#[derive(Clone)]
pub struct TicketService {
    pool: DatabaseConnection,
    lifecycle: LifecycleService,
    qr: QrGenerator,
}

impl TicketService {
    pub fn new(pool: DatabaseConnection, lifecycle: LifecycleService, qr: QrGenerator) -> Self {
        Self {
            pool,
            lifecycle,
            qr,
        }
    }

    /// Newest first.
    pub async fn list_tickets(&self) -> AppResult<Vec<TicketResponse>> {
        let list = tickets::Entity::find()
            .order_by_desc(tickets::Column::Id)
            .all(&self.pool)
            .await?;
        Ok(list.into_iter().map(Into::into).collect())
    }

    pub async fn find_ticket(&self, ticket_id: i64) -> AppResult<Option<tickets::Model>> {
        Ok(tickets::Entity::find_by_id(ticket_id).one(&self.pool).await?)
    }

    pub async fn get_ticket(&self, ticket_id: i64) -> AppResult<TicketResponse> {
        self.find_ticket(ticket_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))
    }

    /// Creates a ticket.
    ///
    /// 1. validate name and phone
    /// 2. price from the fixed table, never from the request
    /// 3. insert with a NULL QR code, then attach the QR code for `/checkin/<id>`
    /// 4. a ticket created as confirmed triggers the confirmation notification
    pub async fn create_ticket(&self, req: CreateTicketRequest) -> AppResult<TicketResponse> {
        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::ValidationError(format!(
                "Name must be at most {MAX_NAME_LEN} characters"
            )));
        }
        let phone = validate_optional_phone(req.phone.as_deref())?;

        let price = req.ticket_type.price();
        if let Some(requested) = req.price
            && requested != price
        {
            log::warn!(
                "Ignoring client price {requested} for {} ticket, using {price}",
                req.ticket_type
            );
        }

        let status = self.lifecycle.initial_status(req.status);
        let model = self
            .insert_ticket(name, phone, req.ticket_type, status, Utc::now().date_naive())
            .await?;
        let model = self.attach_qr_code(model).await;

        log::info!(
            "Ticket {} created: {} ({}, {})",
            model.id,
            model.name,
            model.ticket_type,
            model.status
        );

        if model.status == TicketStatus::Confirmed {
            self.lifecycle.notify_confirmed(&model);
        }

        Ok(model.into())
    }

    /// Hard delete. Returns the number of rows removed (0 for an unknown id).
    pub async fn delete_ticket(&self, ticket_id: i64) -> AppResult<u64> {
        let result = tickets::Entity::delete_by_id(ticket_id)
            .exec(&self.pool)
            .await?;
        if result.rows_affected > 0 {
            log::info!("Ticket {ticket_id} deleted");
        }
        Ok(result.rows_affected)
    }

    pub async fn get_qr_code(&self, ticket_id: i64) -> AppResult<String> {
        self.find_ticket(ticket_id)
            .await?
            .and_then(|t| t.qr_code)
            .ok_or_else(|| AppError::NotFound("QR code not found".to_string()))
    }

    pub async fn stats(&self, event: &EventConfig) -> AppResult<TicketStats> {
        let list = tickets::Entity::find().all(&self.pool).await?;
        Ok(TicketStats::compute(&list, event))
    }

    /// Fills in QR codes that are still NULL (failed or interrupted creation).
    pub async fn backfill_missing_qr_codes(&self) -> AppResult<usize> {
        let missing = tickets::Entity::find()
            .filter(tickets::Column::QrCode.is_null())
            .all(&self.pool)
            .await?;

        let mut filled = 0;
        for ticket in missing {
            if self.attach_qr_code(ticket).await.qr_code.is_some() {
                filled += 1;
            }
        }
        Ok(filled)
    }

    /// Inserts the demo attendees when the table is empty. Returns how many were added.
    pub async fn seed_demo_data(&self) -> AppResult<usize> {
        if tickets::Entity::find().count(&self.pool).await? > 0 {
            return Ok(0);
        }

        let demo = [
            ("Sarah Johnson", "+233 24 123 4567", TicketType::Vip, TicketStatus::Confirmed, 15),
            ("Michael Chen", "+233 24 234 5678", TicketType::Standard, TicketStatus::Confirmed, 16),
            ("Emma Davis", "+233 24 345 6789", TicketType::EarlyBird, TicketStatus::Pending, 10),
            ("James Wilson", "+233 24 456 7890", TicketType::Vip, TicketStatus::Confirmed, 17),
            ("Lisa Anderson", "+233 24 567 8901", TicketType::Standard, TicketStatus::Cancelled, 12),
            ("Robert Taylor", "+233 24 678 9012", TicketType::Standard, TicketStatus::Confirmed, 18),
            ("Jennifer Martin", "+233 24 789 0123", TicketType::EarlyBird, TicketStatus::Confirmed, 9),
            ("David White", "+233 24 890 1234", TicketType::Vip, TicketStatus::Pending, 19),
        ];

        for (name, phone, ticket_type, status, day) in demo {
            let date = NaiveDate::from_ymd_opt(2025, 1, day)
                .ok_or_else(|| AppError::InternalError(format!("invalid demo day {day}")))?;
            let model = self
                .insert_ticket(name, Some(phone.to_string()), ticket_type, status, date)
                .await?;
            self.attach_qr_code(model).await;
        }

        log::info!("Database seeded with {} demo tickets", demo.len());
        Ok(demo.len())
    }

    async fn insert_ticket(
        &self,
        name: &str,
        phone: Option<String>,
        ticket_type: TicketType,
        status: TicketStatus,
        date: NaiveDate,
    ) -> AppResult<tickets::Model> {
        let model = tickets::ActiveModel {
            name: Set(name.to_string()),
            phone: Set(phone),
            ticket_type: Set(ticket_type),
            price: Set(ticket_type.price()),
            status: Set(status),
            date: Set(date),
            qr_code: Set(None),
            checked_in: Set(false),
            check_in_time: Set(None),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;
        Ok(model)
    }

    /// Generates and stores the QR code for a ticket that has none yet.
    /// Any failure leaves `qr_code` NULL for the backfill task to retry.
    async fn attach_qr_code(&self, ticket: tickets::Model) -> tickets::Model {
        if ticket.qr_code.is_some() {
            return ticket;
        }
        let url = self.qr.checkin_url(ticket.id);
        let Some(qr_code) = self.qr.generate(&url) else {
            return ticket;
        };

        match self.store_qr_code(ticket.id, &qr_code).await {
            Ok(true) => tickets::Model {
                qr_code: Some(qr_code),
                ..ticket
            },
            Ok(false) => ticket,
            Err(e) => {
                log::error!("Failed to store QR code for ticket {}: {e}", ticket.id);
                ticket
            }
        }
    }

    /// Write-once: only succeeds while the stored value is still NULL.
    async fn store_qr_code(&self, ticket_id: i64, qr_code: &str) -> AppResult<bool> {
        let result = tickets::Entity::update_many()
            .col_expr(
                tickets::Column::QrCode,
                sea_orm::sea_query::Expr::value(qr_code.to_string()),
            )
            .filter(tickets::Column::Id.eq(ticket_id))
            .filter(tickets::Column::QrCode.is_null())
            .exec(&self.pool)
            .await?;
        Ok(result.rows_affected == 1)
    }
}
