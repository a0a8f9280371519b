use crate::entities::{TicketStatus, ticket_entity as tickets};
use crate::error::{AppError, AppResult};
use crate::models::CheckInReceipt;
use crate::services::notification_service::{EventSender, TicketEvent};
use chrono::{DateTime, SubsecRound, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

/// What a check-in attempt would do to a ticket in its current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInDecision {
    Eligible,
    AlreadyCheckedIn(Option<DateTime<Utc>>),
    NotConfirmed(TicketStatus),
}

/// Already-checked-in takes precedence over status.
pub fn decide_check_in(ticket: &tickets::Model) -> CheckInDecision {
    if ticket.checked_in {
        return CheckInDecision::AlreadyCheckedIn(ticket.check_in_time);
    }
    if ticket.status != TicketStatus::Confirmed {
        return CheckInDecision::NotConfirmed(ticket.status);
    }
    CheckInDecision::Eligible
}

/// Ticket state machine over `status x checked_in`.
///
/// Every transition is a single conditional UPDATE, so concurrent callers on the
/// same row serialize in the store: exactly one of them matches the guard.
#[derive(Clone)]
pub struct LifecycleService {
    pool: DatabaseConnection,
    events: EventSender,
}

impl LifecycleService {
    pub fn new(pool: DatabaseConnection, events: EventSender) -> Self {
        Self { pool, events }
    }

    pub fn initial_status(&self, requested: Option<TicketStatus>) -> TicketStatus {
        requested.unwrap_or_default()
    }

    /// Queues the confirmation notification. Never fails the caller.
    pub fn notify_confirmed(&self, ticket: &tickets::Model) {
        if let Err(e) = self.events.send(TicketEvent::confirmed(ticket)) {
            log::warn!(
                "Notification dispatcher unavailable, dropping event for ticket {}: {e}",
                ticket.id
            );
        }
    }

    /// `pending|confirmed -> confirmed`. Returns the number of rows changed.
    pub async fn confirm(&self, ticket_id: i64) -> AppResult<u64> {
        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::Status, Expr::value(TicketStatus::Confirmed))
            .filter(tickets::Column::Id.eq(ticket_id))
            .filter(tickets::Column::Status.ne(TicketStatus::Cancelled))
            .exec(&self.pool)
            .await?;

        let current = tickets::Entity::find_by_id(ticket_id)
            .one(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            return match current {
                None => Err(AppError::NotFound("Ticket not found".to_string())),
                Some(ticket) if !ticket.status.can_confirm() => Err(
                    AppError::InvalidTransition(format!(
                        "Cannot confirm a {} ticket",
                        ticket.status
                    )),
                ),
                Some(_) => Err(AppError::InternalError(format!(
                    "Confirm guard for ticket {ticket_id} matched no rows"
                ))),
            };
        }

        match current {
            Some(ticket) => {
                log::info!("Ticket {ticket_id} confirmed");
                self.notify_confirmed(&ticket);
            }
            // deleted between the update and the read; nobody left to notify
            None => log::warn!("Ticket {ticket_id} vanished right after confirmation"),
        }

        Ok(result.rows_affected)
    }

    /// `confirmed, not checked in -> confirmed, checked in`, stamping the time once.
    pub async fn check_in(&self, ticket_id: i64) -> AppResult<CheckInReceipt> {
        // microsecond precision survives a PostgreSQL round trip unchanged
        let now = Utc::now().trunc_subsecs(6);

        let result = tickets::Entity::update_many()
            .col_expr(tickets::Column::CheckedIn, Expr::value(true))
            .col_expr(tickets::Column::CheckInTime, Expr::value(now))
            .filter(tickets::Column::Id.eq(ticket_id))
            .filter(tickets::Column::Status.eq(TicketStatus::Confirmed))
            .filter(tickets::Column::CheckedIn.eq(false))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 1 {
            log::info!("Ticket {ticket_id} checked in at {now}");
            return Ok(CheckInReceipt {
                ticket_id,
                time: now,
            });
        }

        let ticket = tickets::Entity::find_by_id(ticket_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Ticket not found".to_string()))?;

        match decide_check_in(&ticket) {
            CheckInDecision::AlreadyCheckedIn(time) => Err(AppError::AlreadyCheckedIn(time)),
            CheckInDecision::NotConfirmed(status) => Err(AppError::InvalidTransition(format!(
                "Cannot check in: ticket is {status}"
            ))),
            CheckInDecision::Eligible => Err(AppError::InternalError(format!(
                "Check-in guard for ticket {ticket_id} matched no rows"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::database::{create_in_memory_pool, create_pool, run_migrations};
    use crate::entities::TicketType;
    use crate::services::notification_service::{EventReceiver, event_channel};
    use chrono::NaiveDate;
    use sea_orm::{ActiveModelTrait, Set};

    async fn setup() -> (LifecycleService, DatabaseConnection, EventReceiver) {
        let pool = create_in_memory_pool().await.unwrap();
        let (tx, rx) = event_channel();
        (LifecycleService::new(pool.clone(), tx), pool, rx)
    }

    async fn insert(pool: &DatabaseConnection, status: TicketStatus) -> tickets::Model {
        tickets::ActiveModel {
            name: Set("Ama Boateng".to_string()),
            phone: Set(Some("+233 24 123 4567".to_string())),
            ticket_type: Set(TicketType::Vip),
            price: Set(TicketType::Vip.price()),
            status: Set(status),
            date: Set(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()),
            qr_code: Set(None),
            checked_in: Set(false),
            check_in_time: Set(None),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    async fn reload(pool: &DatabaseConnection, id: i64) -> tickets::Model {
        tickets::Entity::find_by_id(id)
            .one(pool)
            .await
            .unwrap()
            .unwrap()
    }

    fn sample(status: TicketStatus, checked_in: bool) -> tickets::Model {
        tickets::Model {
            id: 1,
            name: "Kofi".to_string(),
            phone: None,
            ticket_type: TicketType::Standard,
            price: 150,
            status,
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
            qr_code: None,
            checked_in,
            check_in_time: checked_in.then(Utc::now),
            created_at: None,
        }
    }

    #[test]
    fn test_decide_check_in() {
        assert_eq!(
            decide_check_in(&sample(TicketStatus::Confirmed, false)),
            CheckInDecision::Eligible
        );
        assert_eq!(
            decide_check_in(&sample(TicketStatus::Pending, false)),
            CheckInDecision::NotConfirmed(TicketStatus::Pending)
        );
        assert_eq!(
            decide_check_in(&sample(TicketStatus::Cancelled, false)),
            CheckInDecision::NotConfirmed(TicketStatus::Cancelled)
        );
        assert!(matches!(
            decide_check_in(&sample(TicketStatus::Confirmed, true)),
            CheckInDecision::AlreadyCheckedIn(Some(_))
        ));
    }

    #[test]
    fn test_initial_status_defaults_to_pending() {
        let (tx, _rx) = event_channel();
        let svc = LifecycleService::new(DatabaseConnection::Disconnected, tx);
        assert_eq!(svc.initial_status(None), TicketStatus::Pending);
        assert_eq!(
            svc.initial_status(Some(TicketStatus::Cancelled)),
            TicketStatus::Cancelled
        );
    }

    #[tokio::test]
    async fn test_confirm_pending_emits_event() {
        let (svc, pool, mut rx) = setup().await;
        let ticket = insert(&pool, TicketStatus::Pending).await;

        assert_eq!(svc.confirm(ticket.id).await.unwrap(), 1);
        assert_eq!(reload(&pool, ticket.id).await.status, TicketStatus::Confirmed);

        match rx.try_recv().unwrap() {
            TicketEvent::Confirmed { ticket_id, phone, .. } => {
                assert_eq!(ticket_id, ticket.id);
                assert_eq!(phone.as_deref(), Some("+233 24 123 4567"));
            }
        }
    }

    #[tokio::test]
    async fn test_reconfirm_is_idempotent_and_notifies_again() {
        let (svc, pool, mut rx) = setup().await;
        let ticket = insert(&pool, TicketStatus::Confirmed).await;

        svc.confirm(ticket.id).await.unwrap();
        svc.confirm(ticket.id).await.unwrap();

        assert_eq!(reload(&pool, ticket.id).await.status, TicketStatus::Confirmed);
        assert!(rx.try_recv().is_ok());
        assert!(rx.try_recv().is_ok());
    }

    #[tokio::test]
    async fn test_confirm_cancelled_is_rejected() {
        let (svc, pool, mut rx) = setup().await;
        let ticket = insert(&pool, TicketStatus::Cancelled).await;

        let err = svc.confirm(ticket.id).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition(_)));
        assert_eq!(reload(&pool, ticket.id).await.status, TicketStatus::Cancelled);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_confirm_unknown_ticket() {
        let (svc, _pool, _rx) = setup().await;
        assert!(matches!(
            svc.confirm(999).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_confirm_survives_closed_dispatcher() {
        let (svc, pool, rx) = setup().await;
        drop(rx);
        let ticket = insert(&pool, TicketStatus::Pending).await;

        assert_eq!(svc.confirm(ticket.id).await.unwrap(), 1);
        assert_eq!(reload(&pool, ticket.id).await.status, TicketStatus::Confirmed);
    }

    #[tokio::test]
    async fn test_check_in_stamps_once() {
        let (svc, pool, _rx) = setup().await;
        let ticket = insert(&pool, TicketStatus::Confirmed).await;

        let receipt = svc.check_in(ticket.id).await.unwrap();
        let stored = reload(&pool, ticket.id).await;
        assert!(stored.checked_in);
        assert_eq!(stored.check_in_time, Some(receipt.time));

        let err = svc.check_in(ticket.id).await.unwrap_err();
        match err {
            AppError::AlreadyCheckedIn(time) => assert_eq!(time, Some(receipt.time)),
            other => panic!("unexpected error: {other:?}"),
        }

        let again = reload(&pool, ticket.id).await;
        assert!(again.checked_in);
        assert_eq!(again.check_in_time, Some(receipt.time));
    }

    #[tokio::test]
    async fn test_check_in_requires_confirmed() {
        let (svc, pool, _rx) = setup().await;
        for status in [TicketStatus::Pending, TicketStatus::Cancelled] {
            let ticket = insert(&pool, status).await;
            let err = svc.check_in(ticket.id).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidTransition(_)));

            let stored = reload(&pool, ticket.id).await;
            assert!(!stored.checked_in);
            assert!(stored.check_in_time.is_none());
        }
    }

    #[tokio::test]
    async fn test_check_in_unknown_ticket() {
        let (svc, _pool, _rx) = setup().await;
        assert!(matches!(
            svc.check_in(404).await,
            Err(AppError::NotFound(_))
        ));
    }

    async fn race_check_ins(svc: &LifecycleService, pool: &DatabaseConnection) {
        let ticket = insert(pool, TicketStatus::Confirmed).await;

        let attempts = (0..8).map(|_| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.check_in(ticket.id).await })
        });
        let mut admitted = Vec::new();
        let mut repeats = 0;
        for handle in attempts {
            match handle.await.unwrap() {
                Ok(receipt) => admitted.push(receipt),
                Err(AppError::AlreadyCheckedIn(_)) => repeats += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(admitted.len(), 1);
        assert_eq!(repeats, 7);
        assert_eq!(
            reload(pool, ticket.id).await.check_in_time,
            Some(admitted[0].time)
        );
    }

    #[tokio::test]
    async fn test_concurrent_check_ins_admit_exactly_one() {
        // one connection: the UPDATEs queue at the pool, covering interleaving between awaits
        let (svc, pool, _rx) = setup().await;
        race_check_ins(&svc, &pool).await;
    }

    #[tokio::test]
    async fn test_concurrent_check_ins_across_connections() {
        // several connections to one file, so the UPDATEs reach SQLite at the same time
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}?mode=rwc", dir.path().join("tickets.db").display());
        let pool = create_pool(&DatabaseConfig {
            url,
            max_connections: 4,
            seed_demo_data: false,
        })
        .await
        .unwrap();
        run_migrations(&pool).await.unwrap();

        let (tx, _rx) = event_channel();
        let svc = LifecycleService::new(pool.clone(), tx);
        race_check_ins(&svc, &pool).await;
    }

    #[tokio::test]
    async fn test_confirm_after_check_in_keeps_stamp() {
        let (svc, pool, _rx) = setup().await;
        let ticket = insert(&pool, TicketStatus::Confirmed).await;
        let receipt = svc.check_in(ticket.id).await.unwrap();

        svc.confirm(ticket.id).await.unwrap();

        let stored = reload(&pool, ticket.id).await;
        assert!(stored.checked_in);
        assert_eq!(stored.check_in_time, Some(receipt.time));
        assert_eq!(stored.price, 250);
    }
}
