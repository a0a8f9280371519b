use crate::entities::{TicketType, ticket_entity};
use crate::external::TwilioService;
use chrono::NaiveDate;
use tokio::sync::mpsc;

/// Side effects requested by ticket transitions, consumed off the request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TicketEvent {
    Confirmed {
        ticket_id: i64,
        name: String,
        phone: Option<String>,
        ticket_type: TicketType,
        date: NaiveDate,
    },
}

impl TicketEvent {
    pub fn confirmed(ticket: &ticket_entity::Model) -> Self {
        TicketEvent::Confirmed {
            ticket_id: ticket.id,
            name: ticket.name.clone(),
            phone: ticket.phone.clone(),
            ticket_type: ticket.ticket_type,
            date: ticket.date,
        }
    }
}

pub type EventSender = mpsc::UnboundedSender<TicketEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<TicketEvent>;

pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// Best-effort SMS dispatcher. Never reports failure back to the caller.
#[derive(Clone)]
pub struct NotificationService {
    twilio_service: TwilioService,
    event_name: String,
}

impl NotificationService {
    pub fn new(twilio_service: TwilioService, event_name: &str) -> Self {
        Self {
            twilio_service,
            event_name: event_name.to_string(),
        }
    }

    pub fn confirmation_message(
        &self,
        ticket_id: i64,
        name: &str,
        ticket_type: TicketType,
        date: NaiveDate,
    ) -> String {
        format!(
            "Hello {name}! Your {ticket_type} ticket for the {} has been confirmed. Ticket ID: {ticket_id}. See you on {}!",
            self.event_name,
            date.format("%Y-%m-%d")
        )
    }

    /// Returns whether an SMS actually went out.
    pub async fn handle(&self, event: TicketEvent) -> bool {
        match event {
            TicketEvent::Confirmed {
                ticket_id,
                name,
                phone,
                ticket_type,
                date,
            } => {
                let Some(phone) = phone else {
                    log::debug!("Ticket {ticket_id} has no phone, skipping confirmation SMS");
                    return false;
                };
                let message = self.confirmation_message(ticket_id, &name, ticket_type, date);

                if !self.twilio_service.is_enabled() {
                    log::info!("SMS not configured. Would have sent: {message} to {phone}");
                    return false;
                }

                match self.twilio_service.send_sms(&phone, &message).await {
                    Ok(_) => true,
                    Err(e) => {
                        log::warn!("Confirmation SMS for ticket {ticket_id} not delivered: {e}");
                        false
                    }
                }
            }
        }
    }

    /// Drains the event channel until every sender is dropped.
    pub async fn run(self, mut events: EventReceiver) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        log::info!("Notification dispatcher stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TwilioConfig;
    use wiremock::matchers::{body_string_contains, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn confirmed(phone: Option<&str>) -> TicketEvent {
        TicketEvent::Confirmed {
            ticket_id: 12,
            name: "Ama Boateng".to_string(),
            phone: phone.map(str::to_string),
            ticket_type: TicketType::Vip,
            date: NaiveDate::from_ymd_opt(2025, 1, 20).unwrap(),
        }
    }

    async fn twilio_for(server: &MockServer) -> TwilioService {
        TwilioService::new(TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            from_phone: "+15005550006".to_string(),
            api_base: server.uri(),
        })
    }

    #[test]
    fn test_confirmation_message() {
        let svc = NotificationService::new(TwilioService::new(TwilioConfig::default()), "Dinner Event");
        assert_eq!(
            svc.confirmation_message(
                12,
                "Ama Boateng",
                TicketType::Vip,
                NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
            ),
            "Hello Ama Boateng! Your VIP ticket for the Dinner Event has been confirmed. Ticket ID: 12. See you on 2025-01-20!"
        );
    }

    #[tokio::test]
    async fn test_handle_skips_without_phone_or_gateway() {
        let disabled =
            NotificationService::new(TwilioService::new(TwilioConfig::default()), "Dinner Event");
        assert!(!disabled.handle(confirmed(None)).await);
        assert!(!disabled.handle(confirmed(Some("+233 24 123 4567"))).await);
    }

    #[tokio::test]
    async fn test_handle_sends_sms() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_string_contains("Ama+Boateng"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(serde_json::json!({"sid": "SM1"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let svc = NotificationService::new(twilio_for(&server).await, "Dinner Event");
        assert!(svc.handle(confirmed(Some("+233 24 123 4567"))).await);
    }

    #[tokio::test]
    async fn test_gateway_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let svc = NotificationService::new(twilio_for(&server).await, "Dinner Event");
        assert!(!svc.handle(confirmed(Some("+233 24 123 4567"))).await);
    }

    #[tokio::test]
    async fn test_run_drains_until_senders_drop() {
        let svc =
            NotificationService::new(TwilioService::new(TwilioConfig::default()), "Dinner Event");
        let (tx, rx) = event_channel();
        tx.send(confirmed(None)).unwrap();
        tx.send(confirmed(Some("+233 24 123 4567"))).unwrap();
        drop(tx);

        // returns once the channel is closed and empty
        svc.run(rx).await;
    }
}
