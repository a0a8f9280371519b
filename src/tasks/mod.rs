//! Background tasks for the application.
//!
//! Call `spawn_all` once during startup. Every task is detached with `tokio::spawn`
//! and none of them blocks the HTTP server from starting.

use crate::services::{EventReceiver, NotificationService, TicketService};
use std::time::Duration;

const QR_BACKFILL_INTERVAL: Duration = Duration::from_secs(5 * 60);

pub fn spawn_all(
    notification_service: NotificationService,
    events: EventReceiver,
    ticket_service: TicketService,
) {
    // confirmation SMS dispatcher, lives as long as any EventSender does
    tokio::spawn(notification_service.run(events));

    // QR codes that failed inline generation are retried here
    tokio::spawn(async move {
        loop {
            match ticket_service.backfill_missing_qr_codes().await {
                Ok(n) if n > 0 => log::info!("QR codes backfilled: {n}"),
                Ok(_) => {}
                Err(e) => log::error!("Failed to backfill QR codes: {e:?}"),
            }
            tokio::time::sleep(QR_BACKFILL_INTERVAL).await;
        }
    });
}
