use crate::config::{Config, EventConfig};
use crate::database::DbPool;
use crate::handlers;
use crate::services::{AuthService, EventSender, LifecycleService, QrGenerator, TicketService};
use crate::utils::JwtService;
use actix_web::web;

/// Everything the request handlers share. Built once in `main` and cloned per worker.
#[derive(Clone)]
pub struct AppState {
    pub jwt_service: JwtService,
    pub auth_service: AuthService,
    pub lifecycle_service: LifecycleService,
    pub ticket_service: TicketService,
    pub event: EventConfig,
}

impl AppState {
    pub fn new(config: &Config, pool: DbPool, events: EventSender) -> Self {
        let jwt_service = JwtService::new(&config.jwt.secret, config.jwt.access_token_expires_in);
        let lifecycle_service = LifecycleService::new(pool.clone(), events);
        let qr = QrGenerator::new(&config.server.public_base_url());
        let ticket_service = TicketService::new(pool.clone(), lifecycle_service.clone(), qr);
        let auth_service = AuthService::new(pool, jwt_service.clone());

        Self {
            jwt_service,
            auth_service,
            lifecycle_service,
            ticket_service,
            event: config.event.clone(),
        }
    }

    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::Data::new(self.auth_service.clone()))
            .app_data(web::Data::new(self.lifecycle_service.clone()))
            .app_data(web::Data::new(self.ticket_service.clone()))
            .app_data(web::Data::new(self.event.clone()))
            .configure(handlers::configure);
    }
}
