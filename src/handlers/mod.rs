pub mod auth;
pub mod checkin;
pub mod ticket;

pub use auth::auth_config;
pub use checkin::checkin_config;
pub use ticket::ticket_config;

use crate::error::AppError;
use actix_web::{HttpResponse, ResponseError, error, web};

/// Registers every route. Services are expected as `web::Data` on the app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        let response = AppError::ValidationError(err.to_string()).error_response();
        error::InternalError::from_response(err, response).into()
    }))
    // a non-numeric id can never name a ticket
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        let response = AppError::NotFound("Ticket not found".to_string()).error_response();
        error::InternalError::from_response(err, response).into()
    }))
    .route(
        "/",
        web::get().to(|| async {
            HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    )
    .configure(checkin_config)
    .service(
        web::scope("/api")
            .configure(auth_config)
            .configure(ticket_config),
    );
}
