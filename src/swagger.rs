use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::entities::{TicketStatus, TicketType};
use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login,
        handlers::auth::check,
        handlers::ticket::list_tickets,
        handlers::ticket::create_ticket,
        handlers::ticket::get_stats,
        handlers::ticket::delete_ticket,
        handlers::ticket::confirm_ticket,
        handlers::ticket::get_qr_code,
        handlers::checkin::check_in,
    ),
    components(
        schemas(
            LoginRequest,
            LoginResponse,
            AuthCheckResponse,
            TicketType,
            TicketStatus,
            TicketResponse,
            CreateTicketRequest,
            QrCodeResponse,
            CheckInResponse,
            TicketStats,
            ChangesResponse,
            ApiErrorResponse,
            ApiError,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Admin authentication API"),
        (name = "tickets", description = "Ticket management API"),
        (name = "checkin", description = "Public check-in API"),
    ),
    info(
        title = "Ticketdesk API",
        version = "1.0.0",
        description = "Single-event ticketing admin REST API"
    ),
    servers(
        (url = "/api", description = "Local server")
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}
