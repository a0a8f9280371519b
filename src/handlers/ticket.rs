use crate::config::EventConfig;
use crate::models::*;
use crate::services::{LifecycleService, TicketService};
use actix_web::{HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    get,
    path = "/tickets",
    tag = "tickets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All tickets, newest first", body = [TicketResponse]),
        (status = 401, description = "No token provided"),
        (status = 403, description = "Invalid or expired token")
    )
)]
pub async fn list_tickets(ticket_service: web::Data<TicketService>) -> Result<HttpResponse> {
    match ticket_service.list_tickets().await {
        Ok(tickets) => Ok(HttpResponse::Ok().json(DataResponse::success(tickets))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/tickets",
    tag = "tickets",
    request_body = CreateTicketRequest,
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ticket created", body = TicketResponse),
        (status = 400, description = "Invalid ticket data", body = ApiErrorResponse)
    )
)]
pub async fn create_ticket(
    ticket_service: web::Data<TicketService>,
    request: web::Json<CreateTicketRequest>,
) -> Result<HttpResponse> {
    match ticket_service.create_ticket(request.into_inner()).await {
        Ok(ticket) => Ok(HttpResponse::Ok().json(DataResponse::success(ticket))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/tickets/stats",
    tag = "tickets",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Sales and attendance figures", body = TicketStats)
    )
)]
pub async fn get_stats(
    ticket_service: web::Data<TicketService>,
    event: web::Data<EventConfig>,
) -> Result<HttpResponse> {
    match ticket_service.stats(&event).await {
        Ok(stats) => Ok(HttpResponse::Ok().json(DataResponse::success(stats))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/tickets/{id}",
    tag = "tickets",
    params(("id" = i64, Path, description = "Ticket ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Rows deleted (0 if the ticket did not exist)", body = ChangesResponse)
    )
)]
pub async fn delete_ticket(
    ticket_service: web::Data<TicketService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match ticket_service.delete_ticket(path.into_inner()).await {
        Ok(changes) => Ok(HttpResponse::Ok().json(ChangesResponse::new("deleted", changes))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    patch,
    path = "/tickets/{id}/confirm",
    tag = "tickets",
    params(("id" = i64, Path, description = "Ticket ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Ticket confirmed, SMS queued", body = ChangesResponse),
        (status = 404, description = "Ticket not found", body = ApiErrorResponse),
        (status = 409, description = "Ticket is cancelled", body = ApiErrorResponse)
    )
)]
pub async fn confirm_ticket(
    lifecycle_service: web::Data<LifecycleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match lifecycle_service.confirm(path.into_inner()).await {
        Ok(changes) => Ok(HttpResponse::Ok().json(ChangesResponse::new("success", changes))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/tickets/{id}/qrcode",
    tag = "tickets",
    params(("id" = i64, Path, description = "Ticket ID")),
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "QR code as a PNG data URL", body = QrCodeResponse),
        (status = 404, description = "Ticket or QR code not found", body = ApiErrorResponse)
    )
)]
pub async fn get_qr_code(
    ticket_service: web::Data<TicketService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match ticket_service.get_qr_code(path.into_inner()).await {
        Ok(qr_code) => Ok(HttpResponse::Ok().json(QrCodeResponse { qr_code })),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn ticket_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/tickets")
            .route("", web::get().to(list_tickets))
            .route("", web::post().to(create_ticket))
            .route("/stats", web::get().to(get_stats))
            .route("/{id}", web::delete().to(delete_ticket))
            .route("/{id}/confirm", web::patch().to(confirm_ticket))
            .route("/{id}/qrcode", web::get().to(get_qr_code))
            .route("/{id}/checkin", web::post().to(super::checkin::check_in)),
    );
}
