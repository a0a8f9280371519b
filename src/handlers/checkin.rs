use crate::config::EventConfig;
use crate::entities::ticket_entity;
use crate::models::*;
use crate::services::{CheckInDecision, LifecycleService, TicketService, decide_check_in};
use crate::utils::escape_html;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError, Result, web};

/// Public: possession of the ticket's QR code is the authorization.
#[utoipa::path(
    post,
    path = "/tickets/{id}/checkin",
    tag = "checkin",
    params(("id" = i64, Path, description = "Ticket ID")),
    responses(
        (status = 200, description = "Ticket checked in", body = CheckInResponse),
        (status = 404, description = "Ticket not found", body = ApiErrorResponse),
        (status = 409, description = "Already checked in, or ticket not confirmed", body = ApiErrorResponse)
    )
)]
pub async fn check_in(
    lifecycle_service: web::Data<LifecycleService>,
    path: web::Path<i64>,
) -> Result<HttpResponse> {
    match lifecycle_service.check_in(path.into_inner()).await {
        Ok(receipt) => Ok(HttpResponse::Ok().json(CheckInResponse {
            success: true,
            time: receipt.time,
        })),
        Err(e) => Ok(e.error_response()),
    }
}

/// Landing page for a scanned QR code. Never changes the ticket.
pub async fn checkin_page(
    ticket_service: web::Data<TicketService>,
    event: web::Data<EventConfig>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    // a malformed id is just another unknown ticket here
    let ticket = match path.into_inner().parse::<i64>() {
        Ok(id) => match ticket_service.find_ticket(id).await {
            Ok(ticket) => ticket,
            Err(e) => return Ok(e.error_response()),
        },
        Err(_) => None,
    };

    match ticket {
        Some(ticket) => Ok(HttpResponse::Ok()
            .content_type(ContentType::html())
            .body(render_ticket_page(&ticket, &event))),
        None => Ok(HttpResponse::NotFound()
            .content_type(ContentType::html())
            .body(render_page(
                "Ticket Not Found",
                "<h1>Ticket Not Found</h1><p>This ticket does not exist or has been removed.</p>",
            ))),
    }
}

fn render_ticket_page(ticket: &ticket_entity::Model, event: &EventConfig) -> String {
    let (badge_class, badge) = if ticket.checked_in {
        ("checked-in", "CHECKED IN".to_string())
    } else {
        ("status", ticket.status.to_string().to_uppercase())
    };

    let action = match decide_check_in(ticket) {
        CheckInDecision::AlreadyCheckedIn(time) => {
            let when = time
                .map(|t| t.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "an unknown time".to_string());
            format!("<p class=\"done\">Checked in at {when}</p>")
        }
        CheckInDecision::NotConfirmed(status) => {
            format!("<p class=\"blocked\">Cannot check in: Ticket is {status}</p>")
        }
        CheckInDecision::Eligible => format!(
            r#"<button id="checkin" onclick="checkIn()">Check In Now</button>
<p id="result"></p>
<script>
async function checkIn() {{
  const res = await fetch('/api/tickets/{id}/checkin', {{ method: 'POST' }});
  const body = await res.json();
  document.getElementById('result').textContent = res.ok
    ? 'Checked in at ' + body.time
    : (body.error ? body.error.message : 'Check-in failed');
  if (res.ok) document.getElementById('checkin').disabled = true;
}}
</script>"#,
            id = ticket.id
        ),
    };

    let phone = ticket.phone.as_deref().unwrap_or("-");
    let body = format!(
        r#"<h1>{event_name}</h1>
<div class="card">
<span class="badge {badge_class}">{badge}</span>
<h2>{name}</h2>
<dl>
<dt>Ticket ID</dt><dd>{id}</dd>
<dt>Type</dt><dd>{ticket_type}</dd>
<dt>Price</dt><dd>{currency} {price}</dd>
<dt>Phone</dt><dd>{phone}</dd>
<dt>Date</dt><dd>{date}</dd>
</dl>
{action}
</div>"#,
        event_name = escape_html(&event.name),
        name = escape_html(&ticket.name),
        id = ticket.id,
        ticket_type = escape_html(&ticket.ticket_type.to_string()),
        currency = escape_html(&event.currency),
        price = ticket.price,
        phone = escape_html(phone),
        date = ticket.date.format("%Y-%m-%d"),
    );

    render_page(&format!("Ticket #{}", ticket.id), &body)
}

fn render_page(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
<style>
body {{ font-family: sans-serif; max-width: 480px; margin: 2rem auto; padding: 0 1rem; }}
.card {{ border: 1px solid #ddd; border-radius: 8px; padding: 1rem; }}
.badge {{ display: inline-block; padding: 0.2rem 0.6rem; border-radius: 4px; background: #eee; }}
.badge.checked-in {{ background: #2e7d32; color: #fff; }}
.blocked {{ color: #c62828; }}
button {{ font-size: 1.1rem; padding: 0.6rem 1.2rem; }}
</style>
</head>
<body>
{body}
</body>
</html>"#
    )
}

pub fn checkin_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/checkin/{id}", web::get().to(checkin_page));
}
