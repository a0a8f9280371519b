use actix_web::http::StatusCode;
use actix_web::{App, test};
use serde_json::{Value, json};
use ticketdesk_backend::{
    AppState,
    config::Config,
    database::create_in_memory_pool,
    middlewares::AuthMiddleware,
    services::{EventReceiver, event_channel},
};

async fn setup() -> (AppState, EventReceiver) {
    let config = Config::default();
    let pool = create_in_memory_pool().await.unwrap();
    let (events, rx) = event_channel();
    let state = AppState::new(&config, pool, events);
    state
        .auth_service
        .ensure_default_admin(&config.admin)
        .await
        .unwrap();
    (state, rx)
}

fn bearer(state: &AppState) -> (&'static str, String) {
    let token = state
        .jwt_service
        .generate_access_token(1, "admin")
        .unwrap();
    ("Authorization", format!("Bearer {token}"))
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .wrap(AuthMiddleware::new($state.jwt_service.clone()))
                .configure(|cfg| $state.configure(cfg)),
        )
        .await
    };
}

#[actix_web::test]
async fn test_ticket_lifecycle_end_to_end() {
    let (state, mut rx) = setup().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "admin", "password": "admin123"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["username"], "admin");
    let auth = ("Authorization", format!("Bearer {}", body["token"].as_str().unwrap()));

    let req = test::TestRequest::post()
        .uri("/api/tickets")
        .insert_header(auth.clone())
        .set_json(json!({
            "name": "Ama Boateng",
            "phone": "+233 24 123 4567",
            "type": "VIP",
            "price": 1
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["message"], "success");
    let ticket = &body["data"];
    assert_eq!(ticket["status"], "pending");
    assert_eq!(ticket["price"], 250);
    assert_eq!(ticket["checked_in"], false);
    let id = ticket["id"].as_i64().unwrap();

    // pending tickets cannot be checked in
    let req = test::TestRequest::post()
        .uri(&format!("/api/tickets/{id}/checkin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    let req = test::TestRequest::patch()
        .uri(&format!("/api/tickets/{id}/confirm"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body, json!({"message": "success", "changes": 1}));
    assert!(rx.try_recv().is_ok(), "confirmation event queued");

    // no token needed for the scan
    let req = test::TestRequest::post()
        .uri(&format!("/api/tickets/{id}/checkin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    let first_time = body["time"].clone();
    assert!(first_time.is_string());

    let req = test::TestRequest::post()
        .uri(&format!("/api/tickets/{id}/checkin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "ALREADY_CHECKED_IN");
    assert_eq!(body["time"], first_time);

    let req = test::TestRequest::get()
        .uri("/api/tickets/stats")
        .insert_header(auth)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"]["sold"], 1);
    assert_eq!(body["data"]["confirmed"], 1);
    assert_eq!(body["data"]["checked_in"], 1);
    assert_eq!(body["data"]["revenue"], 250);
}

#[actix_web::test]
async fn test_cancelled_ticket_is_terminal() {
    let (state, _rx) = setup().await;
    let app = test_app!(state);
    let auth = bearer(&state);

    let req = test::TestRequest::post()
        .uri("/api/tickets")
        .insert_header(auth.clone())
        .set_json(json!({"name": "Kwame Mensah", "type": "Standard", "status": "cancelled"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/tickets/{id}/checkin"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["code"], "INVALID_TRANSITION");

    let req = test::TestRequest::patch()
        .uri(&format!("/api/tickets/{id}/confirm"))
        .insert_header(auth)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}

#[actix_web::test]
async fn test_admin_routes_require_token() {
    let (state, _rx) = setup().await;
    let app = test_app!(state);

    let req = test::TestRequest::get().uri("/api/tickets").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/api/tickets")
        .insert_header(("Authorization", "Bearer not-a-jwt"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::post()
        .uri("/api/auth/login")
        .set_json(json!({"username": "admin", "password": "wrong"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = test::TestRequest::get()
        .uri("/api/auth/check")
        .insert_header(bearer(&state))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"authenticated": true, "username": "admin"}));
}

#[actix_web::test]
async fn test_invalid_input_is_rejected() {
    let (state, _rx) = setup().await;
    let app = test_app!(state);
    let auth = bearer(&state);

    for payload in [
        json!({"name": "   ", "type": "VIP"}),
        json!({"name": "Esi", "type": "VIP", "phone": "0241234567"}),
        json!({"name": "Esi", "type": "Platinum"}),
    ] {
        let req = test::TestRequest::post()
            .uri("/api/tickets")
            .insert_header(auth.clone())
            .set_json(payload)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    let req = test::TestRequest::get()
        .uri("/api/tickets")
        .insert_header(auth)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_delete_removes_ticket_and_qr_code() {
    let (state, _rx) = setup().await;
    let app = test_app!(state);
    let auth = bearer(&state);

    let req = test::TestRequest::post()
        .uri("/api/tickets")
        .insert_header(auth.clone())
        .set_json(json!({"name": "Yaw Owusu", "type": "Early Bird"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/api/tickets/{id}/qrcode"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert!(
        body["qr_code"]
            .as_str()
            .unwrap()
            .starts_with("data:image/png;base64,")
    );

    let req = test::TestRequest::delete()
        .uri(&format!("/api/tickets/{id}"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body, json!({"message": "deleted", "changes": 1}));

    // deleting again is not an error
    let req = test::TestRequest::delete()
        .uri(&format!("/api/tickets/{id}"))
        .insert_header(auth.clone())
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["changes"], 0);

    let req = test::TestRequest::get()
        .uri(&format!("/api/tickets/{id}/qrcode"))
        .insert_header(auth.clone())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = test::TestRequest::get()
        .uri("/api/tickets")
        .insert_header(auth)
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["data"], json!([]));
}

#[actix_web::test]
async fn test_checkin_page_is_public_and_read_only() {
    let (state, _rx) = setup().await;
    let app = test_app!(state);

    let req = test::TestRequest::post()
        .uri("/api/tickets")
        .insert_header(bearer(&state))
        .set_json(json!({"name": "Abena <Asante>", "type": "VIP", "status": "confirmed"}))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    let id = body["data"]["id"].as_i64().unwrap();

    let req = test::TestRequest::get()
        .uri(&format!("/checkin/{id}"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let html = String::from_utf8(test::read_body(resp).await.to_vec()).unwrap();
    assert!(html.contains("Abena &lt;Asante&gt;"));
    assert!(html.contains("Check In Now"));

    let ticket = state.ticket_service.get_ticket(id).await.unwrap();
    assert!(!ticket.checked_in);

    let req = test::TestRequest::get().uri("/checkin/99999").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_malformed_ticket_id_is_not_found() {
    let (state, _rx) = setup().await;
    let app = test_app!(state);

    for req in [
        test::TestRequest::patch().uri("/api/tickets/abc/confirm"),
        test::TestRequest::post().uri("/api/tickets/abc/checkin"),
        test::TestRequest::delete().uri("/api/tickets/abc"),
    ] {
        let resp = test::call_service(&app, req.insert_header(bearer(&state)).to_request()).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }
}
