use actix_web::{App, HttpServer, middleware::Logger};
use chrono::Local; // timestamp in log lines
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter

use ticketdesk_backend::{
    AppState,
    config::Config,
    database::{create_pool, run_migrations},
    external::TwilioService,
    middlewares::{AuthMiddleware, create_cors},
    services::{NotificationService, event_channel},
    swagger::swagger_config,
    tasks,
};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // Load configuration
    let config = Config::from_toml().expect("Failed to load configuration file");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    // Side effects of ticket transitions flow through this channel
    let (events, event_rx) = event_channel();
    let state = AppState::new(&config, pool, events);

    state
        .auth_service
        .ensure_default_admin(&config.admin)
        .await
        .expect("Failed to create default admin user");

    if config.database.seed_demo_data
        && let Err(e) = state.ticket_service.seed_demo_data().await
    {
        log::error!("Failed to seed demo data: {e:?}");
    }

    let twilio_service = TwilioService::new(config.twilio.clone());
    if !twilio_service.is_enabled() {
        log::warn!("Twilio credentials missing, confirmation SMS will only be logged");
    }
    let notification_service = NotificationService::new(twilio_service, &config.event.name);
    tasks::spawn_all(
        notification_service,
        event_rx,
        state.ticket_service.clone(),
    );

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let allowed_origin = config.server.allowed_origin.clone();
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(create_cors(allowed_origin.as_deref()))
            .wrap(AuthMiddleware::new(state.jwt_service.clone()))
            .configure(swagger_config)
            .configure(|cfg| state.configure(cfg))
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
