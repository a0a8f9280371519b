use actix_cors::Cors;

/// Restricts to `allowed_origin` when configured, otherwise accepts any origin.
pub fn create_cors(allowed_origin: Option<&str>) -> Cors {
    let cors = match allowed_origin {
        Some(origin) => Cors::default().allowed_origin(origin),
        None => Cors::default().allowed_origin_fn(|_, _req_head| true),
    };

    cors.allowed_methods(vec!["GET", "POST", "PATCH", "DELETE", "OPTIONS"])
        .allow_any_header()
        .supports_credentials()
        .max_age(3600)
}
