use crate::error::AppError;
use crate::middlewares::get_current_admin;
use crate::models::*;
use crate::services::AuthService;
use actix_web::{HttpRequest, HttpResponse, ResponseError, Result, web};

#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid username or password", body = ApiErrorResponse)
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    request: web::Json<LoginRequest>,
) -> Result<HttpResponse> {
    match auth_service.login(request.into_inner()).await {
        Ok(response) => Ok(HttpResponse::Ok().json(response)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/auth/check",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Token is valid", body = AuthCheckResponse),
        (status = 401, description = "No token provided", body = ApiErrorResponse),
        (status = 403, description = "Invalid or expired token", body = ApiErrorResponse)
    )
)]
pub async fn check(req: HttpRequest) -> Result<HttpResponse> {
    match get_current_admin(&req) {
        Some(admin) => Ok(HttpResponse::Ok().json(AuthCheckResponse {
            authenticated: true,
            username: admin.username,
        })),
        None => Ok(AppError::AuthError("Not authenticated".to_string()).error_response()),
    }
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/login", web::post().to(login))
            .route("/check", web::get().to(check)),
    );
}
