use crate::config::AdminConfig;
use crate::entities::admin_user_entity as admins;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    jwt_service: JwtService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, jwt_service: JwtService) -> Self {
        Self { pool, jwt_service }
    }

    /// Creates the configured admin account if it does not exist yet.
    /// Returns `true` when a new account was created.
    pub async fn ensure_default_admin(&self, admin: &AdminConfig) -> AppResult<bool> {
        if self.find_admin(&admin.username).await?.is_some() {
            return Ok(false);
        }

        admins::ActiveModel {
            username: Set(admin.username.clone()),
            password_hash: Set(hash_password(&admin.password)?),
            created_at: Set(Some(Utc::now())),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Default admin user '{}' created", admin.username);
        Ok(true)
    }

    /// Unknown user and wrong password are indistinguishable to the caller.
    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let admin = self
            .find_admin(request.username.trim())
            .await?
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(&request.password, &admin.password_hash)? {
            log::warn!("Failed login for '{}'", admin.username);
            return Err(AppError::InvalidCredentials);
        }

        let token = self
            .jwt_service
            .generate_access_token(admin.id, &admin.username)?;

        log::info!("Admin '{}' logged in", admin.username);
        Ok(LoginResponse {
            message: "Login successful".to_string(),
            token,
            username: admin.username,
        })
    }

    async fn find_admin(&self, username: &str) -> AppResult<Option<admins::Model>> {
        Ok(admins::Entity::find()
            .filter(admins::Column::Username.eq(username))
            .one(&self.pool)
            .await?)
    }
}
