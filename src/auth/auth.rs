use crate::api::error::ApiError;
use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::model::role::Role;
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};

/// Session context of the caller, built from a verified bearer token and
/// handed to each handler explicitly.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,
}

#[derive(Debug, PartialEq, Eq)]
pub enum AuthRejection {
    MissingHeader,
    MalformedHeader,
    InvalidToken(String),
    InvalidRole,
    ConfigMissing,
}

impl AuthRejection {
    pub fn message(&self) -> String {
        match self {
            AuthRejection::MissingHeader => "Missing Authorization header".to_string(),
            AuthRejection::MalformedHeader => {
                "Authorization header must start with Bearer".to_string()
            }
            AuthRejection::InvalidToken(e) => format!("Invalid or expired token: {e}"),
            AuthRejection::InvalidRole => "Invalid role".to_string(),
            AuthRejection::ConfigMissing => "App config missing".to_string(),
        }
    }
}

impl AuthUser {
    /// Verifies the `Authorization: Bearer` header of a request.
    pub fn from_bearer(req: &HttpRequest) -> Result<Self, AuthRejection> {
        let config = req
            .app_data::<Data<Config>>()
            .ok_or(AuthRejection::ConfigMissing)?;

        let header = req
            .headers()
            .get("Authorization")
            .ok_or(AuthRejection::MissingHeader)?
            .to_str()
            .map_err(|_| AuthRejection::MalformedHeader)?;

        let token = header
            .strip_prefix("Bearer ")
            .ok_or(AuthRejection::MalformedHeader)?;

        let claims = verify_token(token, &config.jwt_secret)
            .map_err(|e| AuthRejection::InvalidToken(e.to_string()))?;

        let role = Role::from_id(claims.role).ok_or(AuthRejection::InvalidRole)?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
        })
    }

    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden("Admin only".to_string()))
        }
    }
}

impl FromRequest for AuthUser {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // set by auth_middleware on protected scopes
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        ready(
            AuthUser::from_bearer(req)
                .map_err(|rejection| ApiError::Unauthorized(rejection.message())),
        )
    }
}
