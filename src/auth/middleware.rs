use crate::auth::auth::{AuthRejection, AuthUser};
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
};
use serde_json::json;
use tracing::debug;

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let auth_user = match AuthUser::from_bearer(req.request()) {
        Ok(user) => user,
        Err(AuthRejection::ConfigMissing) => {
            return Err(actix_web::error::ErrorInternalServerError(
                "App config missing",
            ));
        }
        Err(rejection) => {
            debug!(path = %req.path(), reason = ?rejection, "Rejected unauthenticated request");
            let resp = HttpResponse::Unauthorized().json(json!({"error": rejection.message()}));
            return Ok(req.into_response(resp.map_into_boxed_body()));
        }
    };

    req.extensions_mut().insert(auth_user);

    next.call(req).await
}
