use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use tracing::{debug, warn};

/// Authenticates every request in the wrapped scope and stores the caller as
/// an [`AuthUser`] extension. Rejections use the crate's JSON error body.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let authenticated = match req.app_data::<Data<Config>>() {
        Some(config) => AuthUser::from_headers(req.headers(), &config.jwt_secret),
        None => Err(AppError::Persistence("app config missing".into())),
    };

    match authenticated {
        Ok(user) => {
            debug!(user_id = user.user_id, role = %user.role, path = %req.path(), "Authenticated request");
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(e) => {
            warn!(path = %req.path(), error = %e, "Rejected unauthenticated request");
            let resp = e.error_response();
            Ok(req.into_response(resp))
        }
    }
}
