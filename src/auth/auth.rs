use crate::auth::jwt::verify_token;
use crate::error::AppError;
use crate::model::role::Role;
use actix_web::http::header::{AUTHORIZATION, HeaderMap};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: u64,
    pub username: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

/// Handlers only run behind `auth_middleware`, which stores the caller in
/// the request extensions.
impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Authentication required".into())),
        )
    }
}

impl AuthUser {
    /// Resolves the caller from an `Authorization: Bearer <access token>` header.
    pub fn from_headers(headers: &HeaderMap, secret: &str) -> Result<Self, AppError> {
        let header = headers
            .get(AUTHORIZATION)
            .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|h| h.strip_prefix("Bearer "))
            .ok_or_else(|| {
                AppError::Unauthorized("Authorization header must be a Bearer token".into())
            })?;

        let claims = verify_token(token, secret)
            .map_err(|e| AppError::Unauthorized(format!("Invalid or expired token: {e}")))?;

        let role = Role::from_id(claims.role)
            .ok_or_else(|| AppError::Unauthorized("Invalid role".into()))?;

        Ok(AuthUser {
            user_id: claims.user_id,
            username: claims.sub,
            role,
            employee_id: claims.employee_id,
        })
    }

    pub fn require_hr_or_admin(&self) -> Result<(), AppError> {
        if matches!(self.role, Role::Admin | Role::Hr) {
            Ok(())
        } else {
            Err(AppError::Forbidden("HR/Admin only".into()))
        }
    }

    /// Returns true if the user is an employee
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }

    /// EMPLOYEE callers may only act on their own employee record.
    pub fn require_self_or_privileged(&self, employee_id: u64, action: &str) -> Result<(), AppError> {
        if self.is_employee() && self.employee_id != Some(employee_id) {
            return Err(AppError::Forbidden(format!("You can only {action} your own records")));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::issue_test_token;
    use crate::models::TokenType;
    use actix_web::http::header::HeaderValue;
    use actix_web::test::TestRequest;

    const SECRET: &str = "auth-secret";

    fn headers(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn user(role: Role, employee_id: Option<u64>) -> AuthUser {
        AuthUser {
            user_id: 1,
            username: "u".into(),
            role,
            employee_id,
        }
    }

    #[test]
    fn employees_are_limited_to_their_own_records() {
        let emp = user(Role::Employee, Some(7));
        assert!(emp.require_self_or_privileged(7, "view").is_ok());
        assert!(matches!(
            emp.require_self_or_privileged(8, "view"),
            Err(AppError::Forbidden(_))
        ));

        let unlinked = user(Role::Employee, None);
        assert!(unlinked.require_self_or_privileged(7, "view").is_err());

        assert!(user(Role::Hr, None).require_self_or_privileged(8, "view").is_ok());
        assert!(user(Role::Admin, None).require_self_or_privileged(8, "view").is_ok());
    }

    #[test]
    fn hr_and_admin_pass_privileged_check() {
        assert!(user(Role::Admin, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Hr, None).require_hr_or_admin().is_ok());
        assert!(user(Role::Employee, Some(1)).require_hr_or_admin().is_err());
    }

    #[test]
    fn bearer_access_token_resolves_the_caller() {
        let token = issue_test_token(Role::Employee, Some(7), TokenType::Access, SECRET);
        let user = AuthUser::from_headers(&headers(&format!("Bearer {token}")), SECRET).unwrap();
        assert_eq!(user.role, Role::Employee);
        assert_eq!(user.employee_id, Some(7));
        assert_eq!(user.username, "tester");
    }

    #[test]
    fn bad_credentials_are_unauthorized() {
        assert!(matches!(
            AuthUser::from_headers(&HeaderMap::new(), SECRET),
            Err(AppError::Unauthorized(_))
        ));

        let token = issue_test_token(Role::Admin, None, TokenType::Access, SECRET);
        assert!(matches!(
            AuthUser::from_headers(&headers(&format!("Token {token}")), SECRET),
            Err(AppError::Unauthorized(_))
        ));
        assert!(matches!(
            AuthUser::from_headers(&headers(&format!("Bearer {token}")), "other-secret"),
            Err(AppError::Unauthorized(_))
        ));

        let refresh = issue_test_token(Role::Admin, None, TokenType::Refresh, SECRET);
        assert!(matches!(
            AuthUser::from_headers(&headers(&format!("Bearer {refresh}")), SECRET),
            Err(AppError::Unauthorized(_))
        ));
    }

    #[actix_web::test]
    async fn extractor_requires_an_authenticated_request() {
        let req = TestRequest::default().to_http_request();
        assert!(matches!(
            AuthUser::extract(&req).await,
            Err(AppError::Unauthorized(_))
        ));

        req.extensions_mut().insert(user(Role::Hr, None));
        let extracted = AuthUser::extract(&req).await.unwrap();
        assert_eq!(extracted.role, Role::Hr);
    }
}
