use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use crate::error::AppError;
use crate::models::User;

/// Extracts the authenticated user from request extensions.
///
/// `AuthMiddleware` loads the user named by the token and inserts it; routes outside
/// the middleware get `AppError::Unauthorized`.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl FromRequest for AuthenticatedUser {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<User>().cloned() {
            Some(user) => ready(Ok(AuthenticatedUser(user))),
            None => {
                let err = AppError::Unauthorized("Not authenticated".to_string());
                ready(Err(err.into()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use actix_web::dev::Payload;
    use actix_web::http::StatusCode;
    use actix_web::test;

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_success() {
        let user = User::new("jane@example.com", "Jane".into(), "hash".into(), Role::Admin);
        let req = test::TestRequest::default().to_http_request();
        req.extensions_mut().insert(user.clone());

        let mut payload = Payload::None;
        let extracted = AuthenticatedUser::from_request(&req, &mut payload).await;
        assert_eq!(extracted.unwrap().0.id, user.id);
    }

    #[actix_rt::test]
    async fn test_authenticated_user_extractor_failure() {
        let req = test::TestRequest::default().to_http_request();

        let mut payload = Payload::None;
        let err = AuthenticatedUser::from_request(&req, &mut payload)
            .await
            .unwrap_err();
        assert_eq!(err.error_response().status(), StatusCode::UNAUTHORIZED);
    }
}
