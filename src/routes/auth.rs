use actix_web::{post, web, Responder};

use crate::{
    auth::{generate_token, verify_password, LoginRequest, LoginResponse},
    error::AppError,
    models::user::normalize_email,
    response::ApiResponse,
    state::AppState,
};

const INVALID_LOGIN: &str = "Invalid Login. Please try again.";

/// Login user
///
/// Checks the credentials and returns a bearer token in the envelope body.
/// Every credential mismatch is a 401, even a badly formed email or a short password.
#[post("/login")]
pub async fn login(
    state: web::Data<AppState>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    let user = state
        .users
        .find_user_by_email(&normalize_email(&login_data.email))
        .await?
        .ok_or_else(|| AppError::Unauthorized(INVALID_LOGIN.into()))?;

    if !verify_password(&login_data.password, &user.password_hash)? {
        return Err(AppError::Unauthorized(INVALID_LOGIN.into()));
    }

    let token = generate_token(&user, &state.auth)?;
    log::info!("user {} logged in", user.id);
    Ok(ApiResponse::new(LoginResponse { token }))
}
