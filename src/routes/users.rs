use actix_web::{delete, get, post, put, web, Responder};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::{hash_password, AuthenticatedUser},
    error::AppError,
    images::{reconcile, ImageTarget},
    models::{
        user::normalize_email, CreateUserRequest, PageQuery, PageRequest, Role,
        UpdateUserRequest, User,
    },
    response::ApiResponse,
    state::AppState,
};

/// Image store folder for avatars.
pub const AVATAR_FOLDER: &str = "users";

async fn load_user(state: &AppState, id: Uuid) -> Result<User, AppError> {
    state
        .users
        .find_user(id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}

async fn ensure_email_free(state: &AppState, email: &str, owner: Option<Uuid>) -> Result<(), AppError> {
    match state.users.find_user_by_email(email).await? {
        Some(existing) if Some(existing.id) != owner => {
            Err(AppError::BadRequest("Email already registered".into()))
        }
        _ => Ok(()),
    }
}

/// Lists accounts with the `user` role, one page at a time.
///
/// ## Query Parameters:
/// - `page` (optional, default 1)
/// - `size` (optional, default 10, at most 100)
/// - `sort` (optional): `name`, `email`, `createdAt` or `updatedAt`, with `:asc` or `:desc`.
#[get("")]
pub async fn find_users(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let request = PageRequest::from(query.into_inner());
    let page = state.users.list_users(Role::User, &request).await?;
    Ok(ApiResponse::paginated(page))
}

#[get("/{id}")]
pub async fn find_user(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user = load_user(&state, path.into_inner()).await?;
    Ok(ApiResponse::new(user))
}

/// Creates a user, uploading the avatar first when one is supplied.
///
/// The record is written once, after the avatar upload has succeeded.
#[post("")]
pub async fn create_user(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateUserRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let CreateUserRequest {
        email,
        name,
        password,
        avatar,
    } = payload.into_inner();

    let email = normalize_email(&email);
    ensure_email_free(&state, &email, None).await?;

    let password_hash = hash_password(&password, state.auth.bcrypt_cost)?;
    let mut user = User::new(&email, name, password_hash, Role::User);

    let target = ImageTarget::new(user.id, user.display_name(), AVATAR_FOLDER);
    reconcile::apply(state.images.as_ref(), None, avatar, &target)
        .await?
        .apply_to(&mut user.avatar);

    state.users.insert_user(&user).await?;
    log::info!("user {} created by {}", user.id, caller.0.id);

    let created = load_user(&state, user.id).await?;
    Ok(ApiResponse::new(created))
}

/// Partially updates a user.
///
/// `avatar` follows the image convention: missing or `null` keeps it, `""` removes it,
/// anything else replaces it. The stored file is named after the name held before
/// this update.
#[put("/{id}")]
pub async fn update_user(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateUserRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let mut user = load_user(&state, path.into_inner()).await?;
    let UpdateUserRequest {
        email,
        name,
        password,
        avatar,
    } = payload.into_inner();

    let email = email.map(|email| normalize_email(&email));
    if let Some(email) = &email {
        ensure_email_free(&state, email, Some(user.id)).await?;
    }

    let target = ImageTarget::new(user.id, user.display_name(), AVATAR_FOLDER);
    let change = reconcile::apply(state.images.as_ref(), user.avatar.as_ref(), avatar, &target).await?;
    change.apply_to(&mut user.avatar);

    if let Some(email) = email {
        user.email = email;
    }
    if let Some(name) = name {
        user.name = name;
    }
    if let Some(password) = password {
        user.password_hash = hash_password(&password, state.auth.bcrypt_cost)?;
    }
    user.updated_at = Utc::now();

    state.users.update_user(&user).await?;
    log::info!("user {} updated by {}", user.id, caller.0.id);

    let updated = load_user(&state, user.id).await?;
    Ok(ApiResponse::new(updated))
}

/// Deletes a user and its avatar. Clients assigned to the user become unassigned.
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let user = load_user(&state, path.into_inner()).await?;

    reconcile::discard(state.images.as_ref(), user.avatar.as_ref()).await?;

    let deleted = state
        .users
        .delete_user(user.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    log::info!("user {} deleted by {}", deleted.id, caller.0.id);

    Ok(ApiResponse::new(deleted))
}
