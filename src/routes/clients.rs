use actix_web::{delete, get, post, put, web, Responder};
use futures::future::join;
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    images::{reconcile, ImageTarget},
    models::{
        AssignmentInput, Client, ClientImages, ClientView, CreateClientRequest, PageQuery,
        PageRequest, UpdateClientRequest,
    },
    response::ApiResponse,
    state::AppState,
};

/// Image store folder for organization and contact images.
pub const CLIENT_FOLDER: &str = "client";

async fn load_client(state: &AppState, id: Uuid) -> Result<Client, AppError> {
    state
        .clients
        .find_client(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".into()))
}

async fn load_client_view(state: &AppState, id: Uuid) -> Result<ClientView, AppError> {
    state
        .clients
        .find_client_view(id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".into()))
}

async fn ensure_assignee_exists(state: &AppState, assigned: &AssignmentInput) -> Result<(), AppError> {
    if let Some(user_id) = assigned.user_id() {
        if state.users.find_user(user_id).await?.is_none() {
            return Err(AppError::BadRequest(format!(
                "Assigned user {} does not exist",
                user_id
            )));
        }
    }
    Ok(())
}

/// Surfaces the first error of two branches that have both run to completion.
fn both<A, B, E>(results: (Result<A, E>, Result<B, E>)) -> Result<(A, B), E> {
    let (first, second) = results;
    Ok((first?, second?))
}

/// Reconciles both image attributes of `client` concurrently and merges the outcomes.
///
/// Files are named after the names `client` holds when this is called. Both branches
/// always run to completion; nothing is merged unless both succeed.
async fn reconcile_images(
    state: &AppState,
    client: &mut Client,
    images: ClientImages,
) -> Result<(), AppError> {
    let store = state.images.as_ref();
    let organization_target = ImageTarget::new(client.id, &client.organization_name, CLIENT_FOLDER);
    let contact_target = ImageTarget::new(client.id, &client.contact_name, CLIENT_FOLDER);

    let (organization, contact) = both(
        join(
            reconcile::apply(
                store,
                client.organization_image.as_ref(),
                images.organization,
                &organization_target,
            ),
            reconcile::apply(
                store,
                client.contact_image.as_ref(),
                images.contact,
                &contact_target,
            ),
        )
        .await,
    )?;

    organization.apply_to(&mut client.organization_image);
    contact.apply_to(&mut client.contact_image);
    Ok(())
}

/// Lists clients with their assigned user populated, one page at a time.
///
/// ## Query Parameters:
/// - `page` (optional, default 1)
/// - `size` (optional, default 10, at most 100)
/// - `sort` (optional): e.g. `organizationName:asc`, `createdAt:desc`.
#[get("")]
pub async fn find_clients(
    state: web::Data<AppState>,
    query: web::Query<PageQuery>,
) -> Result<impl Responder, AppError> {
    let request = PageRequest::from(query.into_inner());
    let page = state.clients.list_clients(&request).await?;
    Ok(ApiResponse::paginated(page))
}

#[get("/{id}")]
pub async fn find_client(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let client = load_client_view(&state, path.into_inner()).await?;
    Ok(ApiResponse::new(client))
}

/// Creates a client.
///
/// Supplied images are uploaded first (concurrently); the client is inserted once
/// both uploads have succeeded and returned with its assigned user populated.
#[post("")]
pub async fn create_client(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    payload: web::Json<CreateClientRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let payload = payload.into_inner();
    ensure_assignee_exists(&state, &payload.assigned).await?;

    let (mut client, images) = payload.into_parts();
    reconcile_images(&state, &mut client, images).await?;

    state.clients.insert_client(&client).await?;
    log::info!("client {} created by {}", client.id, caller.0.id);

    let created = load_client_view(&state, client.id).await?;
    Ok(ApiResponse::new(created))
}

/// Partially updates a client.
///
/// Image fields follow the image convention (missing or `null` keeps, `""` removes,
/// anything else replaces). `assigned` set to `null` or `"null"` unassigns.
#[put("/{id}")]
pub async fn update_client(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
    payload: web::Json<UpdateClientRequest>,
) -> Result<impl Responder, AppError> {
    payload.validate()?;
    let mut client = load_client(&state, path.into_inner()).await?;

    let (changes, images) = payload.into_inner().into_parts();
    ensure_assignee_exists(&state, &changes.assigned).await?;

    reconcile_images(&state, &mut client, images).await?;
    changes.apply_to(&mut client);

    state.clients.update_client(&client).await?;
    log::info!("client {} updated by {}", client.id, caller.0.id);

    let updated = load_client_view(&state, client.id).await?;
    Ok(ApiResponse::new(updated))
}

/// Deletes a client and both of its images.
#[delete("/{id}")]
pub async fn delete_client(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    path: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    let client = load_client(&state, path.into_inner()).await?;

    let store = state.images.as_ref();
    both(
        join(
            reconcile::discard(store, client.organization_image.as_ref()),
            reconcile::discard(store, client.contact_image.as_ref()),
        )
        .await,
    )?;

    let deleted = state
        .clients
        .delete_client(client.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Client not found".into()))?;
    log::info!("client {} deleted by {}", deleted.id, caller.0.id);

    Ok(ApiResponse::new(deleted))
}
