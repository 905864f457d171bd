use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{types::Json, FromRow, PgPool};
use uuid::Uuid;

use super::{ClientStore, UserStore};
use crate::error::AppError;
use crate::models::{
    AssignedUser, Client, ClientView, ImageRef, Page, PageRequest, Role, Sort, User,
};

const USER_COLUMNS: &str =
    "id, email, name, password_hash, avatar, role, created_at, updated_at";

const CLIENT_COLUMNS: &str = "id, organization_name, organization_image, contact_name, \
     contact_image, contact_email, contact_phone_number, website, status, assigned, \
     created_at, updated_at";

const CLIENT_VIEW_SELECT: &str = "SELECT c.id, c.organization_name, c.organization_image, \
     c.contact_name, c.contact_image, c.contact_email, c.contact_phone_number, c.website, \
     c.status, c.assigned, c.created_at, c.updated_at, \
     u.name AS assigned_name, u.email AS assigned_email, u.avatar AS assigned_avatar \
     FROM clients c LEFT JOIN users u ON u.id = c.assigned";

/// PostgreSQL-backed implementation of both store traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    name: String,
    password_hash: String,
    avatar: Option<Json<ImageRef>>,
    role: Role,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            password_hash: row.password_hash,
            avatar: row.avatar.map(|Json(image)| image),
            role: row.role,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct ClientRow {
    id: Uuid,
    organization_name: String,
    organization_image: Option<Json<ImageRef>>,
    contact_name: String,
    contact_image: Option<Json<ImageRef>>,
    contact_email: String,
    contact_phone_number: Option<String>,
    website: Option<String>,
    status: bool,
    assigned: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Self {
            id: row.id,
            organization_name: row.organization_name,
            organization_image: row.organization_image.map(|Json(image)| image),
            contact_name: row.contact_name,
            contact_image: row.contact_image.map(|Json(image)| image),
            contact_email: row.contact_email,
            contact_phone_number: row.contact_phone_number,
            website: row.website,
            status: row.status,
            assigned: row.assigned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// A client joined with the public columns of its assigned user.
#[derive(Debug, FromRow)]
struct ClientViewRow {
    id: Uuid,
    organization_name: String,
    organization_image: Option<Json<ImageRef>>,
    contact_name: String,
    contact_image: Option<Json<ImageRef>>,
    contact_email: String,
    contact_phone_number: Option<String>,
    website: Option<String>,
    status: bool,
    assigned: Option<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    assigned_name: Option<String>,
    assigned_email: Option<String>,
    assigned_avatar: Option<Json<ImageRef>>,
}

impl From<ClientViewRow> for ClientView {
    fn from(row: ClientViewRow) -> Self {
        let assigned = match (row.assigned, row.assigned_name, row.assigned_email) {
            (Some(id), Some(name), Some(email)) => Some(AssignedUser {
                id,
                name,
                email,
                avatar: row.assigned_avatar.map(|Json(image)| image),
            }),
            _ => None,
        };
        let client = Client {
            id: row.id,
            organization_name: row.organization_name,
            organization_image: row.organization_image.map(|Json(image)| image),
            contact_name: row.contact_name,
            contact_image: row.contact_image.map(|Json(image)| image),
            contact_email: row.contact_email,
            contact_phone_number: row.contact_phone_number,
            website: row.website,
            status: row.status,
            assigned: row.assigned,
            created_at: row.created_at,
            updated_at: row.updated_at,
        };
        ClientView::new(client, assigned)
    }
}

/// Maps a wire sort field of the user listing to its column.
fn user_sort_column(field: &str) -> Option<&'static str> {
    match field {
        "name" => Some("name"),
        "email" => Some("email"),
        "createdAt" => Some("created_at"),
        "updatedAt" => Some("updated_at"),
        _ => None,
    }
}

/// Maps a wire sort field of the client listing to its (aliased) column.
fn client_sort_column(field: &str) -> Option<&'static str> {
    match field {
        "organizationName" => Some("c.organization_name"),
        "contactName" => Some("c.contact_name"),
        "contactEmail" => Some("c.contact_email"),
        "status" => Some("c.status"),
        "createdAt" => Some("c.created_at"),
        "updatedAt" => Some("c.updated_at"),
        _ => None,
    }
}

/// Builds an ORDER BY clause from a whitelisted column; newest first otherwise.
fn order_by(sort: Option<&Sort>, column_for: fn(&str) -> Option<&'static str>, default: &str) -> String {
    match sort.and_then(|s| column_for(&s.field).map(|column| (column, s.direction))) {
        Some((column, direction)) => format!("ORDER BY {} {}", column, direction.as_sql()),
        None => format!("ORDER BY {} DESC", default),
    }
}

fn limit_offset(page: &PageRequest) -> (i64, i64) {
    (
        i64::from(page.size),
        i64::try_from(page.offset()).unwrap_or(i64::MAX),
    )
}

#[async_trait]
impl UserStore for PgStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            USER_COLUMNS
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.avatar.clone().map(Json))
        .bind(user.role)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE users SET email = $1, name = $2, password_hash = $3, avatar = $4, \
             role = $5, updated_at = $6 WHERE id = $7",
        )
        .bind(&user.email)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.avatar.clone().map(Json))
        .bind(user.role)
        .bind(user.updated_at)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        Ok(())
    }

    // clients.assigned is ON DELETE SET NULL, so the unassignment happens in the same statement.
    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let row = sqlx::query_as::<_, UserRow>(&format!(
            "DELETE FROM users WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(User::from))
    }

    async fn list_users(&self, role: Role, page: &PageRequest) -> Result<Page<User>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1")
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, UserRow>(&format!(
            "SELECT {} FROM users WHERE role = $1 {} LIMIT $2 OFFSET $3",
            USER_COLUMNS,
            order_by(page.sort.as_ref(), user_sort_column, "created_at")
        ))
        .bind(role)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let users = rows.into_iter().map(User::from).collect();
        Ok(Page::new(users, page, total.max(0) as u64))
    }
}

#[async_trait]
impl ClientStore for PgStore {
    async fn insert_client(&self, client: &Client) -> Result<(), AppError> {
        sqlx::query(&format!(
            "INSERT INTO clients ({}) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
            CLIENT_COLUMNS
        ))
        .bind(client.id)
        .bind(&client.organization_name)
        .bind(client.organization_image.clone().map(Json))
        .bind(&client.contact_name)
        .bind(client.contact_image.clone().map(Json))
        .bind(&client.contact_email)
        .bind(&client.contact_phone_number)
        .bind(&client.website)
        .bind(client.status)
        .bind(client.assigned)
        .bind(client.created_at)
        .bind(client.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "SELECT {} FROM clients WHERE id = $1",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Client::from))
    }

    async fn find_client_view(&self, id: Uuid) -> Result<Option<ClientView>, AppError> {
        let row = sqlx::query_as::<_, ClientViewRow>(&format!(
            "{} WHERE c.id = $1",
            CLIENT_VIEW_SELECT
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ClientView::from))
    }

    async fn update_client(&self, client: &Client) -> Result<(), AppError> {
        let result = sqlx::query(
            "UPDATE clients SET organization_name = $1, organization_image = $2, \
             contact_name = $3, contact_image = $4, contact_email = $5, \
             contact_phone_number = $6, website = $7, status = $8, assigned = $9, \
             updated_at = $10 WHERE id = $11",
        )
        .bind(&client.organization_name)
        .bind(client.organization_image.clone().map(Json))
        .bind(&client.contact_name)
        .bind(client.contact_image.clone().map(Json))
        .bind(&client.contact_email)
        .bind(&client.contact_phone_number)
        .bind(&client.website)
        .bind(client.status)
        .bind(client.assigned)
        .bind(client.updated_at)
        .bind(client.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Client not found".into()));
        }
        Ok(())
    }

    async fn delete_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        let row = sqlx::query_as::<_, ClientRow>(&format!(
            "DELETE FROM clients WHERE id = $1 RETURNING {}",
            CLIENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Client::from))
    }

    async fn list_clients(&self, page: &PageRequest) -> Result<Page<ClientView>, AppError> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM clients")
            .fetch_one(&self.pool)
            .await?;

        let (limit, offset) = limit_offset(page);
        let rows = sqlx::query_as::<_, ClientViewRow>(&format!(
            "{} {} LIMIT $1 OFFSET $2",
            CLIENT_VIEW_SELECT,
            order_by(page.sort.as_ref(), client_sort_column, "c.created_at")
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let clients = rows.into_iter().map(ClientView::from).collect();
        Ok(Page::new(clients, page, total.max(0) as u64))
    }
}
