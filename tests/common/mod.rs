#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use clientdesk::auth::{generate_token, hash_password};
use clientdesk::config::AuthConfig;
use clientdesk::error::AppError;
use clientdesk::images::{DeleteOutcome, ImageStore, ImageStoreError};
use clientdesk::models::{
    AssignedUser, Client, ClientView, ImageRef, Page, PageRequest, Role, SortDirection, User,
};
use clientdesk::state::AppState;
use clientdesk::store::{ClientStore, UserStore};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "admin-password";

/// Builds the full application around `$state`, as `main` does.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data(actix_web::web::Data::new($state))
                .app_data(clientdesk::routes::json_config())
                .app_data(clientdesk::routes::path_config())
                .app_data(clientdesk::routes::query_config())
                .service(clientdesk::routes::health::health)
                .service(
                    actix_web::web::scope("/api")
                        .wrap(clientdesk::auth::AuthMiddleware)
                        .configure(clientdesk::routes::config),
                ),
        )
        .await
    };
}

/// Users and clients kept in memory, with a count of entity writes.
#[derive(Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<Uuid, User>>,
    clients: Mutex<HashMap<Uuid, Client>>,
    writes: AtomicUsize,
}

impl MemoryStore {
    /// Number of inserts and updates issued so far.
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn reset_writes(&self) {
        self.writes.store(0, Ordering::SeqCst);
    }

    pub fn client(&self, id: Uuid) -> Option<Client> {
        self.clients.lock().unwrap().get(&id).cloned()
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.lock().unwrap().get(&id).cloned()
    }

    /// Stores `client` directly, bypassing the write counter.
    pub fn put_client(&self, client: Client) {
        self.clients.lock().unwrap().insert(client.id, client);
    }

    pub fn put_user(&self, user: User) {
        self.users.lock().unwrap().insert(user.id, user);
    }

    fn view(&self, client: Client) -> ClientView {
        let assigned = client
            .assigned
            .and_then(|id| self.users.lock().unwrap().get(&id).map(AssignedUser::from));
        ClientView::new(client, assigned)
    }
}

fn paginate<T>(mut items: Vec<T>, page: &PageRequest) -> Page<T> {
    let total = items.len() as u64;
    let offset = page.offset() as usize;
    let items = if offset >= items.len() {
        Vec::new()
    } else {
        items
            .drain(offset..)
            .take(page.size as usize)
            .collect::<Vec<_>>()
    };
    Page::new(items, page, total)
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn insert_user(&self, user: &User) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut users = self.users.lock().unwrap();
        if users.values().any(|u| u.email == user.email) {
            return Err(AppError::BadRequest("duplicate email".into()));
        }
        users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(self.user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_user(&self, user: &User) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.users.lock().unwrap().get_mut(&user.id) {
            Some(stored) => {
                *stored = user.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("User not found".into())),
        }
    }

    async fn delete_user(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let removed = self.users.lock().unwrap().remove(&id);
        if removed.is_some() {
            for client in self.clients.lock().unwrap().values_mut() {
                if client.assigned == Some(id) {
                    client.assigned = None;
                }
            }
        }
        Ok(removed)
    }

    async fn list_users(&self, role: Role, page: &PageRequest) -> Result<Page<User>, AppError> {
        let mut users: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .values()
            .filter(|u| u.role == role)
            .cloned()
            .collect();
        match page.sort.as_ref().filter(|s| s.field == "name") {
            Some(sort) if sort.direction == SortDirection::Asc => {
                users.sort_by(|a, b| a.name.cmp(&b.name))
            }
            Some(_) => users.sort_by(|a, b| b.name.cmp(&a.name)),
            None => users.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
        }
        Ok(paginate(users, page))
    }
}

#[async_trait]
impl ClientStore for MemoryStore {
    async fn insert_client(&self, client: &Client) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        let mut clients = self.clients.lock().unwrap();
        if clients.values().any(|c| c.contact_name == client.contact_name) {
            return Err(AppError::BadRequest("duplicate contact name".into()));
        }
        clients.insert(client.id, client.clone());
        Ok(())
    }

    async fn find_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        Ok(self.client(id))
    }

    async fn find_client_view(&self, id: Uuid) -> Result<Option<ClientView>, AppError> {
        Ok(self.client(id).map(|client| self.view(client)))
    }

    async fn update_client(&self, client: &Client) -> Result<(), AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.clients.lock().unwrap().get_mut(&client.id) {
            Some(stored) => {
                *stored = client.clone();
                Ok(())
            }
            None => Err(AppError::NotFound("Client not found".into())),
        }
    }

    async fn delete_client(&self, id: Uuid) -> Result<Option<Client>, AppError> {
        Ok(self.clients.lock().unwrap().remove(&id))
    }

    async fn list_clients(&self, page: &PageRequest) -> Result<Page<ClientView>, AppError> {
        let mut clients: Vec<Client> = self.clients.lock().unwrap().values().cloned().collect();
        clients.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let views = clients.into_iter().map(|c| self.view(c)).collect();
        Ok(paginate(views, page))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageCall {
    Upload { file_name: String, folder: String },
    Delete(String),
}

/// Image store fake: records calls, hands out sequential ids and only deletes ids it holds.
#[derive(Default)]
pub struct FakeImageStore {
    existing: Mutex<HashSet<String>>,
    calls: Mutex<Vec<ImageCall>>,
    next_id: AtomicUsize,
    fail_uploads: AtomicBool,
    fail_uploads_named: Mutex<Option<String>>,
    delete_delay: Mutex<Option<Duration>>,
}

impl FakeImageStore {
    pub fn calls(&self) -> Vec<ImageCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
    }

    /// Registers `id` as a file currently held by the store.
    pub fn hold(&self, id: &str) {
        self.existing.lock().unwrap().insert(id.to_string());
    }

    pub fn holds(&self, id: &str) -> bool {
        self.existing.lock().unwrap().contains(id)
    }

    pub fn fail_uploads(&self) {
        self.fail_uploads.store(true, Ordering::SeqCst);
    }

    /// Fails only uploads whose file name ends with `suffix`.
    pub fn fail_uploads_named(&self, suffix: &str) {
        *self.fail_uploads_named.lock().unwrap() = Some(suffix.to_string());
    }

    /// Makes every delete wait `delay` before it completes and is recorded.
    pub fn slow_deletes(&self, delay: Duration) {
        *self.delete_delay.lock().unwrap() = Some(delay);
    }
}

#[async_trait]
impl ImageStore for FakeImageStore {
    async fn upload(
        &self,
        _file: &str,
        file_name: &str,
        folder: &str,
    ) -> Result<ImageRef, ImageStoreError> {
        self.calls.lock().unwrap().push(ImageCall::Upload {
            file_name: file_name.to_string(),
            folder: folder.to_string(),
        });
        let named_failure = self
            .fail_uploads_named
            .lock()
            .unwrap()
            .as_deref()
            .map_or(false, |suffix| file_name.ends_with(suffix));
        if named_failure || self.fail_uploads.load(Ordering::SeqCst) {
            return Err(ImageStoreError::Api {
                status: 500,
                message: "upload failed".into(),
            });
        }
        let id = format!("file_{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.hold(&id);
        Ok(ImageRef {
            id,
            path: format!("/{}/{}", folder, file_name),
        })
    }

    async fn delete(&self, file_id: &str) -> Result<DeleteOutcome, ImageStoreError> {
        let delay = *self.delete_delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls
            .lock()
            .unwrap()
            .push(ImageCall::Delete(file_id.to_string()));
        if self.existing.lock().unwrap().remove(file_id) {
            Ok(DeleteOutcome::Deleted)
        } else {
            Ok(DeleteOutcome::NotFound)
        }
    }
}

/// Shared fixtures: stores, a seeded admin and a token for it.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub images: Arc<FakeImageStore>,
    pub auth: AuthConfig,
    pub admin: User,
    pub token: String,
}

impl TestApp {
    pub fn new() -> Self {
        let auth = AuthConfig {
            jwt_secret: "integration-test-secret".to_string(),
            token_ttl: chrono::Duration::hours(1),
            bcrypt_cost: 4,
        };
        let store = Arc::new(MemoryStore::default());
        let images = Arc::new(FakeImageStore::default());

        let admin = User::new(
            ADMIN_EMAIL,
            "Admin".to_string(),
            hash_password(ADMIN_PASSWORD, auth.bcrypt_cost).unwrap(),
            Role::Admin,
        );
        store.put_user(admin.clone());
        let token = generate_token(&admin, &auth).unwrap();

        Self {
            store,
            images,
            auth,
            admin,
            token,
        }
    }

    pub fn state(&self) -> AppState {
        AppState::new(
            self.store.clone(),
            self.store.clone(),
            self.images.clone(),
            self.auth.clone(),
            "test",
        )
    }

    pub fn bearer(&self) -> (&'static str, String) {
        ("Authorization", format!("Bearer {}", self.token))
    }

    /// A stored user with the `user` role.
    pub fn seed_user(&self, email: &str, name: &str, avatar: Option<ImageRef>) -> User {
        let mut user = User::new(
            email,
            name.to_string(),
            hash_password("password123", self.auth.bcrypt_cost).unwrap(),
            Role::User,
        );
        if let Some(image) = &avatar {
            self.images.hold(&image.id);
        }
        user.avatar = avatar;
        self.store.put_user(user.clone());
        user
    }

    /// A stored client; images listed in `held` exist in the image store.
    pub fn seed_client(
        &self,
        contact_name: &str,
        organization_image: Option<ImageRef>,
        contact_image: Option<ImageRef>,
        held: &[&str],
    ) -> Client {
        let now = chrono::Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            organization_name: "Acme".to_string(),
            organization_image,
            contact_name: contact_name.to_string(),
            contact_image,
            contact_email: "contact@acme.com".to_string(),
            contact_phone_number: None,
            website: None,
            status: true,
            assigned: None,
            created_at: now,
            updated_at: now,
        };
        for id in held {
            self.images.hold(id);
        }
        self.store.put_client(client.clone());
        client
    }
}

pub fn image(id: &str) -> ImageRef {
    ImageRef {
        id: id.to_string(),
        path: format!("/client/{}.png", id),
    }
}

/// Calls `app` and returns the status with the parsed JSON envelope.
///
/// Errors raised by middleware are rendered the way the server would render them.
pub async fn send(
    app: &impl actix_web::dev::Service<
        actix_http::Request,
        Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
        Error = actix_web::Error,
    >,
    req: actix_http::Request,
) -> (actix_web::http::StatusCode, serde_json::Value) {
    let (status, bytes) = match actix_web::test::try_call_service(app, req).await {
        Ok(resp) => {
            let status = resp.status();
            (status, actix_web::test::read_body(resp).await)
        }
        Err(err) => {
            let resp = err.error_response();
            let status = resp.status();
            let bytes = actix_web::body::to_bytes(resp.into_body()).await.unwrap();
            (status, bytes)
        }
    };
    let json = serde_json::from_slice(&bytes).unwrap_or_else(|e| {
        panic!(
            "response is not JSON ({}): {}",
            e,
            String::from_utf8_lossy(&bytes)
        )
    });
    (status, json)
}
