use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::image::{ImageInput, ImageRef};
use super::user::User;

lazy_static! {
    // Digits, spaces, parentheses and dashes with an optional leading plus.
    static ref PHONE_REGEX: regex::Regex = regex::Regex::new(r"^\+?[0-9()\- ]{6,20}$").unwrap();
}

/// A client organization as stored in the database.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: Uuid,
    pub organization_name: String,
    pub organization_image: Option<ImageRef>,
    pub contact_name: String,
    pub contact_image: Option<ImageRef>,
    /// Always stored lower-cased.
    pub contact_email: String,
    pub contact_phone_number: Option<String>,
    pub website: Option<String>,
    /// Whether the client is active.
    pub status: bool,
    /// User responsible for this client.
    pub assigned: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public fields of the user a client is assigned to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub avatar: Option<ImageRef>,
}

impl From<&User> for AssignedUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            avatar: user.avatar.clone(),
        }
    }
}

/// A client with its `assigned` user populated, as returned by the API.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientView {
    pub id: Uuid,
    pub organization_name: String,
    pub organization_image: Option<ImageRef>,
    pub contact_name: String,
    pub contact_image: Option<ImageRef>,
    pub contact_email: String,
    pub contact_phone_number: Option<String>,
    pub website: Option<String>,
    pub status: bool,
    pub assigned: Option<AssignedUser>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientView {
    pub fn new(client: Client, assigned: Option<AssignedUser>) -> Self {
        Self {
            id: client.id,
            organization_name: client.organization_name,
            organization_image: client.organization_image,
            contact_name: client.contact_name,
            contact_image: client.contact_image,
            contact_email: client.contact_email,
            contact_phone_number: client.contact_phone_number,
            website: client.website,
            status: client.status,
            assigned,
            created_at: client.created_at,
            updated_at: client.updated_at,
        }
    }
}

/// The `assigned` field of a client payload.
///
/// Missing means "leave as is"; `null` or the string `"null"` unassigns;
/// anything else must be a user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AssignmentInput {
    #[default]
    Absent,
    Unassign,
    Assign(Uuid),
}

impl AssignmentInput {
    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            AssignmentInput::Assign(id) => Some(*id),
            _ => None,
        }
    }
}

impl<'de> Deserialize<'de> for AssignmentInput {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Option::<String>::deserialize(deserializer)? {
            None => Ok(AssignmentInput::Unassign),
            Some(raw) if raw == "null" || raw.is_empty() => Ok(AssignmentInput::Unassign),
            Some(raw) => Uuid::parse_str(&raw)
                .map(AssignmentInput::Assign)
                .map_err(|_| de::Error::custom(format!("invalid assigned user id: {}", raw))),
        }
    }
}

/// Image inputs carried by a client payload, reconciled separately from the scalar fields.
#[derive(Debug, Default)]
pub struct ClientImages {
    pub organization: ImageInput,
    pub contact: ImageInput,
}

fn default_status() -> bool {
    true
}

/// Payload for `POST /api/client`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub organization_name: String,
    #[serde(default)]
    pub organization_image: ImageInput,
    #[validate(length(min = 1, max = 200))]
    pub contact_name: String,
    #[serde(default)]
    pub contact_image: ImageInput,
    #[validate(email)]
    pub contact_email: String,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub contact_phone_number: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    #[serde(default = "default_status")]
    pub status: bool,
    #[serde(default)]
    pub assigned: AssignmentInput,
}

impl CreateClientRequest {
    /// Splits the payload into a new client (fresh id, no images) and its image inputs.
    pub fn into_parts(self) -> (Client, ClientImages) {
        let now = Utc::now();
        let client = Client {
            id: Uuid::new_v4(),
            organization_name: self.organization_name,
            organization_image: None,
            contact_name: self.contact_name,
            contact_image: None,
            contact_email: self.contact_email.trim().to_lowercase(),
            contact_phone_number: self.contact_phone_number,
            website: self.website,
            status: self.status,
            assigned: self.assigned.user_id(),
            created_at: now,
            updated_at: now,
        };
        let images = ClientImages {
            organization: self.organization_image,
            contact: self.contact_image,
        };
        (client, images)
    }
}

/// Payload for `PUT /api/client/{id}`. Missing fields are left unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClientRequest {
    #[validate(length(min = 1, max = 200))]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub organization_image: ImageInput,
    #[validate(length(min = 1, max = 200))]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub contact_image: ImageInput,
    #[validate(email)]
    pub contact_email: Option<String>,
    #[validate(regex(path = "PHONE_REGEX", message = "Invalid phone number"))]
    pub contact_phone_number: Option<String>,
    #[validate(url)]
    pub website: Option<String>,
    pub status: Option<bool>,
    #[serde(default)]
    pub assigned: AssignmentInput,
}

/// Scalar changes of an update payload.
#[derive(Debug, Default)]
pub struct ClientChanges {
    organization_name: Option<String>,
    contact_name: Option<String>,
    contact_email: Option<String>,
    contact_phone_number: Option<String>,
    website: Option<String>,
    status: Option<bool>,
    pub assigned: AssignmentInput,
}

impl UpdateClientRequest {
    pub fn into_parts(self) -> (ClientChanges, ClientImages) {
        let changes = ClientChanges {
            organization_name: self.organization_name,
            contact_name: self.contact_name,
            contact_email: self.contact_email,
            contact_phone_number: self.contact_phone_number,
            website: self.website,
            status: self.status,
            assigned: self.assigned,
        };
        let images = ClientImages {
            organization: self.organization_image,
            contact: self.contact_image,
        };
        (changes, images)
    }
}

impl ClientChanges {
    pub fn apply_to(self, client: &mut Client) {
        if let Some(name) = self.organization_name {
            client.organization_name = name;
        }
        if let Some(name) = self.contact_name {
            client.contact_name = name;
        }
        if let Some(email) = self.contact_email {
            client.contact_email = email.trim().to_lowercase();
        }
        if let Some(phone) = self.contact_phone_number {
            client.contact_phone_number = Some(phone);
        }
        if let Some(website) = self.website {
            client.website = Some(website);
        }
        if let Some(status) = self.status {
            client.status = status;
        }
        match self.assigned {
            AssignmentInput::Absent => {}
            AssignmentInput::Unassign => client.assigned = None,
            AssignmentInput::Assign(user_id) => client.assigned = Some(user_id),
        }
        client.updated_at = Utc::now();
    }
}
