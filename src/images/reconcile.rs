//! Image reconciliation.
//!
//! For one image attribute of an owning entity, [`reconcile`] decides which store
//! action a request implies, [`execute`] performs it, and the resulting
//! [`ImageChange`] is merged into the entity before the single persistence write.
//!
//! | current | incoming  | action                 |
//! |---------|-----------|------------------------|
//! | any     | `Absent`  | `NoOp`                 |
//! | `None`  | `Clear`   | `NoOp`                 |
//! | `Some`  | `Clear`   | `Delete(current.id)`   |
//! | `None`  | `Payload` | `Upload(payload)`      |
//! | `Some`  | `Payload` | `Replace(current.id, payload)` |

use uuid::Uuid;

use super::{DeleteOutcome, ImageStore, ImageStoreError};
use crate::models::{ImageInput, ImageRef};

/// The store action implied by a request for one image attribute.
#[derive(Clone, PartialEq, Eq)]
pub enum ImageAction {
    NoOp,
    Upload(String),
    Replace { old_id: String, payload: String },
    Delete(String),
}

impl std::fmt::Debug for ImageAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageAction::NoOp => f.write_str("NoOp"),
            ImageAction::Upload(payload) => write!(f, "Upload({} bytes)", payload.len()),
            ImageAction::Replace { old_id, payload } => {
                write!(f, "Replace({}, {} bytes)", old_id, payload.len())
            }
            ImageAction::Delete(old_id) => write!(f, "Delete({})", old_id),
        }
    }
}

/// How an image attribute must change once its action has completed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageChange {
    Unchanged,
    Set(ImageRef),
    Cleared,
}

impl ImageChange {
    pub fn apply_to(self, slot: &mut Option<ImageRef>) {
        match self {
            ImageChange::Unchanged => {}
            ImageChange::Set(image) => *slot = Some(image),
            ImageChange::Cleared => *slot = None,
        }
    }
}

/// Where an uploaded image is stored: `{owner_id}_{display_name}` inside `folder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageTarget {
    pub file_name: String,
    pub folder: &'static str,
}

impl ImageTarget {
    pub fn new(owner_id: Uuid, display_name: &str, folder: &'static str) -> Self {
        Self {
            file_name: format!("{}_{}", owner_id, display_name),
            folder,
        }
    }
}

/// Decides the store action for one image attribute.
///
/// Only the attribute itself determines whether an image exists.
pub fn reconcile(current: Option<&ImageRef>, incoming: ImageInput) -> ImageAction {
    match (incoming, current) {
        (ImageInput::Absent, _) => ImageAction::NoOp,
        (ImageInput::Clear, None) => ImageAction::NoOp,
        (ImageInput::Clear, Some(image)) => ImageAction::Delete(image.id.clone()),
        (ImageInput::Payload(payload), None) => ImageAction::Upload(payload),
        (ImageInput::Payload(payload), Some(image)) => ImageAction::Replace {
            old_id: image.id.clone(),
            payload,
        },
    }
}

/// Runs `action` against the store and reports how the attribute must change.
///
/// Deleting a file that is already gone counts as success. On `Replace` the upload
/// happens whether the old file was deleted or already missing.
pub async fn execute(
    store: &dyn ImageStore,
    action: ImageAction,
    target: &ImageTarget,
) -> Result<ImageChange, ImageStoreError> {
    match action {
        ImageAction::NoOp => Ok(ImageChange::Unchanged),
        ImageAction::Upload(payload) => {
            let image = store
                .upload(&payload, &target.file_name, target.folder)
                .await?;
            Ok(ImageChange::Set(image))
        }
        ImageAction::Delete(old_id) => {
            delete_tolerant(store, &old_id).await?;
            Ok(ImageChange::Cleared)
        }
        ImageAction::Replace { old_id, payload } => {
            delete_tolerant(store, &old_id).await?;
            let image = store
                .upload(&payload, &target.file_name, target.folder)
                .await?;
            Ok(ImageChange::Set(image))
        }
    }
}

/// [`reconcile`] followed by [`execute`].
pub async fn apply(
    store: &dyn ImageStore,
    current: Option<&ImageRef>,
    incoming: ImageInput,
    target: &ImageTarget,
) -> Result<ImageChange, ImageStoreError> {
    execute(store, reconcile(current, incoming), target).await
}

/// Deletes an entity's image, if it has one, ahead of deleting the entity itself.
pub async fn discard(
    store: &dyn ImageStore,
    current: Option<&ImageRef>,
) -> Result<(), ImageStoreError> {
    match current {
        Some(image) => delete_tolerant(store, &image.id).await,
        None => Ok(()),
    }
}

async fn delete_tolerant(store: &dyn ImageStore, file_id: &str) -> Result<(), ImageStoreError> {
    if store.delete(file_id).await? == DeleteOutcome::NotFound {
        log::warn!("image {} was already missing from the store", file_id);
    }
    Ok(())
}
