//! Hosted image storage.
//!
//! `ImageStore` abstracts the external image service so the reconciliation logic
//! and the handlers can be exercised against an in-memory fake in tests.
//! `ImageKitClient` is the production implementation.

pub mod imagekit;
pub mod reconcile;

use async_trait::async_trait;
use std::fmt;

use crate::models::ImageRef;

pub use imagekit::ImageKitClient;
pub use reconcile::{reconcile, ImageAction, ImageChange, ImageTarget};

/// Result of asking the store to delete a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    /// The file was already gone. Callers treat this as success.
    NotFound,
}

/// Errors raised by an image store.
#[derive(Debug)]
pub enum ImageStoreError {
    /// The request never produced a usable response.
    Transport(String),
    /// The service answered with an error status.
    Api { status: u16, message: String },
}

impl fmt::Display for ImageStoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ImageStoreError::Transport(msg) => write!(f, "image service unreachable: {}", msg),
            ImageStoreError::Api { status, message } => {
                write!(f, "image service error ({}): {}", status, message)
            }
        }
    }
}

impl std::error::Error for ImageStoreError {}

impl From<reqwest::Error> for ImageStoreError {
    fn from(error: reqwest::Error) -> Self {
        ImageStoreError::Transport(error.to_string())
    }
}

/// Operations the application needs from the hosted image service.
#[async_trait]
pub trait ImageStore: Send + Sync {
    /// Stores `file` (base64 content or a fetchable URL) as `file_name` inside `folder`.
    async fn upload(
        &self,
        file: &str,
        file_name: &str,
        folder: &str,
    ) -> Result<ImageRef, ImageStoreError>;

    /// Removes the file with the given id. A missing file is reported as
    /// `DeleteOutcome::NotFound`, not as an error.
    async fn delete(&self, file_id: &str) -> Result<DeleteOutcome, ImageStoreError>;
}
