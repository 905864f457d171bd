//! The uniform response envelope returned by every endpoint.
//!
//! Successful handlers return an `ApiResponse<T>` directly (it implements `Responder`),
//! and `AppError` renders itself through the same type so clients always see
//! `{status, message, body, meta?}`.

use actix_web::{body::BoxBody, http::StatusCode, HttpRequest, HttpResponse, Responder};
use serde::{Deserialize, Serialize};

use crate::models::Page;

pub const SUCCESS: &str = "success";
pub const UNAUTHORIZED: &str = "Unauthorized";
pub const NOT_FOUND: &str = "Not Found";
pub const SERVER_ERROR: &str = "Server Error";

/// Pagination details attached to list responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub per_page: u32,
    pub current_page: u32,
    pub total_pages: u32,
    pub total_items: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status: u16,
    pub message: String,
    pub body: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub meta: Option<Meta>,
}

impl<T> ApiResponse<T> {
    /// A 200 "success" envelope carrying `body`.
    pub fn new(body: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: SUCCESS.to_string(),
            body: Some(body),
            meta: None,
        }
    }

    /// A 200 "success" envelope with a null body.
    pub fn empty() -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: SUCCESS.to_string(),
            body: None,
            meta: None,
        }
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = Some(meta);
        self
    }

    /// Switches to 401. An empty message falls back to "Unauthorized".
    pub fn to_unauthorized(&mut self, message: &str) {
        self.set_status(StatusCode::UNAUTHORIZED, or_default(message, UNAUTHORIZED));
    }

    /// Switches to 404. An empty message falls back to "Not Found".
    pub fn to_not_found(&mut self, message: &str) {
        self.set_status(StatusCode::NOT_FOUND, or_default(message, NOT_FOUND));
    }

    /// Switches to 500. An empty message falls back to "Server Error".
    pub fn to_server_error(&mut self, message: &str) {
        self.set_status(StatusCode::INTERNAL_SERVER_ERROR, or_default(message, SERVER_ERROR));
    }

    /// Sets status and message while keeping whatever body was already accumulated.
    pub fn set_status(&mut self, status: StatusCode, message: &str) {
        self.status = status.as_u16();
        self.message = message.to_string();
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Wraps one page of results. An empty page yields `[]` and no `meta`.
    pub fn paginated(page: Page<T>) -> Self {
        if page.items.is_empty() {
            return ApiResponse::new(Vec::new());
        }
        let meta = Meta {
            per_page: page.per_page,
            current_page: page.current_page,
            total_pages: page.total_pages,
            total_items: page.total_items,
        };
        ApiResponse::new(page.items).with_meta(meta)
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub fn into_http_response(self) -> HttpResponse {
        let status =
            StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        HttpResponse::build(status).json(self)
    }
}

impl<T: Serialize> Responder for ApiResponse<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        self.into_http_response()
    }
}

fn or_default<'a>(message: &'a str, default: &'a str) -> &'a str {
    if message.is_empty() {
        default
    } else {
        message
    }
}
