#![doc = "The `clientdesk` library crate."]
#![doc = ""]
#![doc = "Domain models, persistence, image reconciliation, authentication, routing and"]
#![doc = "error handling for the client and user management API. The binary (`main.rs`)"]
#![doc = "wires these together and runs the server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod models;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use error::AppError;
pub use state::AppState;
