pub mod client;
pub mod image;
pub mod page;
pub mod user;

pub use client::{
    AssignedUser, AssignmentInput, Client, ClientChanges, ClientImages, ClientView,
    CreateClientRequest, UpdateClientRequest,
};
pub use image::{ImageInput, ImageRef};
pub use page::{Page, PageQuery, PageRequest, Sort, SortDirection};
pub use user::{CreateUserRequest, Role, UpdateUserRequest, User};
