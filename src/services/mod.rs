//! Backend endpoints built on the request pipeline

pub mod auth;

pub use auth::{landing_path, AuthService, MessageResponse, UserProfile};
