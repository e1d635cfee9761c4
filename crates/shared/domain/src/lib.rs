//! Domain layer - Core business entities.
//!
//! This crate contains pure domain types with no infrastructure dependencies.
//! The same `User` record is persisted by the user service and returned on the wire.

pub mod user;

pub use user::{User, UserData};
