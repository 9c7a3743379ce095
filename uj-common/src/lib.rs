//! # University Journal Common Library
//!
//! Shared code for the University Journal service:
//! - Entity models and their form schemas
//! - Persistence gateway over SQLite
//! - Form controller (create/edit workflow)
//! - Generic table view with CSV and PDF export
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod form;
pub mod gateway;
pub mod model;
pub mod schema;
pub mod table;
pub mod views;

pub use error::{Error, Result};
pub use gateway::{Gateway, SqliteGateway};
pub use model::{Entity, Grade, Group, Student, Subject, Teacher};
pub use schema::{FormSchema, ValidationErrors};
