//! Data-file loading for the Fabrikon engine.
//!
//! Reads game content definitions (parts, recipes, power recipes,
//! buildings) from RON, JSON, or TOML files and resolves them into an
//! immutable [`fabrikon_core::catalogue::GameCatalogue`].

pub mod loader;
pub mod schema;

pub use loader::{load_catalogue, DataLoadError};
