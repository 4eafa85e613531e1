pub mod file_repository;
pub mod repository;

/// Name of the single storage slot holding the saved collection.
pub const STORAGE_SLOT: &str = "saved_components.json";
