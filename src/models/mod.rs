pub mod anime;

// Re-export core models for easy access
pub use anime::AnimeRecord;
