//! Profile schema and storage.
//!
//! The profile is a fixed namespaced tree of string attributes addressed by
//! dotted paths. Everything entering the engine goes through [`sanitize`],
//! so readers can rely on every canonical path resolving to a string.

pub mod errors;
pub mod schema;
pub mod store;

pub use errors::ProfileError;
pub use schema::{
    default_profile, normalize_yes_no, sanitize, Profile, CANONICAL_PATHS, DEFAULT_COUNTRY,
    PREFER_NOT_TO_SAY, STORAGE_KEY,
};
pub use store::{FileProfileStore, MemoryProfileStore, ProfileStore};
