//! Retouch Storage Library
//!
//! Collaborators the image service talks to: a [`ResourceStore`] holding
//! imported image bytes and an [`ImageSizeCache`] memoizing decoded
//! dimensions by resource identity.
//!
//! # Resource key format
//!
//! Resources are content addressed: `resources/{hash[0..2]}/{hash}` where
//! `hash` is the hex SHA-256 of the bytes. Importing identical bytes twice
//! yields the same key.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod size_cache;
pub mod traits;

// Re-export commonly used types
pub use factory::{create_size_cache, create_store};
pub use local::LocalResourceStore;
pub use size_cache::{ImageSizeCache, LruSizeCache};
pub use traits::{Resource, ResourceStore, StoreError, StoreResult};
