//! Core business logic for quill.

pub mod cache;
pub mod services;

pub use cache::{CacheService, MemoryCache, NoOpCache, PostCache, RedisCache};
