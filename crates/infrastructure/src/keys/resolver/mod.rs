// Resolver layers: cache-first remote resolution, then static fallback

pub mod cache_layer;
pub mod fallback_layer;

pub use cache_layer::CachedKeyResolver;
pub use fallback_layer::FallbackLayer;
