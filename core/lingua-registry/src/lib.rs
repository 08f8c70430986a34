//! Read path of lingua: snapshot registry, hot caches and the resolver.
//!
//! # Architecture
//!
//! ```text
//!  resolve(lang, ns, key, args)
//!        │
//!        ▼
//!  L1 resolved-string cache ──hit──▶ text
//!        │ miss
//!        ▼
//!  L2 snapshot registry (lang) ──miss──▶ registry (default lang) ──miss──▶ missing-key format
//!        │ hit
//!        ▼
//!  L3 compiled-template cache ──▶ substitute placeholders ──▶ text
//! ```
//!
//! The registry is a single immutable snapshot behind an atomic pointer.
//! Readers load the pointer once and never block; writers build the next
//! snapshot copy-on-write and swap it in with compare-and-swap retry.
//! Nothing in this crate performs I/O or returns errors to callers.

pub mod cache;
pub mod plural;
pub mod registry;
pub mod resolver;
pub mod template;

pub use cache::{BoundedCache, CacheConfig, CacheKey, CacheStats, Generation, HotCache};
pub use registry::{Registry, Snapshot};
pub use resolver::{MissingKeyLog, MissingKeyPolicy, Resolver, ResolverConfig};
pub use template::{Placeholders, Template};
