//! Content store layer for lingua.
//!
//! Provides the storage side of the engine:
//! - [`ContentStore`]: the interface the sync engine reads and writes through
//! - [`FileContentStore`]: YAML tree at `<root>/<language>/<namespace>/...`
//! - [`MemoryContentStore`]: the same semantics without a disk
//! - [`HashLedger`]: content hashes last pushed to the remote service
//! - [`BackupWriter`]: timestamped JSON snapshots taken before a sync
//!
//! # Key prefixes
//!
//! Keys are derived from file paths: `menu.yml` owns `menu.*`,
//! `gui/shop.yml` owns `gui.shop.*`, and the namespace-root `main.yml`
//! owns unprefixed keys. Writing a key picks the file with the longest
//! matching prefix.

mod backup;
pub mod codec;
mod dynamic;
mod error;
mod file;
pub mod layout;
mod ledger;
mod memory;
mod store;

pub use backup::BackupWriter;
pub use codec::{FlatDocument, FlatValue};
pub use dynamic::DynamicTable;
pub use error::{StoreError, StoreResult};
pub use file::{FileContentStore, FileStoreConfig};
pub use layout::KeyPrefix;
pub use ledger::HashLedger;
pub use memory::MemoryContentStore;
pub use store::{ContentStore, DefaultFile, list_translation_files};
