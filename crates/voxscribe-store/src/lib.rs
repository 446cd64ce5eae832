//! VoxScribe Record Store
//!
//! Flat-file JSON persistence for `FileRecord`, one pretty-printed document
//! per record at `{data_dir}/{file_id}.json`. Single-process, single-node:
//! durability comes from atomic temp-file-and-rename writes, and concurrent
//! mutation of the same record is serialized by a per-key async lock.

mod file_store;

pub use file_store::{FileStore, StoreError, StoreResult};
