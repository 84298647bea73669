//! # cdash Storage Engine
//!
//! Purpose: Persist one daily-average record per calendar day in an ordered
//! key/value store and read it back for the dashboard.
//!
//! ## Design Principles
//! 1. **Strategy Pattern**: `KVStore` keeps the accumulator and HTTP layer
//!    decoupled from the backend.
//! 2. **Raw Bytes Below, Records Above**: Backends only move bytes; record
//!    encoding lives in provided trait methods so every backend agrees on it.
//! 3. **Single Writer**: The daily accumulator is the only writer; readers
//!    never mutate.

mod disk;
mod memory;
mod store;

pub use disk::SledStore;
pub use memory::MemoryStore;
pub use store::{DayRecord, KVStore};
