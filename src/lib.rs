//! kmap: a growable hash table whose buckets are ordered maps, built on a
//! small dynamic array of its own.
//!
//! Internal Design:
//!
//! Summary
//! - Layers:
//!   - KVec<T>: owned boxed slice with a separate logical size. Index
//!     access is bounded by capacity; `get`/`as_slice` only see live
//!     elements.
//!   - select: the tuning constant `a` and `select_bucket`, which maps a
//!     64-bit digest to `floor(m * frac(digest * a))`.
//!   - KMap<K, V, S>: `m` buckets (`BTreeMap<K, V>`) in a KVec. A key lives
//!     in the bucket its digest selects under the current `m`.
//!   - iter: borrowing `Iter`/`IterMut` and detached `Cursor`s.
//!
//! Growth
//! - The threshold is `m * BUCKET_LOAD` entries. Insertion paths check it
//!   before writing; reaching it doubles `m` and rehashes every bucket.
//!   Lookups and removals never resize.
//! - A bucket is split in one full pass and the departing entries are
//!   placed afterwards, so no bucket is modified while being iterated.
//! - After a rehash the entry count is recomputed from the buckets.
//!
//! Entry count
//! - `insert` counts every call, including overwrites of an existing key.
//!   `get_or_insert_with`/`get_or_insert_default` count only real
//!   insertions and `remove` only real removals. The drift that `insert`
//!   can introduce is corrected at the next rehash.
//!
//! Cursors
//! - A cursor holds (bucket, key, end sentinel, generation). The table's
//!   generation changes whenever entries may have moved (growth, resize,
//!   clear, clean, swap); a cursor from an older generation is rejected
//!   with `CursorError::Stale`. Removing a key invalidates only cursors on
//!   that key (`CursorError::Vacant`).
//!
//! Notes and non-goals
//! - Single-threaded, no interior mutability; wrap the whole table in a
//!   lock to share it.
//! - The table never shrinks except through `clear`.
//! - `bucket_at_mut` bypasses the entry count; it is an escape hatch.

pub mod iter;
pub mod kmap;
mod kmap_proptest;
pub mod kvec;
pub mod select;

// Public surface
pub use hashbrown::hash_map::DefaultHashBuilder;
pub use iter::{Cursor, CursorError, Iter, IterMut};
pub use kmap::{Bucket, KMap, BUCKET_LOAD, MIN_BUCKETS};
pub use kvec::KVec;
pub use select::{select_bucket, ConfigError, Tuning};
