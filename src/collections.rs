use std::hash::BuildHasherDefault;
use dashmap::DashMap;
use indexmap::IndexMap;
use rustc_hash::FxHasher;


/// Use indexmap for fast lookups and rustc_hash for fast hashing
pub(crate) type FxIndexMap<K, V> = IndexMap<K, V, BuildHasherDefault<FxHasher>>;

pub(crate) use rustc_hash::{FxHashMap, FxHashSet};

/// Sharded concurrent map, shared between worker threads
pub(crate) type FxDashMap<K, V> = DashMap<K, V, BuildHasherDefault<FxHasher>>;
