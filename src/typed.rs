//! Typed Adapters
//!
//! Every tier stores raw bytes. A `TypedCache` pairs a byte store with a
//! `Codec` and a `Namespace` prefix so values of different types can share
//! the same caller key without colliding.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::disk::{DiskCache, FileStore};
use crate::error::{validate_key, CacheError, Result};
use crate::memory::MemoryCache;
use crate::tiered::TwoTierCache;
use crate::ttl::Ttl;

// == Namespace ==
/// Short tag prepended to caller keys to form the storage key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Namespace(&'static str);

impl Namespace {
    pub const BYTES: Namespace = Namespace("by_");
    pub const TEXT: Namespace = Namespace("st_");
    pub const JSON_OBJECT: Namespace = Namespace("jo_");
    pub const JSON_ARRAY: Namespace = Namespace("ja_");
    pub const BITMAP: Namespace = Namespace("bi_");
    pub const DRAWABLE: Namespace = Namespace("dr_");
    pub const PARCELABLE: Namespace = Namespace("pa_");
    pub const SERIALIZABLE: Namespace = Namespace("se_");

    /// The namespaces `remove_all_namespaces` sweeps.
    pub const BUILTIN: [Namespace; 8] = [
        Self::BYTES,
        Self::TEXT,
        Self::JSON_OBJECT,
        Self::JSON_ARRAY,
        Self::BITMAP,
        Self::DRAWABLE,
        Self::PARCELABLE,
        Self::SERIALIZABLE,
    ];

    pub const fn custom(prefix: &'static str) -> Self {
        Namespace(prefix)
    }

    pub fn prefix(&self) -> &'static str {
        self.0
    }

    /// `prefix + caller_key`. Caller keys must be non-empty.
    pub fn storage_key(&self, caller_key: &str) -> Result<String> {
        validate_key(caller_key)?;
        Ok(format!("{}{}", self.0, caller_key))
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

// == Byte Cache Trait ==
/// A byte-oriented store a `TypedCache` can sit on.
pub trait ByteCache: Send + Sync {
    fn put_bytes(&self, key: &str, value: &[u8], ttl: Ttl) -> Result<()>;
    fn get_bytes(&self, key: &str) -> Option<Vec<u8>>;
    fn remove_bytes(&self, key: &str) -> bool;
}

impl ByteCache for TwoTierCache {
    fn put_bytes(&self, key: &str, value: &[u8], ttl: Ttl) -> Result<()> {
        self.put(key, value, ttl)
    }

    fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.get(key)
    }

    fn remove_bytes(&self, key: &str) -> bool {
        self.remove(key)
    }
}

impl<F: FileStore> ByteCache for DiskCache<F> {
    fn put_bytes(&self, key: &str, value: &[u8], ttl: Ttl) -> Result<()> {
        self.put(key, value, ttl)
    }

    fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.get(key)
    }

    fn remove_bytes(&self, key: &str) -> bool {
        self.remove(key)
    }
}

impl ByteCache for MemoryCache<Vec<u8>> {
    fn put_bytes(&self, key: &str, value: &[u8], ttl: Ttl) -> Result<()> {
        validate_key(key)?;
        self.put(key, value.to_vec(), ttl);
        Ok(())
    }

    fn get_bytes(&self, key: &str) -> Option<Vec<u8>> {
        self.get(key)
    }

    fn remove_bytes(&self, key: &str) -> bool {
        self.remove(key).is_some()
    }
}

/// Removes `caller_key` from every built-in namespace. Returns whether any existed.
pub fn remove_all_namespaces<S: ByteCache + ?Sized>(store: &S, caller_key: &str) -> bool {
    let mut removed = false;
    for namespace in Namespace::BUILTIN {
        if let Ok(key) = namespace.storage_key(caller_key) {
            removed |= store.remove_bytes(&key);
        }
    }
    removed
}

// == Codec Trait ==
/// Converts a typed value to and from bytes.
pub trait Codec: Send + Sync {
    type Value;

    fn encode(&self, value: &Self::Value) -> Result<Vec<u8>>;
    fn decode(&self, bytes: &[u8]) -> Result<Self::Value>;
}

/// Identity codec.
#[derive(Debug, Default, Clone, Copy)]
pub struct BytesCodec;

impl Codec for BytesCodec {
    type Value = Vec<u8>;

    fn encode(&self, value: &Vec<u8>) -> Result<Vec<u8>> {
        Ok(value.clone())
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        Ok(bytes.to_vec())
    }
}

/// UTF-8 text.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextCodec;

impl Codec for TextCodec {
    type Value = String;

    fn encode(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn decode(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|err| CacheError::Codec(err.to_string()))
    }
}

/// Any serde type, stored as JSON.
pub struct JsonCodec<T>(PhantomData<fn() -> T>);

impl<T> JsonCodec<T> {
    pub fn new() -> Self {
        JsonCodec(PhantomData)
    }
}

impl<T> Default for JsonCodec<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for JsonCodec<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JsonCodec")
    }
}

impl<T: Serialize + DeserializeOwned> Codec for JsonCodec<T> {
    type Value = T;

    fn encode(&self, value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn decode(&self, bytes: &[u8]) -> Result<T> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

// == Typed Cache ==
/// A byte store viewed through one namespace and one codec.
pub struct TypedCache<S: ?Sized, C> {
    store: Arc<S>,
    namespace: Namespace,
    codec: C,
}

impl<S: ?Sized, C: Clone> Clone for TypedCache<S, C> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            namespace: self.namespace,
            codec: self.codec.clone(),
        }
    }
}

impl<S: ByteCache + ?Sized, C: Codec> TypedCache<S, C> {
    pub fn new(store: Arc<S>, namespace: Namespace, codec: C) -> Self {
        Self {
            store,
            namespace,
            codec,
        }
    }

    pub fn namespace(&self) -> Namespace {
        self.namespace
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    // == Put ==
    pub fn put(&self, key: &str, value: &C::Value, ttl: Ttl) -> Result<()> {
        let storage_key = self.namespace.storage_key(key)?;
        let bytes = self.codec.encode(value)?;
        self.store.put_bytes(&storage_key, &bytes, ttl)
    }

    // == Get ==
    /// Returns the decoded value. Bytes that fail to decode read as a miss.
    pub fn get(&self, key: &str) -> Option<C::Value> {
        let storage_key = self.namespace.storage_key(key).ok()?;
        let bytes = self.store.get_bytes(&storage_key)?;
        match self.codec.decode(&bytes) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(key = %storage_key, error = %err, "cached value failed to decode");
                None
            }
        }
    }

    pub fn get_or(&self, key: &str, default: C::Value) -> C::Value {
        self.get(key).unwrap_or(default)
    }

    // == Remove ==
    pub fn remove(&self, key: &str) -> bool {
        match self.namespace.storage_key(key) {
            Ok(storage_key) => self.store.remove_bytes(&storage_key),
            Err(_) => false,
        }
    }
}

impl<S: ByteCache + ?Sized> TypedCache<S, BytesCodec> {
    pub fn bytes(store: Arc<S>) -> Self {
        Self::new(store, Namespace::BYTES, BytesCodec)
    }
}

impl<S: ByteCache + ?Sized> TypedCache<S, TextCodec> {
    pub fn text(store: Arc<S>) -> Self {
        Self::new(store, Namespace::TEXT, TextCodec)
    }
}

impl<S: ByteCache + ?Sized, T: Serialize + DeserializeOwned> TypedCache<S, JsonCodec<T>> {
    pub fn json_object(store: Arc<S>) -> Self {
        Self::new(store, Namespace::JSON_OBJECT, JsonCodec::new())
    }

    pub fn json_array(store: Arc<S>) -> Self {
        Self::new(store, Namespace::JSON_ARRAY, JsonCodec::new())
    }

    pub fn serializable(store: Arc<S>) -> Self {
        Self::new(store, Namespace::SERIALIZABLE, JsonCodec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        age: u32,
    }

    fn memory_store() -> Arc<MemoryCache<Vec<u8>>> {
        Arc::new(MemoryCache::new(64))
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(Namespace::TEXT.storage_key("user").unwrap(), "st_user");
        assert!(matches!(
            Namespace::BYTES.storage_key(""),
            Err(CacheError::InvalidKey(_))
        ));
        assert_eq!(Namespace::custom("img_").prefix(), "img_");
    }

    #[test]
    fn test_same_caller_key_different_types() {
        let store = memory_store();
        let text = TypedCache::text(store.clone());
        let bytes = TypedCache::bytes(store.clone());

        text.put("k", &"hello".to_string(), Ttl::Forever).unwrap();
        bytes.put("k", &vec![1, 2, 3], Ttl::Forever).unwrap();

        assert_eq!(text.get("k"), Some("hello".to_string()));
        assert_eq!(bytes.get("k"), Some(vec![1, 2, 3]));
        assert_eq!(store.count(), 2);
    }

    #[test]
    fn test_json_round_trip() {
        let cache = TypedCache::<_, JsonCodec<Profile>>::json_object(memory_store());
        let profile = Profile {
            name: "Ada".to_string(),
            age: 36,
        };

        cache.put("p", &profile, Ttl::Forever).unwrap();
        assert_eq!(cache.get("p"), Some(profile));
    }

    #[test]
    fn test_json_array_namespace() {
        let cache = TypedCache::<_, JsonCodec<Vec<u32>>>::json_array(memory_store());
        cache.put("list", &vec![1, 2, 3], Ttl::Forever).unwrap();

        assert_eq!(cache.namespace(), Namespace::JSON_ARRAY);
        assert_eq!(cache.store().get_bytes("ja_list"), Some(b"[1,2,3]".to_vec()));
    }

    #[test]
    fn test_decode_failure_is_a_miss() {
        let store = memory_store();
        store.put("st_bad", vec![0xff, 0xfe], Ttl::Forever);

        let text = TypedCache::text(store);
        assert_eq!(text.get("bad"), None);
        assert_eq!(text.get_or("bad", "fallback".to_string()), "fallback");
    }

    #[test]
    fn test_empty_caller_key() {
        let text = TypedCache::text(memory_store());
        assert!(text.put("", &"v".to_string(), Ttl::Forever).is_err());
        assert_eq!(text.get(""), None);
        assert!(!text.remove(""));
    }

    #[test]
    fn test_remove_all_namespaces() {
        let store = memory_store();
        TypedCache::text(store.clone())
            .put("k", &"a".to_string(), Ttl::Forever)
            .unwrap();
        TypedCache::bytes(store.clone())
            .put("k", &vec![1], Ttl::Forever)
            .unwrap();
        TypedCache::bytes(store.clone())
            .put("other", &vec![2], Ttl::Forever)
            .unwrap();

        assert!(remove_all_namespaces(store.as_ref(), "k"));
        assert!(!remove_all_namespaces(store.as_ref(), "k"));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_typed_over_disk() {
        let tmp = tempfile::tempdir().unwrap();
        let disk = Arc::new(DiskCache::open(tmp.path(), u64::MAX, usize::MAX));
        let text = TypedCache::text(disk.clone());

        text.put("greeting", &"hi".to_string(), Ttl::Seconds(60)).unwrap();
        assert_eq!(text.get("greeting"), Some("hi".to_string()));
        assert!(text.remove("greeting"));
        assert_eq!(disk.count(), 0);
    }
}
