//! Our caching system keeps datasets and their applied filters between calls.
//!
//! To use the cache system, implement the Cacheable and CacheKey traits, then you can
//! use the read() and write() functions.
use crate::context::{AppliedFilters, Dataset, DatasetName};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;

/// Overrides where the cache lives, mostly useful for scripts.
pub const CACHE_DIR_ENV: &str = "RUSTY_FILTERS_CACHE_DIR";

/// You need a cache key in order to read something from cache.
pub trait CacheKey {
    fn as_path(&self) -> String;
}

/// Anything that can be cached needs to implement this trait.
///
/// Cacheable has an associated type so that we can always pair up a struct to be cached with its
/// cache key:
/// ```ignore
/// use rusty_filters::cache::read;
/// use rusty_filters::context::{Dataset, DatasetName};
///
/// let data: Dataset = read(&DatasetName::from("spans"))?;
/// //        ^^^^^^^ -- since Dataset::CacheKey == DatasetName, trying to use a different key type
/// //                   will cause a compile error.
/// ```
///
/// The same CacheKey type can be used for multiple Cacheables, AppliedFilters and Dataset both use
/// DatasetName. Their type ids keep them apart.
pub trait Cacheable {
    type CacheKey;

    fn cache_key(&self) -> Self::CacheKey;

    /// All structs of the same type are saved in the same folder, named after the type id, so
    /// that we can read all of them at once. Type ids should be unique.
    fn type_id() -> &'static str;
}

pub fn read<D, K>(cache_key: &K) -> Result<D, crate::Error>
where
    // makes sure we can only read() to structs that are actually meant to be read from that key
    D: Cacheable<CacheKey = K> + DeserializeOwned,
    K: CacheKey,
{
    let file_location = get_cache_path(D::type_id(), cache_key.as_path().as_str())?;

    let data = serde_json::from_reader(fs::File::open(file_location)?)?;

    Ok(data)
}

/// Like read(), but a missing file is not an error.
pub fn read_optional<D, K>(cache_key: &K) -> Result<Option<D>, crate::Error>
where
    D: Cacheable<CacheKey = K> + DeserializeOwned,
    K: CacheKey,
{
    let file_location = get_cache_path(D::type_id(), cache_key.as_path().as_str())?;

    if !file_location.exists() {
        return Ok(None);
    }

    let data = serde_json::from_reader(fs::File::open(file_location)?)?;

    Ok(Some(data))
}

pub fn read_all<D>() -> Result<Vec<D>, crate::Error>
where
    D: Cacheable + DeserializeOwned,
{
    let folder = require_cache_folder(D::type_id())?;
    let mut all = Vec::new();

    for entry in fs::read_dir(folder)? {
        let path = entry?.path();

        if path.is_file() {
            all.push(serde_json::from_reader(fs::File::open(path)?)?);
        }
    }

    Ok(all)
}

pub fn write<D, K>(data: &D) -> Result<(), crate::Error>
where
    D: Cacheable<CacheKey = K> + Serialize,
    K: CacheKey,
{
    let file_location = get_cache_path(D::type_id(), data.cache_key().as_path().as_str())?;

    let data = serde_json::to_string(&data)?;

    fs::write(file_location, data)?;

    Ok(())
}

fn get_cache_path(type_id: &'static str, cache_key: &str) -> Result<PathBuf, crate::Error> {
    let mut location = require_cache_folder(type_id)?;

    location.push(cache_key);

    Ok(location)
}

fn require_cache_folder(type_id: &'static str) -> Result<PathBuf, crate::Error> {
    let mut path = cache_root()?;
    path.push(type_id);

    // we have to make sure it exists, right?
    fs::create_dir_all(&path)?;

    Ok(path)
}

fn cache_root() -> Result<PathBuf, crate::Error> {
    if let Ok(dir) = std::env::var(CACHE_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let home = std::env::var("HOME")?;

    let mut path = PathBuf::from(home);
    path.push(".cache");
    path.push("rusty-filters");
    path.push("cache");
    path.push("v1");

    Ok(path)
}

// Please dump all impls here, so we keep the rest of the code base clean.

impl Cacheable for Dataset {
    type CacheKey = DatasetName;

    fn cache_key(&self) -> Self::CacheKey {
        self.name.clone()
    }

    fn type_id() -> &'static str {
        "dataset"
    }
}

impl CacheKey for DatasetName {
    fn as_path(&self) -> String {
        format!("dataset_{}.json", self)
    }
}

impl Cacheable for AppliedFilters {
    type CacheKey = DatasetName;

    fn cache_key(&self) -> Self::CacheKey {
        self.dataset.clone()
    }

    fn type_id() -> &'static str {
        "applied_filters"
    }
}

impl Cacheable for DatasetName {
    type CacheKey = SharedCacheKey;

    fn cache_key(&self) -> Self::CacheKey {
        SharedCacheKey(Self::type_id().to_owned())
    }

    fn type_id() -> &'static str {
        "current_dataset"
    }
}

pub struct SharedCacheKey(String);

impl SharedCacheKey {
    pub fn current_dataset() -> Self {
        SharedCacheKey(DatasetName::type_id().to_owned())
    }
}

impl CacheKey for SharedCacheKey {
    fn as_path(&self) -> String {
        self.0.clone()
    }
}

/// Points the cache at a temporary folder for the rest of the test run.
#[cfg(test)]
pub(crate) fn use_test_cache() {
    use once_cell::sync::Lazy;

    static TEST_CACHE: Lazy<tempfile::TempDir> = Lazy::new(|| {
        let dir = tempfile::tempdir().expect("cannot create a temporary cache folder");
        std::env::set_var(CACHE_DIR_ENV, dir.path());
        dir
    });

    Lazy::force(&TEST_CACHE);
}
