//! Runtime configuration, read from environment variables.
//!
//! | Variable | Default |
//! |----------|---------|
//! | `CATALOG_BIND_ADDR` | `0.0.0.0:8080` |
//! | `DATABASE_URL` | unset: in-memory store |
//! | `REDIS_URL` | unset: in-memory cache |
//! | `CATALOG_ITEM_TTL_SECS` | `600` |
//! | `CATALOG_COLLECTION_TTL_SECS` | `300` |
//! | `CATALOG_STORE_TIMEOUT_MS` | `2000` |
//! | `CATALOG_CACHE_TIMEOUT_MS` | `250` |
//! | `CATALOG_MAX_PAGE_SIZE` | `1000` |
//!
//! A variable that is set but does not parse is an error, never a silent default.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use catalog_core::page::DEFAULT_MAX_PAGE_SIZE;

use crate::cache_coordinator::{
    CachePolicy, DEFAULT_CACHE_TIMEOUT, DEFAULT_COLLECTION_TTL, DEFAULT_ITEM_TTL, DEFAULT_STORE_TIMEOUT,
};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var}: cannot parse {value:?}: {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub redis_url: Option<String>,
    pub item_ttl: Duration,
    pub collection_ttl: Duration,
    pub store_timeout: Duration,
    pub cache_timeout: Duration,
    pub max_page_size: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            database_url: None,
            redis_url: None,
            item_ttl: DEFAULT_ITEM_TTL,
            collection_ttl: DEFAULT_COLLECTION_TTL,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            cache_timeout: DEFAULT_CACHE_TIMEOUT,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

fn parse<T>(lookup: &impl Fn(&str) -> Option<String>, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ConfigError::Invalid {
                var,
                value,
                reason: e.to_string(),
            }),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl CatalogConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable source; used by tests to avoid touching the process env.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let max_page_size = match parse::<u32>(&lookup, "CATALOG_MAX_PAGE_SIZE")? {
            Some(0) => {
                return Err(ConfigError::Invalid {
                    var: "CATALOG_MAX_PAGE_SIZE",
                    value: "0".to_string(),
                    reason: "must be at least 1".to_string(),
                });
            }
            Some(n) => n,
            None => defaults.max_page_size,
        };

        Ok(Self {
            bind_addr: parse(&lookup, "CATALOG_BIND_ADDR")?.unwrap_or(defaults.bind_addr),
            database_url: non_blank(lookup("DATABASE_URL")),
            redis_url: non_blank(lookup("REDIS_URL")),
            item_ttl: parse(&lookup, "CATALOG_ITEM_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.item_ttl),
            collection_ttl: parse(&lookup, "CATALOG_COLLECTION_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.collection_ttl),
            store_timeout: parse(&lookup, "CATALOG_STORE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            cache_timeout: parse(&lookup, "CATALOG_CACHE_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.cache_timeout),
            max_page_size,
        })
    }

    pub fn cache_policy(&self) -> CachePolicy {
        CachePolicy {
            item_ttl: self.item_ttl,
            collection_ttl: self.collection_ttl,
            cache_timeout: self.cache_timeout,
            store_timeout: self.store_timeout,
        }
    }
}
