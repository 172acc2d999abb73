//! 对象缓存
//!
//! 目前只有 Moka 内存实现。缓存只存放可重算的派生数据（例如评分汇总），
//! 写操作方负责显式失效。

pub mod object_cache;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::errors::{HWSystemError, Result};

pub use object_cache::moka::MokaCacheWrapper;

/// 缓存查询结果
#[derive(Debug, Clone, PartialEq)]
pub enum CacheResult<T> {
    Found(T),
    NotFound,
}

#[async_trait]
pub trait ObjectCache: Send + Sync {
    async fn get_raw(&self, key: &str) -> CacheResult<String>;
    async fn insert_raw(&self, key: String, value: String, ttl: u64);
    async fn remove(&self, key: &str);
    async fn invalidate_all(&self);
}

/// 以 JSON 读取缓存对象，反序列化失败视为未命中
pub async fn get_json<T: DeserializeOwned>(cache: &dyn ObjectCache, key: &str) -> Option<T> {
    match cache.get_raw(key).await {
        CacheResult::Found(raw) => match serde_json::from_str(&raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!("Discarding undecodable cache entry {}: {}", key, e);
                cache.remove(key).await;
                None
            }
        },
        CacheResult::NotFound => None,
    }
}

/// 以 JSON 写入缓存对象
pub async fn insert_json<T: Serialize>(
    cache: &dyn ObjectCache,
    key: String,
    value: &T,
    ttl: u64,
) -> Result<()> {
    let raw = serde_json::to_string(value)?;
    cache.insert_raw(key, raw, ttl).await;
    Ok(())
}

/// 根据配置创建缓存实例
pub fn create_cache() -> Result<Arc<dyn ObjectCache>> {
    let config = AppConfig::get();
    match config.cache.cache_type.as_str() {
        "moka" | "memory" => {
            debug!("Creating moka cache backend");
            Ok(Arc::new(MokaCacheWrapper::new(
                config.cache.memory.max_capacity,
                config.cache.default_ttl,
            )))
        }
        other => Err(HWSystemError::cache_connection(format!(
            "不支持的缓存类型: {other}. 支持: moka"
        ))),
    }
}
