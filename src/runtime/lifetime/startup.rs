use std::sync::Arc;

use tracing::{debug, warn};

use crate::cache::{ObjectCache, create_cache};
use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::mutant_hints::validate_hint_defaults;
use crate::services::{HandgradingService, HintService};
use crate::storage::{Storage, create_storage};

pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub cache: Arc<dyn ObjectCache>,
    pub handgrading: Arc<HandgradingService>,
    pub hints: Arc<HintService>,
}

/// 准备运行时上下文
/// 包括存储（执行迁移）、缓存以及两个业务服务
pub async fn prepare_startup() -> Result<StartupContext> {
    let config = AppConfig::get();
    validate_hint_defaults(&config.hints)?;

    let storage = create_storage().await?;
    warn!("Storage backend initialized and migrations completed");

    let cache = create_cache()?;
    warn!("{} cache backend initialized", config.cache.cache_type);

    let handgrading = Arc::new(HandgradingService::new(storage.clone(), cache.clone()));
    let hints = Arc::new(HintService::new(storage.clone(), config.hints.clone()));
    debug!(
        "Hint defaults: timezone={}, prefix={}",
        config.hints.default_reset_timezone, config.hints.default_obfuscated_mutant_name_prefix
    );

    Ok(StartupContext {
        storage,
        cache,
        handgrading,
        hints,
    })
}
