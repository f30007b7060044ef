//! 驱动别名映射模块
//!
//! 提供全局的别名到存储驱动的映射，第一个注册的别名成为默认别名

use crate::adapter::StoreDriver;
use crate::error::{DocSyncError, DocSyncResult};
use rat_logger::info;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

#[derive(Default)]
struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn StoreDriver>>,
    default_alias: Option<String>,
}

/// 别名到驱动的全局映射
static DRIVER_REGISTRY: OnceLock<RwLock<DriverRegistry>> = OnceLock::new();

fn registry() -> &'static RwLock<DriverRegistry> {
    DRIVER_REGISTRY.get_or_init(|| RwLock::new(DriverRegistry::default()))
}

fn poisoned() -> DocSyncError {
    DocSyncError::ConfigError {
        message: "驱动映射表锁被污染".to_string(),
    }
}

/// 注册驱动
///
/// 同名别名会被覆盖；注册表为空时该别名成为默认别名。
pub fn add_driver(alias: impl Into<String>, driver: Arc<dyn StoreDriver>) -> DocSyncResult<()> {
    let alias = alias.into();
    if alias.trim().is_empty() {
        return Err(crate::docsync_error!(config, "驱动别名不能为空"));
    }

    let mut map = registry().write().map_err(|_| poisoned())?;
    info!("注册存储驱动: alias={}, driver={}", alias, driver.name());
    if map.default_alias.is_none() {
        map.default_alias = Some(alias.clone());
    }
    map.drivers.insert(alias, driver);
    Ok(())
}

/// 通过别名获取驱动，None 表示默认别名
pub fn get_driver(alias: Option<&str>) -> DocSyncResult<Arc<dyn StoreDriver>> {
    let map = registry().read().map_err(|_| poisoned())?;
    let alias = match alias {
        Some(alias) => alias,
        None => map
            .default_alias
            .as_deref()
            .ok_or_else(|| crate::docsync_error!(config, "未设置默认驱动别名"))?,
    };
    map.drivers
        .get(alias)
        .cloned()
        .ok_or_else(|| crate::docsync_error!(config, format!("未找到驱动别名: {}", alias)))
}

/// 设置默认别名，别名必须已注册
pub fn set_default_alias(alias: &str) -> DocSyncResult<()> {
    let mut map = registry().write().map_err(|_| poisoned())?;
    if !map.drivers.contains_key(alias) {
        return Err(crate::docsync_error!(
            config,
            format!("未找到驱动别名: {}", alias)
        ));
    }
    map.default_alias = Some(alias.to_string());
    Ok(())
}

/// 当前默认别名
pub fn get_default_alias() -> Option<String> {
    registry().read().ok()?.default_alias.clone()
}

/// 获取所有已注册的别名
pub fn get_aliases() -> Vec<String> {
    match registry().read() {
        Ok(map) => {
            let mut aliases: Vec<String> = map.drivers.keys().cloned().collect();
            aliases.sort();
            aliases
        }
        Err(_) => Vec::new(),
    }
}

/// 移除驱动；移除的是默认别名时默认别名被清空
pub fn remove_driver(alias: &str) -> DocSyncResult<bool> {
    let mut map = registry().write().map_err(|_| poisoned())?;
    let removed = map.drivers.remove(alias).is_some();
    if removed && map.default_alias.as_deref() == Some(alias) {
        map.default_alias = None;
    }
    Ok(removed)
}
