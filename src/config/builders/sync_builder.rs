//! # 同步层配置构建器模块

use crate::config::core::{DocSyncConfig, LoggingConfig, MongoConfig};
use crate::error::DocSyncResult;
use rat_logger::info;

/// 同步层配置构建器
#[derive(Debug, Default)]
pub struct DocSyncConfigBuilder {
    default_alias: Option<String>,
    mongo: Option<MongoConfig>,
    logging: Option<LoggingConfig>,
}

impl DocSyncConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置默认驱动别名
    pub fn default_alias(mut self, alias: impl Into<String>) -> Self {
        self.default_alias = Some(alias.into());
        self
    }

    /// 设置MongoDB连接配置
    pub fn mongo(mut self, mongo: MongoConfig) -> Self {
        self.mongo = Some(mongo);
        self
    }

    /// 设置日志配置
    pub fn logging(mut self, logging: LoggingConfig) -> Self {
        self.logging = Some(logging);
        self
    }

    /// 构建配置
    ///
    /// # 错误
    ///
    /// 默认别名或日志配置未设置时返回错误
    pub fn build(self) -> DocSyncResult<DocSyncConfig> {
        let default_alias = self
            .default_alias
            .filter(|a| !a.trim().is_empty())
            .ok_or_else(|| crate::docsync_error!(config, "默认驱动别名必须设置"))?;
        let logging = self
            .logging
            .ok_or_else(|| crate::docsync_error!(config, "日志配置必须设置"))?;

        info!("创建同步层配置: 默认别名={}, MongoDB={}", default_alias, self.mongo.is_some());
        Ok(DocSyncConfig {
            default_alias,
            mongo: self.mongo,
            logging,
        })
    }
}
