//! # MongoDB配置构建器模块

use crate::config::core::MongoConfig;
use crate::error::DocSyncResult;
use std::collections::BTreeMap;

/// MongoDB配置构建器
#[derive(Debug, Default)]
pub struct MongoConfigBuilder {
    host: Option<String>,
    port: Option<u16>,
    database: Option<String>,
    username: Option<String>,
    password: Option<String>,
    auth_source: Option<String>,
    direct_connection: bool,
    options: BTreeMap<String, String>,
}

impl MongoConfigBuilder {
    /// 创建新的构建器
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置主机
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// 设置端口
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// 设置数据库名
    pub fn database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    /// 设置用户名和密码
    pub fn with_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    /// 设置认证数据库
    pub fn with_auth_source(mut self, auth_source: impl Into<String>) -> Self {
        self.auth_source = Some(auth_source.into());
        self
    }

    /// 启用直接连接
    pub fn with_direct_connection(mut self, direct: bool) -> Self {
        self.direct_connection = direct;
        self
    }

    /// 添加自定义URI参数
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// 构建MongoDB配置
    ///
    /// 主机、端口、数据库名必须设置且不能为空
    pub fn build(self) -> DocSyncResult<MongoConfig> {
        let host = self
            .host
            .filter(|h| !h.trim().is_empty())
            .ok_or_else(|| crate::docsync_error!(config, "MongoDB主机必须设置"))?;
        let port = self
            .port
            .ok_or_else(|| crate::docsync_error!(config, "MongoDB端口必须设置"))?;
        if port == 0 {
            return Err(crate::docsync_error!(config, "MongoDB端口不能为零"));
        }
        let database = self
            .database
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| crate::docsync_error!(config, "MongoDB数据库名必须设置"))?;

        if self.username.is_some() != self.password.is_some() {
            return Err(crate::docsync_error!(config, "用户名和密码必须同时设置"));
        }

        Ok(MongoConfig {
            host,
            port,
            database,
            username: self.username,
            password: self.password,
            auth_source: self.auth_source,
            direct_connection: self.direct_connection,
            options: self.options,
        })
    }
}
