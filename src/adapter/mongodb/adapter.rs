//! MongoDB驱动核心模块
//!
//! 提供MongoDB驱动的核心结构定义和连接建立

use crate::config::MongoConfig;
use crate::error::{DocSyncError, DocSyncResult};
use mongodb::bson::Document;
use mongodb::{Client, Collection, Database};
use rat_logger::info;

/// MongoDB驱动
#[derive(Debug, Clone)]
pub struct MongoDriver {
    database: Database,
}

impl MongoDriver {
    /// 按配置建立连接
    pub async fn connect(config: &MongoConfig) -> DocSyncResult<Self> {
        let uri = config.build_uri();
        let client = Client::with_uri_str(&uri)
            .await
            .map_err(|e| DocSyncError::TransportError {
                message: format!("MongoDB连接失败: {}", e),
            })?;

        info!(
            "MongoDB驱动已连接: {}:{}/{}",
            config.host, config.port, config.database
        );
        Ok(Self::from_database(client.database(&config.database)))
    }

    /// 使用已有的数据库句柄
    pub fn from_database(database: Database) -> Self {
        Self { database }
    }

    /// 数据库名称
    pub fn database_name(&self) -> &str {
        self.database.name()
    }

    pub(crate) fn collection(&self, name: &str) -> Collection<Document> {
        self.database.collection::<Document>(name)
    }
}
