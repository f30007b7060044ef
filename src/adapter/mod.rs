//! 存储驱动模块
//!
//! 定义同步层对文档存储驱动的调用约定，屏蔽不同驱动的实现差异。
//! 驱动错误原样透传；唯一键冲突以 `DocSyncError::DuplicateKey` 报告。

use crate::error::DocSyncResult;
use crate::types::*;
use async_trait::async_trait;

pub mod memory;
#[cfg(feature = "mongodb-support")]
pub mod mongodb;

pub use memory::MemoryDriver;
#[cfg(feature = "mongodb-support")]
pub use mongodb::MongoDriver;

/// 文档存储驱动
#[async_trait]
pub trait StoreDriver: Send + Sync {
    /// 驱动名称，用于日志
    fn name(&self) -> &str;

    /// 插入文档，缺少 `_id` 时由存储端分配
    async fn insert(&self, collection: &str, document: Document) -> DocSyncResult<InsertOutcome>;

    /// 按主键更新单个文档，`$set`/`$unset`/`$inc` 在同一请求中原子生效
    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        update: &UpdateSpec,
    ) -> DocSyncResult<UpdateOutcome>;

    /// 按主键删除单个文档，返回删除数量
    async fn delete_one(&self, collection: &str, id: ObjectId) -> DocSyncResult<u64>;

    /// 删除全部匹配的文档，返回删除数量
    async fn delete_many(&self, collection: &str, filter: &Document) -> DocSyncResult<u64>;

    /// 查找文档
    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> DocSyncResult<Vec<Document>>;

    /// 查找单个文档
    async fn find_one(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> DocSyncResult<Option<Document>> {
        let options = options.clone().limit(1);
        Ok(self.find(collection, filter, &options).await?.into_iter().next())
    }

    /// 统计匹配的文档数量
    async fn count(&self, collection: &str, filter: &Document) -> DocSyncResult<u64>;

    /// 执行聚合管道
    async fn aggregate(&self, collection: &str, pipeline: &[Document]) -> DocSyncResult<Vec<Document>>;

    /// 创建单字段索引（唯一索引为稀疏索引，缺失字段不参与冲突检测）
    async fn create_index(&self, collection: &str, field: &str, unique: bool) -> DocSyncResult<()>;
}
