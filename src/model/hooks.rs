//! 生命周期钩子

use crate::error::DocSyncResult;
use crate::model::instance::ModelInstance;
use async_trait::async_trait;

/// 模型生命周期钩子
///
/// `before_*` 返回错误时操作中止，不会向存储端发出请求。
#[async_trait]
pub trait ModelHooks: Send + Sync {
    async fn before_save(&self, _instance: &ModelInstance) -> DocSyncResult<()> {
        Ok(())
    }

    async fn after_save(&self, _instance: &ModelInstance) {}

    async fn before_remove(&self, _instance: &ModelInstance) -> DocSyncResult<()> {
        Ok(())
    }

    async fn after_remove(&self, _instance: &ModelInstance) {}
}
