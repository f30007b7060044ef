//! # 删除处理器

use crate::error::DocSyncResult;
use crate::model::{ModelInstance, SyncState};
use crate::odm::SyncModel;
use crate::types::Document;
use rat_logger::debug;

impl SyncModel {
    /// 删除实例
    ///
    /// 只有已持久化的实例会发出请求；新实例和已删除实例直接返回。
    pub async fn remove(&self, instance: &mut ModelInstance) -> DocSyncResult<()> {
        self.check_model(instance)?;
        let id = match (instance.state(), instance.primary()) {
            (SyncState::Persisted, Some(id)) => id,
            (state, _) => {
                debug!("跳过删除: collection={}, state={:?}", self.collection_name(), state);
                return Ok(());
            }
        };

        if let Some(hooks) = &self.meta().hooks {
            hooks.before_remove(instance).await?;
        }

        debug!("处理删除请求: collection={}, _id={}", self.collection_name(), id);
        let deleted = self.driver().delete_one(self.collection_name(), id).await?;
        if deleted == 0 {
            debug!("删除时文档已不存在: collection={}, _id={}", self.collection_name(), id);
        }
        instance.mark_removed();

        if let Some(hooks) = &self.meta().hooks {
            hooks.after_remove(instance).await;
        }
        Ok(())
    }

    /// 删除全部匹配的文档，返回删除数量
    pub async fn remove_all(&self, filter: Document) -> DocSyncResult<u64> {
        let filter = self.normalize_filter(filter)?;
        debug!("处理批量删除请求: collection={}, filter={:?}", self.collection_name(), filter);
        self.driver().delete_many(self.collection_name(), &filter).await
    }
}
