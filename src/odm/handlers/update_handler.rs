//! # 更新处理器

use crate::PRIMARY_KEY;
use crate::error::{DocSyncError, DocSyncResult};
use crate::model::{ModelInstance, compute_change_set};
use crate::odm::SyncModel;
use crate::types::UpdateSpec;
use rat_logger::{debug, warn};

impl SyncModel {
    /// 按变更集更新已持久化的实例
    ///
    /// 变更集为空时直接成功，不发出请求。
    /// 原子属性以 `$inc` 发送，同一次请求中与 `$set`/`$unset` 一起生效。
    pub(crate) async fn update_instance(&self, instance: &mut ModelInstance) -> DocSyncResult<()> {
        let id = instance.primary().ok_or_else(|| {
            crate::docsync_error!(validation, PRIMARY_KEY, "已持久化的实例缺少主键")
        })?;

        if let Some(hooks) = &self.meta().hooks {
            hooks.before_save(instance).await?;
        }

        let changes = compute_change_set(instance)?;
        if changes.is_empty() {
            debug!("无变更，跳过更新: collection={}, _id={}", self.collection_name(), id);
            return Ok(());
        }

        let update = UpdateSpec::from(changes);
        debug!(
            "处理更新请求: collection={}, _id={}, set={}, unset={}, inc={}",
            self.collection_name(),
            id,
            update.set.len(),
            update.unset.len(),
            update.inc.len()
        );

        let outcome = self
            .driver()
            .update_one(self.collection_name(), id, &update)
            .await
            .map_err(DocSyncError::into_validation)?;

        if outcome.matched_count == 0 {
            warn!("更新未匹配任何文档: collection={}, _id={}", self.collection_name(), id);
        }

        instance.commit_snapshot();

        if let Some(hooks) = &self.meta().hooks {
            hooks.after_save(instance).await;
        }
        Ok(())
    }
}
