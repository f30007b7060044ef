//! # 插入处理器

use crate::error::{DocSyncError, DocSyncResult};
use crate::model::ModelInstance;
use crate::model::conversion::coerce_primary_key;
use crate::model::tracker::coerce_atomic_fields;
use crate::odm::SyncModel;
use rat_logger::debug;

impl SyncModel {
    /// 插入新实例
    ///
    /// 成功后采用存储端报告的主键（调用方指定的主键会原样返回），
    /// 快照与当前值一致并进入 Persisted。原子属性的初始值必须能转换为数值，
    /// 否则在发出请求前返回 `AtomicTypeError`。失败时实例保持不变。
    pub(crate) async fn insert_instance(&self, instance: &mut ModelInstance) -> DocSyncResult<()> {
        if let Some(hooks) = &self.meta().hooks {
            hooks.before_save(instance).await?;
        }

        let mut document = instance.to_document();
        coerce_atomic_fields(self.meta(), &mut document)?;
        debug!(
            "处理插入请求: collection={}, fields={}",
            self.collection_name(),
            document.len()
        );

        let outcome = self
            .driver()
            .insert(self.collection_name(), document)
            .await
            .map_err(DocSyncError::into_validation)?;

        let id = coerce_primary_key(&outcome.assigned_id)
            .ok()
            .flatten()
            .or(instance.primary())
            .ok_or_else(|| {
                crate::docsync_error!(
                    transport,
                    format!("存储端未返回可用的主键: {}", outcome.assigned_id)
                )
            })?;

        instance.mark_inserted(id);
        debug!("插入成功: collection={}, _id={}", self.collection_name(), id);

        if let Some(hooks) = &self.meta().hooks {
            hooks.after_save(instance).await;
        }
        Ok(())
    }
}
