//! # 模型同步器
//!
//! `SyncModel` 把一个模型绑定到一个存储驱动和一个集合。
//! 只持有 `Arc`，可以自由克隆并跨任务共享。

use crate::PRIMARY_KEY;
use crate::adapter::StoreDriver;
use crate::error::DocSyncResult;
use crate::manager;
use crate::model::{ModelInstance, ModelMeta, SyncState};
use crate::query::{ModelAggregate, ModelQuery};
use crate::types::Document;
use futures::future::try_join_all;
use rat_logger::{info, warn};
use std::sync::Arc;

/// 模型同步器
#[derive(Clone)]
pub struct SyncModel {
    meta: Arc<ModelMeta>,
    driver: Arc<dyn StoreDriver>,
}

impl SyncModel {
    /// 绑定模型与驱动，不创建索引
    pub fn new(meta: Arc<ModelMeta>, driver: Arc<dyn StoreDriver>) -> Self {
        Self { meta, driver }
    }

    /// 绑定模型与驱动，并为唯一属性建立索引
    pub async fn bind(meta: Arc<ModelMeta>, driver: Arc<dyn StoreDriver>) -> DocSyncResult<Self> {
        let model = Self::new(meta, driver);
        model.ensure_indexes().await?;
        info!(
            "模型已绑定: model={}, collection={}, driver={}",
            model.meta.name,
            model.meta.collection_name,
            model.driver.name()
        );
        Ok(model)
    }

    /// 按模型声明的别名从全局注册表取驱动并绑定
    pub async fn from_registry(meta: Arc<ModelMeta>) -> DocSyncResult<Self> {
        let driver = manager::get_driver(meta.database_alias.as_deref())?;
        Self::bind(meta, driver).await
    }

    /// 为每个唯一属性建立唯一索引
    pub async fn ensure_indexes(&self) -> DocSyncResult<()> {
        let requests = self.meta.unique_fields().map(|field| async move {
            self.driver
                .create_index(self.collection_name(), &field.name, true)
                .await?;
            info!("已建立唯一索引: {}.{}", self.collection_name(), field.name);
            Ok::<_, crate::error::DocSyncError>(())
        });
        try_join_all(requests).await?;
        Ok(())
    }

    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    pub fn driver(&self) -> &Arc<dyn StoreDriver> {
        &self.driver
    }

    /// 绑定的集合名
    pub fn collection_name(&self) -> &str {
        &self.meta.collection_name
    }

    /// 创建空实例
    pub fn instance(&self) -> ModelInstance {
        ModelInstance::new(self.meta.clone())
    }

    /// 由原始数据创建新实例（尚未插入）
    pub fn build(&self, attrs: Document) -> DocSyncResult<ModelInstance> {
        ModelInstance::with_attrs(self.meta.clone(), attrs)
    }

    /// 新的查询构建器，每次调用都是独立的
    pub fn query(&self) -> ModelQuery {
        ModelQuery::new(self.clone())
    }

    /// 新的聚合构建器；`unwrapped` 为 true 时返回原始行
    pub fn aggregate(&self, unwrapped: bool) -> ModelAggregate {
        ModelAggregate::new(self.clone(), unwrapped)
    }

    /// 保存实例：新实例插入，已持久化实例按变更集更新
    pub async fn save(&self, instance: &mut ModelInstance) -> DocSyncResult<()> {
        self.check_model(instance)?;
        match instance.state() {
            SyncState::New => self.insert_instance(instance).await,
            SyncState::Persisted => self.update_instance(instance).await,
            SyncState::Removed => {
                warn!(
                    "拒绝保存已删除的实例: model={}, id={:?}",
                    self.meta.name,
                    instance.primary()
                );
                Err(crate::docsync_error!(
                    validation,
                    PRIMARY_KEY,
                    "记录已被删除，无法保存"
                ))
            }
        }
    }

    /// 实例必须由同一份模型定义创建，同名的其他定义不算
    pub(crate) fn check_model(&self, instance: &ModelInstance) -> DocSyncResult<()> {
        if Arc::ptr_eq(instance.meta(), &self.meta) {
            Ok(())
        } else {
            Err(crate::docsync_error!(
                validation,
                PRIMARY_KEY,
                format!(
                    "实例属于模型 {}，不能由模型 {} 同步",
                    instance.meta().name,
                    self.meta.name
                )
            ))
        }
    }
}

impl std::fmt::Debug for SyncModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncModel")
            .field("model", &self.meta.name)
            .field("collection", &self.meta.collection_name)
            .field("driver", &self.driver.name())
            .finish()
    }
}
