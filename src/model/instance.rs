//! 模型实例
//!
//! 实例由两部分组成：框架持有的属性映射，以及同步层独占的追踪状态
//! （主键、生命周期状态、最近一次持久化的快照）。

use crate::PRIMARY_KEY;
use crate::error::DocSyncResult;
use crate::model::conversion::{coerce_primary_key, coerce_value};
use crate::model::document;
use crate::model::field_types::ModelMeta;
use crate::types::{DataValue, Document, ObjectId};
use std::sync::Arc;

/// 实例生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncState {
    /// 尚未插入
    New,
    /// 已与存储端同步
    Persisted,
    /// 已删除
    Removed,
}

/// 同步层追踪的实例状态
#[derive(Debug, Clone)]
pub struct TrackedState {
    primary: Option<ObjectId>,
    state: SyncState,
    snapshot: Document,
}

impl TrackedState {
    fn new() -> Self {
        Self {
            primary: None,
            state: SyncState::New,
            snapshot: Document::new(),
        }
    }
}

/// 模型实例
#[derive(Debug, Clone)]
pub struct ModelInstance {
    meta: Arc<ModelMeta>,
    attrs: Document,
    tracked: TrackedState,
}

impl ModelInstance {
    /// 创建空实例
    pub fn new(meta: Arc<ModelMeta>) -> Self {
        Self {
            meta,
            attrs: Document::new(),
            tracked: TrackedState::new(),
        }
    }

    /// 由原始数据构造实例
    ///
    /// 每个已声明属性都会按类型转换；`_id` 作为调用方指定的主键，
    /// 字符串形式会被转换为ObjectId。
    pub fn with_attrs(meta: Arc<ModelMeta>, attrs: Document) -> DocSyncResult<Self> {
        let mut instance = Self::new(meta);
        for (name, value) in attrs {
            instance.set(name, value)?;
        }
        Ok(instance)
    }

    /// 从存储端文档还原实例
    ///
    /// 只填充文档中出现的属性，快照与之完全一致。
    pub(crate) fn hydrate(meta: Arc<ModelMeta>, doc: Document) -> DocSyncResult<Self> {
        let mut instance = Self::new(meta);
        for (name, value) in doc {
            if name == PRIMARY_KEY {
                instance.tracked.primary = coerce_primary_key(&value)?;
                continue;
            }
            if let Some(field) = instance.meta.get_field(&name) {
                let value = coerce_value(field, value)?;
                instance.attrs.insert(name, value);
            }
        }
        instance.tracked.snapshot = instance.attrs.clone();
        instance.tracked.state = SyncState::Persisted;
        Ok(instance)
    }

    /// 模型元数据
    pub fn meta(&self) -> &Arc<ModelMeta> {
        &self.meta
    }

    /// 读取属性，未加载也未设置时返回 None
    pub fn get(&self, name: &str) -> Option<&DataValue> {
        self.attrs.get(name)
    }

    /// 设置属性（按声明类型转换）
    ///
    /// 设置 `_id` 只在实例尚未插入时有效。
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<DataValue>) -> DocSyncResult<()> {
        let name = name.into();
        let value = value.into();

        if name == PRIMARY_KEY {
            return self.set_primary(value);
        }

        let field = self.meta.get_field(&name).ok_or_else(|| {
            crate::docsync_error!(
                validation,
                name,
                format!("模型 {} 未声明该属性", self.meta.name)
            )
        })?;
        let value = coerce_value(field, value)?;
        self.attrs.insert(name, value);
        Ok(())
    }

    /// 批量设置属性
    pub fn set_many(&mut self, attrs: Document) -> DocSyncResult<()> {
        for (name, value) in attrs {
            self.set(name, value)?;
        }
        Ok(())
    }

    /// 显式清除属性，下次保存时生成 `$unset`
    pub fn unset(&mut self, name: impl Into<String>) -> DocSyncResult<()> {
        self.set(name, DataValue::Undefined)
    }

    fn set_primary(&mut self, value: DataValue) -> DocSyncResult<()> {
        let id = coerce_primary_key(&value)?;
        if self.tracked.state != SyncState::New {
            if id == self.tracked.primary {
                return Ok(());
            }
            return Err(crate::docsync_error!(
                validation,
                PRIMARY_KEY,
                "主键在插入后不可修改"
            ));
        }
        self.tracked.primary = id;
        Ok(())
    }

    /// 当前属性
    pub fn attrs(&self) -> &Document {
        &self.attrs
    }

    /// 主键
    pub fn primary(&self) -> Option<ObjectId> {
        self.tracked.primary
    }

    /// 生命周期状态
    pub fn state(&self) -> SyncState {
        self.tracked.state
    }

    pub fn is_new(&self) -> bool {
        self.tracked.state == SyncState::New
    }

    /// 最近一次持久化的快照
    pub fn snapshot(&self) -> &Document {
        &self.tracked.snapshot
    }

    /// 持久化映射（尊重模型的覆盖函数）
    pub fn to_document(&self) -> Document {
        document::to_document(self)
    }

    /// 对外映射（尊重模型的覆盖函数）
    pub fn to_external(&self) -> Document {
        document::to_external(self)
    }

    /// 对外映射的 JSON 形式
    pub fn to_json(&self) -> serde_json::Value {
        crate::types::document_to_json(&self.to_external())
    }

    /// 插入成功：记录主键、快照并进入 Persisted
    pub(crate) fn mark_inserted(&mut self, id: ObjectId) {
        self.tracked.primary = Some(id);
        self.tracked.state = SyncState::Persisted;
        self.commit_snapshot();
    }

    /// 更新成功：快照与当前值一致
    pub(crate) fn commit_snapshot(&mut self) {
        self.tracked.snapshot = self.attrs.clone();
    }

    /// 删除成功
    pub(crate) fn mark_removed(&mut self) {
        self.tracked.state = SyncState::Removed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use crate::model::field_types::{any_field, datetime_field};

    fn meta() -> Arc<ModelMeta> {
        ModelMeta::new("Ticket")
            .field(any_field("message"))
            .field(datetime_field("created"))
            .build()
    }

    #[test]
    fn test_with_attrs_coerces() {
        let instance = ModelInstance::with_attrs(
            meta(),
            document! { "message" => "hi", "created" => "2014-01-01" },
        )
        .unwrap();
        assert!(instance.get("created").unwrap().as_datetime().is_some());
        assert!(instance.is_new());
        assert!(instance.snapshot().is_empty());
    }

    #[test]
    fn test_string_primary_key() {
        let id = ObjectId::new();
        let instance =
            ModelInstance::with_attrs(meta(), document! { "_id" => id.to_hex() }).unwrap();
        assert_eq!(instance.primary(), Some(id));
        assert!(instance.get("_id").is_none());
    }

    #[test]
    fn test_undeclared_attribute_rejected() {
        let mut instance = ModelInstance::new(meta());
        assert!(instance.set("unknown", 1).is_err());
    }

    #[test]
    fn test_primary_key_immutable_after_insert() {
        let mut instance = ModelInstance::new(meta());
        let id = ObjectId::new();
        instance.mark_inserted(id);
        assert!(instance.set("_id", ObjectId::new()).is_err());
        assert!(instance.set("_id", id).is_ok());
        assert_eq!(instance.primary(), Some(id));
    }

    #[test]
    fn test_hydrate_snapshot_matches_document() {
        let id = ObjectId::new();
        let instance = ModelInstance::hydrate(
            meta(),
            document! { "_id" => id, "message" => "hello", "ignored" => 1 },
        )
        .unwrap();
        assert_eq!(instance.state(), SyncState::Persisted);
        assert_eq!(instance.primary(), Some(id));
        assert_eq!(instance.snapshot(), instance.attrs());
        assert!(instance.get("ignored").is_none());
        assert!(instance.get("created").is_none());
    }
}
