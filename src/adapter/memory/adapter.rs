//! 内存驱动核心模块
//!
//! 集合以插入顺序保存文档；唯一索引为稀疏索引：缺失的字段不参与冲突检测，显式的 null 参与。

use crate::PRIMARY_KEY;
use crate::error::DocSyncResult;
use crate::types::{DataValue, Document, ObjectId};
use parking_lot::Mutex;
use rat_logger::debug;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// 稀疏索引中字段的取值，缺失字段不被索引
pub(crate) fn indexed_value<'a>(doc: &'a Document, field: &str) -> Option<&'a DataValue> {
    doc.get(field).filter(|value| !value.is_undefined())
}

/// 单个集合
#[derive(Debug, Default, Clone)]
pub(crate) struct MemoryCollection {
    pub(crate) docs: Vec<Document>,
    pub(crate) indexes: BTreeSet<String>,
    pub(crate) unique_fields: BTreeSet<String>,
}

impl MemoryCollection {
    /// 按主键查找文档位置
    pub(crate) fn position(&self, id: ObjectId) -> Option<usize> {
        self.docs
            .iter()
            .position(|doc| doc.get(PRIMARY_KEY).and_then(|v| v.as_object_id()) == Some(id))
    }

    /// 检查唯一约束，`skip` 为正在被替换的文档位置
    pub(crate) fn check_unique(
        &self,
        collection: &str,
        candidate: &Document,
        skip: Option<usize>,
    ) -> DocSyncResult<()> {
        let keys = std::iter::once(PRIMARY_KEY).chain(self.unique_fields.iter().map(String::as_str));
        for field in keys {
            let Some(value) = indexed_value(candidate, field) else {
                continue;
            };
            let conflict = self
                .docs
                .iter()
                .enumerate()
                .any(|(i, doc)| Some(i) != skip && indexed_value(doc, field) == Some(value));
            if conflict {
                return Err(crate::docsync_error!(
                    duplicate,
                    field,
                    format!(
                        "E11000 duplicate key error collection: {} index: {}_1 dup key: {{ {}: {} }}",
                        collection, field, field, value
                    )
                ));
            }
        }
        Ok(())
    }
}

/// 内存驱动
///
/// 所有操作在一把互斥锁内完成，单个请求天然原子。
/// 驱动记录收到的请求数量，便于确认某些操作没有发出任何请求。
#[derive(Debug, Default)]
pub struct MemoryDriver {
    pub(crate) collections: Mutex<HashMap<String, MemoryCollection>>,
    requests: AtomicU64,
}

impl MemoryDriver {
    /// 创建新的内存驱动
    pub fn new() -> Self {
        Self::default()
    }

    /// 已收到的请求数量
    pub fn request_count(&self) -> u64 {
        self.requests.load(Ordering::SeqCst)
    }

    /// 清零请求计数
    pub fn reset_request_count(&self) {
        self.requests.store(0, Ordering::SeqCst);
    }

    /// 集合内全部文档的原始副本（按插入顺序）
    pub fn raw_documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .get(collection)
            .map(|c| c.docs.clone())
            .unwrap_or_default()
    }

    /// 集合名称列表
    pub fn collection_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.collections.lock().keys().cloned().collect();
        names.sort();
        names
    }

    /// 集合上已建立的索引字段
    pub fn index_fields(&self, collection: &str) -> Vec<String> {
        self.collections
            .lock()
            .get(collection)
            .map(|c| c.indexes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// 清空所有集合
    pub fn clear(&self) {
        self.collections.lock().clear();
    }

    pub(crate) fn record(&self, op: &str, collection: &str) {
        let n = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("内存驱动请求 #{}: {} {}", n, op, collection);
    }
}

/// 从文档中取主键，缺失时生成新主键并写回
pub(crate) fn ensure_primary(doc: &mut Document) -> DataValue {
    doc.entry(PRIMARY_KEY.to_string())
        .or_insert_with(|| DataValue::ObjectId(ObjectId::new()))
        .clone()
}
