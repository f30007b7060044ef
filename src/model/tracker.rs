//! 变更追踪
//!
//! 比较实例当前值与最近一次持久化的快照，得到分类后的变更集。

use crate::error::DocSyncResult;
use crate::model::field_types::ModelMeta;
use crate::model::instance::ModelInstance;
use crate::types::{DataValue, Document, UpdateSpec};
use rat_logger::debug;
use std::collections::BTreeSet;

/// 变更集
///
/// 三部分互不相交：一个属性最多出现在其中一处。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeSet {
    /// 非原子属性的新值
    pub assign: Document,
    /// 被显式清除的非原子属性
    pub clear: BTreeSet<String>,
    /// 原子属性的增量
    pub increment: Document,
}

impl ChangeSet {
    /// 是否没有任何变更
    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.clear.is_empty() && self.increment.is_empty()
    }

    /// 涉及的属性数量
    pub fn len(&self) -> usize {
        self.assign.len() + self.clear.len() + self.increment.len()
    }
}

impl From<ChangeSet> for UpdateSpec {
    fn from(changes: ChangeSet) -> Self {
        UpdateSpec {
            set: changes.assign,
            unset: changes.clear,
            inc: changes.increment,
        }
    }
}

/// 计算实例的变更集
///
/// 只考虑已声明且出现在当前值中的属性；
/// 从未加载也未在本地修改的属性不会出现在结果里。
/// 原子属性的当前值被解释为增量，必须能转换为数值。
pub fn compute_change_set(instance: &ModelInstance) -> DocSyncResult<ChangeSet> {
    let meta = instance.meta();
    let current = instance.attrs();
    let snapshot = instance.snapshot();
    let mut changes = ChangeSet::default();

    for field in &meta.fields {
        let name = field.name.as_str();
        let value = match current.get(name) {
            Some(value) => value,
            // 未出现在当前值中的属性没有被观察或修改过
            None => continue,
        };

        if snapshot.get(name) == Some(value) {
            continue;
        }

        if field.atomic {
            changes.increment.insert(name.to_string(), atomic_number(name, value)?);
        } else if value.is_undefined() {
            changes.clear.insert(name.to_string());
        } else {
            changes.assign.insert(name.to_string(), value.clone());
        }
    }

    debug!(
        "计算变更集: model={}, assign={}, clear={}, increment={}",
        meta.name,
        changes.assign.len(),
        changes.clear.len(),
        changes.increment.len()
    );

    Ok(changes)
}

fn atomic_number(name: &str, value: &DataValue) -> DocSyncResult<DataValue> {
    value
        .to_number()
        .ok_or_else(|| crate::docsync_error!(atomic, name))
}

/// 把待插入文档中的原子属性转换为数值
///
/// 插入时原子属性写入的是初始值，同样必须能转换为数值。
pub(crate) fn coerce_atomic_fields(meta: &ModelMeta, document: &mut Document) -> DocSyncResult<()> {
    for field in meta.fields.iter().filter(|field| field.atomic) {
        if let Some(value) = document.get_mut(&field.name) {
            *value = atomic_number(&field.name, value)?;
        }
    }
    Ok(())
}
