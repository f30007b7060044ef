use crate::types::data_value::{DataValue, Document};
use std::collections::BTreeSet;

/// 单次更新请求
///
/// 三部分在同一个请求中发送：`$set`、`$unset`、`$inc`。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateSpec {
    /// 直接设置的字段
    pub set: Document,
    /// 移除的字段
    pub unset: BTreeSet<String>,
    /// 原子递增的字段（值为增量）
    pub inc: Document,
}

impl UpdateSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置字段
    pub fn set(mut self, field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.set.insert(field.into(), value.into());
        self
    }

    /// 移除字段
    pub fn unset(mut self, field: impl Into<String>) -> Self {
        self.unset.insert(field.into());
        self
    }

    /// 原子递增字段
    pub fn inc(mut self, field: impl Into<String>, delta: impl Into<DataValue>) -> Self {
        self.inc.insert(field.into(), delta.into());
        self
    }

    /// 是否为空请求
    pub fn is_empty(&self) -> bool {
        self.set.is_empty() && self.unset.is_empty() && self.inc.is_empty()
    }
}

/// 插入结果
#[derive(Debug, Clone, PartialEq)]
pub struct InsertOutcome {
    /// 存储端最终使用的主键
    pub assigned_id: DataValue,
}

/// 更新结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    /// 匹配的文档数量
    pub matched_count: u64,
}
