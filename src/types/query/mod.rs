use crate::types::data_value::{DataValue, Document};
use crate::types::id_types::ObjectId;
use serde::{Deserialize, Serialize};

/// 排序方向
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// 升序
    Asc,
    /// 降序
    Desc,
}

impl SortDirection {
    /// MongoDB 风格的方向值（1 / -1）
    pub fn as_i32(&self) -> i32 {
        match self {
            SortDirection::Asc => 1,
            SortDirection::Desc => -1,
        }
    }
}

/// 排序配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortConfig {
    /// 字段名
    pub field: String,
    /// 排序方向
    pub direction: SortDirection,
}

/// 查询选项
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FindOptions {
    /// 排序配置
    pub sort: Vec<SortConfig>,
    /// 跳过的记录数
    pub skip: Option<u64>,
    /// 限制返回的记录数
    pub limit: Option<i64>,
    /// 返回的字段（None 表示全部字段，`_id` 总是返回）
    pub fields: Option<Vec<String>>,
}

impl FindOptions {
    /// 创建新的查询选项
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加排序
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort.push(SortConfig {
            field: field.into(),
            direction,
        });
        self
    }

    /// 设置跳过数量
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// 设置返回数量
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 设置字段选择
    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }
}

/// 查找条件
///
/// 对应调用方传入的三种形态：主键、过滤文档、未给出。
#[derive(Debug, Clone, PartialEq)]
pub enum Criteria {
    /// 未给出条件（`get` 直接返回未找到）
    None,
    /// 主键的十六进制字符串
    IdString(String),
    /// 主键
    Id(ObjectId),
    /// 过滤文档
    Filter(Document),
}

impl From<ObjectId> for Criteria {
    fn from(value: ObjectId) -> Self {
        Criteria::Id(value)
    }
}

impl From<&str> for Criteria {
    fn from(value: &str) -> Self {
        Criteria::IdString(value.to_string())
    }
}

impl From<String> for Criteria {
    fn from(value: String) -> Self {
        Criteria::IdString(value)
    }
}

impl From<Document> for Criteria {
    fn from(value: Document) -> Self {
        Criteria::Filter(value)
    }
}

impl<T> From<Option<T>> for Criteria
where
    T: Into<Criteria>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Criteria::None,
        }
    }
}

/// 构建按主键过滤的文档
pub fn id_filter(id: ObjectId) -> Document {
    let mut filter = Document::new();
    filter.insert(crate::PRIMARY_KEY.to_string(), DataValue::ObjectId(id));
    filter
}
