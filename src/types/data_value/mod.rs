use crate::types::id_types::ObjectId;
use base64::Engine;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 文档类型：字段名到值的有序映射
pub type Document = BTreeMap<String, DataValue>;

/// 自带序列化能力的值
///
/// 实现此特征的值在映射为文档时调用 `to_data_value`，
/// 其余值一律按普通结构值深拷贝。
pub trait Serializable: Send + Sync + std::fmt::Debug {
    /// 转换为可持久化的普通值
    fn to_data_value(&self) -> DataValue;

    /// 类型名称，用于日志
    fn type_name(&self) -> &'static str {
        "custom"
    }
}

/// 通用数据值类型
#[derive(Clone)]
pub enum DataValue {
    /// 显式清除的字段（保存时生成 $unset）
    Undefined,
    /// 空值
    Null,
    /// 布尔值
    Bool(bool),
    /// 整数
    Int(i64),
    /// 浮点数
    Float(f64),
    /// 字符串
    String(String),
    /// 字节数组
    Bytes(Vec<u8>),
    /// 日期时间
    DateTime(DateTime<FixedOffset>),
    /// 12字节标识符
    ObjectId(ObjectId),
    /// 数组
    Array(Vec<DataValue>),
    /// 对象/文档
    Object(Document),
    /// 自带序列化的值
    Custom(Arc<dyn Serializable>),
}

impl PartialEq for DataValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DataValue::Undefined, DataValue::Undefined) => true,
            (DataValue::Null, DataValue::Null) => true,
            (DataValue::Bool(a), DataValue::Bool(b)) => a == b,
            (DataValue::Int(a), DataValue::Int(b)) => a == b,
            (DataValue::Float(a), DataValue::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            // 数值跨类型按值比较，存储端可能把整数浮点化
            (DataValue::Int(a), DataValue::Float(b)) | (DataValue::Float(b), DataValue::Int(a)) => {
                (*a as f64) == *b
            }
            (DataValue::String(a), DataValue::String(b)) => a == b,
            (DataValue::Bytes(a), DataValue::Bytes(b)) => a == b,
            (DataValue::DateTime(a), DataValue::DateTime(b)) => a == b,
            (DataValue::ObjectId(a), DataValue::ObjectId(b)) => a == b,
            (DataValue::Array(a), DataValue::Array(b)) => a == b,
            (DataValue::Object(a), DataValue::Object(b)) => a == b,
            (DataValue::Custom(a), DataValue::Custom(b)) => a.to_data_value() == b.to_data_value(),
            (DataValue::Custom(a), b) => &a.to_data_value() == b,
            (a, DataValue::Custom(b)) => a == &b.to_data_value(),
            _ => false,
        }
    }
}

impl std::fmt::Display for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DataValue::Undefined => write!(f, "undefined"),
            DataValue::Null => write!(f, "null"),
            DataValue::Bool(b) => write!(f, "{}", b),
            DataValue::Int(i) => write!(f, "{}", i),
            DataValue::Float(fl) => write!(f, "{}", fl),
            DataValue::String(s) => write!(f, "{}", s),
            DataValue::Bytes(bytes) => write!(f, "[{} bytes]", bytes.len()),
            DataValue::DateTime(dt) => write!(f, "{}", dt.to_rfc3339()),
            DataValue::ObjectId(oid) => write!(f, "ObjectId({})", oid),
            DataValue::Custom(c) => write!(f, "{}", c.to_data_value()),
            DataValue::Array(_) | DataValue::Object(_) => write!(f, "{}", self.to_json_value()),
        }
    }
}

impl std::fmt::Debug for DataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Debug 与 Display 保持一致，显示实际值而不是类型构造函数
        write!(f, "{}", self)
    }
}

impl DataValue {
    /// 获取数据类型名称
    pub fn type_name(&self) -> &'static str {
        match self {
            DataValue::Undefined => "undefined",
            DataValue::Null => "null",
            DataValue::Bool(_) => "boolean",
            DataValue::Int(_) => "integer",
            DataValue::Float(_) => "float",
            DataValue::String(_) => "string",
            DataValue::Bytes(_) => "bytes",
            DataValue::DateTime(_) => "datetime",
            DataValue::ObjectId(_) => "object_id",
            DataValue::Array(_) => "array",
            DataValue::Object(_) => "object",
            DataValue::Custom(c) => c.type_name(),
        }
    }

    /// 判断是否为空值
    pub fn is_null(&self) -> bool {
        matches!(self, DataValue::Null)
    }

    /// 判断是否为显式清除标记
    pub fn is_undefined(&self) -> bool {
        matches!(self, DataValue::Undefined)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DataValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            DataValue::Int(i) => Some(*i),
            DataValue::Float(f) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            DataValue::Int(i) => Some(*i as f64),
            DataValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            DataValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_object_id(&self) -> Option<ObjectId> {
        match self {
            DataValue::ObjectId(oid) => Some(*oid),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<&DateTime<FixedOffset>> {
        match self {
            DataValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            DataValue::Object(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<DataValue>> {
        match self {
            DataValue::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// 解释为数值
    ///
    /// 整数和浮点直接返回，数值字符串（如 "29"、"7.50"）被解析；
    /// 其他类型返回 None。
    pub fn to_number(&self) -> Option<DataValue> {
        match self {
            DataValue::Int(i) => Some(DataValue::Int(*i)),
            DataValue::Float(f) if f.is_finite() => Some(DataValue::Float(*f)),
            DataValue::String(s) => {
                let trimmed = s.trim();
                if let Ok(i) = trimmed.parse::<i64>() {
                    Some(DataValue::Int(i))
                } else {
                    trimmed
                        .parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(DataValue::Float)
                }
            }
            DataValue::Custom(c) => c.to_data_value().to_number(),
            _ => None,
        }
    }

    /// 转换为 JSON 值
    pub fn to_json_value(&self) -> serde_json::Value {
        match self {
            DataValue::Undefined | DataValue::Null => serde_json::Value::Null,
            DataValue::Bool(b) => serde_json::Value::Bool(*b),
            DataValue::Int(i) => serde_json::Value::Number(serde_json::Number::from(*i)),
            DataValue::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            DataValue::String(s) => serde_json::Value::String(s.clone()),
            DataValue::Bytes(b) => {
                // 将字节数组转换为 base64 字符串
                serde_json::Value::String(base64::engine::general_purpose::STANDARD.encode(b))
            }
            DataValue::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            DataValue::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
            DataValue::Array(arr) => {
                serde_json::Value::Array(arr.iter().map(|v| v.to_json_value()).collect())
            }
            DataValue::Object(obj) => {
                let json_object: serde_json::Map<String, serde_json::Value> = obj
                    .iter()
                    .filter(|(_, v)| !v.is_undefined())
                    .map(|(k, v)| (k.clone(), v.to_json_value()))
                    .collect();
                serde_json::Value::Object(json_object)
            }
            DataValue::Custom(c) => c.to_data_value().to_json_value(),
        }
    }

    /// 转换为 JSON 字符串
    pub fn to_json_string(&self) -> String {
        self.to_json_value().to_string()
    }
}

impl serde::Serialize for DataValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json_value().serialize(serializer)
    }
}

impl From<bool> for DataValue {
    fn from(value: bool) -> Self {
        DataValue::Bool(value)
    }
}

impl From<i32> for DataValue {
    fn from(value: i32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<i64> for DataValue {
    fn from(value: i64) -> Self {
        DataValue::Int(value)
    }
}

impl From<u32> for DataValue {
    fn from(value: u32) -> Self {
        DataValue::Int(value as i64)
    }
}

impl From<f32> for DataValue {
    fn from(value: f32) -> Self {
        DataValue::Float(value as f64)
    }
}

impl From<f64> for DataValue {
    fn from(value: f64) -> Self {
        DataValue::Float(value)
    }
}

impl From<String> for DataValue {
    fn from(value: String) -> Self {
        DataValue::String(value)
    }
}

impl From<&str> for DataValue {
    fn from(value: &str) -> Self {
        DataValue::String(value.to_string())
    }
}

impl From<Vec<u8>> for DataValue {
    fn from(value: Vec<u8>) -> Self {
        DataValue::Bytes(value)
    }
}

impl From<DateTime<Utc>> for DataValue {
    fn from(value: DateTime<Utc>) -> Self {
        DataValue::DateTime(value.into())
    }
}

impl From<DateTime<FixedOffset>> for DataValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        DataValue::DateTime(value)
    }
}

impl From<ObjectId> for DataValue {
    fn from(value: ObjectId) -> Self {
        DataValue::ObjectId(value)
    }
}

impl From<Vec<DataValue>> for DataValue {
    fn from(value: Vec<DataValue>) -> Self {
        DataValue::Array(value)
    }
}

impl From<Document> for DataValue {
    fn from(value: Document) -> Self {
        DataValue::Object(value)
    }
}

impl From<serde_json::Value> for DataValue {
    fn from(value: serde_json::Value) -> Self {
        json_value_to_data_value(value)
    }
}

impl<T> From<Option<T>> for DataValue
where
    T: Into<DataValue>,
{
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => DataValue::Null,
        }
    }
}

/// 将 serde_json::Value 转换为对应的 DataValue 类型
pub fn json_value_to_data_value(value: serde_json::Value) -> DataValue {
    match value {
        serde_json::Value::Null => DataValue::Null,
        serde_json::Value::Bool(b) => DataValue::Bool(b),
        serde_json::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                DataValue::Int(i)
            } else if let Some(f) = n.as_f64() {
                DataValue::Float(f)
            } else {
                DataValue::String(n.to_string())
            }
        }
        serde_json::Value::String(s) => DataValue::String(s),
        serde_json::Value::Array(arr) => {
            DataValue::Array(arr.into_iter().map(json_value_to_data_value).collect())
        }
        serde_json::Value::Object(obj) => DataValue::Object(
            obj.into_iter()
                .map(|(k, v)| (k, json_value_to_data_value(v)))
                .collect(),
        ),
    }
}

/// 文档转 JSON 对象
pub fn document_to_json(doc: &Document) -> serde_json::Value {
    DataValue::Object(doc.clone()).to_json_value()
}

/// 快速构建文档
///
/// ```
/// use rat_docsync::document;
/// let doc = document! { "name" => "Ryan", "age" => 30 };
/// assert_eq!(doc.len(), 2);
/// ```
#[macro_export]
macro_rules! document {
    () => {
        $crate::types::Document::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut doc = $crate::types::Document::new();
        $(
            doc.insert($key.to_string(), $crate::types::DataValue::from($value));
        )+
        doc
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_equality() {
        assert_eq!(DataValue::Float(f64::NAN), DataValue::Float(f64::NAN));
        assert_ne!(DataValue::Float(f64::NAN), DataValue::Float(1.0));
        assert_eq!(DataValue::Int(3), DataValue::Float(3.0));
        assert_ne!(DataValue::Int(3), DataValue::Float(f64::NAN));
    }
}
