//! 类型强制转换模块
//!
//! 按属性声明类型把原始值转换为规范值。在三处调用：
//! 由原始数据构造实例、调用setter、从存储端还原。
//! 所有转换都是幂等的。

pub mod datetime_conversion;

pub use datetime_conversion::{coerce_datetime, parse_datetime_str};

use crate::error::DocSyncResult;
use crate::model::field_types::{FieldDefinition, FieldType};
use crate::types::{DataValue, ObjectId};

/// 按字段定义转换值
pub fn coerce_value(field: &FieldDefinition, raw: DataValue) -> DocSyncResult<DataValue> {
    match &field.field_type {
        FieldType::Any => Ok(raw),
        FieldType::DateTime => coerce_datetime(&field.name, raw),
        FieldType::ObjectId => coerce_object_id(&field.name, raw),
        FieldType::Custom(custom) => match raw {
            DataValue::Null | DataValue::Undefined => Ok(raw),
            other => custom.coerce(&field.name, other),
        },
    }
}

/// 将原始值转换为ObjectId
///
/// 已是ObjectId、Null、Undefined、空字符串原样返回；
/// 其他字符串必须是24位十六进制。
pub fn coerce_object_id(field: &str, raw: DataValue) -> DocSyncResult<DataValue> {
    match raw {
        DataValue::ObjectId(_) | DataValue::Null | DataValue::Undefined => Ok(raw),
        DataValue::String(ref s) if s.is_empty() => Ok(raw),
        DataValue::String(s) => ObjectId::parse_str(&s)
            .map(DataValue::ObjectId)
            .map_err(|e| crate::docsync_error!(coercion, field, e)),
        DataValue::Bytes(bytes) if bytes.len() == 12 => {
            let mut buf = [0u8; 12];
            buf.copy_from_slice(&bytes);
            Ok(DataValue::ObjectId(ObjectId::from_bytes(buf)))
        }
        other => Err(crate::docsync_error!(
            coercion,
            field,
            format!("不支持的数据类型 {}，期望ObjectId或24位十六进制字符串", other.type_name())
        )),
    }
}

/// 将主键输入转换为ObjectId
pub fn coerce_primary_key(raw: &DataValue) -> DocSyncResult<Option<ObjectId>> {
    match coerce_object_id(crate::PRIMARY_KEY, raw.clone())? {
        DataValue::ObjectId(oid) => Ok(Some(oid)),
        _ => Ok(None),
    }
}
