//! MongoDB工具函数模块
//!
//! 包含BSON数据转换、更新文档构建与驱动错误映射

use crate::error::DocSyncError;
use crate::types::*;
use mongodb::bson::{self, Bson};

/// 唯一键冲突的错误码
pub(crate) const DUPLICATE_KEY_CODE: i32 = 11000;

/// 将DataValue转换为BSON值
pub(crate) fn data_value_to_bson(value: &DataValue) -> Bson {
    match value {
        DataValue::Undefined | DataValue::Null => Bson::Null,
        DataValue::String(s) => Bson::String(s.clone()),
        DataValue::Int(i) => Bson::Int64(*i),
        DataValue::Float(f) => Bson::Double(*f),
        DataValue::Bool(b) => Bson::Boolean(*b),
        DataValue::DateTime(dt) => Bson::DateTime(bson::DateTime::from_millis(dt.timestamp_millis())),
        DataValue::ObjectId(oid) => Bson::ObjectId(*oid),
        DataValue::Bytes(bytes) => Bson::Binary(bson::Binary {
            bytes: bytes.clone(),
            subtype: bson::spec::BinarySubtype::Generic,
        }),
        DataValue::Array(arr) => Bson::Array(arr.iter().map(data_value_to_bson).collect()),
        DataValue::Object(obj) => Bson::Document(document_to_bson(obj)),
        DataValue::Custom(custom) => data_value_to_bson(&custom.to_data_value()),
    }
}

/// 将Document转换为BSON文档，清除标记不写入
pub(crate) fn document_to_bson(doc: &Document) -> bson::Document {
    let mut bson_doc = bson::Document::new();
    for (key, value) in doc.iter().filter(|(_, v)| !v.is_undefined()) {
        bson_doc.insert(key.clone(), data_value_to_bson(value));
    }
    bson_doc
}

/// 将BSON值转换为DataValue
pub(crate) fn bson_to_data_value(bson: &Bson) -> DataValue {
    match bson {
        Bson::String(s) => DataValue::String(s.clone()),
        Bson::Int64(i) => DataValue::Int(*i),
        Bson::Int32(i) => DataValue::Int(*i as i64),
        Bson::Double(d) => DataValue::Float(*d),
        Bson::Boolean(b) => DataValue::Bool(*b),
        Bson::DateTime(dt) => chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
            .map(DataValue::from)
            .unwrap_or(DataValue::Null),
        Bson::ObjectId(oid) => DataValue::ObjectId(*oid),
        Bson::Null | Bson::Undefined => DataValue::Null,
        Bson::Array(arr) => DataValue::Array(arr.iter().map(bson_to_data_value).collect()),
        Bson::Document(doc) => DataValue::Object(bson_to_document(doc)),
        Bson::Binary(bin) => DataValue::Bytes(bin.bytes.clone()),
        Bson::Decimal128(decimal) => DataValue::String(decimal.to_string()),
        // 其他类型按字符串表示
        other => DataValue::String(other.to_string()),
    }
}

/// 将BSON文档转换为Document
pub(crate) fn bson_to_document(doc: &bson::Document) -> Document {
    doc.iter()
        .map(|(key, value)| (key.clone(), bson_to_data_value(value)))
        .collect()
}

/// 构建更新文档：`$set` / `$unset` / `$inc`，空的部分不输出
pub(crate) fn build_update_document(update: &UpdateSpec) -> bson::Document {
    let mut update_doc = bson::Document::new();
    if !update.set.is_empty() {
        update_doc.insert("$set", document_to_bson(&update.set));
    }
    if !update.unset.is_empty() {
        let mut unset_doc = bson::Document::new();
        for field in &update.unset {
            unset_doc.insert(field.clone(), "");
        }
        update_doc.insert("$unset", unset_doc);
    }
    if !update.inc.is_empty() {
        update_doc.insert("$inc", document_to_bson(&update.inc));
    }
    update_doc
}

/// 转换查询选项
pub(crate) fn build_find_options(options: &FindOptions) -> mongodb::options::FindOptions {
    let mut find_options = mongodb::options::FindOptions::default();

    if !options.sort.is_empty() {
        let mut sort_doc = bson::Document::new();
        for sort_field in &options.sort {
            sort_doc.insert(sort_field.field.clone(), sort_field.direction.as_i32());
        }
        find_options.sort = Some(sort_doc);
    }
    find_options.skip = options.skip;
    find_options.limit = options.limit;

    if let Some(fields) = &options.fields {
        let mut projection = bson::Document::new();
        for field in fields {
            projection.insert(field.clone(), 1);
        }
        find_options.projection = Some(projection);
    }
    find_options
}

/// 从冲突消息中取出字段名
///
/// 消息形如 `E11000 duplicate key error collection: db.User index: email_1 dup key: { email: "x" }`
pub(crate) fn duplicate_key_field(message: &str) -> String {
    let index_name = message
        .split("index: ")
        .nth(1)
        .and_then(|rest| rest.split_whitespace().next())
        .unwrap_or("");
    index_name
        .strip_suffix("_-1")
        .or_else(|| index_name.strip_suffix("_1"))
        .unwrap_or(index_name)
        .to_string()
}

/// 映射驱动错误：唯一键冲突为 DuplicateKey，其余为 TransportError
pub(crate) fn map_driver_error(context: &str, err: mongodb::error::Error) -> DocSyncError {
    use mongodb::error::{ErrorKind, WriteFailure};

    let duplicate = match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error))
            if write_error.code == DUPLICATE_KEY_CODE =>
        {
            Some(write_error.message.clone())
        }
        ErrorKind::Command(command_error) if command_error.code == DUPLICATE_KEY_CODE => {
            Some(command_error.message.clone())
        }
        _ => None,
    };

    match duplicate {
        Some(message) => DocSyncError::DuplicateKey {
            field: duplicate_key_field(&message),
            message,
        },
        None => DocSyncError::TransportError {
            message: format!("{}: {}", context, err),
        },
    }
}

impl From<mongodb::error::Error> for DocSyncError {
    fn from(err: mongodb::error::Error) -> Self {
        map_driver_error("MongoDB操作失败", err)
    }
}
