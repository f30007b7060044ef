//! 通用数据类型定义
//!
//! 定义值类型、标识符、查询选项与更新请求

pub mod data_value;
pub mod id_types;
pub mod query;
pub mod update_operations;

// 重新导出所有公共类型
pub use data_value::{DataValue, Document, Serializable, document_to_json, json_value_to_data_value};
pub use id_types::{OBJECT_ID_HEX_LEN, ObjectId, ObjectIdParseError};
pub use query::{Criteria, FindOptions, SortConfig, SortDirection, id_filter};
pub use update_operations::{InsertOutcome, UpdateOutcome, UpdateSpec};
