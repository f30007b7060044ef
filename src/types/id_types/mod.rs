//! ObjectId 定义
//!
//! 主键统一使用 bson 的 ObjectId，内存驱动与 MongoDB 驱动共用同一类型。

pub use bson::oid::Error as ObjectIdParseError;
pub use bson::oid::ObjectId;

/// 十六进制字符串长度
pub const OBJECT_ID_HEX_LEN: usize = 24;
