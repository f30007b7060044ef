//! rat_docsync - 文档数据库同步层
//!
//! 把模型实例与文档存储同步：按声明类型强制转换属性、追踪变更、
//! 以 `$set`/`$unset`/`$inc` 生成最小更新，并把查询结果还原为实例。
//! 支持内存驱动与MongoDB驱动（`mongodb-support` 特性）。

// 导出所有公共模块
pub mod adapter;
pub mod config;
pub mod error;
pub mod manager;
pub mod model;
pub mod odm;
pub mod query;
pub mod types;

// 重新导出常用类型和函数
pub use adapter::{MemoryDriver, StoreDriver};
#[cfg(feature = "mongodb-support")]
pub use adapter::MongoDriver;
pub use config::{
    DocSyncConfig, DocSyncConfigBuilder, LogLevel, LoggingConfig, LoggingConfigBuilder,
    MongoConfig, MongoConfigBuilder, init_logging,
};
pub use error::{DocSyncError, DocSyncResult};
pub use manager::{add_driver, get_aliases, get_driver, set_default_alias};
pub use model::{
    ChangeSet, CustomType, FieldDefinition, FieldType, ModelHooks, ModelInstance, ModelMeta,
    SyncState, any_field, compute_change_set, custom_field, datetime_field, object_id_field,
};
pub use odm::SyncModel;
pub use query::{AggregateOutput, ModelAggregate, ModelQuery, QueryMode};
pub use types::*;

/// 主键字段名
pub const PRIMARY_KEY: &str = "_id";

// 条件编译调试宏 - 只有在 debug 模式下才输出调试信息
#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        rat_logger::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        // 在 release 模式下不输出调试信息
    };
}

/// 库版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 库名称
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// 获取库信息
pub fn get_info() -> String {
    format!("{} v{}", NAME, VERSION)
}
