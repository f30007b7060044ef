//! 查询与聚合构建器
//!
//! 由 `SyncModel::query()` 与 `SyncModel::aggregate()` 创建，每个构建器独立持有自己的状态

pub mod aggregate;
pub mod builder;

pub use aggregate::{AggregateOutput, ModelAggregate};
pub use builder::{ModelQuery, QueryMode};
