//! # 配置构建器模块
//!
//! 提供所有配置类型的构建器实现，支持链式调用和严格验证

pub mod logging_builder;
pub mod mongo_builder;
pub mod sync_builder;

pub use logging_builder::LoggingConfigBuilder;
pub use mongo_builder::MongoConfigBuilder;
pub use sync_builder::DocSyncConfigBuilder;
