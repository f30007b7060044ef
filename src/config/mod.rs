//! # 配置管理模块
//!
//! 提供统一的配置管理系统，支持构建器模式和链式配置
//! 构建器中的必需项必须显式设置，缺失时返回 ConfigError

pub mod builders;
pub mod core;
pub mod logging;

// 重新导出所有公共类型
pub use builders::{DocSyncConfigBuilder, LoggingConfigBuilder, MongoConfigBuilder};
pub use self::core::{DocSyncConfig, LogLevel, LoggingConfig, MongoConfig};
pub use logging::init_logging;
