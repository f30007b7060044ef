//! MongoDB驱动模块
//!
//! 提供MongoDB文档存储的驱动实现，采用模块化设计：
//! - adapter.rs: 核心驱动结构与连接
//! - operations.rs: StoreDriver trait实现
//! - utils.rs: BSON数据转换与错误映射

pub mod adapter;
pub mod operations;
pub mod utils;

// 重新导出核心类型
pub use adapter::MongoDriver;
