//! 内存驱动模块
//!
//! 进程内的文档存储，行为与MongoDB的常用子集一致：
//! - adapter.rs: 核心驱动结构与集合存储
//! - operations.rs: StoreDriver trait实现
//! - matcher.rs: 过滤、排序与投影
//! - aggregate.rs: 聚合管道

pub mod adapter;
pub mod aggregate;
pub mod matcher;
pub mod operations;

// 重新导出核心类型
pub use adapter::MemoryDriver;
