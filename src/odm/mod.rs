//! # 同步层模块
//!
//! 把模型实例的生命周期映射为对存储驱动的请求
//! 按操作类型分离的处理器组织

// 核心模块
pub mod sync_model;

// 请求处理器模块
pub mod handlers;

pub use sync_model::SyncModel;
