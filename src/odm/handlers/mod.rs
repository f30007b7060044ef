//! # 同步操作处理器模块
//!
//! 按操作类型分离的 `SyncModel` 方法实现

pub mod create_handler;
pub mod delete_handler;
pub mod read_handler;
pub mod update_handler;
