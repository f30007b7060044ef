//! 驱动管理模块
//!
//! 按别名管理存储驱动，模型通过 `ModelMeta::with_alias` 选择驱动

mod driver_registry;

pub use driver_registry::{
    add_driver, get_aliases, get_default_alias, get_driver, remove_driver, set_default_alias,
};
