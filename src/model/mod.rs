//! 模型模块
//!
//! 属性声明、类型转换、实例状态、变更追踪与文档映射

pub mod conversion;
pub mod document;
pub mod field_types;
pub mod hooks;
pub mod instance;
pub mod tracker;

pub use conversion::{coerce_object_id, coerce_value};
pub use document::{default_mapping, export_value};
pub use field_types::{
    CustomType, DocumentHook, FieldDefinition, FieldType, ModelMeta, any_field, custom_field,
    datetime_field, object_id_field,
};
pub use hooks::ModelHooks;
pub use instance::{ModelInstance, SyncState};
pub use tracker::{ChangeSet, compute_change_set};
