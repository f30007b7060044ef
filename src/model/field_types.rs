//! 字段类型定义模块
//!
//! 定义模型属性的声明类型、标志位以及模型元数据

use crate::error::DocSyncResult;
use crate::model::hooks::ModelHooks;
use crate::model::instance::ModelInstance;
use crate::types::{DataValue, Document};
use std::sync::Arc;

/// 自定义属性类型
///
/// 由模型定义方提供，负责把原始输入转换为规范值。
pub trait CustomType: Send + Sync + std::fmt::Debug {
    /// 类型名称
    fn name(&self) -> &str;

    /// 转换原始值，必须是幂等的
    fn coerce(&self, field: &str, raw: DataValue) -> DocSyncResult<DataValue>;
}

/// 属性声明类型
#[derive(Debug, Clone)]
pub enum FieldType {
    /// 未声明类型，原样保存
    Any,
    /// 日期时间
    DateTime,
    /// 12字节标识符
    ObjectId,
    /// 自定义类型
    Custom(Arc<dyn CustomType>),
}

/// 属性定义
#[derive(Debug, Clone)]
pub struct FieldDefinition {
    /// 属性名
    pub name: String,
    /// 声明类型
    pub field_type: FieldType,
    /// 是否唯一（绑定时创建唯一索引）
    pub unique: bool,
    /// 是否原子字段
    pub atomic: bool,
    /// 字段描述
    pub description: Option<String>,
}

impl FieldDefinition {
    /// 创建新的字段定义
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
            unique: false,
            atomic: false,
            description: None,
        }
    }

    /// 设置为唯一字段
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// 设置为原子字段
    ///
    /// 注意：原子字段上本地赋的值被解释为**增量**而不是绝对值。
    /// 保存时发送 `$inc: { field: 赋的值 }`，存储端完成累加；
    /// 调用方要递增计数器应赋增量（如 `1`），而不是新的计数值。
    pub fn atomic(mut self) -> Self {
        self.atomic = true;
        self
    }

    /// 设置字段描述
    pub fn description(mut self, desc: &str) -> Self {
        self.description = Some(desc.to_string());
        self
    }
}

/// 创建无类型字段
pub fn any_field(name: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldType::Any)
}

/// 创建日期时间字段
pub fn datetime_field(name: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldType::DateTime)
}

/// 创建ObjectId字段
pub fn object_id_field(name: impl Into<String>) -> FieldDefinition {
    FieldDefinition::new(name, FieldType::ObjectId)
}

/// 创建自定义类型字段
pub fn custom_field(name: impl Into<String>, custom: Arc<dyn CustomType>) -> FieldDefinition {
    FieldDefinition::new(name, FieldType::Custom(custom))
}

/// 文档映射覆盖函数
pub type DocumentHook = Arc<dyn Fn(&ModelInstance) -> Document + Send + Sync>;

/// 模型元数据
#[derive(Clone)]
pub struct ModelMeta {
    /// 模型名称
    pub name: String,
    /// 集合名（默认与模型名相同）
    pub collection_name: String,
    /// 驱动别名（None 使用默认别名）
    pub database_alias: Option<String>,
    /// 属性定义（按声明顺序）
    pub fields: Vec<FieldDefinition>,
    /// 持久化映射覆盖
    pub to_document: Option<DocumentHook>,
    /// 对外映射覆盖
    pub to_external: Option<DocumentHook>,
    /// 生命周期钩子
    pub hooks: Option<Arc<dyn ModelHooks>>,
}

impl ModelMeta {
    /// 创建模型元数据，集合名默认为模型名
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            collection_name: name.clone(),
            name,
            database_alias: None,
            fields: Vec::new(),
            to_document: None,
            to_external: None,
            hooks: None,
        }
    }

    /// 声明属性
    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.retain(|f| f.name != field.name);
        self.fields.push(field);
        self
    }

    /// 显式指定集合名
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection_name = collection.into();
        self
    }

    /// 指定驱动别名
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.database_alias = Some(alias.into());
        self
    }

    /// 覆盖持久化映射
    pub fn with_to_document<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ModelInstance) -> Document + Send + Sync + 'static,
    {
        self.to_document = Some(Arc::new(hook));
        self
    }

    /// 覆盖对外映射
    pub fn with_to_external<F>(mut self, hook: F) -> Self
    where
        F: Fn(&ModelInstance) -> Document + Send + Sync + 'static,
    {
        self.to_external = Some(Arc::new(hook));
        self
    }

    /// 设置生命周期钩子
    pub fn with_hooks(mut self, hooks: Arc<dyn ModelHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// 查找属性定义
    pub fn get_field(&self, name: &str) -> Option<&FieldDefinition> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// 唯一属性
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.iter().filter(|f| f.unique)
    }

    /// 完成定义
    pub fn build(self) -> Arc<ModelMeta> {
        Arc::new(self)
    }
}

impl std::fmt::Debug for ModelMeta {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelMeta")
            .field("name", &self.name)
            .field("collection_name", &self.collection_name)
            .field("database_alias", &self.database_alias)
            .field("fields", &self.fields)
            .field("to_document", &self.to_document.is_some())
            .field("to_external", &self.to_external.is_some())
            .field("hooks", &self.hooks.is_some())
            .finish()
    }
}
