//! 文档映射
//!
//! 把实例属性转换为可持久化文档。模型提供覆盖函数时直接使用其返回值，
//! 不与默认映射合并。

use crate::PRIMARY_KEY;
use crate::model::instance::ModelInstance;
use crate::types::{DataValue, Document};

/// 持久化映射
pub fn to_document(instance: &ModelInstance) -> Document {
    match &instance.meta().to_document {
        Some(hook) => hook(instance),
        None => default_mapping(instance),
    }
}

/// 对外映射
pub fn to_external(instance: &ModelInstance) -> Document {
    match &instance.meta().to_external {
        Some(hook) => hook(instance),
        None => default_mapping(instance),
    }
}

/// 默认映射：全部属性，已清除的属性不输出，主键输出为 `_id`
pub fn default_mapping(instance: &ModelInstance) -> Document {
    let mut doc: Document = instance
        .attrs()
        .iter()
        .filter(|(_, value)| !value.is_undefined())
        .map(|(name, value)| (name.clone(), export_value(value)))
        .collect();

    if let Some(id) = instance.primary() {
        doc.insert(PRIMARY_KEY.to_string(), DataValue::ObjectId(id));
    }
    doc
}

/// 导出单个值
///
/// 自带序列化的值调用其 `to_data_value`，其余值深拷贝，
/// 嵌套结构中的自定义值同样被展开。
pub fn export_value(value: &DataValue) -> DataValue {
    match value {
        DataValue::Custom(custom) => export_value(&custom.to_data_value()),
        DataValue::Array(items) => DataValue::Array(items.iter().map(export_value).collect()),
        DataValue::Object(fields) => DataValue::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), export_value(v)))
                .collect(),
        ),
        plain => plain.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use crate::model::field_types::{any_field, ModelMeta};
    use crate::types::{ObjectId, Serializable};
    use std::sync::Arc;

    #[derive(Debug)]
    struct Money {
        cents: i64,
    }

    impl Serializable for Money {
        fn to_data_value(&self) -> DataValue {
            DataValue::from(format!("{}.{:02}", self.cents / 100, self.cents % 100))
        }
    }

    fn user_meta() -> ModelMeta {
        ModelMeta::new("OverrideUser")
            .field(any_field("name"))
            .field(any_field("password"))
            .field(any_field("balance"))
            .field(any_field("tags"))
    }

    #[test]
    fn test_default_mapping_uses_serializer() {
        let mut instance = ModelInstance::new(user_meta().build());
        instance.set("name", "Ryan").unwrap();
        instance
            .set("balance", DataValue::Custom(Arc::new(Money { cents: 1250 })))
            .unwrap();

        let doc = to_document(&instance);
        assert_eq!(doc.get("balance"), Some(&DataValue::from("12.50")));
        assert_eq!(doc.get("name"), Some(&DataValue::from("Ryan")));
        assert!(!doc.contains_key("_id"));
    }

    #[test]
    fn test_default_mapping_is_independent_copy() {
        let mut instance = ModelInstance::new(user_meta().build());
        instance
            .set("tags", DataValue::Array(vec![DataValue::from("a")]))
            .unwrap();

        let mut doc = to_document(&instance);
        if let Some(DataValue::Array(items)) = doc.get_mut("tags") {
            items.push(DataValue::from("b"));
        }
        assert_eq!(
            instance.get("tags"),
            Some(&DataValue::Array(vec![DataValue::from("a")]))
        );
    }

    #[test]
    fn test_undefined_omitted_and_primary_emitted() {
        let id = ObjectId::new();
        let mut instance = ModelInstance::with_attrs(
            user_meta().build(),
            document! { "_id" => id, "name" => "Ryan" },
        )
        .unwrap();
        instance.unset("password").unwrap();

        let doc = to_document(&instance);
        assert_eq!(doc.get("_id"), Some(&DataValue::ObjectId(id)));
        assert!(!doc.contains_key("password"));
    }

    #[test]
    fn test_override_is_not_merged() {
        let meta = user_meta()
            .with_to_external(|instance| {
                let mut doc = default_mapping(instance);
                doc.remove("password");
                doc
            })
            .with_to_document(|_| document! { "only" => true })
            .build();

        let instance = ModelInstance::with_attrs(
            meta,
            document! { "name" => "Ryan", "password" => "foobar123" },
        )
        .unwrap();

        assert_eq!(to_document(&instance), document! { "only" => true });

        let external = to_external(&instance);
        assert!(!external.contains_key("password"));
        assert_eq!(external.get("name"), Some(&DataValue::from("Ryan")));
    }
}
