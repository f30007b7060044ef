//! # 读取处理器
//!
//! 查找条件中的主键字符串以及声明为日期/ObjectId的属性值
//! 在发出请求之前按声明类型转换。

use crate::PRIMARY_KEY;
use crate::error::DocSyncResult;
use crate::model::conversion::{coerce_object_id, coerce_value};
use crate::model::{FieldType, ModelInstance};
use crate::odm::SyncModel;
use crate::types::{Criteria, DataValue, Document, FindOptions, ObjectId, id_filter};
use rat_logger::debug;

/// 操作数需要按属性类型转换的比较操作符
const VALUE_OPERATORS: &[&str] = &["$eq", "$ne", "$gt", "$gte", "$lt", "$lte"];
/// 操作数为数组的操作符
const LIST_OPERATORS: &[&str] = &["$in", "$nin"];

impl SyncModel {
    /// 按条件查找单个实例
    ///
    /// 条件未给出时直接返回 None，不发出请求；
    /// 主键字符串无法解析时返回 CoercionError。
    pub async fn find(
        &self,
        criteria: impl Into<Criteria>,
        options: FindOptions,
    ) -> DocSyncResult<Option<ModelInstance>> {
        let filter = match criteria.into() {
            Criteria::None => {
                debug!("查找条件为空: collection={}", self.collection_name());
                return Ok(None);
            }
            Criteria::IdString(id) => {
                let id = ObjectId::parse_str(&id)
                    .map_err(|e| crate::docsync_error!(coercion, PRIMARY_KEY, e))?;
                id_filter(id)
            }
            Criteria::Id(id) => id_filter(id),
            Criteria::Filter(filter) => self.normalize_filter(filter)?,
        };

        debug!("处理查找请求: collection={}, filter={:?}", self.collection_name(), filter);
        match self
            .driver()
            .find_one(self.collection_name(), &filter, &options)
            .await?
        {
            Some(doc) => Ok(Some(self.hydrate(doc)?)),
            None => Ok(None),
        }
    }

    /// `find` 的别名
    pub async fn get(
        &self,
        criteria: impl Into<Criteria>,
        options: FindOptions,
    ) -> DocSyncResult<Option<ModelInstance>> {
        self.find(criteria, options).await
    }

    /// 查找全部匹配的实例
    pub async fn all(&self, filter: Document, options: FindOptions) -> DocSyncResult<Vec<ModelInstance>> {
        let filter = self.normalize_filter(filter)?;
        debug!("处理列表请求: collection={}, filter={:?}", self.collection_name(), filter);
        let docs = self
            .driver()
            .find(self.collection_name(), &filter, &options)
            .await?;
        crate::debug_log!("还原查询结果: collection={}, rows={}", self.collection_name(), docs.len());
        docs.into_iter().map(|doc| self.hydrate(doc)).collect()
    }

    /// 统计匹配的文档数量
    pub async fn count(&self, filter: Document) -> DocSyncResult<u64> {
        let filter = self.normalize_filter(filter)?;
        self.driver().count(self.collection_name(), &filter).await
    }

    /// 把存储端文档还原为已持久化的实例
    ///
    /// 快照恰好是收到的字段；未返回的字段在实例中不存在。
    pub fn hydrate(&self, doc: Document) -> DocSyncResult<ModelInstance> {
        ModelInstance::hydrate(self.meta().clone(), doc)
    }

    /// 转换过滤条件中的值
    pub(crate) fn normalize_filter(&self, filter: Document) -> DocSyncResult<Document> {
        let mut normalized = Document::new();
        for (key, value) in filter {
            let value = match key.as_str() {
                "$and" | "$or" | "$nor" => match value {
                    DataValue::Array(items) => DataValue::Array(
                        items
                            .into_iter()
                            .map(|item| match item {
                                DataValue::Object(sub) => self.normalize_filter(sub).map(DataValue::Object),
                                other => Ok(other),
                            })
                            .collect::<DocSyncResult<Vec<_>>>()?,
                    ),
                    other => other,
                },
                name => self.normalize_condition(name, value)?,
            };
            normalized.insert(key, value);
        }
        Ok(normalized)
    }

    fn normalize_condition(&self, name: &str, value: DataValue) -> DocSyncResult<DataValue> {
        let convert = |raw: DataValue| -> DocSyncResult<DataValue> {
            if name == PRIMARY_KEY {
                return coerce_object_id(PRIMARY_KEY, raw);
            }
            match self.meta().get_field(name) {
                Some(field) if matches!(field.field_type, FieldType::DateTime | FieldType::ObjectId) => {
                    coerce_value(field, raw)
                }
                _ => Ok(raw),
            }
        };

        match value {
            DataValue::Object(ops) if !ops.is_empty() && ops.keys().all(|k| k.starts_with('$')) => {
                let mut converted = Document::new();
                for (op, operand) in ops {
                    let operand = if VALUE_OPERATORS.contains(&op.as_str()) {
                        convert(operand)?
                    } else if LIST_OPERATORS.contains(&op.as_str()) {
                        match operand {
                            DataValue::Array(items) => DataValue::Array(
                                items.into_iter().map(convert).collect::<DocSyncResult<Vec<_>>>()?,
                            ),
                            other => other,
                        }
                    } else {
                        operand
                    };
                    converted.insert(op, operand);
                }
                Ok(DataValue::Object(converted))
            }
            other => convert(other),
        }
    }
}
