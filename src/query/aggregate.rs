//! 聚合构建器

use crate::error::DocSyncResult;
use crate::model::ModelInstance;
use crate::odm::SyncModel;
use crate::types::{DataValue, Document, SortDirection};
use rat_logger::{debug, warn};

/// 聚合结果
#[derive(Debug, Clone)]
pub enum AggregateOutput {
    /// 还原后的实例
    Instances(Vec<ModelInstance>),
    /// 原始行
    Raw(Vec<Document>),
}

impl AggregateOutput {
    pub fn len(&self) -> usize {
        match self {
            AggregateOutput::Instances(items) => items.len(),
            AggregateOutput::Raw(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 取出实例；原始行模式返回 None
    pub fn into_instances(self) -> Option<Vec<ModelInstance>> {
        match self {
            AggregateOutput::Instances(items) => Some(items),
            AggregateOutput::Raw(_) => None,
        }
    }

    /// 取出原始行；实例模式返回 None
    pub fn into_raw(self) -> Option<Vec<Document>> {
        match self {
            AggregateOutput::Raw(rows) => Some(rows),
            AggregateOutput::Instances(_) => None,
        }
    }
}

/// 绑定到模型的聚合管道
#[derive(Debug, Clone)]
pub struct ModelAggregate {
    model: SyncModel,
    pipeline: Vec<Document>,
    unwrapped: bool,
}

impl ModelAggregate {
    pub(crate) fn new(model: SyncModel, unwrapped: bool) -> Self {
        Self {
            model,
            pipeline: Vec::new(),
            unwrapped,
        }
    }

    fn push(mut self, name: &str, spec: impl Into<DataValue>) -> Self {
        let mut stage = Document::new();
        stage.insert(name.to_string(), spec.into());
        self.pipeline.push(stage);
        self
    }

    /// `$match` 阶段
    pub fn match_(self, filter: Document) -> Self {
        self.push("$match", filter)
    }

    /// `$group` 阶段，`spec` 必须包含 `_id`
    pub fn group(self, spec: Document) -> Self {
        self.push("$group", spec)
    }

    /// 单字段 `$sort` 阶段
    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        let mut spec = Document::new();
        spec.insert(field.into(), DataValue::Int(direction.as_i32() as i64));
        self.push("$sort", spec)
    }

    pub fn skip(self, skip: u64) -> Self {
        self.push("$skip", DataValue::Int(skip as i64))
    }

    pub fn limit(self, limit: u64) -> Self {
        self.push("$limit", DataValue::Int(limit as i64))
    }

    /// `$project` 阶段
    pub fn project(self, spec: Document) -> Self {
        self.push("$project", spec)
    }

    /// `$unwind` 阶段，`path` 形如 `"$tags"`
    pub fn unwind(self, path: impl Into<String>) -> Self {
        self.push("$unwind", DataValue::String(path.into()))
    }

    /// 追加任意阶段
    pub fn stage(mut self, stage: Document) -> Self {
        self.pipeline.push(stage);
        self
    }

    /// 当前管道
    pub fn pipeline(&self) -> &[Document] {
        &self.pipeline
    }

    pub fn is_unwrapped(&self) -> bool {
        self.unwrapped
    }

    /// 执行管道
    ///
    /// 默认把每一行还原为实例，无法还原的行被跳过；
    /// 以 unwrapped 创建时返回原始行。
    pub async fn exec(&self) -> DocSyncResult<AggregateOutput> {
        let mut pipeline = Vec::with_capacity(self.pipeline.len());
        for stage in &self.pipeline {
            match stage.get("$match") {
                Some(DataValue::Object(filter)) if stage.len() == 1 => {
                    let mut normalized = Document::new();
                    normalized.insert(
                        "$match".to_string(),
                        DataValue::Object(self.model.normalize_filter(filter.clone())?),
                    );
                    pipeline.push(normalized);
                }
                _ => pipeline.push(stage.clone()),
            }
        }

        debug!(
            "执行聚合: collection={}, stages={}",
            self.model.collection_name(),
            pipeline.len()
        );
        let rows = self
            .model
            .driver()
            .aggregate(self.model.collection_name(), &pipeline)
            .await?;

        if self.unwrapped {
            return Ok(AggregateOutput::Raw(rows));
        }

        let mut instances = Vec::with_capacity(rows.len());
        for row in rows {
            match self.model.hydrate(row) {
                Ok(instance) => instances.push(instance),
                Err(e) => warn!("聚合结果无法还原为实例，已跳过: {}", e),
            }
        }
        Ok(AggregateOutput::Instances(instances))
    }
}
