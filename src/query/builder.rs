//! 查询构建器

use crate::error::DocSyncResult;
use crate::model::ModelInstance;
use crate::odm::SyncModel;
use crate::types::{DataValue, Document, FindOptions, SortDirection};
use rat_logger::debug;

/// 查询模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// 返回全部匹配
    Many,
    /// 只返回第一条
    One,
}

/// 绑定到模型的查询
///
/// 链式设置条件与选项，`exec` 把结果还原为实例，`exec_raw` 返回原始文档。
#[derive(Debug, Clone)]
pub struct ModelQuery {
    model: SyncModel,
    mode: QueryMode,
    filter: Document,
    options: FindOptions,
}

impl ModelQuery {
    pub(crate) fn new(model: SyncModel) -> Self {
        Self {
            model,
            mode: QueryMode::Many,
            filter: Document::new(),
            options: FindOptions::new(),
        }
    }

    /// 查找全部匹配
    pub fn find(mut self) -> Self {
        self.mode = QueryMode::Many;
        self
    }

    /// 只查找第一条
    pub fn find_one(mut self) -> Self {
        self.mode = QueryMode::One;
        self
    }

    /// 合并过滤条件，同名字段以后者为准
    pub fn filter(mut self, filter: Document) -> Self {
        self.filter.extend(filter);
        self
    }

    /// 等值条件
    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<DataValue>) -> Self {
        self.filter.insert(field.into(), value.into());
        self
    }

    /// 操作符条件，如 `where_op("age", "$gt", 18)`
    ///
    /// 同一字段上的多个操作符会合并。
    pub fn where_op(
        mut self,
        field: impl Into<String>,
        op: impl Into<String>,
        value: impl Into<DataValue>,
    ) -> Self {
        let entry = self
            .filter
            .entry(field.into())
            .or_insert_with(|| DataValue::Object(Document::new()));
        if !matches!(entry, DataValue::Object(_)) {
            *entry = DataValue::Object(Document::new());
        }
        if let DataValue::Object(ops) = entry {
            ops.insert(op.into(), value.into());
        }
        self
    }

    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.options = self.options.sort(field, direction);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.options = self.options.skip(skip);
        self
    }

    pub fn limit(mut self, limit: i64) -> Self {
        self.options = self.options.limit(limit);
        self
    }

    /// 只返回指定字段（`_id` 总是返回）
    pub fn select<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.fields(fields);
        self
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }

    /// 当前过滤条件
    pub fn filter_document(&self) -> &Document {
        &self.filter
    }

    /// 当前查询选项
    pub fn options(&self) -> &FindOptions {
        &self.options
    }

    /// 执行并返回原始文档
    pub async fn exec_raw(&self) -> DocSyncResult<Vec<Document>> {
        let filter = self.model.normalize_filter(self.filter.clone())?;
        let driver = self.model.driver();
        let collection = self.model.collection_name();
        debug!(
            "执行查询: collection={}, mode={:?}, filter={:?}",
            collection, self.mode, filter
        );

        match self.mode {
            QueryMode::Many => driver.find(collection, &filter, &self.options).await,
            QueryMode::One => Ok(driver
                .find_one(collection, &filter, &self.options)
                .await?
                .into_iter()
                .collect()),
        }
    }

    /// 执行并还原为实例
    pub async fn exec(&self) -> DocSyncResult<Vec<ModelInstance>> {
        self.exec_raw()
            .await?
            .into_iter()
            .map(|doc| self.model.hydrate(doc))
            .collect()
    }

    /// 执行并返回第一条
    pub async fn first(&self) -> DocSyncResult<Option<ModelInstance>> {
        Ok(self.exec().await?.into_iter().next())
    }

    /// 统计匹配数量（忽略排序与分页）
    pub async fn count(&self) -> DocSyncResult<u64> {
        self.model.count(self.filter.clone()).await
    }
}
