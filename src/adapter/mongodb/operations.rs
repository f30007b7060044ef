//! MongoDB驱动的StoreDriver trait实现

use super::adapter::MongoDriver;
use super::utils::{
    bson_to_data_value, bson_to_document, build_find_options, build_update_document,
    document_to_bson, map_driver_error,
};
use crate::PRIMARY_KEY;
use crate::adapter::StoreDriver;
use crate::error::DocSyncResult;
use crate::types::*;
use async_trait::async_trait;
use mongodb::bson;
use mongodb::options::IndexOptions;
use mongodb::IndexModel;
use rat_logger::debug;

fn id_document(id: ObjectId) -> bson::Document {
    let mut filter = bson::Document::new();
    filter.insert(PRIMARY_KEY, id);
    filter
}

#[async_trait]
impl StoreDriver for MongoDriver {
    fn name(&self) -> &str {
        "mongodb"
    }

    async fn insert(&self, collection: &str, document: Document) -> DocSyncResult<InsertOutcome> {
        let doc = document_to_bson(&document);
        debug!("执行MongoDB插入到集合 {}: {:?}", collection, doc);

        let result = self
            .collection(collection)
            .insert_one(doc, None)
            .await
            .map_err(|e| map_driver_error("MongoDB插入失败", e))?;

        Ok(InsertOutcome {
            assigned_id: bson_to_data_value(&result.inserted_id),
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        update: &UpdateSpec,
    ) -> DocSyncResult<UpdateOutcome> {
        let update_doc = build_update_document(update);
        debug!("执行MongoDB更新 {} _id={}: {:?}", collection, id, update_doc);

        let result = self
            .collection(collection)
            .update_one(id_document(id), update_doc, None)
            .await
            .map_err(|e| map_driver_error("MongoDB更新失败", e))?;

        Ok(UpdateOutcome {
            matched_count: result.matched_count,
        })
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> DocSyncResult<u64> {
        debug!("执行MongoDB删除 {} _id={}", collection, id);
        let result = self
            .collection(collection)
            .delete_one(id_document(id), None)
            .await
            .map_err(|e| map_driver_error("MongoDB删除失败", e))?;
        Ok(result.deleted_count)
    }

    async fn delete_many(&self, collection: &str, filter: &Document) -> DocSyncResult<u64> {
        let filter = document_to_bson(filter);
        debug!("执行MongoDB批量删除 {}: {:?}", collection, filter);
        let result = self
            .collection(collection)
            .delete_many(filter, None)
            .await
            .map_err(|e| map_driver_error("MongoDB批量删除失败", e))?;
        Ok(result.deleted_count)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> DocSyncResult<Vec<Document>> {
        let query = document_to_bson(filter);
        debug!("执行MongoDB查询 {}: {:?}", collection, query);

        let mut cursor = self
            .collection(collection)
            .find(query, build_find_options(options))
            .await
            .map_err(|e| map_driver_error("MongoDB查询失败", e))?;

        let mut results = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| map_driver_error("MongoDB游标遍历失败", e))?
        {
            let doc = cursor.deserialize_current().map_err(|e| {
                crate::docsync_error!(transport, format!("MongoDB文档反序列化失败: {}", e))
            })?;
            results.push(bson_to_document(&doc));
        }
        Ok(results)
    }

    async fn count(&self, collection: &str, filter: &Document) -> DocSyncResult<u64> {
        let query = document_to_bson(filter);
        debug!("执行MongoDB计数 {}: {:?}", collection, query);
        self.collection(collection)
            .count_documents(query, None)
            .await
            .map_err(|e| map_driver_error("MongoDB计数失败", e))
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Document]) -> DocSyncResult<Vec<Document>> {
        let stages: Vec<bson::Document> = pipeline.iter().map(document_to_bson).collect();
        debug!("执行MongoDB聚合 {}: {:?}", collection, stages);

        let mut cursor = self
            .collection(collection)
            .aggregate(stages, None)
            .await
            .map_err(|e| map_driver_error("MongoDB聚合失败", e))?;

        let mut results = Vec::new();
        while cursor
            .advance()
            .await
            .map_err(|e| map_driver_error("MongoDB游标遍历失败", e))?
        {
            let doc = cursor.deserialize_current().map_err(|e| {
                crate::docsync_error!(transport, format!("MongoDB文档反序列化失败: {}", e))
            })?;
            results.push(bson_to_document(&doc));
        }
        Ok(results)
    }

    async fn create_index(&self, collection: &str, field: &str, unique: bool) -> DocSyncResult<()> {
        let mut index_options = IndexOptions::default();
        if unique {
            index_options.unique = Some(true);
            index_options.sparse = Some(true);
        }

        let mut keys = bson::Document::new();
        keys.insert(field, 1);

        let index_model = IndexModel::builder()
            .keys(keys)
            .options(index_options)
            .build();

        debug!("创建MongoDB索引: {}.{} unique={}", collection, field, unique);
        self.collection(collection)
            .create_index(index_model, None)
            .await
            .map_err(|e| map_driver_error("创建MongoDB索引失败", e))?;
        Ok(())
    }
}
