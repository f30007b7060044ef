//! 内存驱动的StoreDriver trait实现

use super::adapter::{MemoryDriver, ensure_primary, indexed_value};
use super::aggregate::run_pipeline;
use super::matcher::{add_numbers, matches, project_fields, sort_documents};
use crate::adapter::StoreDriver;
use crate::error::DocSyncResult;
use crate::types::*;
use async_trait::async_trait;
use rat_logger::debug;

#[async_trait]
impl StoreDriver for MemoryDriver {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, collection: &str, mut document: Document) -> DocSyncResult<InsertOutcome> {
        self.record("insert", collection);
        let assigned_id = ensure_primary(&mut document);

        let mut collections = self.collections.lock();
        let coll = collections.entry(collection.to_string()).or_default();
        coll.check_unique(collection, &document, None)?;
        coll.docs.push(document);

        debug!("内存驱动插入文档: {} _id={}", collection, assigned_id);
        Ok(InsertOutcome { assigned_id })
    }

    async fn update_one(
        &self,
        collection: &str,
        id: ObjectId,
        update: &UpdateSpec,
    ) -> DocSyncResult<UpdateOutcome> {
        self.record("update_one", collection);

        // 同一字段不能出现在多个更新部分中
        for field in update.set.keys().chain(update.unset.iter()) {
            if update.inc.contains_key(field) || (update.set.contains_key(field) && update.unset.contains(field)) {
                return Err(crate::docsync_error!(
                    transport,
                    format!("Updating the path '{}' would create a conflict", field)
                ));
            }
        }

        let mut collections = self.collections.lock();
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(UpdateOutcome { matched_count: 0 });
        };
        let Some(index) = coll.position(id) else {
            return Ok(UpdateOutcome { matched_count: 0 });
        };

        let mut updated = coll.docs[index].clone();
        for (field, value) in &update.set {
            updated.insert(field.clone(), value.clone());
        }
        for field in &update.unset {
            updated.remove(field);
        }
        for (field, delta) in &update.inc {
            let next = match updated.get(field) {
                None => delta.to_number(),
                Some(current) => add_numbers(current, delta),
            };
            let next = next.ok_or_else(|| {
                crate::docsync_error!(
                    transport,
                    format!("Cannot apply $inc to a value of non-numeric type: {}", field)
                )
            })?;
            updated.insert(field.clone(), next);
        }

        coll.check_unique(collection, &updated, Some(index))?;
        coll.docs[index] = updated;
        Ok(UpdateOutcome { matched_count: 1 })
    }

    async fn delete_one(&self, collection: &str, id: ObjectId) -> DocSyncResult<u64> {
        self.record("delete_one", collection);
        let mut collections = self.collections.lock();
        let removed = collections
            .get_mut(collection)
            .and_then(|coll| coll.position(id).map(|index| coll.docs.remove(index)));
        Ok(removed.map_or(0, |_| 1))
    }

    async fn delete_many(&self, collection: &str, filter: &Document) -> DocSyncResult<u64> {
        self.record("delete_many", collection);
        let mut collections = self.collections.lock();
        let Some(coll) = collections.get_mut(collection) else {
            return Ok(0);
        };

        let mut kept = Vec::with_capacity(coll.docs.len());
        for doc in &coll.docs {
            if !matches(doc, filter)? {
                kept.push(doc.clone());
            }
        }
        let removed = (coll.docs.len() - kept.len()) as u64;
        coll.docs = kept;
        debug!("内存驱动批量删除: {} 删除 {} 条", collection, removed);
        Ok(removed)
    }

    async fn find(
        &self,
        collection: &str,
        filter: &Document,
        options: &FindOptions,
    ) -> DocSyncResult<Vec<Document>> {
        self.record("find", collection);
        let mut found = Vec::new();
        {
            let collections = self.collections.lock();
            if let Some(coll) = collections.get(collection) {
                for doc in &coll.docs {
                    if matches(doc, filter)? {
                        found.push(doc.clone());
                    }
                }
            }
        }

        sort_documents(&mut found, &options.sort);

        let skip = options.skip.unwrap_or(0) as usize;
        let limit = match options.limit {
            Some(0) | None => usize::MAX,
            Some(n) => n.unsigned_abs() as usize,
        };

        Ok(found
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|doc| match &options.fields {
                Some(fields) => project_fields(doc, fields),
                None => doc,
            })
            .collect())
    }

    async fn count(&self, collection: &str, filter: &Document) -> DocSyncResult<u64> {
        self.record("count", collection);
        let collections = self.collections.lock();
        let Some(coll) = collections.get(collection) else {
            return Ok(0);
        };
        let mut total = 0;
        for doc in &coll.docs {
            if matches(doc, filter)? {
                total += 1;
            }
        }
        Ok(total)
    }

    async fn aggregate(&self, collection: &str, pipeline: &[Document]) -> DocSyncResult<Vec<Document>> {
        self.record("aggregate", collection);
        let docs = self
            .collections
            .lock()
            .get(collection)
            .map(|c| c.docs.clone())
            .unwrap_or_default();
        run_pipeline(docs, pipeline)
    }

    async fn create_index(&self, collection: &str, field: &str, unique: bool) -> DocSyncResult<()> {
        self.record("create_index", collection);
        let mut collections = self.collections.lock();
        let coll = collections.entry(collection.to_string()).or_default();

        if unique && !coll.unique_fields.contains(field) {
            let mut seen: Vec<&DataValue> = Vec::new();
            for value in coll.docs.iter().filter_map(|doc| indexed_value(doc, field)) {
                if seen.contains(&value) {
                    return Err(crate::docsync_error!(
                        duplicate,
                        field,
                        format!(
                            "E11000 duplicate key error collection: {} index: {}_1 dup key: {{ {}: {} }}",
                            collection, field, field, value
                        )
                    ));
                }
                seen.push(value);
            }
            coll.unique_fields.insert(field.to_string());
        }
        coll.indexes.insert(field.to_string());
        debug!("内存驱动建立索引: {}.{} unique={}", collection, field, unique);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;
    use crate::error::DocSyncError;

    #[tokio::test]
    async fn test_insert_assigns_id_and_counts_requests() {
        let driver = MemoryDriver::new();
        let outcome = driver.insert("users", document! { "name" => "Ryan" }).await.unwrap();
        assert!(outcome.assigned_id.as_object_id().is_some());

        let id = ObjectId::new();
        let outcome = driver
            .insert("users", document! { "_id" => id, "name" => "Bob" })
            .await
            .unwrap();
        assert_eq!(outcome.assigned_id, DataValue::ObjectId(id));
        assert_eq!(driver.request_count(), 2);
        assert_eq!(driver.raw_documents("users").len(), 2);
    }

    #[tokio::test]
    async fn test_unique_index_is_sparse() {
        let driver = MemoryDriver::new();
        driver.create_index("users", "email", true).await.unwrap();
        driver.insert("users", document! { "name" => "a" }).await.unwrap();
        driver.insert("users", document! { "name" => "b" }).await.unwrap();
        driver
            .insert("users", document! { "email" => "ryan@slingingcode.com" })
            .await
            .unwrap();

        let err = driver
            .insert("users", document! { "email" => "ryan@slingingcode.com" })
            .await
            .unwrap_err();
        match err {
            DocSyncError::DuplicateKey { field, .. } => assert_eq!(field, "email"),
            other => panic!("期望DuplicateKey，实际: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_unique_index_covers_null() {
        let driver = MemoryDriver::new();
        driver.create_index("users", "email", true).await.unwrap();
        driver.insert("users", document! { "email" => DataValue::Null }).await.unwrap();
        driver.insert("users", document! { "name" => "missing" }).await.unwrap();

        let err = driver
            .insert("users", document! { "email" => DataValue::Null })
            .await
            .unwrap_err();
        assert!(matches!(err, DocSyncError::DuplicateKey { .. }));

        // 已有两个 null 时无法建立唯一索引，缺失字段不算
        let driver = MemoryDriver::new();
        driver.insert("people", document! { "email" => DataValue::Null }).await.unwrap();
        driver.insert("people", document! { "name" => "a" }).await.unwrap();
        driver.insert("people", document! { "name" => "b" }).await.unwrap();
        driver.create_index("people", "email", true).await.unwrap();

        let driver = MemoryDriver::new();
        driver.insert("people", document! { "email" => DataValue::Null }).await.unwrap();
        driver.insert("people", document! { "email" => DataValue::Null }).await.unwrap();
        let err = driver.create_index("people", "email", true).await.unwrap_err();
        assert!(matches!(err, DocSyncError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn test_update_set_unset_inc() {
        let driver = MemoryDriver::new();
        let id = ObjectId::new();
        driver
            .insert("users", document! { "_id" => id, "name" => "Ted", "email" => "t@x", "age" => 30 })
            .await
            .unwrap();

        let update = UpdateSpec::new()
            .set("name", "Bob")
            .unset("email")
            .inc("age", 2)
            .inc("visits", 1);
        let outcome = driver.update_one("users", id, &update).await.unwrap();
        assert_eq!(outcome.matched_count, 1);

        let doc = &driver.raw_documents("users")[0];
        assert_eq!(doc.get("name"), Some(&DataValue::from("Bob")));
        assert!(!doc.contains_key("email"));
        assert_eq!(doc.get("age"), Some(&DataValue::Int(32)));
        assert_eq!(doc.get("visits"), Some(&DataValue::Int(1)));

        let missing = driver.update_one("users", ObjectId::new(), &update).await.unwrap();
        assert_eq!(missing.matched_count, 0);
    }

    #[tokio::test]
    async fn test_inc_non_numeric_fails() {
        let driver = MemoryDriver::new();
        let id = ObjectId::new();
        driver
            .insert("users", document! { "_id" => id, "name" => "Ted" })
            .await
            .unwrap();
        let err = driver
            .update_one("users", id, &UpdateSpec::new().inc("name", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, DocSyncError::TransportError { .. }));
    }

    #[tokio::test]
    async fn test_find_sort_skip_limit_fields() {
        let driver = MemoryDriver::new();
        for (name, age) in [("a", 3), ("b", 1), ("c", 2)] {
            driver
                .insert("users", document! { "name" => name, "age" => age })
                .await
                .unwrap();
        }
        let options = FindOptions::new()
            .sort("age", SortDirection::Desc)
            .skip(1)
            .limit(1)
            .fields(["name"]);
        let found = driver.find("users", &document! {}, &options).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].get("name"), Some(&DataValue::from("c")));
        assert!(found[0].contains_key("_id"));
        assert!(!found[0].contains_key("age"));

        let first = driver
            .find_one("users", &document! { "age" => document! { "$gt" => 1 } }, &FindOptions::new())
            .await
            .unwrap();
        assert_eq!(first.unwrap().get("name"), Some(&DataValue::from("a")));
    }

    #[tokio::test]
    async fn test_delete_one_and_many() {
        let driver = MemoryDriver::new();
        let id = ObjectId::new();
        driver.insert("users", document! { "_id" => id, "name" => "x" }).await.unwrap();
        driver.insert("users", document! { "name" => "steven" }).await.unwrap();
        driver.insert("users", document! { "name" => "steven" }).await.unwrap();

        assert_eq!(driver.delete_one("users", id).await.unwrap(), 1);
        assert_eq!(driver.delete_one("users", id).await.unwrap(), 0);
        assert_eq!(
            driver.delete_many("users", &document! { "name" => "steven" }).await.unwrap(),
            2
        );
        assert_eq!(driver.count("users", &document! {}).await.unwrap(), 0);
    }
}
