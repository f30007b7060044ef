#[cfg(test)]
mod tests {
    use rat_docsync::*;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn user_meta() -> ModelMeta {
        ModelMeta::new("User")
            .field(any_field("name"))
            .field(any_field("age"))
            .field(any_field("email").unique())
            .field(datetime_field("joined"))
    }

    /// 绑定模型并写入三个 steven（年龄 40、60、20）
    async fn seeded() -> (SyncModel, Arc<MemoryDriver>) {
        let driver = Arc::new(MemoryDriver::new());
        let model = assert_ok!(SyncModel::bind(user_meta().build(), driver.clone()).await);

        for age in [40, 60, 20] {
            let mut user = assert_ok!(model.build(document! {
                "name" => "steven",
                "age" => age,
                "joined" => format!("2014-01-{:02}", age / 10),
            }));
            assert_ok!(model.save(&mut user).await);
        }
        (model, driver)
    }

    fn age_of(instance: &ModelInstance) -> Option<i64> {
        instance.get("age").and_then(DataValue::as_i64)
    }

    /// 默认集合名与模型名相同，也可以显式指定
    #[tokio::test]
    async fn test_collection_names() {
        let driver = Arc::new(MemoryDriver::new());

        let baz = SyncModel::new(ModelMeta::new("Baz").build(), driver.clone());
        assert_eq!(baz.collection_name(), "Baz");

        let foo = SyncModel::new(ModelMeta::new("Foo").with_collection("bar").build(), driver.clone());
        assert_eq!(foo.collection_name(), "bar");

        let mut record = foo.instance();
        assert_ok!(foo.save(&mut record).await);
        assert_eq!(driver.collection_names(), vec!["bar".to_string()]);
    }

    /// 没有匹配时返回空列表
    #[tokio::test]
    async fn test_all_returns_empty_when_no_match() {
        let (model, _driver) = seeded().await;
        let users = assert_ok!(model.all(document! { "name" => "brobobski" }, FindOptions::new()).await);
        assert!(users.is_empty());
    }

    /// 返回已持久化的实例
    #[tokio::test]
    async fn test_all_returns_instances() {
        let (model, _driver) = seeded().await;
        let users = assert_ok!(model.all(document! { "name" => "steven" }, FindOptions::new()).await);
        assert_eq!(users.len(), 3);
        for user in &users {
            assert_eq!(user.state(), SyncState::Persisted);
            assert!(user.primary().is_some());
            assert_eq!(user.snapshot(), user.attrs());
            assert!(user.get("joined").and_then(DataValue::as_datetime).is_some());
        }
    }

    /// 排序与数量限制传递给驱动
    #[tokio::test]
    async fn test_all_forwards_options() {
        let (model, _driver) = seeded().await;
        let options = FindOptions::new().limit(1).sort("age", SortDirection::Desc);
        let users = assert_ok!(model.all(document! { "name" => "steven" }, options).await);
        assert_eq!(users.len(), 1);
        assert_eq!(age_of(&users[0]), Some(60));

        let options = FindOptions::new().sort("age", SortDirection::Asc).skip(1);
        let users = assert_ok!(model.all(document! { "name" => "steven" }, options).await);
        let ages: Vec<_> = users.iter().filter_map(age_of).collect();
        assert_eq!(ages, vec![40, 60]);
    }

    /// 过滤条件中的日期字符串按声明类型转换
    #[tokio::test]
    async fn test_filter_values_are_coerced() {
        let (model, _driver) = seeded().await;
        let users = assert_ok!(
            model
                .all(
                    document! { "joined" => document! { "$gte" => "2014-01-04" } },
                    FindOptions::new().sort("age", SortDirection::Asc),
                )
                .await
        );
        let ages: Vec<_> = users.iter().filter_map(age_of).collect();
        assert_eq!(ages, vec![40, 60]);
    }

    /// 查找不存在的记录返回 None
    #[tokio::test]
    async fn test_get_absent_returns_none() {
        let (model, _driver) = seeded().await;
        let found = assert_ok!(model.get(document! { "name" => "lsadkfjsadlkf" }, FindOptions::new()).await);
        assert!(found.is_none());

        let found = assert_ok!(model.get(ObjectId::new(), FindOptions::new()).await);
        assert!(found.is_none());
    }

    /// 按过滤条件返回实例
    #[tokio::test]
    async fn test_get_returns_instance() {
        let (model, _driver) = seeded().await;
        let found = assert_ok!(model.find(document! { "name" => "steven" }, FindOptions::new()).await);
        let user = found.expect("应当找到记录");
        assert_eq!(user.get("name"), Some(&DataValue::from("steven")));
        assert_eq!(user.meta().name, "User");
    }

    /// 主键字符串（直接给出或在 `_id` 中）被转换为主键
    #[tokio::test]
    async fn test_get_converts_string_ids() {
        println!("🔍 测试字符串主键查找");
        let (model, _driver) = seeded().await;
        let any = assert_ok!(model.get(document! { "name" => "steven" }, FindOptions::new()).await)
            .expect("应当找到记录");
        let id = any.primary().expect("已持久化的实例有主键");

        let by_string = assert_ok!(model.get(id.to_hex(), FindOptions::new()).await)
            .expect("字符串主键应当找到记录");
        assert_eq!(by_string.primary(), Some(id));

        let by_filter = assert_ok!(model.get(document! { "_id" => id.to_hex() }, FindOptions::new()).await)
            .expect("_id 字符串应当找到记录");
        assert_eq!(by_filter.primary(), Some(id));
        println!("✅ 字符串主键查找完成");
    }

    /// 未给出条件时返回 None 且不发出请求
    #[tokio::test]
    async fn test_get_without_criteria() {
        let (model, driver) = seeded().await;
        let before = driver.request_count();
        let found = assert_ok!(model.get(None::<ObjectId>, FindOptions::new()).await);
        assert!(found.is_none());
        let found = assert_ok!(model.get(Criteria::None, FindOptions::new()).await);
        assert!(found.is_none());
        assert_eq!(driver.request_count(), before);
    }

    /// 无法解析的主键字符串是类型转换错误
    #[tokio::test]
    async fn test_get_with_bad_id_string() {
        let (model, driver) = seeded().await;
        let before = driver.request_count();
        let err = assert_err!(model.get("not-an-object-id", FindOptions::new()).await);
        assert!(matches!(err, DocSyncError::CoercionError { .. }));
        assert_eq!(driver.request_count(), before);
    }

    /// get 同样转发排序选项
    #[tokio::test]
    async fn test_get_forwards_options() {
        let (model, _driver) = seeded().await;
        let user = assert_ok!(
            model
                .get(
                    document! { "name" => "steven" },
                    FindOptions::new().sort("age", SortDirection::Desc),
                )
                .await
        )
        .expect("应当找到记录");
        assert_eq!(age_of(&user), Some(60));
    }

    /// 批量删除返回删除数量
    #[tokio::test]
    async fn test_remove_all_returns_count() {
        let (model, _driver) = seeded().await;
        for _ in 0..5 {
            let mut user = assert_ok!(model.build(document! { "name" => "soonToBeDeleted" }));
            assert_ok!(model.save(&mut user).await);
        }

        let removed = assert_ok!(model.remove_all(document! { "name" => "soonToBeDeleted" }).await);
        assert_eq!(removed, 5);
        assert_eq!(assert_ok!(model.count(document! {}).await), 3);
    }

    /// 计数
    #[tokio::test]
    async fn test_count() {
        let (model, _driver) = seeded().await;
        assert_eq!(assert_ok!(model.count(document! { "name" => "steven" }).await), 3);
        let older = document! { "age" => document! { "$gt" => 30 } };
        assert_eq!(assert_ok!(model.count(older).await), 2);
        assert_eq!(assert_ok!(model.query().where_op("age", "$lt", 50).count().await), 2);
    }

    /// 每次调用都得到独立的查询构建器
    #[tokio::test]
    async fn test_query_builders_are_distinct() {
        let (model, _driver) = seeded().await;
        let query_a = model.query().where_eq("name", "steven").limit(1);
        let query_b = model.query();

        assert!(query_b.filter_document().is_empty());
        assert_eq!(query_b.options(), &FindOptions::new());
        assert_eq!(query_a.filter_document().len(), 1);
        assert_eq!(query_a.options().limit, Some(1));
    }

    /// 查询构建器的结果被还原为实例
    #[tokio::test]
    async fn test_query_wraps_results() {
        let (model, _driver) = seeded().await;
        let users = assert_ok!(
            model
                .query()
                .find_one()
                .where_eq("name", "steven")
                .sort("age", SortDirection::Desc)
                .exec()
                .await
        );
        assert_eq!(users.len(), 1);
        assert_eq!(age_of(&users[0]), Some(60));

        let youngest = assert_ok!(
            model
                .query()
                .where_op("age", "$gte", 20)
                .where_op("age", "$lt", 60)
                .sort("age", SortDirection::Asc)
                .first()
                .await
        )
        .expect("应当找到记录");
        assert_eq!(age_of(&youngest), Some(20));

        let raw = assert_ok!(model.query().select(["age"]).exec_raw().await);
        assert_eq!(raw.len(), 3);
        assert!(raw.iter().all(|doc| doc.contains_key("_id") && !doc.contains_key("name")));
    }

    /// 聚合默认还原为实例
    #[tokio::test]
    async fn test_aggregate_wraps_by_default() {
        let (model, _driver) = seeded().await;
        let output = assert_ok!(
            model
                .aggregate(false)
                .match_(document! { "name" => "steven" })
                .sort("age", SortDirection::Desc)
                .exec()
                .await
        );
        let users = output.into_instances().expect("默认模式返回实例");
        assert_eq!(users.len(), 3);
        assert_eq!(age_of(&users[0]), Some(60));
        assert!(users.iter().all(|u| u.state() == SyncState::Persisted));
    }

    /// unwrapped 模式返回原始分组行
    #[tokio::test]
    async fn test_aggregate_unwrapped_returns_rows() {
        println!("🔍 测试聚合原始行");
        let (model, _driver) = seeded().await;
        let aggregate = model
            .aggregate(true)
            .match_(document! { "name" => "steven" })
            .group(document! {
                "_id" => "$name",
                "count" => document! { "$sum" => 1 },
            });
        assert!(aggregate.is_unwrapped());
        assert_eq!(aggregate.pipeline().len(), 2);

        let rows = assert_ok!(aggregate.exec().await).into_raw().expect("unwrapped 模式返回原始行");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["_id"], DataValue::from("steven"));
        assert_eq!(rows[0]["count"], DataValue::Int(3));
        println!("✅ 分组结果: {:?}", rows[0]);
    }

    /// 无法还原的聚合行在默认模式下被跳过
    #[tokio::test]
    async fn test_aggregate_skips_unhydratable_rows() {
        let (model, _driver) = seeded().await;
        let output = assert_ok!(
            model
                .aggregate(false)
                .group(document! { "_id" => "$name", "count" => document! { "$sum" => 1 } })
                .exec()
                .await
        );
        assert!(output.is_empty());
    }

    /// 通过全局注册表按别名绑定
    #[tokio::test]
    async fn test_bind_from_registry() {
        let driver = Arc::new(MemoryDriver::new());
        assert_ok!(add_driver("query_test_registry", driver.clone()));
        assert!(get_aliases().contains(&"query_test_registry".to_string()));

        let meta = user_meta().with_alias("query_test_registry").build();
        let model = assert_ok!(SyncModel::from_registry(meta).await);
        assert_eq!(model.driver().name(), "memory");
        assert_eq!(driver.index_fields("User"), vec!["email".to_string()]);

        let mut user = assert_ok!(model.build(document! { "name" => "registry" }));
        assert_ok!(model.save(&mut user).await);
        assert_eq!(driver.raw_documents("User").len(), 1);

        let missing = user_meta().with_alias("query_test_missing").build();
        let err = assert_err!(SyncModel::from_registry(missing).await);
        assert!(matches!(err, DocSyncError::ConfigError { .. }));
    }
}
