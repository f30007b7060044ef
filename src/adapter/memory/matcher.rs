//! 过滤、排序与投影
//!
//! 支持的过滤操作符：`$eq` `$ne` `$gt` `$gte` `$lt` `$lte` `$in` `$nin`
//! `$exists` `$regex`(+`$options`) `$not` `$size`，以及顶层的 `$and` `$or` `$nor`。

use crate::PRIMARY_KEY;
use crate::error::DocSyncResult;
use crate::types::{DataValue, Document, SortConfig, SortDirection};
use regex::RegexBuilder;
use std::cmp::Ordering;

/// 按点号路径读取字段
pub(crate) fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a DataValue> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            DataValue::Object(inner) => inner.get(part)?,
            DataValue::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// 文档是否满足过滤条件
pub(crate) fn matches(doc: &Document, filter: &Document) -> DocSyncResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => {
                let mut all = true;
                for sub in sub_filters(key, condition)? {
                    if !matches(doc, sub)? {
                        all = false;
                        break;
                    }
                }
                all
            }
            "$or" => any_matches(doc, key, condition)?,
            "$nor" => !any_matches(doc, key, condition)?,
            op if op.starts_with('$') => {
                return Err(crate::docsync_error!(
                    transport,
                    format!("unknown top level operator: {}", op)
                ));
            }
            path => field_matches(get_path(doc, path), condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn any_matches(doc: &Document, key: &str, condition: &DataValue) -> DocSyncResult<bool> {
    for sub in sub_filters(key, condition)? {
        if matches(doc, sub)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn sub_filters<'a>(key: &str, condition: &'a DataValue) -> DocSyncResult<Vec<&'a Document>> {
    let invalid = || crate::docsync_error!(transport, format!("{} must be an array of documents", key));
    match condition {
        DataValue::Array(items) if !items.is_empty() => items
            .iter()
            .map(|item| item.as_document().ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

/// 条件是否为操作符文档（全部键以 `$` 开头）
fn operator_doc(condition: &DataValue) -> Option<&Document> {
    match condition {
        DataValue::Object(inner)
            if !inner.is_empty() && inner.keys().all(|k| k.starts_with('$')) =>
        {
            Some(inner)
        }
        _ => None,
    }
}

fn field_matches(value: Option<&DataValue>, condition: &DataValue) -> DocSyncResult<bool> {
    let Some(ops) = operator_doc(condition) else {
        return Ok(value_equals(value, condition));
    };

    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => value_equals(value, operand),
            "$ne" => !value_equals(value, operand),
            "$gt" => compare_any(value, operand, |o| o == Ordering::Greater),
            "$gte" => compare_any(value, operand, |o| o != Ordering::Less),
            "$lt" => compare_any(value, operand, |o| o == Ordering::Less),
            "$lte" => compare_any(value, operand, |o| o != Ordering::Greater),
            "$in" => in_list(op, value, operand)?,
            "$nin" => !in_list(op, value, operand)?,
            "$exists" => value.is_some() == is_truthy(operand),
            "$regex" => regex_matches(value, operand, ops.get("$options"))?,
            "$options" => true,
            "$not" => !field_matches(value, operand)?,
            "$size" => match (value, operand.as_i64()) {
                (Some(DataValue::Array(items)), Some(size)) => items.len() as i64 == size,
                _ => false,
            },
            other => {
                return Err(crate::docsync_error!(
                    transport,
                    format!("unknown operator: {}", other)
                ));
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

/// 相等匹配：缺失字段等于 null，数组字段只要有一个元素相等即匹配
fn value_equals(value: Option<&DataValue>, expected: &DataValue) -> bool {
    match value {
        None => expected.is_null(),
        Some(DataValue::Array(items)) if !matches!(expected, DataValue::Array(_)) => {
            items.iter().any(|item| item == expected)
        }
        Some(actual) => actual == expected,
    }
}

fn compare_any(value: Option<&DataValue>, operand: &DataValue, pred: impl Fn(Ordering) -> bool) -> bool {
    match value {
        None => false,
        Some(DataValue::Array(items)) if !matches!(operand, DataValue::Array(_)) => items
            .iter()
            .any(|item| compare_values(item, operand).is_some_and(&pred)),
        Some(actual) => compare_values(actual, operand).is_some_and(&pred),
    }
}

fn in_list(op: &str, value: Option<&DataValue>, operand: &DataValue) -> DocSyncResult<bool> {
    let candidates = operand
        .as_array()
        .ok_or_else(|| crate::docsync_error!(transport, format!("{} needs an array", op)))?;
    Ok(candidates.iter().any(|candidate| value_equals(value, candidate)))
}

fn regex_matches(
    value: Option<&DataValue>,
    pattern: &DataValue,
    options: Option<&DataValue>,
) -> DocSyncResult<bool> {
    let pattern = pattern
        .as_str()
        .ok_or_else(|| crate::docsync_error!(transport, "$regex has to be a string"))?;
    let flags = options.and_then(|o| o.as_str()).unwrap_or("");

    let regex = RegexBuilder::new(pattern)
        .case_insensitive(flags.contains('i'))
        .multi_line(flags.contains('m'))
        .dot_matches_new_line(flags.contains('s'))
        .build()
        .map_err(|e| crate::docsync_error!(transport, format!("invalid regex: {}", e)))?;

    Ok(match value {
        Some(DataValue::String(s)) => regex.is_match(s),
        Some(DataValue::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_str())
            .any(|s| regex.is_match(s)),
        _ => false,
    })
}

fn is_truthy(value: &DataValue) -> bool {
    match value {
        DataValue::Bool(b) => *b,
        DataValue::Int(i) => *i != 0,
        DataValue::Float(f) => *f != 0.0,
        DataValue::Null | DataValue::Undefined => false,
        _ => true,
    }
}

/// 同类值比较，类型不可比较时返回 None
pub(crate) fn compare_values(a: &DataValue, b: &DataValue) -> Option<Ordering> {
    match (a, b) {
        (DataValue::String(x), DataValue::String(y)) => Some(x.cmp(y)),
        (DataValue::Bool(x), DataValue::Bool(y)) => Some(x.cmp(y)),
        (DataValue::DateTime(x), DataValue::DateTime(y)) => Some(x.cmp(y)),
        (DataValue::ObjectId(x), DataValue::ObjectId(y)) => Some(x.cmp(y)),
        (DataValue::Null, DataValue::Null) => Some(Ordering::Equal),
        (DataValue::Bytes(x), DataValue::Bytes(y)) => Some(x.cmp(y)),
        _ => match (numeric(a), numeric(b)) {
            (Some(x), Some(y)) => x.partial_cmp(&y),
            _ => None,
        },
    }
}

fn numeric(value: &DataValue) -> Option<f64> {
    match value {
        DataValue::Int(i) => Some(*i as f64),
        DataValue::Float(f) => Some(*f),
        _ => None,
    }
}

/// 数值相加：两个整数相加仍为整数，溢出或含浮点时为浮点
pub(crate) fn add_numbers(a: &DataValue, b: &DataValue) -> Option<DataValue> {
    match (a, b) {
        (DataValue::Int(x), DataValue::Int(y)) => Some(
            x.checked_add(*y)
                .map(DataValue::Int)
                .unwrap_or(DataValue::Float(*x as f64 + *y as f64)),
        ),
        _ => Some(DataValue::Float(numeric(a)? + numeric(b)?)),
    }
}

/// 排序时的类型次序：缺失/null < 数值 < 字符串 < 对象 < 数组 < 二进制 < ObjectId < 布尔 < 日期
fn type_rank(value: Option<&DataValue>) -> u8 {
    match value {
        None | Some(DataValue::Null) | Some(DataValue::Undefined) => 0,
        Some(DataValue::Int(_)) | Some(DataValue::Float(_)) => 1,
        Some(DataValue::String(_)) => 2,
        Some(DataValue::Object(_)) | Some(DataValue::Custom(_)) => 3,
        Some(DataValue::Array(_)) => 4,
        Some(DataValue::Bytes(_)) => 5,
        Some(DataValue::ObjectId(_)) => 6,
        Some(DataValue::Bool(_)) => 7,
        Some(DataValue::DateTime(_)) => 8,
    }
}

fn sort_order(a: Option<&DataValue>, b: Option<&DataValue>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(x), Some(y)) => compare_values(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

/// 按排序配置原地排序（稳定排序，相等时保持插入顺序）
pub(crate) fn sort_documents(docs: &mut [Document], sort: &[SortConfig]) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for config in sort {
            let order = sort_order(get_path(a, &config.field), get_path(b, &config.field));
            let order = match config.direction {
                SortDirection::Asc => order,
                SortDirection::Desc => order.reverse(),
            };
            if order != Ordering::Equal {
                return order;
            }
        }
        Ordering::Equal
    });
}

/// 字段选择：只保留 `_id` 和列出的顶层字段
pub(crate) fn project_fields(doc: Document, fields: &[String]) -> Document {
    doc.into_iter()
        .filter(|(key, _)| key == PRIMARY_KEY || fields.iter().any(|f| f == key))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;

    fn user() -> Document {
        document! {
            "name" => "Ryan",
            "age" => 30,
            "wage" => 7.5,
            "tags" => vec![DataValue::from("admin"), DataValue::from("dev")],
            "address" => document! { "city" => "Portland" },
        }
    }

    #[test]
    fn test_equality_and_missing() {
        let doc = user();
        assert!(matches(&doc, &document! { "name" => "Ryan" }).unwrap());
        assert!(!matches(&doc, &document! { "name" => "Bob" }).unwrap());
        assert!(matches(&doc, &document! { "email" => DataValue::Null }).unwrap());
        assert!(matches(&doc, &document! { "tags" => "dev" }).unwrap());
        assert!(matches(&doc, &document! { "address.city" => "Portland" }).unwrap());
    }

    #[test]
    fn test_comparison_operators() {
        let doc = user();
        assert!(matches(&doc, &document! { "age" => document! { "$gt" => 29, "$lte" => 30 } }).unwrap());
        assert!(!matches(&doc, &document! { "age" => document! { "$lt" => 30 } }).unwrap());
        assert!(matches(&doc, &document! { "wage" => document! { "$gte" => 7 } }).unwrap());
        assert!(matches(
            &doc,
            &document! { "name" => document! { "$in" => vec![DataValue::from("Bob"), DataValue::from("Ryan")] } }
        )
        .unwrap());
        assert!(matches(&doc, &document! { "email" => document! { "$exists" => false } }).unwrap());
    }

    #[test]
    fn test_regex_and_logical() {
        let doc = user();
        assert!(matches(
            &doc,
            &document! { "name" => document! { "$regex" => "^ry", "$options" => "i" } }
        )
        .unwrap());
        let filter = document! {
            "$or" => vec![
                DataValue::from(document! { "name" => "Bob" }),
                DataValue::from(document! { "age" => 30 }),
            ]
        };
        assert!(matches(&doc, &filter).unwrap());
        assert!(matches(&doc, &document! { "$bogus" => 1 }).is_err());
    }

    #[test]
    fn test_sort_mixed_and_missing() {
        let mut docs = vec![
            document! { "n" => 3 },
            document! {},
            document! { "n" => 1.5 },
            document! { "n" => "a" },
        ];
        sort_documents(
            &mut docs,
            &[SortConfig {
                field: "n".to_string(),
                direction: SortDirection::Asc,
            }],
        );
        assert!(docs[0].get("n").is_none());
        assert_eq!(docs[1].get("n"), Some(&DataValue::Float(1.5)));
        assert_eq!(docs[2].get("n"), Some(&DataValue::Int(3)));
        assert_eq!(docs[3].get("n"), Some(&DataValue::from("a")));
    }

    #[test]
    fn test_add_numbers() {
        assert_eq!(add_numbers(&DataValue::Int(2), &DataValue::Int(3)), Some(DataValue::Int(5)));
        assert_eq!(add_numbers(&DataValue::Float(7.75), &DataValue::Float(-0.25)), Some(DataValue::Float(7.5)));
        assert_eq!(add_numbers(&DataValue::from("x"), &DataValue::Int(1)), None);
    }
}
