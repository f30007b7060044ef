//! 内存聚合管道
//!
//! 支持的阶段：`$match` `$group` `$sort` `$skip` `$limit` `$project` `$unwind` `$count`。
//! `$group` 支持的累加器：`$sum` `$avg` `$min` `$max` `$first` `$last` `$push` `$addToSet`。

use super::matcher::{add_numbers, compare_values, get_path, matches, sort_documents};
use crate::PRIMARY_KEY;
use crate::error::DocSyncResult;
use crate::types::{DataValue, Document, SortConfig, SortDirection};
use std::cmp::Ordering;

/// 依次执行管道各阶段
pub(crate) fn run_pipeline(mut docs: Vec<Document>, pipeline: &[Document]) -> DocSyncResult<Vec<Document>> {
    for stage in pipeline {
        let mut entries = stage.iter();
        let (name, spec) = match (entries.next(), entries.next()) {
            (Some(entry), None) => entry,
            _ => {
                return Err(crate::docsync_error!(
                    transport,
                    "A pipeline stage specification object must contain exactly one field."
                ));
            }
        };

        docs = match name.as_str() {
            "$match" => {
                let filter = expect_document(name, spec)?;
                let mut kept = Vec::with_capacity(docs.len());
                for doc in docs {
                    if matches(&doc, filter)? {
                        kept.push(doc);
                    }
                }
                kept
            }
            "$sort" => {
                let sort = sort_spec(expect_document(name, spec)?)?;
                sort_documents(&mut docs, &sort);
                docs
            }
            "$skip" => {
                let n = expect_count(name, spec)?;
                docs.into_iter().skip(n).collect()
            }
            "$limit" => {
                let n = expect_count(name, spec)?;
                docs.into_iter().take(n).collect()
            }
            "$project" => {
                let spec = expect_document(name, spec)?;
                docs.iter()
                    .map(|doc| project(doc, spec))
                    .collect::<DocSyncResult<Vec<_>>>()?
            }
            "$group" => group(&docs, expect_document(name, spec)?)?,
            "$unwind" => unwind(docs, spec)?,
            "$count" => {
                let field = spec
                    .as_str()
                    .ok_or_else(|| crate::docsync_error!(transport, "$count needs a field name"))?;
                if docs.is_empty() {
                    Vec::new()
                } else {
                    let mut out = Document::new();
                    out.insert(field.to_string(), DataValue::Int(docs.len() as i64));
                    vec![out]
                }
            }
            other => {
                return Err(crate::docsync_error!(
                    transport,
                    format!("Unrecognized pipeline stage name: '{}'", other)
                ));
            }
        };
    }
    Ok(docs)
}

fn expect_document<'a>(stage: &str, spec: &'a DataValue) -> DocSyncResult<&'a Document> {
    spec.as_document()
        .ok_or_else(|| crate::docsync_error!(transport, format!("{} needs a document", stage)))
}

fn expect_count(stage: &str, spec: &DataValue) -> DocSyncResult<usize> {
    spec.as_i64()
        .filter(|n| *n >= 0)
        .map(|n| n as usize)
        .ok_or_else(|| crate::docsync_error!(transport, format!("{} needs a non-negative integer", stage)))
}

fn sort_spec(spec: &Document) -> DocSyncResult<Vec<SortConfig>> {
    spec.iter()
        .map(|(field, dir)| {
            let direction = match dir.as_i64() {
                Some(1) => SortDirection::Asc,
                Some(-1) => SortDirection::Desc,
                _ => {
                    return Err(crate::docsync_error!(
                        transport,
                        format!("$sort key ordering must be 1 or -1: {}", field)
                    ));
                }
            };
            Ok(SortConfig {
                field: field.clone(),
                direction,
            })
        })
        .collect()
}

/// 计算表达式：`"$path"` 取字段值，对象逐字段计算，其余按字面值
fn eval(doc: &Document, expr: &DataValue) -> Option<DataValue> {
    match expr {
        DataValue::String(s) if s.starts_with('$') => get_path(doc, &s[1..]).cloned(),
        DataValue::Object(fields) => Some(DataValue::Object(
            fields
                .iter()
                .map(|(k, v)| (k.clone(), eval(doc, v).unwrap_or(DataValue::Null)))
                .collect(),
        )),
        literal => Some(literal.clone()),
    }
}

fn is_exclusion(value: &DataValue) -> bool {
    matches!(value, DataValue::Bool(false) | DataValue::Int(0))
        || matches!(value, DataValue::Float(f) if *f == 0.0)
}

fn is_inclusion(value: &DataValue) -> bool {
    matches!(value, DataValue::Bool(true))
        || matches!(value, DataValue::Int(n) if *n != 0)
        || matches!(value, DataValue::Float(f) if *f != 0.0)
}

fn project(doc: &Document, spec: &Document) -> DocSyncResult<Document> {
    let exclude_mode = spec
        .iter()
        .filter(|(k, _)| k.as_str() != PRIMARY_KEY)
        .all(|(_, v)| is_exclusion(v));

    if exclude_mode {
        let mut out = doc.clone();
        for (key, _) in spec.iter().filter(|(_, v)| is_exclusion(v)) {
            out.remove(key);
        }
        return Ok(out);
    }

    let mut out = Document::new();
    let keep_id = spec.get(PRIMARY_KEY).is_none_or(|v| !is_exclusion(v));
    if keep_id {
        if let Some(id) = doc.get(PRIMARY_KEY) {
            out.insert(PRIMARY_KEY.to_string(), id.clone());
        }
    }

    for (key, value) in spec {
        if key == PRIMARY_KEY && (is_exclusion(value) || is_inclusion(value)) {
            continue;
        }
        if is_exclusion(value) {
            return Err(crate::docsync_error!(
                transport,
                format!("Invalid $project: cannot exclude {} in inclusion projection", key)
            ));
        }
        let projected = if is_inclusion(value) {
            get_path(doc, key).cloned()
        } else {
            eval(doc, value)
        };
        if let Some(projected) = projected {
            out.insert(key.clone(), projected);
        }
    }
    Ok(out)
}

fn unwind(docs: Vec<Document>, spec: &DataValue) -> DocSyncResult<Vec<Document>> {
    let path = match spec {
        DataValue::String(s) => s.as_str(),
        DataValue::Object(opts) => opts.get("path").and_then(|p| p.as_str()).unwrap_or(""),
        _ => "",
    };
    let field = path.strip_prefix('$').ok_or_else(|| {
        crate::docsync_error!(transport, "$unwind path must be prefixed by a '$' sign")
    })?;

    let mut out = Vec::with_capacity(docs.len());
    for doc in docs {
        match doc.get(field) {
            Some(DataValue::Array(items)) => {
                for item in items {
                    let mut copy = doc.clone();
                    copy.insert(field.to_string(), item.clone());
                    out.push(copy);
                }
            }
            None | Some(DataValue::Null) => {}
            Some(_) => out.push(doc),
        }
    }
    Ok(out)
}

/// 分组累加器
enum Accumulator {
    Sum(DataValue),
    Avg { total: f64, count: u64 },
    Min(Option<DataValue>),
    Max(Option<DataValue>),
    First(Option<DataValue>),
    Last(Option<DataValue>),
    Push(Vec<DataValue>),
    AddToSet(Vec<DataValue>),
}

impl Accumulator {
    fn new(op: &str) -> DocSyncResult<Self> {
        Ok(match op {
            "$sum" => Accumulator::Sum(DataValue::Int(0)),
            "$avg" => Accumulator::Avg { total: 0.0, count: 0 },
            "$min" => Accumulator::Min(None),
            "$max" => Accumulator::Max(None),
            "$first" => Accumulator::First(None),
            "$last" => Accumulator::Last(None),
            "$push" => Accumulator::Push(Vec::new()),
            "$addToSet" => Accumulator::AddToSet(Vec::new()),
            other => {
                return Err(crate::docsync_error!(
                    transport,
                    format!("unknown group operator '{}'", other)
                ));
            }
        })
    }

    fn feed(&mut self, value: Option<DataValue>) {
        match self {
            Accumulator::Sum(total) => {
                if let Some(sum) = value.as_ref().and_then(|v| add_numbers(total, v)) {
                    *total = sum;
                }
            }
            Accumulator::Avg { total, count } => {
                if let Some(n) = value.as_ref().and_then(|v| v.as_f64()) {
                    *total += n;
                    *count += 1;
                }
            }
            Accumulator::Min(current) => keep_extreme(current, value, Ordering::Less),
            Accumulator::Max(current) => keep_extreme(current, value, Ordering::Greater),
            Accumulator::First(current) => {
                if current.is_none() {
                    *current = Some(value.unwrap_or(DataValue::Null));
                }
            }
            Accumulator::Last(current) => *current = Some(value.unwrap_or(DataValue::Null)),
            Accumulator::Push(items) => {
                if let Some(v) = value {
                    items.push(v);
                }
            }
            Accumulator::AddToSet(items) => {
                if let Some(v) = value {
                    if !items.contains(&v) {
                        items.push(v);
                    }
                }
            }
        }
    }

    fn finish(self) -> DataValue {
        match self {
            Accumulator::Sum(total) => total,
            Accumulator::Avg { total, count } => {
                if count == 0 {
                    DataValue::Null
                } else {
                    DataValue::Float(total / count as f64)
                }
            }
            Accumulator::Min(v) | Accumulator::Max(v) | Accumulator::First(v) | Accumulator::Last(v) => {
                v.unwrap_or(DataValue::Null)
            }
            Accumulator::Push(items) | Accumulator::AddToSet(items) => DataValue::Array(items),
        }
    }
}

fn keep_extreme(current: &mut Option<DataValue>, value: Option<DataValue>, wanted: Ordering) {
    let Some(value) = value.filter(|v| !v.is_null()) else {
        return;
    };
    let replace = match current {
        None => true,
        Some(existing) => compare_values(&value, existing) == Some(wanted),
    };
    if replace {
        *current = Some(value);
    }
}

fn group(docs: &[Document], spec: &Document) -> DocSyncResult<Vec<Document>> {
    let key_expr = spec.get(PRIMARY_KEY).ok_or_else(|| {
        crate::docsync_error!(transport, "a group specification must include an _id")
    })?;

    let mut fields: Vec<(&String, &str, &DataValue)> = Vec::new();
    for (name, acc) in spec.iter().filter(|(k, _)| k.as_str() != PRIMARY_KEY) {
        let mut entries = acc.as_document().map(|d| d.iter()).into_iter().flatten();
        match (entries.next(), entries.next()) {
            (Some((op, expr)), None) => fields.push((name, op.as_str(), expr)),
            _ => {
                return Err(crate::docsync_error!(
                    transport,
                    format!("The field '{}' must be an accumulator object", name)
                ));
            }
        }
    }

    let mut groups: Vec<(DataValue, Vec<Accumulator>)> = Vec::new();
    for doc in docs {
        let key = eval(doc, key_expr).unwrap_or(DataValue::Null);
        let index = match groups.iter().position(|(k, _)| *k == key) {
            Some(index) => index,
            None => {
                let accs = fields
                    .iter()
                    .map(|(_, op, _)| Accumulator::new(op))
                    .collect::<DocSyncResult<Vec<_>>>()?;
                groups.push((key, accs));
                groups.len() - 1
            }
        };
        for (acc, (_, _, expr)) in groups[index].1.iter_mut().zip(&fields) {
            acc.feed(eval(doc, expr));
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, accs)| {
            let mut out = Document::new();
            out.insert(PRIMARY_KEY.to_string(), key);
            for (acc, (name, _, _)) in accs.into_iter().zip(&fields) {
                out.insert((*name).clone(), acc.finish());
            }
            out
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document;

    fn people() -> Vec<Document> {
        vec![
            document! { "_id" => 1, "name" => "Ryan", "age" => 30, "city" => "pdx", "tags" => vec![DataValue::from("a"), DataValue::from("b")] },
            document! { "_id" => 2, "name" => "Bob", "age" => 20, "city" => "pdx" },
            document! { "_id" => 3, "name" => "Eddie", "age" => 40, "city" => "sea" },
        ]
    }

    #[test]
    fn test_match_group_sort() {
        let pipeline = vec![
            document! { "$match" => document! { "age" => document! { "$gte" => 20 } } },
            document! { "$group" => document! {
                "_id" => "$city",
                "total" => document! { "$sum" => "$age" },
                "count" => document! { "$sum" => 1 },
                "avg" => document! { "$avg" => "$age" },
                "oldest" => document! { "$max" => "$age" },
            } },
            document! { "$sort" => document! { "total" => -1 } },
        ];
        let out = run_pipeline(people(), &pipeline).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].get("_id"), Some(&DataValue::from("pdx")));
        assert_eq!(out[0].get("total"), Some(&DataValue::Int(50)));
        assert_eq!(out[0].get("count"), Some(&DataValue::Int(2)));
        assert_eq!(out[0].get("avg"), Some(&DataValue::Float(25.0)));
        assert_eq!(out[0].get("oldest"), Some(&DataValue::Int(30)));
        assert_eq!(out[1].get("total"), Some(&DataValue::Int(40)));
    }

    #[test]
    fn test_project_unwind_count() {
        let pipeline = vec![
            document! { "$unwind" => "$tags" },
            document! { "$project" => document! { "_id" => 0, "name" => 1, "tag" => "$tags" } },
        ];
        let out = run_pipeline(people(), &pipeline).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], document! { "name" => "Ryan", "tag" => "a" });

        let out = run_pipeline(people(), &[document! { "$count" => "n" }]).unwrap();
        assert_eq!(out, vec![document! { "n" => 3 }]);
    }

    #[test]
    fn test_skip_limit_and_errors() {
        let out = run_pipeline(
            people(),
            &[document! { "$skip" => 1 }, document! { "$limit" => 1 }],
        )
        .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].get("name"), Some(&DataValue::from("Bob")));

        assert!(run_pipeline(people(), &[document! { "$nope" => 1 }]).is_err());
        assert!(run_pipeline(people(), &[document! { "$limit" => 1, "$skip" => 1 }]).is_err());
    }
}
