//! Structural comparison helpers shared by every reconciler.
//!
//! Resources are compared through their serialized JSON form, restricted to a
//! subset of field names (the serialized, camelCase names). A field that is
//! missing and a field that is `null` are indistinguishable here, at every
//! nesting level.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Either a single value or a sequence of values, as accepted in declarative input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    pub fn into_vec(self) -> Vec<T> {
        match self {
            Self::Many(items) => items,
            Self::One(item) => vec![item],
        }
    }
}

/// Absent becomes empty, a scalar becomes a singleton, a sequence is unchanged.
pub fn normalize_list<T>(value: Option<OneOrMany<T>>) -> Vec<T> {
    value.map(OneOrMany::into_vec).unwrap_or_default()
}

/// Serde adapter for list fields that also accept a single item or nothing.
pub fn deserialize_list<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<OneOrMany<T>>::deserialize(deserializer).map(normalize_list)
}

/// Serialize a resource into the record form used for comparisons.
pub fn to_record<T: Serialize + ?Sized>(item: &T) -> Result<Value> {
    Ok(serde_json::to_value(item)?)
}

/// True iff `a` and `b` agree on every field named in `keys`.
pub fn keyed_equals(keys: &[&str], a: &Value, b: &Value) -> bool {
    keys.iter().all(|key| field(a, key) == field(b, key))
}

/// Projection of a record onto `keys`, in key order.
pub fn project(keys: &[&str], record: &Value) -> Vec<Value> {
    keys.iter().map(|key| field(record, key)).collect()
}

/// Elements of `list_a` whose projection onto `keys` matches nothing in `list_b`.
pub fn set_difference<'a, A, B>(keys: &[&str], list_a: &'a [A], list_b: &[B]) -> Result<Vec<&'a A>>
where
    A: Serialize,
    B: Serialize,
{
    let present = list_b
        .iter()
        .map(|item| to_record(item).map(|record| project(keys, &record)))
        .collect::<Result<Vec<_>>>()?;

    let mut missing = Vec::new();
    for item in list_a {
        let projection = project(keys, &to_record(item)?);
        if !present.contains(&projection) {
            missing.push(item);
        }
    }
    Ok(missing)
}

/// Fails if two elements share the same projection onto `keys`.
pub fn duplicate_check<T: Serialize>(kind: &str, keys: &[&str], list: &[T]) -> Result<()> {
    let mut seen: Vec<Vec<Value>> = Vec::with_capacity(list.len());
    for item in list {
        let projection = project(keys, &to_record(item)?);
        if seen.contains(&projection) {
            return Err(CoreError::duplicate_key(
                kind,
                keys.join(", "),
                describe(&projection),
            ));
        }
        seen.push(projection);
    }
    Ok(())
}

/// Human readable rendering of a projection, e.g. `Query.getPost`.
pub fn describe(projection: &[Value]) -> String {
    projection
        .iter()
        .map(|value| match value {
            Value::String(s) => s.clone(),
            Value::Null => "<unset>".to_string(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(".")
}

fn field(record: &Value, key: &str) -> Value {
    record.get(key).map(strip_nulls).unwrap_or(Value::Null)
}

fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(strip_nulls).collect()),
        other => other.clone(),
    }
}
