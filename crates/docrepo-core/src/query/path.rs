use crate::query::Document;
use serde_json::Value;
use std::cmp::Ordering;

/// Resolve a dotted path without fanning out over arrays.
#[must_use]
pub fn get_path<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;

    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    Some(current)
}

/// Assign a value at a dotted path, creating intermediate objects.
/// A non-object intermediate is replaced.
pub fn set_path(doc: &mut Document, path: &str, value: Value) {
    match path.split_once('.') {
        None => {
            doc.insert(path.to_string(), value);
        }
        Some((head, rest)) => {
            let slot = doc
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Document::new()));
            if !slot.is_object() {
                *slot = Value::Object(Document::new());
            }
            if let Value::Object(inner) = slot {
                set_path(inner, rest, value);
            }
        }
    }
}

/// Collect every value reachable at a dotted path.
///
/// Arrays met on the way fan out, so `tags.name` on a list of nested
/// objects yields one value per element.
#[must_use]
pub fn values_at<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let segments: Vec<&str> = path.split('.').collect();
    let mut out = Vec::new();

    if let Some((head, rest)) = segments.split_first()
        && let Some(value) = doc.get(*head)
    {
        collect(value, rest, &mut out);
    }

    out
}

fn collect<'a>(value: &'a Value, rest: &[&str], out: &mut Vec<&'a Value>) {
    let Some((head, tail)) = rest.split_first() else {
        out.push(value);
        return;
    };

    match value {
        Value::Object(map) => {
            if let Some(next) = map.get(*head) {
                collect(next, tail, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect(item, rest, out);
            }
        }
        _ => {}
    }
}

// Cross-type rank, lowest first.
const fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Total order over JSON values used for sorting and range filters.
///
/// Values of different kinds order by kind (null, numbers, strings,
/// objects, arrays, booleans); values of one kind order naturally.
#[must_use]
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return x.cmp(&y);
            }
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(x), Value::Object(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y) {
                let ord = lk.cmp(rk).then_with(|| compare_values(lv, rv));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Equality under `compare_values`, so `1` and `1.0` are equal.
#[must_use]
pub fn values_equal(a: &Value, b: &Value) -> bool {
    compare_values(a, b) == Ordering::Equal
}
