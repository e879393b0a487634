use crate::query::{
    Document, QueryError, json_kind,
    path::{compare_values, values_at, values_equal},
};
use serde_json::Value;
use std::{cmp::Ordering, fmt, str::FromStr};

///
/// Filter
///
/// Structured predicate over a document. Paths are dot-separated and fan
/// out across arrays; a field holding an array matches when any element does.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Filter {
    #[default]
    All,
    Eq(String, Value),
    Ne(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    Lt(String, Value),
    Lte(String, Value),
    In(String, Vec<Value>),
    Nin(String, Vec<Value>),
    Exists(String, bool),
    /// Value kind check by type alias (`"string"`, `"number"`, ...).
    Type(String, Vec<String>),
    And(Vec<Self>),
    Or(Vec<Self>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(path.into(), value.into())
    }

    pub fn ne(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Ne(path.into(), value.into())
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gt(path.into(), value.into())
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(path.into(), value.into())
    }

    pub fn lt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lt(path.into(), value.into())
    }

    pub fn lte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(path.into(), value.into())
    }

    pub fn is_in<I, V>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::In(path.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn not_in<I, V>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Nin(path.into(), values.into_iter().map(Into::into).collect())
    }

    pub fn exists(path: impl Into<String>, exists: bool) -> Self {
        Self::Exists(path.into(), exists)
    }

    pub fn of_type(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::Type(path.into(), vec![alias.into()])
    }

    /// Conjunction, flattening nested `And` and dropping `All`.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut parts = Vec::new();
        for part in [self, other] {
            match part {
                Self::All => {}
                Self::And(inner) => parts.extend(inner),
                other => parts.push(other),
            }
        }

        match parts.len() {
            0 => Self::All,
            1 => parts.remove(0),
            _ => Self::And(parts),
        }
    }

    #[must_use]
    pub const fn is_all(&self) -> bool {
        matches!(self, Self::All)
    }

    ///
    /// EVALUATION
    ///

    #[must_use]
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Self::All => true,
            Self::Eq(path, value) => eq_matches(doc, path, value),
            Self::Ne(path, value) => !eq_matches(doc, path, value),
            Self::Gt(path, value) => range_matches(doc, path, value, Ordering::is_gt),
            Self::Gte(path, value) => range_matches(doc, path, value, Ordering::is_ge),
            Self::Lt(path, value) => range_matches(doc, path, value, Ordering::is_lt),
            Self::Lte(path, value) => range_matches(doc, path, value, Ordering::is_le),
            Self::In(path, values) => values.iter().any(|v| eq_matches(doc, path, v)),
            Self::Nin(path, values) => !values.iter().any(|v| eq_matches(doc, path, v)),
            Self::Exists(path, expected) => values_at(doc, path).is_empty() != *expected,
            Self::Type(path, aliases) => candidates(doc, path)
                .into_iter()
                .any(|v| aliases.iter().any(|alias| type_matches(v, alias))),
            Self::And(parts) => parts.iter().all(|f| f.matches(doc)),
            Self::Or(parts) => parts.iter().any(|f| f.matches(doc)),
        }
    }

    ///
    /// TEXT FORM
    ///

    /// Parse the JSON text form, e.g. `{"age": {"$gt": 3}, "$or": [...]}`.
    pub fn parse(text: &str) -> Result<Self, QueryError> {
        let value: Value = serde_json::from_str(text)?;
        match value {
            Value::Object(doc) => Self::from_document(&doc),
            other => Err(QueryError::NotAnObject {
                found: json_kind(&other),
            }),
        }
    }

    pub fn from_document(doc: &Document) -> Result<Self, QueryError> {
        let mut clauses = Vec::with_capacity(doc.len());

        for (key, value) in doc {
            match key.as_str() {
                "$and" => clauses.push(Self::And(parse_list(key, value)?)),
                "$or" => clauses.push(Self::Or(parse_list(key, value)?)),
                op if op.starts_with('$') => {
                    return Err(QueryError::UnsupportedOperator {
                        field: String::new(),
                        operator: op.to_string(),
                    });
                }
                field => clauses.extend(parse_field(field, value)?),
            }
        }

        Ok(match clauses.len() {
            0 => Self::All,
            1 => clauses.remove(0),
            _ => Self::And(clauses),
        })
    }

    #[must_use]
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();

        match self {
            Self::All => {}
            Self::Eq(path, value) => {
                let rendered = if value.is_object() {
                    operator("$eq", value.clone())
                } else {
                    value.clone()
                };
                doc.insert(path.clone(), rendered);
            }
            Self::Ne(path, value) => {
                doc.insert(path.clone(), operator("$ne", value.clone()));
            }
            Self::Gt(path, value) => {
                doc.insert(path.clone(), operator("$gt", value.clone()));
            }
            Self::Gte(path, value) => {
                doc.insert(path.clone(), operator("$gte", value.clone()));
            }
            Self::Lt(path, value) => {
                doc.insert(path.clone(), operator("$lt", value.clone()));
            }
            Self::Lte(path, value) => {
                doc.insert(path.clone(), operator("$lte", value.clone()));
            }
            Self::In(path, values) => {
                doc.insert(path.clone(), operator("$in", Value::Array(values.clone())));
            }
            Self::Nin(path, values) => {
                doc.insert(path.clone(), operator("$nin", Value::Array(values.clone())));
            }
            Self::Exists(path, exists) => {
                doc.insert(path.clone(), operator("$exists", Value::Bool(*exists)));
            }
            Self::Type(path, aliases) => {
                let operand = match aliases.as_slice() {
                    [alias] => Value::String(alias.clone()),
                    _ => Value::Array(aliases.iter().cloned().map(Value::String).collect()),
                };
                doc.insert(path.clone(), operator("$type", operand));
            }
            Self::And(parts) => {
                doc.insert("$and".to_string(), render_list(parts));
            }
            Self::Or(parts) => {
                doc.insert("$or".to_string(), render_list(parts));
            }
        }

        doc
    }

    /// Equality values this filter pins, used to seed upserted documents.
    #[must_use]
    pub fn equality_fields(&self) -> Vec<(&str, &Value)> {
        match self {
            Self::Eq(path, value) => vec![(path.as_str(), value)],
            Self::And(parts) => parts.iter().flat_map(Self::equality_fields).collect(),
            _ => Vec::new(),
        }
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Value::Object(self.to_document()))
    }
}

impl FromStr for Filter {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// Candidate values at a path: each resolved value, plus the elements of
// any resolved array.
fn candidates<'a>(doc: &'a Document, path: &str) -> Vec<&'a Value> {
    let mut out = Vec::new();
    for value in values_at(doc, path) {
        if let Value::Array(items) = value {
            out.extend(items.iter());
        }
        out.push(value);
    }

    out
}

fn eq_matches(doc: &Document, path: &str, expected: &Value) -> bool {
    let found = candidates(doc, path);
    if found.is_empty() {
        return expected.is_null();
    }

    found.into_iter().any(|v| values_equal(v, expected))
}

fn same_kind(a: &Value, b: &Value) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn range_matches(doc: &Document, path: &str, bound: &Value, accept: fn(Ordering) -> bool) -> bool {
    candidates(doc, path)
        .into_iter()
        .filter(|v| same_kind(v, bound))
        .any(|v| accept(compare_values(v, bound)))
}

fn operator(name: &str, value: Value) -> Value {
    let mut doc = Document::new();
    doc.insert(name.to_string(), value);

    Value::Object(doc)
}

fn render_list(parts: &[Filter]) -> Value {
    Value::Array(
        parts
            .iter()
            .map(|part| Value::Object(part.to_document()))
            .collect(),
    )
}

fn parse_list(operator: &str, value: &Value) -> Result<Vec<Filter>, QueryError> {
    let Value::Array(items) = value else {
        return Err(QueryError::InvalidOperand {
            operator: operator.to_string(),
            expected: "an array of objects",
        });
    };

    items
        .iter()
        .map(|item| match item {
            Value::Object(doc) => Filter::from_document(doc),
            _ => Err(QueryError::InvalidOperand {
                operator: operator.to_string(),
                expected: "an array of objects",
            }),
        })
        .collect()
}

fn is_operator_object(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|doc| !doc.is_empty() && doc.keys().all(|k| k.starts_with('$')))
}

fn parse_field(field: &str, value: &Value) -> Result<Vec<Filter>, QueryError> {
    if !is_operator_object(value) {
        return Ok(vec![Filter::Eq(field.to_string(), value.clone())]);
    }

    let Some(ops) = value.as_object() else {
        return Ok(Vec::new());
    };

    ops.iter()
        .map(|(op, operand)| {
            let path = field.to_string();
            let filter = match op.as_str() {
                "$eq" => Filter::Eq(path, operand.clone()),
                "$ne" => Filter::Ne(path, operand.clone()),
                "$gt" => Filter::Gt(path, operand.clone()),
                "$gte" => Filter::Gte(path, operand.clone()),
                "$lt" => Filter::Lt(path, operand.clone()),
                "$lte" => Filter::Lte(path, operand.clone()),
                "$in" => Filter::In(path, array_operand(op, operand)?),
                "$nin" => Filter::Nin(path, array_operand(op, operand)?),
                "$type" => Filter::Type(path, type_operand(operand)?),
                "$exists" => match operand {
                    Value::Bool(b) => Filter::Exists(path, *b),
                    Value::Number(n) => Filter::Exists(path, n.as_f64() != Some(0.0)),
                    _ => {
                        return Err(QueryError::InvalidOperand {
                            operator: op.clone(),
                            expected: "a boolean",
                        });
                    }
                },
                _ => {
                    return Err(QueryError::UnsupportedOperator {
                        field: field.to_string(),
                        operator: op.clone(),
                    });
                }
            };

            Ok(filter)
        })
        .collect()
}

fn array_operand(op: &str, operand: &Value) -> Result<Vec<Value>, QueryError> {
    match operand {
        Value::Array(items) => Ok(items.clone()),
        _ => Err(QueryError::InvalidOperand {
            operator: op.to_string(),
            expected: "an array",
        }),
    }
}

// Type aliases and their numeric codes. Kinds JSON cannot hold are
// accepted and never match.
const TYPE_ALIASES: &[(&str, i64)] = &[
    ("double", 1),
    ("string", 2),
    ("object", 3),
    ("array", 4),
    ("binData", 5),
    ("objectId", 7),
    ("bool", 8),
    ("date", 9),
    ("null", 10),
    ("regex", 11),
    ("javascript", 13),
    ("int", 16),
    ("timestamp", 17),
    ("long", 18),
    ("decimal", 19),
    ("minKey", -1),
    ("maxKey", 127),
];

fn type_alias(operand: &Value) -> Result<String, QueryError> {
    let found = match operand {
        Value::String(name) if name == "number" => Some("number"),
        Value::String(name) => TYPE_ALIASES
            .iter()
            .find(|(alias, _)| alias == name)
            .map(|(alias, _)| *alias),
        Value::Number(code) => TYPE_ALIASES
            .iter()
            .find(|(_, c)| code.as_i64() == Some(*c))
            .map(|(alias, _)| *alias),
        _ => None,
    };

    found.map(str::to_string).ok_or_else(|| QueryError::InvalidOperand {
        operator: "$type".to_string(),
        expected: "a type alias or code",
    })
}

fn type_operand(operand: &Value) -> Result<Vec<String>, QueryError> {
    match operand {
        Value::Array(items) if !items.is_empty() => items.iter().map(type_alias).collect(),
        other => Ok(vec![type_alias(other)?]),
    }
}

fn type_matches(value: &Value, alias: &str) -> bool {
    match (alias, value) {
        ("string", Value::String(_))
        | ("object", Value::Object(_))
        | ("array", Value::Array(_))
        | ("bool", Value::Bool(_))
        | ("null", Value::Null)
        | ("number", Value::Number(_)) => true,
        ("double", Value::Number(n)) => n.is_f64(),
        ("long", Value::Number(n)) => n.is_i64() || n.is_u64(),
        ("int", Value::Number(n)) => n.as_i64().is_some_and(|i| i32::try_from(i).is_ok()),
        _ => false,
    }
}
