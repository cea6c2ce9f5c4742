use crate::error::Res;
use crate::model::{Fecha, Linea, Monto, RefId};
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// One element of a fetched collection (a producto, compra, venta, proveedor or alerta).
///
/// Filters, comparators and aggregates never touch struct fields directly. They ask for a field by
/// name through [`Item::value`], which lets a screen be configured with plain field names.
pub trait Item {
    /// The identity field.
    fn id(&self) -> i64;

    /// Given the field `name`, retrieve its value. Unknown or absent fields are `Value::Missing`.
    fn value(&self, name: &str) -> Value<'_>;

    /// Purchase/sale line items, if this kind of item has them.
    fn lineas(&self) -> &[Linea] {
        &[]
    }

    /// Given the order of the `headers`, convert the field values to display strings in the same
    /// order.
    fn to_row(&self, headers: &[&str]) -> Vec<String> {
        headers.iter().map(|h| self.value(h).to_string()).collect()
    }
}

/// A field value as seen by the view pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Value<'a> {
    Missing,
    Text(Cow<'a, str>),
    Number(Decimal),
    Money(Monto),
    Ref(RefId),
    Date(Fecha),
    Flag(bool),
    /// Values gathered from nested line items.
    List(Vec<Value<'a>>),
}

impl<'a> Value<'a> {
    pub fn text(s: &'a str) -> Self {
        Value::Text(Cow::Borrowed(s))
    }

    /// `None` and empty strings become `Missing`.
    pub fn opt_text(s: &'a Option<String>) -> Self {
        match s.as_deref() {
            Some(s) if !s.is_empty() => Value::text(s),
            _ => Value::Missing,
        }
    }

    pub fn opt_number(n: Option<i64>) -> Self {
        n.map(|n| Value::Number(Decimal::from(n)))
            .unwrap_or(Value::Missing)
    }

    pub fn opt_flag(b: Option<bool>) -> Self {
        b.map(Value::Flag).unwrap_or(Value::Missing)
    }

    pub fn opt_date(f: Option<Fecha>) -> Self {
        f.map(Value::Date).unwrap_or(Value::Missing)
    }

    pub fn is_missing(&self) -> bool {
        match self {
            Value::Missing => true,
            Value::Text(s) => s.is_empty(),
            Value::Ref(r) => r.is_none(),
            Value::List(values) => values.iter().all(Value::is_missing),
            _ => false,
        }
    }

    /// The numeric reading of this value. Anything non-numeric is zero.
    pub fn as_decimal(&self) -> Decimal {
        match self {
            Value::Number(n) => *n,
            Value::Money(m) => m.value(),
            Value::Ref(r) => r.get().map(Decimal::from).unwrap_or_default(),
            _ => Decimal::ZERO,
        }
    }

    pub fn as_ref_id(&self) -> RefId {
        match self {
            Value::Ref(r) => *r,
            Value::Number(n) if n.fract().is_zero() => {
                n.to_i64().map(RefId::new).unwrap_or_default()
            }
            Value::Text(s) => RefId::parse(s),
            _ => RefId::NONE,
        }
    }

    pub fn as_date(&self) -> Option<Fecha> {
        match self {
            Value::Date(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Value::Flag(b) => Some(*b),
            _ => None,
        }
    }

    /// The text used to sort by this value. Text is borrowed, anything else is formatted.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            Value::Text(s) => Cow::Borrowed(s.as_ref()),
            Value::Missing => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }

    /// The strings a text search looks at: text as-is, numbers and ids in their plain form, and
    /// every element of a list.
    pub fn search_texts(&self) -> Vec<Cow<'_, str>> {
        match self {
            Value::Text(s) => vec![Cow::Borrowed(s.as_ref())],
            Value::Number(n) => vec![Cow::Owned(n.normalize().to_string())],
            Value::Ref(r) if !r.is_none() => vec![Cow::Owned(r.to_string())],
            Value::List(values) => values.iter().flat_map(Value::search_texts).collect(),
            _ => Vec::new(),
        }
    }
}

impl Display for Value<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Missing => Ok(()),
            Value::Text(s) => write!(f, "{s}"),
            Value::Number(n) => write!(f, "{}", n.normalize()),
            Value::Money(m) => write!(f, "{m}"),
            Value::Ref(r) => write!(f, "{r}"),
            Value::Date(d) => write!(f, "{d}"),
            Value::Flag(true) => write!(f, "sí"),
            Value::Flag(false) => write!(f, "no"),
            Value::List(values) => {
                let parts: Vec<String> = values.iter().map(|v| v.to_string()).collect();
                write!(f, "{}", parts.join(", "))
            }
        }
    }
}

/// The shapes a collection endpoint may answer with.
#[derive(Deserialize)]
#[serde(untagged)]
#[serde(bound(deserialize = "I: DeserializeOwned"))]
enum Response<I> {
    Paged { results: Vec<I> },
    Bare(Vec<I>),
}

/// Parses a collection response body, either a paginated envelope (`{"count": .., "results": [..]}`)
/// or a bare JSON array.
pub fn parse_collection<I>(body: &str) -> Res<Vec<I>>
where
    I: DeserializeOwned,
{
    let response: Response<I> =
        serde_json::from_str(body).context("Unable to parse the collection response")?;
    Ok(match response {
        Response::Paged { results } => results,
        Response::Bare(items) => items,
    })
}
