//! Canonical identifiers for references to other entities (categoria, proveedor, producto).
//!
//! Depending on the endpoint the backend sends a reference as a scalar id (`5`), a numeric string
//! (`"5"`), a nested object (`{"id": 5, "nombre": "Lácteos"}`) or `null`. Everything downstream of
//! deserialization only ever sees a `RefId`.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// A normalized reference id. `RefId::NONE` stands for "no reference".
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RefId(Option<i64>);

impl RefId {
    pub const NONE: RefId = RefId(None);

    pub const fn new(id: i64) -> Self {
        Self(Some(id))
    }

    pub fn get(&self) -> Option<i64> {
        self.0
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    /// Normalizes any JSON shape the backend uses for a reference.
    pub fn normalize(value: &Value) -> Self {
        match value {
            Value::Number(n) => match n.as_i64() {
                Some(id) => RefId::new(id),
                None => n
                    .as_f64()
                    .filter(|f| f.fract() == 0.0)
                    .map(|f| RefId::new(f as i64))
                    .unwrap_or_default(),
            },
            Value::String(s) => RefId::parse(s),
            Value::Object(map) => map.get("id").map(RefId::normalize).unwrap_or_default(),
            _ => RefId::NONE,
        }
    }

    /// Parses the leading integer of `s`, so `"12"` and `" 12 "` give 12 and `""` gives `NONE`.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let end = s
            .char_indices()
            .find(|&(ix, c)| !(c.is_ascii_digit() || (ix == 0 && c == '-')))
            .map(|(ix, _)| ix)
            .unwrap_or(s.len());
        s[..end].parse::<i64>().map(RefId::new).unwrap_or_default()
    }
}

impl From<i64> for RefId {
    fn from(id: i64) -> Self {
        RefId::new(id)
    }
}

impl Display for RefId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(id) => write!(f, "{id}"),
            None => Ok(()),
        }
    }
}

impl Serialize for RefId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for RefId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Ok(RefId::normalize(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_scalar() {
        assert_eq!(RefId::normalize(&json!(5)), RefId::new(5));
        assert_eq!(RefId::normalize(&json!(5.0)), RefId::new(5));
        assert_eq!(RefId::normalize(&json!(5.5)), RefId::NONE);
    }

    #[test]
    fn test_normalize_string() {
        assert_eq!(RefId::normalize(&json!("5")), RefId::new(5));
        assert_eq!(RefId::normalize(&json!("12abc")), RefId::new(12));
        assert_eq!(RefId::normalize(&json!("")), RefId::NONE);
        assert_eq!(RefId::normalize(&json!("all")), RefId::NONE);
    }

    #[test]
    fn test_normalize_nested_object() {
        let nested = json!({"id": 7, "nombre": "Lácteos"});
        assert_eq!(RefId::normalize(&nested), RefId::new(7));
        let nested_string_id = json!({"id": "7"});
        assert_eq!(RefId::normalize(&nested_string_id), RefId::new(7));
        assert_eq!(RefId::normalize(&json!({"nombre": "x"})), RefId::NONE);
    }

    #[test]
    fn test_normalize_null_and_other() {
        assert_eq!(RefId::normalize(&Value::Null), RefId::NONE);
        assert_eq!(RefId::normalize(&json!(true)), RefId::NONE);
        assert_eq!(RefId::normalize(&json!([1])), RefId::NONE);
    }

    #[derive(Deserialize)]
    struct Holder {
        #[serde(default)]
        categoria: RefId,
    }

    #[test]
    fn test_deserialize_in_struct() {
        let h: Holder = serde_json::from_str(r#"{"categoria": {"id": 3}}"#).unwrap();
        assert_eq!(h.categoria, RefId::new(3));
        let h: Holder = serde_json::from_str(r#"{"categoria": null}"#).unwrap();
        assert!(h.categoria.is_none());
        let h: Holder = serde_json::from_str(r#"{}"#).unwrap();
        assert!(h.categoria.is_none());
    }

    #[test]
    fn test_serialize() {
        assert_eq!(serde_json::to_string(&RefId::new(4)).unwrap(), "4");
        assert_eq!(serde_json::to_string(&RefId::NONE).unwrap(), "null");
    }
}
