use crate::model::fecha::{self, Fecha};
use crate::model::linea::lineas_value;
use crate::model::{Item, Linea, Monto, Value};
use serde::{Deserialize, Serialize};

/// A sale (boleta), with its line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Venta {
    pub id: i64,
    #[serde(default)]
    pub numero_boleta: Option<String>,
    #[serde(default, deserialize_with = "fecha::lenient")]
    pub fecha: Option<Fecha>,
    #[serde(default)]
    pub total: Monto,
    #[serde(default)]
    pub usuario: Option<String>,
    #[serde(default)]
    pub observaciones: Option<String>,
    #[serde(default)]
    pub items: Vec<Linea>,
}

impl Item for Venta {
    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, name: &str) -> Value<'_> {
        if let Some(v) = lineas_value(&self.items, name) {
            return v;
        }
        match name {
            "id" => Value::Number(self.id.into()),
            "numero_boleta" => Value::opt_text(&self.numero_boleta),
            "fecha" => Value::opt_date(self.fecha),
            "total" => Value::Money(self.total),
            "usuario" => Value::opt_text(&self.usuario),
            "observaciones" => Value::opt_text(&self.observaciones),
            "items" => Value::Number(self.items.len().into()),
            _ => Value::Missing,
        }
    }

    fn lineas(&self) -> &[Linea] {
        &self.items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_items_lookup() {
        let json = r#"{"id": 7, "numero_boleta": "B-7", "total": 2980, "items": [
            {"producto": 1, "producto_nombre": "Pan", "producto_codigo": "PAN-01", "cantidad": 2, "precio_unitario": 990},
            {"producto": 2, "producto_nombre": "Leche", "cantidad": 1, "precio_unitario": 1000}
        ]}"#;
        let v: Venta = serde_json::from_str(json).unwrap();
        let names = v.value("items.producto_nombre");
        assert_eq!(names.search_texts(), vec!["Pan", "Leche"]);
        assert_eq!(v.value("items.producto_codigo").search_texts(), vec!["PAN-01"]);
    }
}
