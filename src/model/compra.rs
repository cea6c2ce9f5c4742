use crate::model::fecha::{self, Fecha};
use crate::model::linea::lineas_value;
use crate::model::{Item, Linea, Monto, RefId, Value};
use serde::{Deserialize, Serialize};

/// A purchase from a supplier, with its line items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Compra {
    pub id: i64,
    #[serde(default)]
    pub numero_factura: Option<String>,
    #[serde(default)]
    pub proveedor: RefId,
    #[serde(default)]
    pub proveedor_nombre: Option<String>,
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

impl Item for Compra {
    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, name: &str) -> Value<'_> {
        if let Some(v) = lineas_value(&self.items, name) {
            return v;
        }
        match name {
            "id" => Value::Number(self.id.into()),
            "numero_factura" => Value::opt_text(&self.numero_factura),
            "proveedor" => Value::Ref(self.proveedor),
            "proveedor_nombre" => Value::opt_text(&self.proveedor_nombre),
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
    use rust_decimal::Decimal;

    #[test]
    fn test_deserialize() {
        let json = r#"{
            "id": 40, "numero_factura": "F-1001", "proveedor": {"id": 2},
            "proveedor_nombre": "Soprole", "fecha": "2025-04-02T09:30:00",
            "total": "45000.00", "usuario": "bodega",
            "items": [
                {"producto": 1, "cantidad": 20, "costo_unitario": "1500.00", "subtotal": "30000.00"},
                {"producto": 2, "cantidad": 10, "costo_unitario": "1500.00", "subtotal": "15000.00"}
            ]
        }"#;
        let c: Compra = serde_json::from_str(json).unwrap();
        assert_eq!(c.proveedor, RefId::new(2));
        assert_eq!(c.lineas().len(), 2);
        assert_eq!(c.value("items"), Value::Number(Decimal::from(2)));
        assert_eq!(c.value("total").as_decimal(), Decimal::from(45000));
    }

    #[test]
    fn test_no_items_no_fecha() {
        let c: Compra = serde_json::from_str(r#"{"id": 1, "fecha": null}"#).unwrap();
        assert!(c.lineas().is_empty());
        assert_eq!(c.value("fecha"), Value::Missing);
    }
}
