use crate::model::fecha::{self, Fecha};
use crate::model::{Item, RefId, Value};
use serde::{Deserialize, Serialize};

/// A low-stock alert raised by the backend for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Alerta {
    pub id: i64,
    #[serde(default)]
    pub producto: RefId,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    #[serde(default)]
    pub producto_codigo: Option<String>,
    #[serde(default)]
    pub stock_actual: Option<i64>,
    #[serde(default)]
    pub stock_minimo: Option<i64>,
    #[serde(default)]
    pub leida: bool,
    #[serde(default, deserialize_with = "fecha::lenient")]
    pub fecha_creacion: Option<Fecha>,
    #[serde(default, deserialize_with = "fecha::lenient")]
    pub fecha_lectura: Option<Fecha>,
}

impl Alerta {
    /// The line shown for this alert, e.g. `Leche entera 1L: stock 4 (mínimo 10)`.
    pub fn mensaje(&self) -> String {
        let nombre = self.producto_nombre.as_deref().unwrap_or("Producto sin nombre");
        match (self.stock_actual, self.stock_minimo) {
            (Some(actual), Some(minimo)) => format!("{nombre}: stock {actual} (mínimo {minimo})"),
            (Some(actual), None) => format!("{nombre}: stock {actual}"),
            _ => nombre.to_string(),
        }
    }
}

impl Item for Alerta {
    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, name: &str) -> Value<'_> {
        match name {
            "id" => Value::Number(self.id.into()),
            "producto" => Value::Ref(self.producto),
            "producto_nombre" => Value::opt_text(&self.producto_nombre),
            "producto_codigo" => Value::opt_text(&self.producto_codigo),
            "stock_actual" => Value::opt_number(self.stock_actual),
            "stock_minimo" => Value::opt_number(self.stock_minimo),
            "leida" => Value::Flag(self.leida),
            "fecha_creacion" => Value::opt_date(self.fecha_creacion),
            "fecha_lectura" => Value::opt_date(self.fecha_lectura),
            _ => Value::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::parse_collection;

    #[test]
    fn test_parse_alertas() {
        let json = r#"[{
            "id": 3, "producto": 12, "producto_nombre": "Leche entera 1L",
            "producto_codigo": "PROD-1A2B3C4D", "stock_actual": 4, "stock_minimo": 10,
            "leida": false, "fecha_creacion": "2025-03-02T10:15:00Z", "fecha_lectura": null
        }]"#;
        let alertas: Vec<Alerta> = parse_collection(json).unwrap();
        let a = &alertas[0];
        assert_eq!(a.producto, RefId::new(12));
        assert!(!a.leida);
        assert!(a.fecha_lectura.is_none());
        assert_eq!(a.mensaje(), "Leche entera 1L: stock 4 (mínimo 10)");
        assert_eq!(a.value("leida"), Value::Flag(false));
    }

    #[test]
    fn test_mensaje_without_product() {
        let a = Alerta {
            id: 1,
            ..Alerta::default()
        };
        assert_eq!(a.mensaje(), "Producto sin nombre");
        assert!(a.value("producto").is_missing());
    }
}
