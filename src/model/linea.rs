use crate::model::{Monto, RefId, Value};
use serde::{Deserialize, Serialize};

/// A purchase or sale line item (`DetalleCompra` / `DetalleVenta`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Linea {
    #[serde(default)]
    pub producto: RefId,
    #[serde(default)]
    pub producto_nombre: Option<String>,
    #[serde(default)]
    pub producto_codigo: Option<String>,
    #[serde(default)]
    pub cantidad: Option<i64>,
    /// Purchases call this `costo_unitario`, sales call it `precio_unitario`.
    #[serde(default, alias = "costo_unitario")]
    pub precio_unitario: Monto,
    #[serde(default)]
    pub subtotal: Monto,
}

impl Linea {
    pub fn cantidad(&self) -> i64 {
        self.cantidad.unwrap_or_default()
    }

    /// The stored subtotal, or `cantidad * precio_unitario` when the backend did not send one.
    pub fn subtotal(&self) -> Monto {
        if self.subtotal.is_zero() {
            self.precio_unitario * self.cantidad().into()
        } else {
            self.subtotal
        }
    }

    pub fn value(&self, name: &str) -> Value<'_> {
        match name {
            "producto" => Value::Ref(self.producto),
            "producto_nombre" => Value::opt_text(&self.producto_nombre),
            "producto_codigo" => Value::opt_text(&self.producto_codigo),
            "cantidad" => Value::opt_number(self.cantidad),
            "precio_unitario" | "costo_unitario" => Value::Money(self.precio_unitario),
            "subtotal" => Value::Money(self.subtotal()),
            _ => Value::Missing,
        }
    }
}

/// Resolves `items.<field>` against a list of line items, gathering one value per line.
pub(crate) fn lineas_value<'a>(lineas: &'a [Linea], name: &str) -> Option<Value<'a>> {
    let field = name.strip_prefix("items.")?;
    Some(Value::List(lineas.iter().map(|l| l.value(field)).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_deserialize_purchase_line() {
        let json = r#"{"producto": 4, "cantidad": 10, "costo_unitario": "450.00",
            "subtotal": "4500.00", "producto_nombre": "Leche entera 1L"}"#;
        let linea: Linea = serde_json::from_str(json).unwrap();
        assert_eq!(linea.producto, RefId::new(4));
        assert_eq!(linea.precio_unitario.value(), Decimal::from(450));
        assert_eq!(linea.subtotal().value(), Decimal::from(4500));
    }

    #[test]
    fn test_subtotal_falls_back_to_product() {
        let json = r#"{"producto": {"id": 4}, "cantidad": 3, "precio_unitario": 990}"#;
        let linea: Linea = serde_json::from_str(json).unwrap();
        assert_eq!(linea.subtotal().value(), Decimal::from(2970));
    }

    #[test]
    fn test_missing_cantidad_is_zero() {
        let linea: Linea = serde_json::from_str("{}").unwrap();
        assert_eq!(linea.cantidad(), 0);
        assert!(linea.subtotal().is_zero());
    }

    #[test]
    fn test_lineas_value() {
        let lineas = vec![
            Linea {
                producto_nombre: Some("Pan".into()),
                ..Linea::default()
            },
            Linea::default(),
        ];
        let v = lineas_value(&lineas, "items.producto_nombre").unwrap();
        assert_eq!(v, Value::List(vec![Value::text("Pan"), Value::Missing]));
        assert!(lineas_value(&lineas, "producto_nombre").is_none());
    }
}
