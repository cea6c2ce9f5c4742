use crate::model::fecha::{self, Fecha};
use crate::model::{Item, Monto, RefId, Value};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A product as returned by the productos endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Producto {
    pub id: i64,
    #[serde(default)]
    pub codigo: Option<String>,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub codigo_barras: Option<String>,
    #[serde(default)]
    pub descripcion: Option<String>,
    #[serde(default)]
    pub categoria: RefId,
    #[serde(default)]
    pub categoria_nombre: Option<String>,
    #[serde(default)]
    pub proveedor: RefId,
    #[serde(default)]
    pub proveedor_nombre: Option<String>,
    #[serde(default)]
    pub costo: Monto,
    #[serde(default)]
    pub precio_venta: Monto,
    #[serde(default)]
    pub stock_actual: Option<i64>,
    #[serde(default)]
    pub stock_minimo: Option<i64>,
    #[serde(default)]
    pub unidad_medida: Option<String>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default, deserialize_with = "fecha::lenient")]
    pub fecha_creacion: Option<Fecha>,
}

impl Producto {
    pub fn stock_actual(&self) -> i64 {
        self.stock_actual.unwrap_or_default()
    }

    pub fn stock_minimo(&self) -> i64 {
        self.stock_minimo.unwrap_or_default()
    }

    /// `(precio_venta - costo) / costo * 100`, or zero when there is no cost to divide by.
    pub fn margen(&self) -> Decimal {
        margen(self.precio_venta.value(), self.costo.value())
    }

    /// Units of measure default to `UN` (unidades).
    pub fn unidad_medida(&self) -> &str {
        match self.unidad_medida.as_deref() {
            Some(u) if !u.is_empty() => u,
            _ => "UN",
        }
    }
}

/// Margin percentage of `precio` over `costo`, zero when `costo` is zero or the margin does not
/// fit in a `Decimal`.
pub fn margen(precio: Decimal, costo: Decimal) -> Decimal {
    if costo.is_zero() {
        return Decimal::ZERO;
    }
    precio
        .checked_sub(costo)
        .and_then(|diff| diff.checked_div(costo))
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or_else(|| {
            debug!("The margin of {precio} over {costo} is out of range, using zero");
            Decimal::ZERO
        })
}

impl Item for Producto {
    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, name: &str) -> Value<'_> {
        match name {
            "id" => Value::Number(self.id.into()),
            "codigo" => Value::opt_text(&self.codigo),
            "nombre" => Value::opt_text(&self.nombre),
            "codigo_barras" => Value::opt_text(&self.codigo_barras),
            "descripcion" => Value::opt_text(&self.descripcion),
            "categoria" => Value::Ref(self.categoria),
            "categoria_nombre" => Value::opt_text(&self.categoria_nombre),
            "proveedor" => Value::Ref(self.proveedor),
            "proveedor_nombre" => Value::opt_text(&self.proveedor_nombre),
            "costo" => Value::Money(self.costo),
            "precio_venta" => Value::Money(self.precio_venta),
            "margen" => Value::Number(self.margen().round_dp(1)),
            "stock_actual" => Value::opt_number(self.stock_actual),
            "stock_minimo" => Value::opt_number(self.stock_minimo),
            "unidad_medida" => Value::text(self.unidad_medida()),
            "activo" => Value::opt_flag(self.activo),
            "fecha_creacion" => Value::opt_date(self.fecha_creacion),
            _ => Value::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_deserialize_nested_references() {
        let json = r#"{
            "id": 12, "codigo": "PROD-1A2B3C4D", "nombre": "Leche entera 1L",
            "categoria": {"id": 5, "nombre": "Lácteos"}, "proveedor": "3",
            "costo": "650.00", "precio_venta": "990.00",
            "stock_actual": 4, "stock_minimo": 10, "activo": true,
            "fecha_creacion": "2025-02-01T10:00:00-03:00"
        }"#;
        let p: Producto = serde_json::from_str(json).unwrap();
        assert_eq!(p.categoria, RefId::new(5));
        assert_eq!(p.proveedor, RefId::new(3));
        assert_eq!(p.costo.value(), Decimal::from(650));
        assert_eq!(p.stock_actual(), 4);
        assert!(p.fecha_creacion.is_some());
    }

    #[test]
    fn test_deserialize_sparse() {
        let p: Producto = serde_json::from_str(r#"{"id": 1, "categoria": null}"#).unwrap();
        assert!(p.categoria.is_none());
        assert_eq!(p.stock_actual(), 0);
        assert_eq!(p.unidad_medida(), "UN");
        assert_eq!(p.value("activo"), Value::Missing);
        assert_eq!(p.value("no_such_field"), Value::Missing);
    }

    #[test]
    fn test_margen() {
        let p = Producto {
            costo: Monto::from_str("50").unwrap(),
            precio_venta: Monto::from_str("100").unwrap(),
            ..Producto::default()
        };
        assert_eq!(p.margen(), Decimal::from(100));
    }

    #[test]
    fn test_margen_out_of_range_is_zero() {
        assert_eq!(margen(Decimal::MAX, Decimal::new(1, 28)), Decimal::ZERO);
        assert_eq!(margen(Decimal::MAX, Decimal::MIN), Decimal::ZERO);
        assert_eq!(margen(Decimal::from(150), Decimal::from(100)), Decimal::from(50));
    }

    #[test]
    fn test_margen_without_cost_is_zero() {
        let p = Producto {
            precio_venta: Monto::from_str("100").unwrap(),
            ..Producto::default()
        };
        assert_eq!(p.margen(), Decimal::ZERO);
    }

    #[test]
    fn test_to_row() {
        let p = Producto {
            id: 3,
            nombre: Some("Pan amasado".into()),
            precio_venta: Monto::from_str("1990").unwrap(),
            stock_actual: Some(25),
            ..Producto::default()
        };
        let row = p.to_row(&["id", "nombre", "precio_venta", "stock_actual", "codigo"]);
        assert_eq!(row, vec!["3", "Pan amasado", "$1.990 CLP", "25", ""]);
    }
}
