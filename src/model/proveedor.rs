use crate::model::fecha::{self, Fecha};
use crate::model::{Item, Value};
use serde::{Deserialize, Serialize};

/// A supplier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Proveedor {
    pub id: i64,
    #[serde(default)]
    pub nombre: Option<String>,
    #[serde(default)]
    pub rut: Option<String>,
    #[serde(default)]
    pub contacto: Option<String>,
    #[serde(default)]
    pub telefono: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub direccion: Option<String>,
    #[serde(default)]
    pub activo: Option<bool>,
    #[serde(default, deserialize_with = "fecha::lenient")]
    pub fecha_creacion: Option<Fecha>,
}

impl Item for Proveedor {
    fn id(&self) -> i64 {
        self.id
    }

    fn value(&self, name: &str) -> Value<'_> {
        match name {
            "id" => Value::Number(self.id.into()),
            "nombre" => Value::opt_text(&self.nombre),
            "rut" => Value::opt_text(&self.rut),
            "contacto" => Value::opt_text(&self.contacto),
            "telefono" => Value::opt_text(&self.telefono),
            "email" => Value::opt_text(&self.email),
            "direccion" => Value::opt_text(&self.direccion),
            "activo" => Value::opt_flag(self.activo),
            "fecha_creacion" => Value::opt_date(self.fecha_creacion),
            _ => Value::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_contact_fields_are_missing() {
        let json = r#"{"id": 2, "nombre": "Distribuidora Sur", "email": "", "telefono": null}"#;
        let p: Proveedor = serde_json::from_str(json).unwrap();
        assert_eq!(p.value("nombre"), Value::text("Distribuidora Sur"));
        assert!(p.value("email").is_missing());
        assert!(p.value("telefono").is_missing());
    }
}
