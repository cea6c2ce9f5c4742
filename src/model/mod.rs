//! Types that represent the backend's data, such as `Producto` and `Compra`, and the [`Item`] view
//! of them that the list views work with.
mod alerta;
mod compra;
pub(crate) mod fecha;
mod items;
mod linea;
mod monto;
mod producto;
mod proveedor;
mod ref_id;
mod venta;

pub use alerta::Alerta;
pub use compra::Compra;
pub use fecha::Fecha;
pub use items::{parse_collection, Item, Value};
pub use linea::Linea;
pub use monto::{Monto, MontoError};
pub use producto::{margen, Producto};
pub use proveedor::Proveedor;
pub use ref_id::RefId;
pub use venta::Venta;
