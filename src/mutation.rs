//! Create/update/delete requests as explicit state machines.
//!
//! A [`Mutation`] moves `Idle -> InFlight -> Succeeded | Failed`. Only the success transition has
//! a side effect: it invalidates the cached collections that the kind of mutation affects.

use crate::cache::{CollectionKey, Invalidate};
use crate::error::{ErrorType, IntoResult, Res};
use crate::Result;
use anyhow::ensure;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::future::Future;
use tracing::{debug, warn};

/// The changes a user can make from the list screens.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    CreateProducto,
    UpdateProducto,
    DeleteProducto,
    AjustarStock,
    CreateCategoria,
    UpdateCategoria,
    DeleteCategoria,
    CreateCompra,
    UpdateCompra,
    DeleteCompra,
    CreateVenta,
    UpdateVenta,
    DeleteVenta,
    CreateProveedor,
    UpdateProveedor,
    DeleteProveedor,
    MarcarAlertaLeida,
    MarcarTodasAlertasLeidas,
}

serde_plain::derive_display_from_serialize!(MutationKind);
serde_plain::derive_fromstr_from_deserialize!(MutationKind);

impl MutationKind {
    /// The cached collections that are out of date once this mutation succeeds. Purchases and
    /// sales move stock, so they also invalidate `productos`. Product rows carry their category's
    /// name, so category changes invalidate `productos`.
    pub fn invalidates(self) -> &'static [CollectionKey] {
        use CollectionKey as K;
        match self {
            MutationKind::CreateProducto
            | MutationKind::UpdateProducto
            | MutationKind::DeleteProducto => &[K::Productos],
            MutationKind::AjustarStock => &[K::Productos, K::Alertas],
            MutationKind::CreateCategoria
            | MutationKind::UpdateCategoria
            | MutationKind::DeleteCategoria => &[K::Productos],
            MutationKind::CreateCompra | MutationKind::UpdateCompra | MutationKind::DeleteCompra => {
                &[K::Compras, K::Productos]
            }
            MutationKind::CreateVenta | MutationKind::UpdateVenta | MutationKind::DeleteVenta => {
                &[K::Ventas, K::Productos]
            }
            MutationKind::CreateProveedor
            | MutationKind::UpdateProveedor
            | MutationKind::DeleteProveedor => &[K::Proveedores],
            MutationKind::MarcarAlertaLeida | MutationKind::MarcarTodasAlertasLeidas => {
                &[K::Alertas]
            }
        }
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Default, Serialize)]
#[serde(tag = "status", content = "error", rename_all = "snake_case")]
pub enum MutationStatus {
    #[default]
    Idle,
    InFlight,
    Succeeded,
    Failed(String),
}

/// One mutation's lifecycle.
#[derive(Debug, Clone)]
pub struct Mutation {
    kind: MutationKind,
    status: MutationStatus,
}

impl Mutation {
    pub fn new(kind: MutationKind) -> Self {
        Self {
            kind,
            status: MutationStatus::Idle,
        }
    }

    pub fn kind(&self) -> MutationKind {
        self.kind
    }

    pub fn status(&self) -> &MutationStatus {
        &self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == MutationStatus::InFlight
    }

    /// Submits the mutation. A mutation cannot be submitted again while it is in flight.
    pub fn begin(&mut self) -> Result<()> {
        self.begin_inner().pub_result(ErrorType::Mutation)
    }

    fn begin_inner(&mut self) -> Res<()> {
        ensure!(
            !self.is_in_flight(),
            "The {} mutation is already in flight",
            self.kind
        );
        debug!("{}: {:?} -> InFlight", self.kind, self.status);
        self.status = MutationStatus::InFlight;
        Ok(())
    }

    /// Records success and invalidates the affected collections in `cache`.
    pub fn succeed(&mut self, cache: &mut dyn Invalidate) -> Result<()> {
        self.finish(MutationStatus::Succeeded)
            .pub_result(ErrorType::Mutation)?;
        for &key in self.kind.invalidates() {
            cache.invalidate(key);
        }
        Ok(())
    }

    /// Records failure. Nothing is invalidated.
    pub fn fail(&mut self, error: impl Display) -> Result<()> {
        let message = error.to_string();
        warn!("The {} mutation failed: {message}", self.kind);
        self.finish(MutationStatus::Failed(message))
            .pub_result(ErrorType::Mutation)
    }

    fn finish(&mut self, status: MutationStatus) -> Res<()> {
        ensure!(
            self.is_in_flight(),
            "The {} mutation is not in flight, it is {:?}",
            self.kind,
            self.status
        );
        debug!("{}: InFlight -> {:?}", self.kind, status);
        self.status = status;
        Ok(())
    }

    /// Back to `Idle`, e.g. when the dialog that submitted the mutation is closed.
    pub fn reset(&mut self) {
        self.status = MutationStatus::Idle;
    }

    /// Drives a whole cycle: begins, awaits `request`, then succeeds or fails with its outcome.
    pub async fn run<T, F>(&mut self, cache: &mut dyn Invalidate, request: F) -> Result<T>
    where
        F: Future<Output = anyhow::Result<T>>,
    {
        self.begin()?;
        match request.await {
            Ok(value) => {
                self.succeed(cache)?;
                Ok(value)
            }
            Err(e) => {
                self.fail(format!("{e:#}"))?;
                Err(e).pub_result(ErrorType::Mutation)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CollectionCache;
    use crate::model::Producto;
    use anyhow::anyhow;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Vec<CollectionKey>);

    impl Invalidate for Recorder {
        fn invalidate(&mut self, key: CollectionKey) {
            self.0.push(key);
        }
    }

    #[test]
    fn test_invalidation_sets() {
        assert_eq!(
            MutationKind::CreateVenta.invalidates(),
            &[CollectionKey::Ventas, CollectionKey::Productos]
        );
        assert_eq!(
            MutationKind::AjustarStock.invalidates(),
            &[CollectionKey::Productos, CollectionKey::Alertas]
        );
        assert_eq!(
            MutationKind::MarcarTodasAlertasLeidas.invalidates(),
            &[CollectionKey::Alertas]
        );
        assert_eq!(
            "marcar_alerta_leida".parse::<MutationKind>().unwrap(),
            MutationKind::MarcarAlertaLeida
        );
        assert_eq!(
            MutationKind::DeleteProveedor.invalidates(),
            &[CollectionKey::Proveedores]
        );
    }

    #[test]
    fn test_happy_path_invalidates() {
        let mut recorder = Recorder::default();
        let mut m = Mutation::new(MutationKind::UpdateCompra);
        m.begin().unwrap();
        assert!(m.is_in_flight());
        m.succeed(&mut recorder).unwrap();
        assert_eq!(m.status(), &MutationStatus::Succeeded);
        assert_eq!(
            recorder.0,
            vec![CollectionKey::Compras, CollectionKey::Productos]
        );
    }

    #[test]
    fn test_cannot_submit_while_in_flight() {
        let mut m = Mutation::new(MutationKind::CreateProducto);
        m.begin().unwrap();
        let err = m.begin().unwrap_err();
        assert_eq!(err.error_type(), ErrorType::Mutation);
        assert!(m.is_in_flight());
    }

    #[test]
    fn test_failure_does_not_invalidate() {
        let mut recorder = Recorder::default();
        let mut m = Mutation::new(MutationKind::CreateProducto);
        m.begin().unwrap();
        m.fail("El código ya existe").unwrap();
        assert_eq!(
            m.status(),
            &MutationStatus::Failed("El código ya existe".into())
        );
        assert!(m.succeed(&mut recorder).is_err());
        assert!(recorder.0.is_empty());
    }

    #[test]
    fn test_resubmit_after_outcome() {
        let mut m = Mutation::new(MutationKind::CreateCategoria);
        m.begin().unwrap();
        m.fail("x").unwrap();
        m.begin().unwrap();
        m.reset();
        assert_eq!(m.status(), &MutationStatus::Idle);
        assert!(m.fail("y").is_err());
    }

    #[tokio::test]
    async fn test_run_marks_cache_stale() {
        let mut cache = CollectionCache::new(Duration::from_secs(300));
        let _ = cache.insert(CollectionKey::Productos, vec![Producto::default()]);
        let mut m = Mutation::new(MutationKind::AjustarStock);
        let n = m.run(&mut cache, async { Ok(7) }).await.unwrap();
        assert_eq!(n, 7);
        assert!(!cache.is_fresh(CollectionKey::Productos));
        assert_eq!(m.status(), &MutationStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_run_failure() {
        let mut cache = CollectionCache::new(Duration::from_secs(300));
        let _ = cache.insert(CollectionKey::Ventas, Vec::<Producto>::new());
        let mut m = Mutation::new(MutationKind::CreateVenta);
        let err = m
            .run::<(), _>(&mut cache, async { Err(anyhow!("Stock insuficiente")) })
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Stock insuficiente"));
        assert!(cache.is_fresh(CollectionKey::Ventas));
        assert!(matches!(m.status(), MutationStatus::Failed(_)));
    }

    #[test]
    fn test_status_serializes() {
        let json = serde_json::to_string(&MutationStatus::Failed("boom".into())).unwrap();
        assert_eq!(json, r#"{"status":"failed","error":"boom"}"#);
    }
}
