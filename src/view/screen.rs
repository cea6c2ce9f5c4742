//! The four list screens and the state each one owns.

use crate::cache::CollectionKey;
use crate::model::Item;
use crate::view::aggregate::{Counter, Measure, SummaryDef};
use crate::view::debounce::Debouncer;
use crate::view::derive::{Derived, DerivedView, Pipeline};
use crate::view::filter::{
    FilterDef, FilterKind, FilterSet, FilterState, FilterValue, StockRule, SEARCH,
};
use crate::view::sort::{Comparators, Direction, SortKeyDef, SortKind, SortState};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::debug;

/// The search debounce used when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Screen {
    Productos,
    Compras,
    Ventas,
    Proveedores,
}

serde_plain::derive_display_from_serialize!(Screen);
serde_plain::derive_fromstr_from_deserialize!(Screen);

impl Screen {
    pub const ALL: [Screen; 4] = [
        Screen::Productos,
        Screen::Compras,
        Screen::Ventas,
        Screen::Proveedores,
    ];

    /// The cached collection this screen lists.
    pub fn collection_key(self) -> CollectionKey {
        match self {
            Screen::Productos => CollectionKey::Productos,
            Screen::Compras => CollectionKey::Compras,
            Screen::Ventas => CollectionKey::Ventas,
            Screen::Proveedores => CollectionKey::Proveedores,
        }
    }
}

/// Ratios of `stock_minimo` at or below which a product's stock is low, or critical.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct Thresholds {
    pub stock_bajo: Decimal,
    pub stock_critico: Decimal,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            stock_bajo: Decimal::ONE,
            stock_critico: Decimal::new(5, 1),
        }
    }
}

/// Everything that differs between screens: filters, sort keys, summary, columns and the search
/// debounce.
#[derive(Debug, Clone)]
pub struct ScreenConfig {
    screen: Screen,
    pipeline: Arc<Pipeline>,
    default_sort: SortState,
    columns: Vec<&'static str>,
    debounce: Duration,
}

fn equals(name: &str, field: &str) -> FilterDef {
    FilterDef::new(
        name,
        FilterKind::Equals {
            field: field.into(),
        },
    )
}

fn date_range(name: &str, field: &str) -> FilterDef {
    FilterDef::new(
        name,
        FilterKind::DateRange {
            field: field.into(),
        },
    )
}

fn purchase_like_summary() -> SummaryDef {
    SummaryDef::new()
        .amount("monto_total", Measure::Field("total".into()))
        .average("monto_total")
        .lines()
}

impl ScreenConfig {
    pub fn new(screen: Screen, thresholds: Thresholds, debounce: Duration) -> Self {
        let (filters, keys, default_sort, summary, columns) = match screen {
            Screen::Productos => (
                vec![
                    FilterDef::search(["codigo", "nombre", "codigo_barras"]),
                    FilterDef::new(
                        "estado",
                        FilterKind::Estado {
                            field: "activo".into(),
                        },
                    ),
                    equals("categoria", "categoria"),
                    equals("proveedor", "proveedor"),
                    FilterDef::new(
                        "stock_bajo",
                        FilterKind::Threshold(StockRule::stock(thresholds.stock_bajo)),
                    ),
                ],
                vec![
                    SortKeyDef::new("codigo", SortKind::text("codigo")),
                    SortKeyDef::new("nombre", SortKind::text("nombre")),
                    SortKeyDef::new("stock", SortKind::number("stock_actual")),
                    SortKeyDef::new("precio", SortKind::number("precio_venta")),
                    SortKeyDef::new("costo", SortKind::number("costo")),
                    SortKeyDef::new(
                        "margen",
                        SortKind::Margin {
                            precio: "precio_venta".into(),
                            costo: "costo".into(),
                        },
                    ),
                ],
                SortState::new("nombre", Direction::Asc),
                SummaryDef::new()
                    .amount(
                        "valor_inventario",
                        Measure::Product("stock_actual".into(), "costo".into()),
                    )
                    .counter(Counter::flag("activos", "activo", true))
                    .counter(Counter::flag("inactivos", "activo", false))
                    .counter(Counter::rule(
                        "stock_bajo",
                        StockRule::stock(thresholds.stock_bajo),
                    ))
                    .counter(Counter::rule(
                        "stock_critico",
                        StockRule::stock(thresholds.stock_critico),
                    )),
                vec![
                    "codigo",
                    "nombre",
                    "categoria_nombre",
                    "stock_actual",
                    "stock_minimo",
                    "costo",
                    "precio_venta",
                    "margen",
                    "activo",
                ],
            ),
            Screen::Compras => (
                vec![
                    FilterDef::search(["numero_factura", "proveedor_nombre", "id"]),
                    equals("proveedor", "proveedor"),
                    date_range("fecha", "fecha"),
                ],
                vec![
                    SortKeyDef::new("id", SortKind::number("id")).default_direction(Direction::Desc),
                    SortKeyDef::new("fecha", SortKind::date("fecha"))
                        .default_direction(Direction::Desc),
                    SortKeyDef::new("total", SortKind::number("total")),
                    SortKeyDef::new("proveedor", SortKind::text("proveedor_nombre")),
                    SortKeyDef::new("items", SortKind::number("items")),
                ],
                SortState::new("fecha", Direction::Desc),
                purchase_like_summary(),
                vec![
                    "id",
                    "numero_factura",
                    "proveedor_nombre",
                    "fecha",
                    "items",
                    "total",
                ],
            ),
            Screen::Ventas => (
                vec![
                    FilterDef::search([
                        "numero_boleta",
                        "id",
                        "items.producto_nombre",
                        "items.producto_codigo",
                    ]),
                    date_range("fecha", "fecha"),
                ],
                vec![
                    SortKeyDef::new("id", SortKind::number("id")).default_direction(Direction::Desc),
                    SortKeyDef::new("fecha", SortKind::date("fecha"))
                        .default_direction(Direction::Desc),
                    SortKeyDef::new("total", SortKind::number("total")),
                    SortKeyDef::new("numero_boleta", SortKind::text("numero_boleta")),
                    SortKeyDef::new("items", SortKind::number("items")),
                ],
                SortState::new("fecha", Direction::Desc),
                purchase_like_summary(),
                vec!["id", "numero_boleta", "fecha", "items", "total", "usuario"],
            ),
            Screen::Proveedores => (
                vec![FilterDef::search([
                    "nombre", "rut", "contacto", "email", "telefono",
                ])],
                vec![
                    SortKeyDef::new("nombre", SortKind::text("nombre")),
                    SortKeyDef::new("email", SortKind::text("email")),
                    SortKeyDef::new("telefono", SortKind::text("telefono")),
                ],
                SortState::new("nombre", Direction::Asc),
                SummaryDef::new()
                    .counter(Counter::present("con_email", "email"))
                    .counter(Counter::present("con_telefono", "telefono")),
                vec!["nombre", "rut", "contacto", "telefono", "email", "activo"],
            ),
        };
        let fallback = default_sort.key.clone();
        Self {
            screen,
            pipeline: Arc::new(Pipeline::new(
                FilterSet::new(filters),
                Comparators::new(keys, fallback),
                summary,
            )),
            default_sort,
            columns,
            debounce,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    pub fn default_sort(&self) -> &SortState {
        &self.default_sort
    }

    pub fn columns(&self) -> &[&'static str] {
        &self.columns
    }

    pub fn debounce(&self) -> Duration {
        self.debounce
    }
}

/// The state a list screen owns: its filter and sort snapshots, the raw and committed search
/// term, and the memoized derived view.
///
/// Raw search input goes through a [`Debouncer`] before it reaches the filter snapshot, so typing
/// does not recompute the view on every keystroke. Filter and sort changes replace the whole
/// snapshot.
pub struct ScreenView<I> {
    config: ScreenConfig,
    search_input: String,
    filters: FilterState,
    sort: SortState,
    committed: watch::Receiver<String>,
    committed_tx: Arc<watch::Sender<String>>,
    debouncer: Debouncer<String>,
    view: DerivedView<I>,
}

impl<I: Item> ScreenView<I> {
    pub fn new(config: ScreenConfig) -> Self {
        let (committed_tx, committed) = watch::channel(String::new());
        let committed_tx = Arc::new(committed_tx);
        let tx = Arc::clone(&committed_tx);
        let debouncer = Debouncer::new(config.debounce(), move |term: String| {
            debug!("Search committed: '{term}'");
            let _ = tx.send_replace(term);
        });
        Self {
            search_input: String::new(),
            filters: FilterState::new(),
            sort: config.default_sort().clone(),
            committed,
            committed_tx,
            debouncer,
            view: DerivedView::new(Arc::clone(config.pipeline())),
            config,
        }
    }

    pub fn config(&self) -> &ScreenConfig {
        &self.config
    }

    /// Records raw search input. The filter sees it once input has been quiet for the debounce
    /// delay.
    pub fn set_search_input(&mut self, term: impl Into<String>) {
        self.search_input = term.into();
        self.debouncer.call(self.search_input.clone());
    }

    pub fn search_input(&self) -> &str {
        &self.search_input
    }

    /// Commits the raw search input now, skipping the debounce.
    pub fn commit_search(&mut self) {
        self.debouncer.cancel();
        let _ = self.committed_tx.send_replace(self.search_input.clone());
    }

    /// The search term the derived view currently filters by.
    pub fn committed_search(&self) -> String {
        self.committed.borrow().clone()
    }

    /// Waits until a new search term is committed and returns it.
    pub async fn search_changed(&mut self) -> String {
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = self.committed.changed().await;
        self.committed.borrow_and_update().clone()
    }

    pub fn set_filter(&mut self, name: impl Into<String>, value: FilterValue) {
        self.filters = self.filters.clone().with(name, value);
    }

    /// Replaces every non-search filter at once.
    pub fn replace_filters(&mut self, filters: FilterState) {
        self.filters = filters;
    }

    /// Back to no filters and an empty search.
    pub fn reset_filters(&mut self) {
        self.filters = FilterState::new();
        self.search_input.clear();
        self.commit_search();
    }

    /// The complete filter snapshot, committed search included.
    pub fn filter_state(&self) -> FilterState {
        self.filters
            .clone()
            .with(SEARCH, FilterValue::Text(self.committed_search()))
    }

    pub fn sort_state(&self) -> &SortState {
        &self.sort
    }

    /// Clicks the column header for `key`.
    pub fn sort_by(&mut self, key: &str) {
        self.sort = self.sort.toggle(key, self.config.pipeline().comparators());
    }

    pub fn set_sort(&mut self, sort: SortState) {
        self.sort = sort;
    }

    /// The derived rows and summary of `collection` under the current snapshots.
    pub fn derive(&mut self, collection: &Arc<Vec<I>>) -> Derived<I> {
        let filter = self.filter_state();
        self.view.get(collection, &filter, &self.sort)
    }

    pub fn recomputations(&self) -> usize {
        self.view.recomputations()
    }
}
