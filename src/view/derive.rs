//! The derived view: filter, then sort, then summarize, with the result memoized on its inputs.

use crate::model::Item;
use crate::view::aggregate::{Summary, SummaryDef};
use crate::view::filter::{FilterSet, FilterState};
use crate::view::sort::{Comparators, SortState};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use tracing::trace;

/// The filters, sort keys and summary of one screen, composed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Pipeline {
    filters: FilterSet,
    comparators: Comparators,
    summary: SummaryDef,
}

impl Pipeline {
    pub fn new(filters: FilterSet, comparators: Comparators, summary: SummaryDef) -> Self {
        Self {
            filters,
            comparators,
            summary,
        }
    }

    pub fn filters(&self) -> &FilterSet {
        &self.filters
    }

    pub fn comparators(&self) -> &Comparators {
        &self.comparators
    }

    pub fn summary_def(&self) -> &SummaryDef {
        &self.summary
    }

    /// Positions in `collection` of the items that pass `filter`, ordered by `sort`. Items that
    /// compare equal keep their relative order from `collection`.
    pub fn derive_indices<I: Item>(
        &self,
        collection: &[I],
        filter: &FilterState,
        sort: &SortState,
    ) -> Vec<usize> {
        let mut order: Vec<usize> = collection
            .iter()
            .enumerate()
            .filter(|(_, item)| self.filters.matches(*item, filter))
            .map(|(ix, _)| ix)
            .collect();
        let cmp = self.comparators.comparator::<I>(sort);
        order.sort_by(|&a, &b| cmp(&collection[a], &collection[b]));
        order
    }

    /// The filtered, ordered view of `collection`. The collection itself is left untouched.
    pub fn derive<'a, I: Item>(
        &self,
        collection: &'a [I],
        filter: &FilterState,
        sort: &SortState,
    ) -> Vec<&'a I> {
        self.derive_indices(collection, filter, sort)
            .into_iter()
            .map(|ix| &collection[ix])
            .collect()
    }

    /// Summarizes an already-derived view.
    pub fn aggregate<'a, I, It>(&self, rows: It) -> Summary
    where
        I: Item + 'a,
        It: IntoIterator<Item = &'a I>,
    {
        self.summary.summarize(rows)
    }
}

/// An ordered projection of a shared collection. Cloning is cheap.
pub struct Rows<I> {
    source: Arc<Vec<I>>,
    order: Arc<[usize]>,
}

impl<I> Rows<I> {
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn get(&self, n: usize) -> Option<&I> {
        self.order.get(n).and_then(|&ix| self.source.get(ix))
    }

    pub fn iter(&self) -> impl Iterator<Item = &I> + '_ {
        self.order.iter().filter_map(|&ix| self.source.get(ix))
    }

    /// Whether both are the same memoized result.
    pub fn ptr_eq(&self, other: &Rows<I>) -> bool {
        Arc::ptr_eq(&self.source, &other.source) && Arc::ptr_eq(&self.order, &other.order)
    }
}

impl<I: Item> Rows<I> {
    pub fn ids(&self) -> Vec<i64> {
        self.iter().map(Item::id).collect()
    }
}

impl<I> Clone for Rows<I> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            order: Arc::clone(&self.order),
        }
    }
}

impl<I> Debug for Rows<I> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rows").field("order", &self.order).finish()
    }
}

/// A derived view and its summary.
pub struct Derived<I> {
    pub rows: Rows<I>,
    pub summary: Arc<Summary>,
}

impl<I> Clone for Derived<I> {
    fn clone(&self) -> Self {
        Self {
            rows: self.rows.clone(),
            summary: Arc::clone(&self.summary),
        }
    }
}

impl<I> Debug for Derived<I> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Derived")
            .field("rows", &self.rows)
            .field("summary", &self.summary)
            .finish()
    }
}

struct Memo<I> {
    filter: FilterState,
    sort: SortState,
    derived: Derived<I>,
}

/// Memoizes [`Pipeline::derive`] and [`Pipeline::aggregate`].
///
/// The cached result is reused for as long as the collection is the same allocation (`Arc`
/// identity, not element equality) and the filter and sort snapshots compare equal. Any change to
/// one of the three recomputes both the rows and the summary.
pub struct DerivedView<I> {
    pipeline: Arc<Pipeline>,
    memo: Option<Memo<I>>,
    recomputations: usize,
}

impl<I: Item> DerivedView<I> {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            memo: None,
            recomputations: 0,
        }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The derived rows and summary for these inputs, recomputed only if an input changed.
    pub fn get(
        &mut self,
        source: &Arc<Vec<I>>,
        filter: &FilterState,
        sort: &SortState,
    ) -> Derived<I> {
        if let Some(memo) = &self.memo {
            if Arc::ptr_eq(&memo.derived.rows.source, source)
                && memo.filter == *filter
                && memo.sort == *sort
            {
                return memo.derived.clone();
            }
        }

        let order = self.pipeline.derive_indices(source, filter, sort);
        let summary = self
            .pipeline
            .aggregate(order.iter().map(|&ix| &source[ix]));
        self.recomputations += 1;
        trace!(
            "Recomputed derived view: {} of {} items, sort {} {}",
            order.len(),
            source.len(),
            sort.key,
            sort.direction
        );

        let derived = Derived {
            rows: Rows {
                source: Arc::clone(source),
                order: order.into(),
            },
            summary: Arc::new(summary),
        };
        self.memo = Some(Memo {
            filter: filter.clone(),
            sort: sort.clone(),
            derived: derived.clone(),
        });
        derived
    }

    /// How many times the view has actually been recomputed.
    pub fn recomputations(&self) -> usize {
        self.recomputations
    }

    /// Drops the cached result.
    pub fn invalidate(&mut self) {
        self.memo = None;
    }
}

impl<I> Debug for DerivedView<I> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedView")
            .field("memoized", &self.memo.is_some())
            .field("recomputations", &self.recomputations)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Producto;
    use crate::test::{producto, productos_demo, productos_pipeline};
    use crate::view::aggregate::{Counter, Measure};
    use crate::view::filter::{FilterValue, Selection, SEARCH};
    use crate::view::sort::Direction;

    fn by_nombre() -> SortState {
        SortState::new("nombre", Direction::Asc)
    }

    fn search(term: &str) -> FilterState {
        FilterState::new().with(SEARCH, FilterValue::Text(term.into()))
    }

    #[test]
    fn test_search_scenario_keeps_source_order_for_ids() {
        let pipeline = productos_pipeline();
        let items = vec![
            producto(1, "Leche"),
            producto(2, "Pan"),
            producto(3, "Lechuga"),
        ];
        let rows = pipeline.derive(&items, &search("lech"), &SortState::new("id", Direction::Asc));
        let ids: Vec<i64> = rows.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_derive_does_not_touch_source() {
        let pipeline = productos_pipeline();
        let items = vec![producto(1, "Pan"), producto(2, "Arroz")];
        let before = items.clone();
        let rows = pipeline.derive(&items, &FilterState::new(), &by_nombre());
        assert_eq!(rows[0].id, 2);
        assert_eq!(items, before);
    }

    #[test]
    fn test_idempotent() {
        let pipeline = productos_pipeline();
        let items = productos_demo();
        let filter = FilterState::new().with("stock_bajo", FilterValue::Toggle(true));
        let a = pipeline.derive_indices(&items, &filter, &by_nombre());
        let b = pipeline.derive_indices(&items, &filter, &by_nombre());
        assert_eq!(a, b);
    }

    #[test]
    fn test_more_restrictive_filter_never_grows() {
        let pipeline = productos_pipeline();
        let items = productos_demo();
        let loose = search("");
        let strict = loose
            .clone()
            .with("categoria", FilterValue::Select(Selection::Id(5)));
        let stricter = strict.clone().with("stock_bajo", FilterValue::Toggle(true));
        let n = |f: &FilterState| pipeline.derive(&items, f, &by_nombre()).len();
        assert!(n(&strict) <= n(&loose));
        assert!(n(&stricter) <= n(&strict));
    }

    #[test]
    fn test_aggregate_total_matches_rows() {
        let pipeline = productos_pipeline();
        let items = productos_demo();
        for filter in [
            FilterState::new(),
            search("a"),
            FilterState::new().with("categoria", FilterValue::Select(Selection::Id(5))),
            search("no existe"),
        ] {
            let rows = pipeline.derive(&items, &filter, &by_nombre());
            let summary = pipeline.aggregate(rows.iter().copied());
            assert_eq!(summary.total, rows.len());
        }
    }

    #[test]
    fn test_memo_reuses_result_for_same_inputs() {
        let mut view = DerivedView::new(Arc::new(productos_pipeline()));
        let source = Arc::new(productos_demo());
        let filter = search("a");

        let first = view.get(&source, &filter, &by_nombre());
        let second = view.get(&source, &filter.clone(), &by_nombre());
        assert!(first.rows.ptr_eq(&second.rows));
        assert!(Arc::ptr_eq(&first.summary, &second.summary));
        assert_eq!(view.recomputations(), 1);
    }

    #[test]
    fn test_memo_recomputes_on_each_input_change() {
        let mut view = DerivedView::new(Arc::new(productos_pipeline()));
        let source = Arc::new(productos_demo());
        let _ = view.get(&source, &FilterState::new(), &by_nombre());

        let _ = view.get(&source, &search("x"), &by_nombre());
        assert_eq!(view.recomputations(), 2);

        let _ = view.get(&source, &search("x"), &SortState::new("nombre", Direction::Desc));
        assert_eq!(view.recomputations(), 3);

        // Same contents, new allocation.
        let refetched = Arc::new(productos_demo());
        let derived = view.get(
            &refetched,
            &search("x"),
            &SortState::new("nombre", Direction::Desc),
        );
        assert_eq!(view.recomputations(), 4);
        assert_eq!(derived.summary.total, derived.rows.len());
    }

    #[test]
    fn test_empty_result_summary_is_zero() {
        let pipeline = Pipeline::new(
            FilterSet::new(vec![crate::view::filter::FilterDef::search(["nombre"])]),
            crate::view::sort::Comparators::new(vec![], "nombre"),
            SummaryDef::new()
                .amount("monto_total", Measure::Field("precio_venta".into()))
                .average("monto_total")
                .counter(Counter::flag("activos", "activo", true)),
        );
        let mut view = DerivedView::new(Arc::new(pipeline));
        let source: Arc<Vec<Producto>> = Arc::new(productos_demo());
        let derived = view.get(&source, &search("zzz"), &by_nombre());
        assert!(derived.rows.is_empty());
        assert_eq!(derived.summary.total, 0);
        assert!(derived.summary.amount("monto_total").is_zero());
        assert!(derived.summary.promedio.unwrap().is_zero());
        assert_eq!(derived.summary.count("activos"), 0);
    }

    #[test]
    fn test_rows_accessors() {
        let mut view = DerivedView::new(Arc::new(productos_pipeline()));
        let source = Arc::new(vec![producto(1, "Pan"), producto(2, "Arroz")]);
        let derived = view.get(&source, &FilterState::new(), &by_nombre());
        assert_eq!(derived.rows.ids(), vec![2, 1]);
        assert_eq!(derived.rows.get(0).map(|p| p.id), Some(2));
        assert!(derived.rows.get(2).is_none());
    }
}
