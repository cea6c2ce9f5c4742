//! The derived-view pipeline behind every list screen: debounced search input, a filter predicate
//! set, a comparator selector, and the memoized derived view with its summary.
mod aggregate;
mod collate;
mod debounce;
mod derive;
mod filter;
mod screen;
mod sort;

pub use aggregate::{Counter, Measure, Summary, SummaryDef};
pub use collate::collate;
pub use debounce::Debouncer;
pub use derive::{Derived, DerivedView, Pipeline, Rows};
pub use filter::{
    DateRange, Estado, FilterDef, FilterKind, FilterSet, FilterState, FilterValue, Selection,
    StockRule, SEARCH,
};
pub use screen::{Screen, ScreenConfig, ScreenView, Thresholds, DEFAULT_DEBOUNCE};
pub use sort::{Comparators, Direction, SortKeyDef, SortKind, SortState};
