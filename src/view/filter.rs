//! The filter predicate set: independent predicates over an [`Item`], combined with AND.
//!
//! Each filter a screen offers is described by a [`FilterDef`]. The user's current choices live in a
//! [`FilterState`], a snapshot mapping filter names to [`FilterValue`]s. A filter whose value is at
//! its no-op sentinel (empty text, `all`, no dates, toggle off) does not take part.

use crate::model::{Item, Value};
use anyhow::bail;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// A categorical selection: the `all` sentinel or one id.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub enum Selection {
    #[default]
    All,
    Id(i64),
}

impl FromStr for Selection {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("all") {
            return Ok(Selection::All);
        }
        match s.parse::<i64>() {
            Ok(id) => Ok(Selection::Id(id)),
            Err(_) => bail!("'{s}' is not an id or 'all'"),
        }
    }
}

impl Display for Selection {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Selection::All => write!(f, "all"),
            Selection::Id(id) => write!(f, "{id}"),
        }
    }
}

/// The active/inactive status selector.
#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Estado {
    #[default]
    All,
    Activo,
    Inactivo,
}

serde_plain::derive_display_from_serialize!(Estado);
serde_plain::derive_fromstr_from_deserialize!(Estado);

/// Calendar-day bounds, both inclusive.
#[derive(Debug, Default, Clone, Copy, Eq, PartialEq, Hash)]
pub struct DateRange {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(desde: Option<NaiveDate>, hasta: Option<NaiveDate>) -> Self {
        Self { desde, hasta }
    }

    pub fn is_unbounded(&self) -> bool {
        self.desde.is_none() && self.hasta.is_none()
    }

    /// Missing dates are never excluded by a range.
    fn contains(&self, value: &Value<'_>) -> bool {
        let Some(fecha) = value.as_date() else {
            return true;
        };
        let day = fecha.date();
        self.desde.map_or(true, |desde| day >= desde)
            && self.hasta.map_or(true, |hasta| day <= hasta)
    }
}

/// The current value of one filter control.
#[derive(Debug, Clone, Eq, PartialEq, Hash)]
pub enum FilterValue {
    Text(String),
    Select(Selection),
    Estado(Estado),
    Range(DateRange),
    Toggle(bool),
}

impl FilterValue {
    /// Whether this value is the control's "no filter" sentinel.
    pub fn is_noop(&self) -> bool {
        match self {
            FilterValue::Text(s) => s.is_empty(),
            FilterValue::Select(s) => *s == Selection::All,
            FilterValue::Estado(e) => *e == Estado::All,
            FilterValue::Range(r) => r.is_unbounded(),
            FilterValue::Toggle(on) => !on,
        }
    }
}

/// "Low stock" style rule: `value <= limit * ratio`. A missing value reads as zero and a missing
/// limit never matches.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct StockRule {
    value: String,
    limit: String,
    ratio: Decimal,
}

impl StockRule {
    pub fn new(value: impl Into<String>, limit: impl Into<String>, ratio: Decimal) -> Self {
        Self {
            value: value.into(),
            limit: limit.into(),
            ratio,
        }
    }

    /// `stock_actual <= stock_minimo * ratio`.
    pub fn stock(ratio: Decimal) -> Self {
        Self::new("stock_actual", "stock_minimo", ratio)
    }

    pub fn ratio(&self) -> Decimal {
        self.ratio
    }

    /// Items without a limit never match. A missing value reads as zero.
    pub fn matches<I: Item>(&self, item: &I) -> bool {
        let limit = item.value(&self.limit);
        if limit.is_missing() {
            return false;
        }
        let value = item.value(&self.value).as_decimal();
        value <= limit.as_decimal().saturating_mul(self.ratio)
    }
}

/// What a filter does with its value.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum FilterKind {
    /// Case-insensitive substring match against any of `fields`.
    Search { fields: Vec<String> },
    /// The item's reference `field` equals the selected id. Items without a reference do not
    /// match a concrete selection.
    Equals { field: String },
    /// The boolean `field` matches the chosen status. Items without the field are kept.
    Estado { field: String },
    /// The item's date `field` falls within the chosen days. Items without a date are kept.
    DateRange { field: String },
    /// When toggled on, the item satisfies the rule.
    Threshold(StockRule),
}

/// One named filter of a screen.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct FilterDef {
    name: String,
    kind: FilterKind,
}

impl FilterDef {
    pub fn new(name: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn search<S: Into<String>>(fields: impl IntoIterator<Item = S>) -> Self {
        Self::new(
            SEARCH,
            FilterKind::Search {
                fields: fields.into_iter().map(Into::into).collect(),
            },
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &FilterKind {
        &self.kind
    }

    /// Evaluates this filter for `item`. A no-op value, or a value of the wrong shape for this
    /// kind of filter, never excludes anything.
    pub fn matches<I: Item>(&self, item: &I, value: &FilterValue) -> bool {
        if value.is_noop() {
            return true;
        }
        match (&self.kind, value) {
            (FilterKind::Search { fields }, FilterValue::Text(term)) => {
                let needle = term.to_lowercase();
                fields.iter().any(|field| {
                    item.value(field)
                        .search_texts()
                        .iter()
                        .any(|text| text.to_lowercase().contains(&needle))
                })
            }
            (FilterKind::Equals { field }, FilterValue::Select(Selection::Id(selected))) => {
                item.value(field).as_ref_id().get() == Some(*selected)
            }
            (FilterKind::Estado { field }, FilterValue::Estado(estado)) => {
                match item.value(field).as_flag() {
                    None => true,
                    Some(flag) => match estado {
                        Estado::All => true,
                        Estado::Activo => flag,
                        Estado::Inactivo => !flag,
                    },
                }
            }
            (FilterKind::DateRange { field }, FilterValue::Range(range)) => {
                range.contains(&item.value(field))
            }
            (FilterKind::Threshold(rule), FilterValue::Toggle(true)) => rule.matches(item),
            _ => true,
        }
    }
}

/// The conventional name of the free-text search filter.
pub const SEARCH: &str = "search";

/// A snapshot of every filter control on a screen.
///
/// Snapshots are replaced as a whole (see [`FilterState::with`]); the derived view compares whole
/// snapshots, so it never observes half of an update.
#[derive(Debug, Default, Clone, Eq, PartialEq, Hash)]
pub struct FilterState {
    values: BTreeMap<String, FilterValue>,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a new snapshot with `name` set to `value`.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: FilterValue) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: FilterValue) {
        let _ = self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FilterValue> {
        self.values.get(name)
    }

    pub fn search_term(&self) -> &str {
        match self.values.get(SEARCH) {
            Some(FilterValue::Text(term)) => term,
            _ => "",
        }
    }

    /// Whether every filter is at its no-op value.
    pub fn is_noop(&self) -> bool {
        self.values.values().all(FilterValue::is_noop)
    }
}

/// The filters a screen offers.
#[derive(Debug, Default, Clone, Eq, PartialEq)]
pub struct FilterSet {
    defs: Vec<FilterDef>,
}

impl FilterSet {
    pub fn new(defs: Vec<FilterDef>) -> Self {
        Self { defs }
    }

    pub fn defs(&self) -> &[FilterDef] {
        &self.defs
    }

    pub fn get(&self, name: &str) -> Option<&FilterDef> {
        self.defs.iter().find(|d| d.name == name)
    }

    /// The AND of every filter that has a value in `state`. Values for names this set does not
    /// define are ignored.
    pub fn matches<I: Item>(&self, item: &I, state: &FilterState) -> bool {
        self.defs.iter().all(|def| match state.get(&def.name) {
            Some(value) => def.matches(item, value),
            None => true,
        })
    }
}
