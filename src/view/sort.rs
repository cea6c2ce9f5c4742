//! The comparator selector: maps a sort key name and a direction to a comparison between items.

use crate::model::{margen, Item};
use crate::view::collate::collate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

#[derive(
    Debug, Default, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

serde_plain::derive_display_from_serialize!(Direction);
serde_plain::derive_fromstr_from_deserialize!(Direction);

impl Direction {
    pub fn flip(self) -> Self {
        match self {
            Direction::Asc => Direction::Desc,
            Direction::Desc => Direction::Asc,
        }
    }

    /// Applies this direction to an ascending ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Asc => ordering,
            Direction::Desc => ordering.reverse(),
        }
    }
}

/// How a sort key compares two items.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum SortKind {
    /// Locale-aware text comparison. Missing text sorts as the empty string.
    Text { field: String },
    /// Numeric comparison. Missing numbers are zero.
    Number { field: String },
    /// Chronological comparison. Missing dates sort before every date.
    Date { field: String },
    /// Margin percentage of `precio` over `costo`, zero where there is no cost.
    Margin { precio: String, costo: String },
}

impl SortKind {
    pub fn text(field: impl Into<String>) -> Self {
        SortKind::Text {
            field: field.into(),
        }
    }

    pub fn number(field: impl Into<String>) -> Self {
        SortKind::Number {
            field: field.into(),
        }
    }

    pub fn date(field: impl Into<String>) -> Self {
        SortKind::Date {
            field: field.into(),
        }
    }

    /// Ascending comparison of `a` and `b`.
    pub fn compare<I: Item>(&self, a: &I, b: &I) -> Ordering {
        match self {
            SortKind::Text { field } => {
                let (a, b) = (a.value(field), b.value(field));
                collate(&a.as_text(), &b.as_text())
            }
            SortKind::Number { field } => a
                .value(field)
                .as_decimal()
                .cmp(&b.value(field).as_decimal()),
            SortKind::Date { field } => a.value(field).as_date().cmp(&b.value(field).as_date()),
            SortKind::Margin { precio, costo } => {
                let margin = |item: &I| {
                    margen(
                        item.value(precio).as_decimal(),
                        item.value(costo).as_decimal(),
                    )
                };
                margin(a).cmp(&margin(b))
            }
        }
    }
}

/// A named sort key offered by a screen.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct SortKeyDef {
    name: String,
    kind: SortKind,
    default_direction: Direction,
}

impl SortKeyDef {
    pub fn new(name: impl Into<String>, kind: SortKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default_direction: Direction::Asc,
        }
    }

    /// The direction used when this key is first selected.
    #[must_use]
    pub fn default_direction(mut self, direction: Direction) -> Self {
        self.default_direction = direction;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &SortKind {
        &self.kind
    }

    pub fn direction(&self) -> Direction {
        self.default_direction
    }
}

/// The single active sort key and its direction.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub direction: Direction,
}

impl SortState {
    pub fn new(key: impl Into<String>, direction: Direction) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }

    /// The state after the user clicks the control for `key`: the active key flips direction,
    /// any other key becomes active in its default direction.
    #[must_use]
    pub fn toggle(&self, key: &str, comparators: &Comparators) -> SortState {
        if self.key == key {
            return SortState::new(key, self.direction.flip());
        }
        let direction = comparators
            .get(key)
            .map(SortKeyDef::direction)
            .unwrap_or_default();
        SortState::new(key, direction)
    }
}

/// The sort keys of a screen plus the key used when an unknown one is requested.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Comparators {
    keys: Vec<SortKeyDef>,
    fallback: String,
}

impl Comparators {
    /// `fallback` should name one of `keys`. If it does not, unknown keys leave the order as is.
    pub fn new(keys: Vec<SortKeyDef>, fallback: impl Into<String>) -> Self {
        Self {
            keys,
            fallback: fallback.into(),
        }
    }

    pub fn keys(&self) -> &[SortKeyDef] {
        &self.keys
    }

    pub fn get(&self, name: &str) -> Option<&SortKeyDef> {
        self.keys.iter().find(|k| k.name == name)
    }

    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    /// The definition for `name`, or the fallback key's definition.
    pub fn resolve(&self, name: &str) -> Option<&SortKeyDef> {
        self.get(name).or_else(|| {
            debug!(
                "Unknown sort key '{name}', falling back to '{}'",
                self.fallback
            );
            self.get(&self.fallback)
        })
    }

    /// The comparator for `state`, already accounting for its direction.
    pub fn comparator<'a, I: Item + 'a>(
        &'a self,
        state: &SortState,
    ) -> impl Fn(&I, &I) -> Ordering + 'a {
        let kind = self.resolve(&state.key).map(SortKeyDef::kind);
        let direction = state.direction;
        move |a: &I, b: &I| match kind {
            Some(kind) => direction.apply(kind.compare(a, b)),
            None => Ordering::Equal,
        }
    }

    /// Stable sort: items that compare equal keep their relative order in either direction.
    pub fn sort<I: Item>(&self, items: &mut [&I], state: &SortState) {
        let cmp = self.comparator::<I>(state);
        items.sort_by(|a, b| cmp(*a, *b));
    }
}
