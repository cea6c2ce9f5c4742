//! The aggregator: summary statistics over what the user currently sees.

use crate::model::{Item, Monto};
use crate::view::filter::StockRule;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::warn;

/// A per-item monetary quantity to be summed.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Measure {
    /// The value of one field.
    Field(String),
    /// The product of two fields, e.g. `stock_actual * costo`.
    Product(String, String),
}

impl Measure {
    /// Missing fields read as zero. A product too large for a `Decimal` saturates.
    pub fn eval<I: Item>(&self, item: &I) -> Decimal {
        match self {
            Measure::Field(field) => item.value(field).as_decimal(),
            Measure::Product(a, b) => {
                let (a, b) = (item.value(a).as_decimal(), item.value(b).as_decimal());
                a.checked_mul(b).unwrap_or_else(|| {
                    warn!("{a} * {b} for item {} is out of range, clamping it", item.id());
                    a.saturating_mul(b)
                })
            }
        }
    }
}

/// A count of the items meeting a condition.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Counter {
    /// Items whose boolean `field` equals `expected`. A missing flag counts as `false`.
    Flag {
        name: String,
        field: String,
        expected: bool,
    },
    /// Items where `field` is present and non-empty.
    Present { name: String, field: String },
    /// Items satisfying a stock rule.
    Rule { name: String, rule: StockRule },
}

impl Counter {
    pub fn flag(name: impl Into<String>, field: impl Into<String>, expected: bool) -> Self {
        Counter::Flag {
            name: name.into(),
            field: field.into(),
            expected,
        }
    }

    pub fn present(name: impl Into<String>, field: impl Into<String>) -> Self {
        Counter::Present {
            name: name.into(),
            field: field.into(),
        }
    }

    pub fn rule(name: impl Into<String>, rule: StockRule) -> Self {
        Counter::Rule {
            name: name.into(),
            rule,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Counter::Flag { name, .. } | Counter::Present { name, .. } | Counter::Rule { name, .. } => {
                name
            }
        }
    }

    fn counts<I: Item>(&self, item: &I) -> bool {
        match self {
            Counter::Flag {
                field, expected, ..
            } => item.value(field).as_flag().unwrap_or(false) == *expected,
            Counter::Present { field, .. } => !item.value(field).is_missing(),
            Counter::Rule { rule, .. } => rule.matches(item),
        }
    }
}

/// What a screen summarizes.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct SummaryDef {
    amounts: Vec<(String, Measure)>,
    average: Option<String>,
    lines: bool,
    counters: Vec<Counter>,
}

impl SummaryDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sums `measure` over the items under `name`.
    #[must_use]
    pub fn amount(mut self, name: impl Into<String>, measure: Measure) -> Self {
        self.amounts.push((name.into(), measure));
        self
    }

    /// Reports the per-item average of the amount `name` as `promedio`.
    #[must_use]
    pub fn average(mut self, name: impl Into<String>) -> Self {
        self.average = Some(name.into());
        self
    }

    /// Reports `total_items` (line count) and `total_unidades` (summed line quantities).
    #[must_use]
    pub fn lines(mut self) -> Self {
        self.lines = true;
        self
    }

    #[must_use]
    pub fn counter(mut self, counter: Counter) -> Self {
        self.counters.push(counter);
        self
    }

    pub fn counters(&self) -> &[Counter] {
        &self.counters
    }

    /// Reduces `items`, which must be the filtered sequence the user sees, into a [`Summary`].
    /// An empty sequence gives zeros everywhere.
    pub fn summarize<'a, I, It>(&self, items: It) -> Summary
    where
        I: Item + 'a,
        It: IntoIterator<Item = &'a I>,
    {
        let mut summary = Summary {
            amounts: self
                .amounts
                .iter()
                .map(|(name, _)| (name.clone(), Monto::ZERO))
                .collect(),
            counts: self
                .counters
                .iter()
                .map(|c| (c.name().to_string(), 0))
                .collect(),
            ..Summary::default()
        };
        if self.lines {
            summary.total_items = Some(0);
            summary.total_unidades = Some(0);
        }

        for item in items {
            summary.total += 1;
            for (name, measure) in &self.amounts {
                if let Some(sum) = summary.amounts.get_mut(name) {
                    let (current, value) = (sum.value(), measure.eval(item));
                    let next = current.checked_add(value).unwrap_or_else(|| {
                        warn!("The {name} total is out of range, clamping it");
                        current.saturating_add(value)
                    });
                    *sum = Monto::new(next);
                }
            }
            if self.lines {
                let lineas = item.lineas();
                if let Some(n) = summary.total_items.as_mut() {
                    *n += lineas.len() as u64;
                }
                if let Some(n) = summary.total_unidades.as_mut() {
                    *n = lineas
                        .iter()
                        .fold(*n, |acc, l| acc.saturating_add(l.cantidad()));
                }
            }
            for counter in &self.counters {
                if counter.counts(item) {
                    if let Some(n) = summary.counts.get_mut(counter.name()) {
                        *n += 1;
                    }
                }
            }
        }

        if let Some(name) = &self.average {
            summary.promedio = Some(summary.amount(name).average(summary.total));
        }
        summary
    }
}

/// Counts, sums and averages over a derived view.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub total: usize,
    #[serde(flatten)]
    pub amounts: BTreeMap<String, Monto>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_items: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_unidades: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promedio: Option<Monto>,
    #[serde(flatten)]
    pub counts: BTreeMap<String, usize>,
}

impl Summary {
    /// The summed amount `name`, zero if it was not summarized.
    pub fn amount(&self, name: &str) -> Monto {
        self.amounts.get(name).copied().unwrap_or_default()
    }

    /// The count `name`, zero if it was not counted.
    pub fn count(&self, name: &str) -> usize {
        self.counts.get(name).copied().unwrap_or_default()
    }

    /// Label and display value pairs, for printing.
    pub fn lines(&self) -> Vec<(String, String)> {
        let mut out = vec![("total".to_string(), self.total.to_string())];
        for (name, amount) in &self.amounts {
            out.push((name.clone(), amount.to_string()));
        }
        if let Some(n) = self.total_items {
            out.push(("total_items".to_string(), n.to_string()));
        }
        if let Some(n) = self.total_unidades {
            out.push(("total_unidades".to_string(), n.to_string()));
        }
        if let Some(promedio) = self.promedio {
            out.push(("promedio".to_string(), promedio.to_string()));
        }
        for (name, n) in &self.counts {
            out.push((name.clone(), n.to_string()));
        }
        out
    }
}
