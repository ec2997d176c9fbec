//! Last-match-wins evaluation of a conditional format list.

use crate::data::{Datum, Value};
use crate::mapping::ColumnRef;

use super::colour::Colour;
use super::heatmap::{numeric_extent, HeatmapScale};
use super::rule::{ConditionalFormat, HeatmapFormat, Style};

/// Result of evaluating one datum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub style: Style,
    /// Position in the original format list of the format that set the style.
    pub winner: Option<usize>,
}

impl Evaluation {
    /// True when some format applied.
    pub fn is_styled(&self) -> bool {
        self.winner.is_some()
    }
}

/// Computes the style of a datum from an ordered list of conditional formats.
///
/// Every format is checked, in declaration order, and each one that applies
/// overwrites the style so far. The last applicable format therefore wins and
/// a datum nothing applies to gets the base style. Rules apply when their
/// comparison holds; heatmaps apply when their source value is numeric and a
/// domain is known (explicit, or measured by [`with_data`](Self::with_data)).
#[derive(Debug, Clone)]
pub struct ConditionalFormatEvaluator {
    formats: Vec<(usize, ConditionalFormat)>,
    data_domains: Vec<Option<[f64; 2]>>,
    base: Style,
    tint: f64,
}

impl ConditionalFormatEvaluator {
    pub fn new(formats: Vec<ConditionalFormat>) -> Self {
        let formats: Vec<_> = formats.into_iter().enumerate().collect();
        let data_domains = vec![None; formats.len()];
        Self {
            formats,
            data_domains,
            base: Style::default(),
            tint: 0.85,
        }
    }

    /// Keep only formats addressed to this dataset.
    pub fn with_dataset(mut self, dataset: Option<&str>) -> Self {
        let formats = std::mem::take(&mut self.formats);
        let domains = std::mem::take(&mut self.data_domains);
        let (formats, domains): (Vec<_>, Vec<_>) = formats
            .into_iter()
            .zip(domains)
            .filter(|((_, format), _)| format.dataset() == dataset)
            .unzip();
        self.formats = formats;
        self.data_domains = domains;
        self
    }

    /// Measure heatmap domains over the rows about to be rendered.
    pub fn with_data(mut self, rows: &[Datum]) -> Self {
        for ((_, format), domain) in self.formats.iter().zip(self.data_domains.iter_mut()) {
            if let ConditionalFormat::Heatmap(heat) = format {
                *domain = numeric_extent(rows.iter().filter_map(|row| row.get(&heat.source_id)))
                    .map(|(lo, hi)| [lo, hi]);
            }
        }
        self
    }

    /// Style returned when no format applies.
    pub fn with_base(mut self, base: Style) -> Self {
        self.base = base;
        self
    }

    /// Heatmap low-end tint.
    pub fn with_tint(mut self, tint: f64) -> Self {
        self.tint = tint;
        self
    }

    pub fn base(&self) -> &Style {
        &self.base
    }

    pub fn len(&self) -> usize {
        self.formats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.formats.is_empty()
    }

    /// Style for a datum.
    pub fn evaluate(&self, datum: &Datum) -> Evaluation {
        self.fold(|_| true, |format, slot| self.apply_datum(format, slot, datum))
    }

    /// Style for one target column of a datum.
    ///
    /// Formats without a target paint every column and still take part.
    pub fn evaluate_target(&self, datum: &Datum, target: &ColumnRef) -> Evaluation {
        self.fold(
            |format| format.target_id().is_none_or(|t| t == target),
            |format, slot| self.apply_datum(format, slot, datum),
        )
    }

    /// Style for a pre-aggregated scalar.
    pub fn evaluate_value(&self, value: &Value) -> Evaluation {
        self.fold(
            |_| true,
            |format, slot| match format {
                ConditionalFormat::Rule(rule) => {
                    rule.compare_value(value).then(|| rule.style.clone())
                }
                ConditionalFormat::Heatmap(heat) => self.heat_style(heat, slot, value),
            },
        )
    }

    fn fold<F, A>(&self, include: F, apply: A) -> Evaluation
    where
        F: Fn(&ConditionalFormat) -> bool,
        A: Fn(&ConditionalFormat, usize) -> Option<Style>,
    {
        let mut evaluation = Evaluation {
            style: self.base.clone(),
            winner: None,
        };
        for (slot, (position, format)) in self.formats.iter().enumerate() {
            if !include(format) {
                continue;
            }
            if let Some(style) = apply(format, slot) {
                evaluation.style = style;
                evaluation.winner = Some(*position);
            }
        }
        evaluation
    }

    fn apply_datum(&self, format: &ConditionalFormat, slot: usize, datum: &Datum) -> Option<Style> {
        match format {
            ConditionalFormat::Rule(rule) => rule.compare(datum).then(|| rule.style.clone()),
            ConditionalFormat::Heatmap(heat) => {
                let value = datum.get(&heat.source_id)?;
                self.heat_style(heat, slot, value)
            }
        }
    }

    fn heat_style(&self, heat: &HeatmapFormat, slot: usize, value: &Value) -> Option<Style> {
        let v = value.as_f64()?;
        let base = Colour::parse(&heat.colour)?;
        let [min, max] = heat.domain.or(self.data_domains[slot])?;
        let scale = HeatmapScale::new(base, min, max).with_tint(self.tint);
        Some(Style::new(scale.colour_at(v).to_hex()))
    }
}
