//! Linear colour scale for the heatmap special format.

use crate::data::{Datum, Value};
use crate::mapping::ColumnRef;

use super::colour::Colour;

/// Maps a numeric domain onto a gradient ending at a base colour.
///
/// The low end of the domain gets the base colour mixed toward white by
/// `tint`; the high end gets the base colour itself.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapScale {
    base: Colour,
    domain: [f64; 2],
    tint: f64,
}

impl HeatmapScale {
    pub fn new(base: Colour, min: f64, max: f64) -> Self {
        Self {
            base,
            domain: [min.min(max), min.max(max)],
            tint: 0.85,
        }
    }

    /// Set how far toward white the low end is mixed.
    pub fn with_tint(mut self, tint: f64) -> Self {
        self.tint = if tint.is_finite() { tint.clamp(0.0, 1.0) } else { 0.0 };
        self
    }

    /// Scale over the numeric values of a column across rows.
    ///
    /// Returns `None` when no row holds a numeric value for the column.
    pub fn from_rows(base: Colour, column: &ColumnRef, rows: &[Datum]) -> Option<Self> {
        let (min, max) = numeric_extent(rows.iter().filter_map(|row| row.get(column)))?;
        Some(Self::new(base, min, max))
    }

    pub fn domain(&self) -> [f64; 2] {
        self.domain
    }

    /// Position of `v` in the domain, clamped to `[0, 1]`.
    ///
    /// A degenerate domain places every value at the top.
    pub fn normalize(&self, v: f64) -> f64 {
        let [min, max] = self.domain;
        let span = max - min;
        if !(span.is_finite() && span > 0.0) {
            return 1.0;
        }
        ((v - min) / span).clamp(0.0, 1.0)
    }

    pub fn colour_at(&self, v: f64) -> Colour {
        let low = self.base.lighten(self.tint);
        low.mix(&self.base, self.normalize(v))
    }
}

/// Minimum and maximum of the numeric values in an iterator.
pub(crate) fn numeric_extent<'a>(values: impl Iterator<Item = &'a Value>) -> Option<(f64, f64)> {
    values
        .filter_map(Value::as_f64)
        .filter(|v| v.is_finite())
        .fold(None, |acc, v| match acc {
            None => Some((v, v)),
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blue() -> Colour {
        Colour::rgb(0x5d, 0xa5, 0xda)
    }

    #[test]
    fn test_top_of_domain_is_base() {
        let scale = HeatmapScale::new(blue(), 0.0, 100.0);
        assert_eq!(scale.colour_at(100.0), blue());
        assert_eq!(scale.colour_at(250.0), blue());
    }

    #[test]
    fn test_distinct_and_monotonic() {
        let scale = HeatmapScale::new(blue(), 0.0, 100.0);
        let low = scale.colour_at(10.0);
        let high = scale.colour_at(90.0);
        assert_ne!(low, high);
        assert!(low.luminance() > high.luminance());
    }

    #[test]
    fn test_degenerate_domain() {
        let scale = HeatmapScale::new(blue(), 5.0, 5.0);
        assert_eq!(scale.normalize(5.0), 1.0);
        assert_eq!(scale.colour_at(-3.0), blue());
    }

    #[test]
    fn test_from_rows_skips_non_numeric() {
        let col = ColumnRef::indexed("measure", 0);
        let rows = vec![
            Datum::new().with_multi("measure", vec![("Revenue", 40.0)]),
            Datum::new().with_multi("measure", vec![("Revenue", "n/a")]),
            Datum::new().with_multi("measure", vec![("Revenue", 10.0)]),
        ];
        let scale = HeatmapScale::from_rows(blue(), &col, &rows).unwrap();
        assert_eq!(scale.domain(), [10.0, 40.0]);
        assert!(HeatmapScale::from_rows(blue(), &ColumnRef::new("x"), &rows).is_none());
    }
}
