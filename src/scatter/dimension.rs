use serde::{Deserialize, Serialize};

use crate::variables::{Variable, VariableId, Year};

/// Tolerance applied to x/y dimensions when neither the chart nor the
/// variable sets one.
pub const DEFAULT_AXIS_TOLERANCE: u32 = 1;

/// The role a variable plays in a scatter chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionProperty {
    X,
    Y,
    Color,
    Size,
}

impl DimensionProperty {
    /// `true` for the two positional axes.
    pub fn is_axis(self) -> bool {
        matches!(self, DimensionProperty::X | DimensionProperty::Y)
    }
}

/// Maximum distance in years between an observation and a target year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tolerance {
    Years(u32),
    Unbounded,
}

impl Tolerance {
    /// Whether an observation at `year` may stand in for `target`.
    pub fn admits(self, year: Year, target: Year) -> bool {
        match self {
            Tolerance::Years(t) => year_distance(year, target) <= u64::from(t),
            Tolerance::Unbounded => true,
        }
    }

    /// The inclusive span of target years an observation at `year` can
    /// serve, clamped to `[min, max]`. `None` when the clamp leaves nothing.
    pub fn window(self, year: Year, min: Year, max: Year) -> Option<(Year, Year)> {
        let (lo, hi) = match self {
            Tolerance::Years(t) => {
                let t = i64::from(t);
                let year = i64::from(year);
                (
                    (year - t).max(i64::from(min)),
                    (year + t).min(i64::from(max)),
                )
            }
            Tolerance::Unbounded => (i64::from(min), i64::from(max)),
        };
        // both bounds lie within [min, max] here, so the casts are lossless
        (lo <= hi).then_some((lo as Year, hi as Year))
    }
}

pub(crate) fn year_distance(a: Year, b: Year) -> u64 {
    (i64::from(a) - i64::from(b)).unsigned_abs()
}

/// A variable bound to a chart property.
#[derive(Debug, Clone, Copy)]
pub struct Dimension<'a> {
    pub property: DimensionProperty,
    pub variable: &'a Variable,
    pub tolerance: Tolerance,
}

impl<'a> Dimension<'a> {
    /// Binds `variable` to `property`.
    ///
    /// Color and size match any year. For x/y the tolerance is `axis_tolerance`
    /// if given, else the variable's display tolerance, else
    /// [`DEFAULT_AXIS_TOLERANCE`].
    pub fn new(property: DimensionProperty, variable: &'a Variable, axis_tolerance: Option<u32>) -> Self {
        let tolerance = if property.is_axis() {
            let from_display = variable
                .display
                .tolerance
                .map(|t| u32::try_from(t.max(0)).unwrap_or(u32::MAX));
            Tolerance::Years(
                axis_tolerance
                    .or(from_display)
                    .unwrap_or(DEFAULT_AXIS_TOLERANCE),
            )
        } else {
            Tolerance::Unbounded
        };

        Self {
            property,
            variable,
            tolerance,
        }
    }

    /// Identity used when memoizing derived results.
    pub fn key(&self) -> (DimensionProperty, VariableId, Tolerance) {
        (self.property, self.variable.id, self.tolerance)
    }
}
