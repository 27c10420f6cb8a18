//! Ordinal color scale and legend entries for the color dimension.

use serde::Serialize;
use std::collections::HashMap;

use crate::variables::VariableValue;

/// Colors assigned to color-dimension categories in domain order.
pub const COLOR_SCHEME: [&str; 27] = [
    "#5675c1", "#aec7e8", "#d14e5b", "#ffd336", "#4d824b", "#a652ba", "#69c487", "#ff7f0e", "#1f77b4",
    "#ffbb78", "#2ca02c", "#98df8a", "#d62728", "#ff9896", "#9467bd", "#c5b0d5", "#8c564b", "#c49c94",
    "#e377c2", "#f7b6d2", "#7f7f7f", "#c7c7c7", "#bcbd22", "#dbdb8d", "#17becf", "#9edae5", "#1f77b4",
];

/// Maps category values to colors by domain position, cycling through the
/// range. Values not yet in the domain are appended on first lookup.
#[derive(Debug, Clone)]
pub struct ColorScale {
    domain: Vec<String>,
    index: HashMap<String, usize>,
    range: Vec<String>,
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl ColorScale {
    /// A scale over [`COLOR_SCHEME`] with the given initial domain.
    pub fn new(domain: Vec<String>) -> Self {
        Self::with_range(domain, COLOR_SCHEME.iter().map(|c| c.to_string()).collect())
    }

    pub fn with_range(domain: Vec<String>, range: Vec<String>) -> Self {
        let mut scale = Self {
            domain: Vec::with_capacity(domain.len()),
            index: HashMap::new(),
            range,
        };
        for value in domain {
            scale.position(&value);
        }
        scale
    }

    fn position(&mut self, value: &str) -> usize {
        if let Some(&i) = self.index.get(value) {
            return i;
        }
        let i = self.domain.len();
        self.domain.push(value.to_string());
        self.index.insert(value.to_string(), i);
        i
    }

    /// Color for a category value. `None` only when the range is empty.
    pub fn color(&mut self, value: &VariableValue) -> Option<String> {
        if self.range.is_empty() {
            return None;
        }
        let i = self.position(&value.to_string());
        Some(self.range[i % self.range.len()].clone())
    }

    /// The domain value shown for `color` in the legend: the value at the
    /// color's first position in the range.
    pub fn label_for(&self, color: &str) -> Option<&str> {
        let i = self.range.iter().position(|c| c == color)?;
        self.domain.get(i).map(String::as_str)
    }

    pub fn domain(&self) -> &[String] {
        &self.domain
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub color: String,
    pub label: String,
}

/// Legend entries for `colors`, skipping colors without a non-empty label.
pub fn legend_entries(colors: &[String], scale: &ColorScale) -> Vec<LegendEntry> {
    colors
        .iter()
        .filter_map(|color| {
            let label = scale.label_for(color).filter(|l| !l.is_empty())?;
            Some(LegendEntry {
                color: color.clone(),
                label: label.to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_order_assigns_colors() {
        let mut scale = ColorScale::new(vec!["Africa".into(), "Asia".into()]);
        assert_eq!(scale.color(&"Asia".into()).as_deref(), Some("#aec7e8"));
        assert_eq!(scale.color(&"Africa".into()).as_deref(), Some("#5675c1"));
    }

    #[test]
    fn test_unknown_values_extend_domain() {
        let mut scale = ColorScale::with_range(vec!["a".into()], vec!["red".into(), "blue".into()]);
        assert_eq!(scale.color(&"b".into()).as_deref(), Some("blue"));
        assert_eq!(scale.color(&"c".into()).as_deref(), Some("red"));
        assert_eq!(scale.domain(), ["a", "b", "c"]);
        // cycling maps "c" to red, but the legend labels red with "a"
        assert_eq!(scale.label_for("red"), Some("a"));
    }

    #[test]
    fn test_numeric_values_use_display_form() {
        let mut scale = ColorScale::with_range(vec!["3".into()], vec!["red".into(), "blue".into()]);
        assert_eq!(scale.color(&3.0.into()).as_deref(), Some("red"));
    }

    #[test]
    fn test_empty_range_has_no_color() {
        let mut scale = ColorScale::with_range(Vec::new(), Vec::new());
        assert_eq!(scale.color(&"a".into()), None);
    }

    #[test]
    fn test_legend_skips_unlabelled_colors() {
        let scale = ColorScale::with_range(vec!["".into(), "b".into()], vec!["red".into(), "blue".into()]);
        let entries = legend_entries(&["red".into(), "blue".into(), "green".into()], &scale);
        assert_eq!(
            entries,
            vec![LegendEntry {
                color: "blue".into(),
                label: "b".into()
            }]
        );
    }
}
