use std::sync::Arc;
use tracing::trace;

use crate::scatter::aggregate::{DataByEntityAndYear, ScatterSeries};
use crate::scatter::dimension::{DimensionProperty, Tolerance};
use crate::variables::{VariableId, Year};

/// Identity of an aggregation: the bound dimensions and the revision of the
/// variable data they read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AggregationKey {
    pub revision: u64,
    pub dimensions: Vec<(DimensionProperty, VariableId, Tolerance)>,
}

/// Timeline and filtered per-entity data for one [`AggregationKey`].
#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub timeline_years: Vec<Year>,
    pub data: DataByEntityAndYear,
}

/// Single-entry memo of the last aggregation and the last window selected
/// from it. A new key or window replaces the stored entry.
#[derive(Debug, Default)]
pub struct AggregationCache {
    aggregation: Option<(AggregationKey, Arc<Aggregation>)>,
    window: Option<(AggregationKey, (Year, Year), Arc<Vec<ScatterSeries>>)>,
}

impl AggregationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn aggregation(
        &mut self,
        key: &AggregationKey,
        compute: impl FnOnce() -> Aggregation,
    ) -> Arc<Aggregation> {
        if let Some((cached, value)) = &self.aggregation {
            if cached == key {
                trace!("Aggregation cache hit");
                return Arc::clone(value);
            }
        }

        let value = Arc::new(compute());
        self.aggregation = Some((key.clone(), Arc::clone(&value)));
        self.window = None;
        value
    }

    pub fn window(
        &mut self,
        key: &AggregationKey,
        window: (Year, Year),
        compute: impl FnOnce() -> Vec<ScatterSeries>,
    ) -> Arc<Vec<ScatterSeries>> {
        if let Some((cached, cached_window, value)) = &self.window {
            if cached == key && *cached_window == window {
                trace!("Window cache hit");
                return Arc::clone(value);
            }
        }

        let value = Arc::new(compute());
        self.window = Some((key.clone(), window, Arc::clone(&value)));
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(revision: u64) -> AggregationKey {
        AggregationKey {
            revision,
            dimensions: vec![(DimensionProperty::X, 1, Tolerance::Years(1))],
        }
    }

    #[test]
    fn test_same_key_computes_once() {
        let mut cache = AggregationCache::new();
        let mut calls = 0;

        for _ in 0..3 {
            cache.aggregation(&key(1), || {
                calls += 1;
                Aggregation::default()
            });
        }
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_new_revision_recomputes_and_drops_window() {
        let mut cache = AggregationCache::new();
        cache.aggregation(&key(1), Aggregation::default);
        cache.window(&key(1), (2000, 2005), Vec::new);

        let mut recomputed = false;
        cache.aggregation(&key(2), || {
            recomputed = true;
            Aggregation::default()
        });
        assert!(recomputed);

        let mut window_calls = 0;
        cache.window(&key(1), (2000, 2005), || {
            window_calls += 1;
            Vec::new()
        });
        assert_eq!(window_calls, 1);
    }

    #[test]
    fn test_window_change_recomputes() {
        let mut cache = AggregationCache::new();
        let mut calls = 0;
        for window in [(2000, 2005), (2000, 2005), (2001, 2005)] {
            cache.window(&key(1), window, || {
                calls += 1;
                Vec::new()
            });
        }
        assert_eq!(calls, 2);
    }
}
