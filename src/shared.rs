use std::{collections::BTreeMap, sync::Arc};

use parking_lot::RwLock;

use crate::{
    delta::{Delta, DeltaKey},
    errors::Result,
    history::{BenchmarkHistory, HistoryStore},
    ingest::AddOptions,
    result::{BenchmarkResult, BenchmarkRunResult},
    thresholds::{ThresholdConfig, Thresholds, calculate_thresholds},
};

/// A [`HistoryStore`] shared between threads.
///
/// Appends take the write lock, so readers never observe a half-sorted
/// history.
#[derive(Clone, Debug, Default)]
pub struct SharedHistory {
    inner: Arc<RwLock<HistoryStore>>,
}

impl SharedHistory {
    pub fn new(store: HistoryStore) -> Self {
        Self {
            inner: Arc::new(RwLock::new(store)),
        }
    }

    pub fn add_results(&self, batch: &BenchmarkRunResult, options: AddOptions) -> Result<()> {
        self.inner.write().add_results(batch, options)?;
        Ok(())
    }

    pub fn delta_for_benchmark(
        &self,
        result: &BenchmarkResult,
        keys: &[DeltaKey],
    ) -> Result<Option<BTreeMap<DeltaKey, Delta>>> {
        self.inner.read().delta_for_benchmark(result, keys)
    }

    pub fn deltas_from(
        &self,
        batch: &BenchmarkRunResult,
        keys: &[DeltaKey],
    ) -> Result<BTreeMap<String, BTreeMap<DeltaKey, Delta>>> {
        self.inner.read().deltas_from(batch, keys)
    }

    pub fn thresholds(&self, config: &ThresholdConfig) -> Thresholds {
        calculate_thresholds(self.inner.read().history(), config)
    }

    pub fn benchmark_names(&self) -> Vec<String> {
        self.inner.read().benchmark_names()
    }

    pub fn data(&self) -> BenchmarkHistory {
        self.inner.read().data()
    }

    pub fn data_string(&self) -> Result<String> {
        self.inner.read().data_string()
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

impl From<HistoryStore> for SharedHistory {
    fn from(store: HistoryStore) -> Self {
        Self::new(store)
    }
}
