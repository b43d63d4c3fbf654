//! Per-virtual-user state.
//!
//! Owned exclusively by one workflow runner instance; mutated by its own
//! activity schedulers under a single reader/writer lock. `data` is
//! monotonic in presence of keys: each successful execution overwrites
//! that activity's entry wholesale.

use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use rand::Rng;

use crate::argument::Argument;
use crate::configuration::WorkflowQuery;
use crate::error::DrkError;
use crate::value::{Row, Value};

pub struct Vu {
    data: RwLock<HashMap<String, Vec<Row>>>,
}

impl Vu {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Write-locks `data`, overwrites the entry for `activity_name`, and
    /// releases.
    pub fn apply_data(&self, activity_name: &str, rows: Vec<Row>) {
        self.data.write().insert(activity_name.to_string(), rows);
    }

    /// Returns a cloned snapshot of the most recent result set for
    /// `activity_name`, or `None` if that activity hasn't run yet.
    ///
    /// Cloning under the read lock keeps the lock scope small: callers
    /// never hold it across argument generation or statement execution.
    pub fn data_for(&self, activity_name: &str) -> Option<Vec<Row>> {
        self.data.read().get(activity_name).cloned()
    }

    /// Iterates `args` in order, invoking each generator in turn. Returns
    /// on the first failure, wrapped in `ArgGenerationFailed`. The result
    /// slice preserves configured order.
    pub fn generate_args(
        &self,
        args: &[Argument],
        catalogue: &crate::generators::GeneratorCatalogue,
    ) -> Result<Vec<Value>, DrkError> {
        args.iter()
            .map(|arg| {
                arg.generate(self, catalogue)
                    .map_err(|e| DrkError::ArgGenerationFailed(Box::new(e)))
            })
            .collect()
    }

    /// Sleeps a uniformly random duration in `[0, max_ticker_interval)`
    /// among `queries`, to de-phase VUs started in lockstep and avoid
    /// synchronised thundering ticks.
    pub async fn stagger(&self, queries: &[WorkflowQuery]) {
        let max_ticker_interval = queries
            .iter()
            .map(|q| q.rate.ticker_interval())
            .max()
            .unwrap_or(Duration::ZERO);

        if max_ticker_interval.is_zero() {
            return;
        }

        let nanos = rand::thread_rng().gen_range(0..max_ticker_interval.as_nanos().max(1)) as u64;
        tokio::time::sleep(Duration::from_nanos(nanos)).await;
    }
}

impl Default for Vu {
    fn default() -> Self {
        Self::new()
    }
}
