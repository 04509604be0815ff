/*!
 * Per-operation timing statistics for the data store.
 */

use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

/// Entity kind and action of a recorded operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StatKey {
    pub entity: &'static str,
    pub action: &'static str,
}

/// Accumulated duration and call count of one kind of operation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatItem {
    pub duration: Duration,
    pub count: u64,
}

impl StatItem {
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            return Duration::ZERO;
        }
        let nanos = self.duration.as_nanos() / u128::from(self.count);
        Duration::from_nanos(u64::try_from(nanos).unwrap_or(u64::MAX))
    }
}

/// Thread-safe statistics table
#[derive(Debug, Default)]
pub struct Stats {
    items: Mutex<HashMap<StatKey, StatItem>>,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one sample
    pub fn log(&self, entity: &'static str, action: &'static str, duration: Duration) {
        let mut items = self.items.lock();
        let item = items.entry(StatKey { entity, action }).or_default();
        item.count += 1;
        item.duration += duration;
    }

    /// Start timing an operation; the sample is recorded when the guard drops
    pub fn timer(&self, entity: &'static str, action: &'static str) -> StatTimer<'_> {
        StatTimer {
            stats: self,
            entity,
            action,
            start: Instant::now(),
        }
    }

    /// Number of recorded samples for one kind of operation
    pub fn count(&self, entity: &'static str, action: &'static str) -> u64 {
        self.items
            .lock()
            .get(&StatKey { entity, action })
            .map(|item| item.count)
            .unwrap_or(0)
    }

    /// All entries sorted by entity and action
    pub fn snapshot(&self) -> Vec<(StatKey, StatItem)> {
        let mut entries: Vec<_> = self
            .items
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), *v))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, item) in self.snapshot() {
            writeln!(
                f,
                "{} {} '{}' actions took {:?} total, {:?} avg",
                item.count,
                key.entity,
                key.action,
                item.duration,
                item.average()
            )?;
        }
        Ok(())
    }
}

/// Records the elapsed time of an operation when dropped
pub struct StatTimer<'a> {
    stats: &'a Stats,
    entity: &'static str,
    action: &'static str,
    start: Instant,
}

impl Drop for StatTimer<'_> {
    fn drop(&mut self) {
        self.stats
            .log(self.entity, self.action, self.start.elapsed());
    }
}
