//! Backfill tuning.

use std::fmt;
use std::str::FromStr;

/// How heights are fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strategy {
    #[default]
    Sequential,
    Parallel,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Sequential => "sequential",
            Strategy::Parallel => "parallel",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" => Ok(Strategy::Sequential),
            "parallel" => Ok(Strategy::Parallel),
            other => Err(format!("unknown backfill strategy '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BackfillConfig {
    pub strategy: Strategy,
    /// Parallel fetch tasks.
    pub workers: usize,
    /// Capacity of the job and result queues.
    pub queue_capacity: usize,
    /// Rows buffered before a sequential flush.
    pub sequential_flush: usize,
    /// Rows buffered before a parallel flush.
    pub parallel_flush: usize,
    /// Heights per sequential chunk; the buffer is flushed at every chunk end.
    pub chunk_heights: u64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::Sequential,
            workers: 20,
            queue_capacity: 2048,
            sequential_flush: 3000,
            parallel_flush: 2000,
            chunk_heights: 1000,
        }
    }
}

impl BackfillConfig {
    pub fn parallel(workers: usize) -> Self {
        Self {
            strategy: Strategy::Parallel,
            workers,
            ..Self::default()
        }
    }

    pub fn flush_threshold(&self) -> usize {
        match self.strategy {
            Strategy::Sequential => self.sequential_flush,
            Strategy::Parallel => self.parallel_flush,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_parse() {
        assert_eq!("Parallel".parse::<Strategy>(), Ok(Strategy::Parallel));
        assert_eq!(" sequential ".parse::<Strategy>(), Ok(Strategy::Sequential));
        assert!("fast".parse::<Strategy>().is_err());
    }

    #[test]
    fn test_flush_threshold_follows_strategy() {
        assert_eq!(BackfillConfig::default().flush_threshold(), 3000);
        assert_eq!(BackfillConfig::parallel(6).flush_threshold(), 2000);
    }
}
