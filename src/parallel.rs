//! Parallel processing configuration
//!
//! Gap filling and path sampling run on Rayon's global pool. The results do
//! not depend on the thread count; one thread gives a strictly sequential run.

use crate::errors::{FlowlineError, Result};
use rayon::ThreadPoolBuilder;
use tracing::info;

/// Configuration for parallel processing
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    pub num_threads: Option<usize>,
}

impl ParallelConfig {
    pub fn new(num_threads: Option<usize>) -> Self {
        Self { num_threads }
    }

    /// Set up the global Rayon thread pool
    ///
    /// # Errors
    ///
    /// Returns [`FlowlineError::ThreadPool`] for a zero thread count or when
    /// the global pool was already built.
    pub fn setup_global_pool(&self) -> Result<()> {
        match self.num_threads {
            Some(0) => Err(FlowlineError::ThreadPool(
                "thread count must be at least 1".to_string(),
            )),
            Some(num_threads) => {
                ThreadPoolBuilder::new()
                    .num_threads(num_threads)
                    .build_global()
                    .map_err(|e| {
                        FlowlineError::ThreadPool(format!(
                            "Failed to initialize thread pool with {} threads: {}",
                            num_threads, e
                        ))
                    })?;
                info!("Configured parallel processing with {} threads", num_threads);
                Ok(())
            }
            None => {
                info!("Using default thread pool configuration");
                Ok(())
            }
        }
    }
}

/// Information about the parallel processing environment
#[derive(Debug, Clone)]
pub struct ParallelInfo {
    pub current_threads: usize,
    pub available_cores: usize,
    pub available_parallelism: usize,
}

pub fn get_parallel_info() -> ParallelInfo {
    ParallelInfo {
        current_threads: rayon::current_num_threads(),
        available_cores: num_cpus::get(),
        available_parallelism: std::thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(1),
    }
}

impl ParallelInfo {
    /// Log the parallel processing environment at debug level
    pub fn log(&self) {
        tracing::debug!(
            current_threads = self.current_threads,
            available_cores = self.available_cores,
            available_parallelism = self.available_parallelism,
            "Parallel processing environment"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_leaves_thread_count_unset() {
        assert_eq!(ParallelConfig::default().num_threads, None);
        assert_eq!(ParallelConfig::new(Some(3)).num_threads, Some(3));
    }

    #[test]
    fn zero_threads_is_rejected() {
        let err = ParallelConfig::new(Some(0)).setup_global_pool().unwrap_err();
        assert!(matches!(err, FlowlineError::ThreadPool(_)));
    }

    #[test]
    fn environment_reports_at_least_one_thread() {
        let info = get_parallel_info();
        assert!(info.current_threads >= 1);
        assert!(info.available_parallelism >= 1);
    }
}
