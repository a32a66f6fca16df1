//! Mapping thread - folds sensor samples into the occupancy grid.
//!
//! Blocks on the sample channel with a timeout so the running flag is rechecked even
//! when no samples arrive. Every sample is applied under one occupancy write lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::common::{NavError, NavResult, SensorSample};
use crate::config::{FrameConfig, NavConfig, SensorConfig};
use crate::store::GridStore;

/// Configuration for the mapping thread.
#[derive(Debug, Clone)]
pub struct MappingThreadConfig {
    pub frame: FrameConfig,
    pub sensors: SensorConfig,
    /// Longest wait for a sample before checking the running flag.
    pub poll_interval: Duration,
}

impl MappingThreadConfig {
    pub fn from_config(config: &NavConfig) -> Self {
        Self {
            frame: config.frame,
            sensors: config.sensors.clone(),
            poll_interval: Duration::from_millis(config.mapping.poll_interval_ms),
        }
    }
}

/// Mapping thread handle.
pub struct MappingThread {
    handle: JoinHandle<()>,
}

impl MappingThread {
    /// Spawn the mapping thread.
    ///
    /// Runs until `running` is cleared or every sample sender is dropped.
    pub fn spawn(
        config: MappingThreadConfig,
        store: Arc<GridStore>,
        samples: Receiver<SensorSample>,
        running: Arc<AtomicBool>,
    ) -> NavResult<Self> {
        let handle = thread::Builder::new()
            .name("mapping".into())
            .spawn(move || run_mapping_loop(config, store, samples, running))
            .map_err(|e| NavError::TaskError(format!("failed to spawn mapping thread: {}", e)))?;

        Ok(Self { handle })
    }

    /// Wait for thread to finish.
    pub fn join(self) -> NavResult<()> {
        self.handle
            .join()
            .map_err(|_| NavError::TaskError("mapping thread panicked".to_string()))
    }
}

fn run_mapping_loop(
    config: MappingThreadConfig,
    store: Arc<GridStore>,
    samples: Receiver<SensorSample>,
    running: Arc<AtomicBool>,
) {
    log::info!(
        "Mapping thread starting ({} active sonars, {} updates)",
        config.sensors.active.len(),
        store.updater().name()
    );

    let mut processed: u64 = 0;

    while running.load(Ordering::Relaxed) {
        match samples.recv_timeout(config.poll_interval) {
            Ok(sample) => {
                let beams = store.apply_sample(&sample, &config.frame, &config.sensors);
                processed += 1;
                log::trace!("Sample {} applied {} beams", processed, beams);
            }
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => {
                log::info!("Sample channel closed");
                break;
            }
        }
    }

    log::info!("Mapping thread shutting down after {} samples", processed);
}
