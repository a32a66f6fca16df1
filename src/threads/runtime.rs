//! Start/stop orchestration of the mapping, field and control threads

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender};

use super::control_thread::ControlThread;
use super::field_thread::FieldThread;
use super::mapping_thread::{MappingThread, MappingThreadConfig};
use crate::common::{ControlInput, NavError, NavResult, SensorSample};
use crate::config::NavConfig;
use crate::store::GridStore;

/// Capacity of the sample queue feeding the mapping thread
pub const SAMPLE_QUEUE_DEPTH: usize = 64;
/// Capacity of the outgoing command queue
pub const COMMAND_QUEUE_DEPTH: usize = 16;

/// The three navigation threads sharing one grid store
pub struct NavigationRuntime {
    store: Arc<GridStore>,
    running: Arc<AtomicBool>,
    samples: Sender<SensorSample>,
    commands: Receiver<ControlInput>,
    mapping: Option<MappingThread>,
    field: Option<FieldThread>,
    control: Option<ControlThread>,
}

impl NavigationRuntime {
    /// Build a fresh store from `config` and start all threads
    pub fn start(config: &NavConfig) -> NavResult<Self> {
        let store = Arc::new(GridStore::from_config(config)?);
        Self::with_store(config, store)
    }

    /// Start all threads over an existing store
    pub fn with_store(config: &NavConfig, store: Arc<GridStore>) -> NavResult<Self> {
        config.validate()?;
        let running = Arc::new(AtomicBool::new(true));
        let (sample_tx, sample_rx) = bounded(SAMPLE_QUEUE_DEPTH);
        let (command_tx, command_rx) = bounded(COMMAND_QUEUE_DEPTH);

        let mut runtime = Self {
            store: Arc::clone(&store),
            running: Arc::clone(&running),
            samples: sample_tx,
            commands: command_rx,
            mapping: None,
            field: None,
            control: None,
        };

        // A failed spawn drops `runtime`, which stops whatever already started.
        runtime.mapping = Some(MappingThread::spawn(
            MappingThreadConfig::from_config(config),
            Arc::clone(&store),
            sample_rx,
            Arc::clone(&running),
        )?);
        runtime.field = Some(FieldThread::spawn(config.field, Arc::clone(&store), Arc::clone(&running))?);
        runtime.control = Some(ControlThread::spawn(config.control, store, command_tx, running)?);

        log::info!("Navigation runtime started");
        Ok(runtime)
    }

    pub fn store(&self) -> &Arc<GridStore> {
        &self.store
    }

    /// Shared shutdown flag; clearing it stops every thread at its next iteration
    pub fn running_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.running)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Queue a sample for the mapping thread. Blocks while the queue is full.
    pub fn submit(&self, sample: SensorSample) -> NavResult<()> {
        self.samples
            .send(sample)
            .map_err(|_| NavError::TaskError("mapping thread is not accepting samples".to_string()))
    }

    /// Steering commands produced by the control thread
    pub fn commands(&self) -> &Receiver<ControlInput> {
        &self.commands
    }

    /// Most recent command waiting in the queue, discarding older ones
    pub fn latest_command(&self) -> Option<ControlInput> {
        self.commands.try_iter().last()
    }

    /// Stop every thread and wait for it to exit
    pub fn shutdown(mut self) -> NavResult<()> {
        self.stop()
    }

    fn stop(&mut self) -> NavResult<()> {
        self.running.store(false, Ordering::Relaxed);

        let results = [
            self.mapping.take().map(MappingThread::join),
            self.field.take().map(FieldThread::join),
            self.control.take().map(ControlThread::join),
        ];

        let mut first_error = None;
        for result in results.into_iter().flatten() {
            if let Err(e) = result {
                log::error!("{}", e);
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => {
                log::info!("Navigation runtime stopped");
                Ok(())
            }
        }
    }
}

impl Drop for NavigationRuntime {
    fn drop(&mut self) {
        if self.mapping.is_some() || self.field.is_some() || self.control.is_some() {
            let _ = self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Pose2D;
    use std::time::{Duration, Instant};

    #[test]
    fn test_start_and_shutdown_idle() {
        let runtime = NavigationRuntime::start(&NavConfig::default()).unwrap();
        assert!(runtime.is_running());
        let flag = runtime.running_flag();
        runtime.shutdown().unwrap();
        assert!(!flag.load(Ordering::Relaxed));
    }

    #[test]
    fn test_with_store_rejects_invalid_config() {
        let store = Arc::new(GridStore::from_config(&NavConfig::default()).unwrap());

        let mut config = NavConfig::default();
        config.control.period_ms = 0;
        assert!(matches!(
            NavigationRuntime::with_store(&config, Arc::clone(&store)),
            Err(NavError::InvalidParameter(_))
        ));

        let mut config = NavConfig::default();
        config.mapping.poll_interval_ms = 0;
        assert!(NavigationRuntime::with_store(&config, Arc::clone(&store)).is_err());

        assert_eq!(Arc::strong_count(&store), 1);
    }

    #[test]
    fn test_samples_map_and_produce_commands() {
        let runtime = NavigationRuntime::start(&NavConfig::default()).unwrap();
        runtime
            .submit(SensorSample::new(vec![1.0; 16], Pose2D::new(0.0, 0.0, 0.0)))
            .unwrap();

        let cmd = runtime.commands().recv_timeout(Duration::from_secs(5)).unwrap();
        assert!(cmd.v.is_finite() && cmd.omega.is_finite());

        let store = Arc::clone(runtime.store());
        runtime.shutdown().unwrap();

        let layer = store.occupancy_snapshot();
        assert!(layer.known_count() > 0);
        assert!(layer.certainty.iter().any(|v| *v > 7.5));
    }

    #[test]
    fn test_field_published_while_running() {
        let config = NavConfig::default();
        let store = Arc::new(GridStore::from_config(&config).unwrap());
        let initial = store.field_snapshot();

        let runtime = NavigationRuntime::with_store(&config, Arc::clone(&store)).unwrap();
        let deadline = Instant::now() + Duration::from_secs(5);
        while Arc::ptr_eq(&initial, &store.field_snapshot()) && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(10));
        }
        runtime.shutdown().unwrap();

        assert!(!Arc::ptr_eq(&initial, &store.field_snapshot()));
    }

    #[test]
    fn test_external_flag_stops_threads() {
        let runtime = NavigationRuntime::start(&NavConfig::default()).unwrap();
        runtime.running_flag().store(false, Ordering::Relaxed);
        assert!(!runtime.is_running());
        runtime.shutdown().unwrap();
    }
}
