//! Field thread - periodically recomputes the navigation field.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::common::{NavError, NavResult};
use crate::config::FieldConfig;
use crate::store::GridStore;

/// Field thread handle.
pub struct FieldThread {
    handle: JoinHandle<()>,
}

impl FieldThread {
    /// Spawn the field thread.
    pub fn spawn(config: FieldConfig, store: Arc<GridStore>, running: Arc<AtomicBool>) -> NavResult<Self> {
        let handle = thread::Builder::new()
            .name("field".into())
            .spawn(move || run_field_loop(config, store, running))
            .map_err(|e| NavError::TaskError(format!("failed to spawn field thread: {}", e)))?;

        Ok(Self { handle })
    }

    /// Wait for thread to finish.
    pub fn join(self) -> NavResult<()> {
        self.handle
            .join()
            .map_err(|_| NavError::TaskError("field thread panicked".to_string()))
    }
}

fn run_field_loop(config: FieldConfig, store: Arc<GridStore>, running: Arc<AtomicBool>) {
    let solver = store.field_solver(config.solver);
    let loop_interval = Duration::from_millis(config.period_ms);

    log::info!(
        "Field thread running every {}ms (seed threshold {:.3}, radius {})",
        loop_interval.as_millis(),
        solver.threshold(),
        config.solver.radius
    );

    let mut passes: u64 = 0;
    let mut unconverged: u64 = 0;

    while running.load(Ordering::Relaxed) {
        let loop_start = Instant::now();

        if let Some(report) = store.solve_field(&solver) {
            if !report.converged {
                unconverged += 1;
            }
        }
        passes += 1;

        let elapsed = loop_start.elapsed();
        if elapsed < loop_interval {
            thread::sleep(loop_interval - elapsed);
        } else {
            log::debug!("Field pass took {}ms, over its period", elapsed.as_millis());
        }
    }

    log::info!(
        "Field thread shutting down after {} passes ({} did not converge)",
        passes,
        unconverged
    );
}
