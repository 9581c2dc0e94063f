use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use trialzone_config::Experiment;
use trialzone_core::Trial;
use trialzone_enhance::{run_collecters, Collecter};
use trialzone_extract::{Extractor, SyncCollector};
use trialzone_readers::Router;
use trialzone_sink::TrialSink;
use trialzone_sync::SyncRegistry;

use crate::error::DriverError;
use crate::summary::RunSummary;

/// `convert` runs to completion unattended; `gui` additionally honors
/// `simulate_delay` pacing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Convert,
    Gui,
}

/// One cooperative run of the reader/delimiter/extractor/sink pipeline.
/// Single-threaded: every buffer append, query, and discard this drives
/// happens on the same call stack, so no locking is needed across the
/// shared buffers.
pub struct Driver {
    router: Router,
    sync: SyncRegistry,
    sync_collector: SyncCollector,
    extractor: Extractor,
    collecters: Vec<Box<dyn Collecter>>,
    sink: Box<dyn TrialSink>,
    mode: RunMode,
    gui_paced: bool,
    shutdown: Arc<AtomicBool>,
}

impl Driver {
    pub fn new(experiment: Experiment, sink: Box<dyn TrialSink>, mode: RunMode) -> Self {
        Self {
            router: experiment.router,
            sync: experiment.sync,
            sync_collector: SyncCollector::new(),
            extractor: experiment.extractor,
            collecters: experiment.collecters,
            sink,
            mode,
            gui_paced: experiment.gui_paced,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// A handle a caller can use to request a graceful stop (user
    /// interrupt, GUI quit) from another thread or a signal handler.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Runs the top-level loop to completion or until shutdown is
    /// requested, then flushes, runs collecters, and closes the sink.
    pub fn run(&mut self) -> Result<RunSummary, DriverError> {
        let mut trials: Vec<Trial> = Vec::new();
        let mut cycles = 0usize;

        loop {
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping reader polling");
                break;
            }
            if self.router.all_exhausted() && self.extractor.is_done() {
                break;
            }

            self.router.advance_all();
            cycles += 1;
            self.sync_collector.collect(&self.router, &mut self.sync);
            self.extractor.scan(&self.router)?;
            if self.router.all_exhausted() {
                self.extractor.notify_end_of_stream();
            }

            self.emit_ready(&mut trials)?;

            if self.mode == RunMode::Gui && self.gui_paced {
                std::thread::sleep(Duration::from_millis(10));
            }
        }

        // A window still open when shutdown fires has no known end_time and
        // is dropped rather than flushed; any already-bounded window whose
        // data has since arrived is still picked up here.
        self.emit_ready(&mut trials)?;

        let rewritten = run_collecters(&self.collecters, &mut trials);
        for index in &rewritten {
            self.sink.rewrite(*index, &trials[*index])?;
        }
        self.sink.close()?;

        info!(cycles, trials = trials.len(), rewritten = rewritten.len(), "run finished");
        Ok(RunSummary {
            cycles,
            trials_emitted: trials.len(),
            trials_rewritten: rewritten.len(),
        })
    }

    fn emit_ready(&mut self, trials: &mut Vec<Trial>) -> Result<(), DriverError> {
        for trial in self.extractor.try_emit(&mut self.router, &self.sync) {
            self.sink.write(&trial)?;
            trials.push(trial);
        }
        Ok(())
    }
}
