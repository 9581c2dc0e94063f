use trialzone_core::{BufferId, Trial, TrialSignal};
use trialzone_enhance::EnhancerPipeline;
use trialzone_readers::{AnySnapshot, Router};
use trialzone_sync::SyncRegistry;

use crate::delimiter::{Delimiter, TrialWindow};
use crate::error::ExtractError;
use crate::lookup::{all_buffers, discard_all_before, find_buffer};
use crate::wrt::{resolve_wrt, WrtConfig};

/// The only non-finite, non-NaN gap between two adjacent `f64` values
/// representable at `t`, used to advance the start-buffer scan cursor past
/// a row without re-querying it. Assumes non-negative timestamps, true of
/// every clock in this system.
fn next_after(t: f64) -> f64 {
    if !t.is_finite() {
        return t;
    }
    f64::from_bits(t.to_bits() + 1)
}

#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub start_buffer: BufferId,
    pub start_column: usize,
    pub start_value: f64,
    pub wrt: Option<WrtConfig>,
}

/// The incremental, streaming trial extraction state machine: delimits
/// trials, resolves offsets and WRT alignment, snapshots buffers, runs
/// enhancers, and garbage-collects consumed data.
pub struct Extractor {
    config: ExtractorConfig,
    delimiter: Delimiter,
    enhancers: EnhancerPipeline,
    scanned_until: f64,
}

impl Extractor {
    pub fn new(config: ExtractorConfig, enhancers: EnhancerPipeline) -> Self {
        Self {
            config,
            delimiter: Delimiter::new(),
            enhancers,
            scanned_until: f64::NEG_INFINITY,
        }
    }

    pub fn is_done(&self) -> bool {
        self.delimiter.is_done()
    }

    /// Scans newly-appended start-buffer rows into the delimiter. Call once
    /// per driver cycle, after the router has advanced.
    pub fn scan(&mut self, router: &Router) -> Result<(), ExtractError> {
        let (_, buffer) = find_buffer(router, &self.config.start_buffer)
            .ok_or_else(|| ExtractError::UnknownBuffer(self.config.start_buffer.clone()))?;
        let trialzone_readers::AnyBuffer::Numeric(numeric) = buffer else {
            return Err(ExtractError::StartBufferNotNumeric(self.config.start_buffer.clone()));
        };
        let rows = numeric.query(self.scanned_until, f64::INFINITY);
        for row in &rows {
            if row.values.get(self.config.start_column) == Some(&self.config.start_value) {
                self.delimiter.on_match(row.t);
            }
            self.scanned_until = next_after(row.t);
        }
        Ok(())
    }

    pub fn notify_end_of_stream(&mut self) {
        self.delimiter.on_end_of_stream();
    }

    /// Emits every trial the delimiter has ready whose data is fully
    /// available, in strict start-time order.
    pub fn try_emit(&mut self, router: &mut Router, sync: &SyncRegistry) -> Vec<Trial> {
        let mut emitted = Vec::new();
        while let Some(window) = self.delimiter.peek_ready().copied() {
            if !Self::is_ready(router, &window) {
                break;
            }
            self.delimiter.pop_ready();
            emitted.push(self.emit_window(router, sync, window));
        }
        emitted
    }

    fn is_ready(router: &Router, window: &TrialWindow) -> bool {
        match window.end {
            Some(end) => router.entries().iter().all(|e| e.is_exhausted() || e.end_time() >= end),
            None => router.entries().iter().all(|e| e.is_exhausted()),
        }
    }

    fn emit_window(&mut self, router: &mut Router, sync: &SyncRegistry, window: TrialWindow) -> Trial {
        let TrialWindow { start, end } = window;
        // No WRT configured, or no match found: an unmatched WRT defaults
        // to 0; the "wrt_time = start_time" fallback only makes sense once
        // `start` is finite (trial 0's sentinel is not).
        let unmatched_fallback = if start.is_finite() { start } else { 0.0 };
        let wrt_time = match &self.config.wrt {
            Some(_) => resolve_wrt(router, sync, self.config.wrt.as_ref(), start, end).unwrap_or(unmatched_fallback),
            None => 0.0,
        };

        let mut trial = Trial::new(start, end, wrt_time);
        let end_bound = end.unwrap_or(f64::INFINITY);

        for (reader_name, buffer) in all_buffers(router) {
            let delta = sync.offset_at(reader_name, start);
            // Buffers are queried in the owning reader's own clock, so a
            // raw timestamp there needs plus delta to land in the
            // reference clock and then minus wrt_time to land at local
            // zero: net `+ (delta - wrt_time)`. `shift_times` always
            // subtracts its argument, so the argument here is the
            // negation: `wrt_time - delta`.
            let shift = wrt_time - delta;
            let snapshot = buffer.query_and_shift(start - delta, end_bound - delta, shift);
            match snapshot {
                AnySnapshot::Numeric(rows) => {
                    trial.numeric_events.insert(buffer.name().to_string(), rows);
                }
                AnySnapshot::Text(rows) => {
                    trial.text_events.insert(buffer.name().to_string(), rows);
                }
                AnySnapshot::Signal(chunks) => {
                    if let Some((frequency, channel_ids)) = buffer.signal_metadata() {
                        trial.signals.insert(
                            buffer.name().to_string(),
                            TrialSignal {
                                sample_frequency: frequency,
                                channel_ids: channel_ids.to_vec(),
                                chunks,
                            },
                        );
                    }
                }
            }
        }

        self.enhancers.run(trial_index_hint(start), &mut trial);

        // Garbage-collect: once a window is emitted, earlier data is
        // unreachable by any future trial.
        let cutoff = match end {
            Some(e) => start.min(e - 1.0),
            None => start,
        };
        if cutoff.is_finite() {
            discard_all_before(router, cutoff);
        }

        trial
    }
}

/// The trial index used in enhancer failure logs is assigned by the caller
/// that owns the full emitted sequence; this placeholder keeps the log line
/// meaningful when the extractor is used standalone (e.g. in tests).
fn trial_index_hint(start: f64) -> usize {
    if start.is_finite() {
        start.max(0.0) as usize
    } else {
        0
    }
}
