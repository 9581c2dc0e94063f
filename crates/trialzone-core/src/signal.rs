use serde::{Deserialize, Serialize};

use crate::error::BufferError;

/// One contiguous run of regularly-sampled, row-major data: `samples[i * c + ch]`
/// is sample `i`, channel `ch`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalChunk {
    pub t0: f64,
    pub samples: Vec<f64>,
    n: usize,
}

impl SignalChunk {
    pub fn new(t0: f64, n: usize, channels: usize, samples: Vec<f64>) -> Self {
        debug_assert_eq!(samples.len(), n * channels);
        Self { t0, samples, n }
    }

    pub fn n(&self) -> usize {
        self.n
    }

    /// Time of sample `n - 1` given the buffer's fixed sample frequency.
    pub fn last_sample_time(&self, f: f64) -> f64 {
        self.t0 + (self.n.saturating_sub(1)) as f64 / f
    }

    fn sample_range(&self, channels: usize, first: usize, last_inclusive: usize) -> Vec<f64> {
        let start = first * channels;
        let end = (last_inclusive + 1) * channels;
        self.samples[start..end].to_vec()
    }
}

/// A sequence of chunks sharing a fixed sample frequency `f`, channel count
/// `c` and channel identifiers, time-ordered with non-overlapping sample
/// ranges.
#[derive(Debug, Clone)]
pub struct SignalBuffer {
    name: String,
    frequency: Option<f64>,
    channel_ids: Vec<String>,
    chunks: Vec<SignalChunk>,
    slack: f64,
}

impl SignalBuffer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            frequency: None,
            channel_ids: Vec::new(),
            chunks: Vec::new(),
            slack: 0.0,
        }
    }

    pub fn with_slack(mut self, slack: f64) -> Self {
        self.slack = slack;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn frequency(&self) -> Option<f64> {
        self.frequency
    }

    pub fn channel_ids(&self) -> &[String] {
        &self.channel_ids
    }

    pub fn channels(&self) -> usize {
        self.channel_ids.len()
    }

    pub fn chunks(&self) -> &[SignalChunk] {
        &self.chunks
    }

    /// Timestamp of the last sample across all chunks, or `-inf` if empty.
    pub fn end_time(&self) -> f64 {
        match (self.chunks.last(), self.frequency) {
            (Some(chunk), Some(f)) => chunk.last_sample_time(f),
            _ => f64::NEG_INFINITY,
        }
    }

    /// Appends one chunk, fixing `f`/`c`/`ids` on the first populated append.
    pub fn append(
        &mut self,
        t0: f64,
        f: f64,
        channel_ids: &[String],
        samples: Vec<f64>,
    ) -> Result<(), BufferError> {
        if f <= 0.0 {
            return Err(BufferError::InvalidFrequency {
                name: self.name.clone(),
                frequency: f,
            });
        }
        let expected_channels = self.frequency.map(|_| self.channel_ids.len());
        if let Some(expected) = expected_channels {
            if channel_ids.len() != expected {
                return Err(BufferError::ChannelMismatch {
                    name: self.name.clone(),
                    expected,
                    got: channel_ids.len(),
                });
            }
        }
        let channels = channel_ids.len().max(1);
        let n = samples.len() / channels;
        if let Some(last) = self.chunks.last() {
            let prev_f = self.frequency.unwrap();
            let last_end = last.last_sample_time(prev_f) + 1.0 / prev_f;
            if t0 < last_end - self.slack {
                return Err(BufferError::OutOfOrder {
                    name: self.name.clone(),
                    new_t: t0,
                    last_t: last_end,
                    slack: self.slack,
                });
            }
        }
        if self.frequency.is_none() {
            self.frequency = Some(f);
            self.channel_ids = channel_ids.to_vec();
        }
        self.chunks.push(SignalChunk::new(t0, n, channels, samples));
        Ok(())
    }

    /// Returns the sub-chunks intersecting `[a, b)`, rounded inward to whole
    /// samples: a partially-covered boundary sample is dropped rather than
    /// included.
    pub fn query(&self, a: f64, b: f64) -> Vec<SignalChunk> {
        let Some(f) = self.frequency else {
            return Vec::new();
        };
        let channels = self.channels().max(1);
        let mut out = Vec::new();
        for chunk in &self.chunks {
            let i_first = ((a - chunk.t0) * f).ceil() as i64;
            let i_last = ((b - chunk.t0) * f).floor() as i64 - 1;
            let i_first = i_first.max(0);
            let i_last = i_last.min(chunk.n() as i64 - 1);
            if i_first > i_last {
                continue;
            }
            let (i_first, i_last) = (i_first as usize, i_last as usize);
            let new_t0 = chunk.t0 + i_first as f64 / f;
            let samples = chunk.sample_range(channels, i_first, i_last);
            out.push(SignalChunk::new(new_t0, i_last - i_first + 1, channels, samples));
        }
        out
    }

    /// Drops chunks whose last sample lies strictly before `t`.
    pub fn discard_before(&mut self, t: f64) {
        let Some(f) = self.frequency else { return };
        self.chunks.retain(|c| c.last_sample_time(f) >= t);
    }
}

/// Subtracts `delta` from every chunk's `t0` in a query result.
pub fn shift_times(chunks: &mut [SignalChunk], delta: f64) {
    for chunk in chunks {
        chunk.t0 -= delta;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("ch{i}")).collect()
    }

    #[test]
    fn query_rounds_inward_to_whole_samples() {
        let mut buf = SignalBuffer::new("sig");
        // f = 10 Hz, 60 samples starting at t=0, 2 channels (sin, cos)
        let samples: Vec<f64> = (0..60 * 2).map(|i| i as f64).collect();
        buf.append(0.0, 10.0, &ids(2), samples).unwrap();

        // query [0.05, 0.25) -> samples whose time is in [0.05, 0.25)
        // sample times are 0.0, 0.1, 0.2, ... so i_first = ceil(0.5) = 1,
        // i_last = floor(2.5) - 1 = 1
        let got = buf.query(0.05, 0.25);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].n(), 1);
        assert_eq!(got[0].t0, 0.1);
    }

    #[test]
    fn query_outside_range_yields_no_chunk() {
        let mut buf = SignalBuffer::new("sig");
        buf.append(0.0, 10.0, &ids(1), vec![0.0; 10]).unwrap();
        let got = buf.query(5.0, 6.0);
        assert!(got.is_empty());
    }

    #[test]
    fn discard_before_drops_whole_chunks_only() {
        let mut buf = SignalBuffer::new("sig");
        buf.append(0.0, 1.0, &ids(1), vec![0.0; 5]).unwrap(); // samples t=0..4
        buf.append(5.0, 1.0, &ids(1), vec![0.0; 5]).unwrap(); // samples t=5..9
        buf.discard_before(5.0);
        assert_eq!(buf.chunks().len(), 1);
        assert_eq!(buf.chunks()[0].t0, 5.0);
    }

    #[test]
    fn rejects_channel_count_change() {
        let mut buf = SignalBuffer::new("sig");
        buf.append(0.0, 1.0, &ids(2), vec![0.0; 10]).unwrap();
        let err = buf.append(5.0, 1.0, &ids(3), vec![0.0; 15]);
        assert!(matches!(err, Err(BufferError::ChannelMismatch { .. })));
    }
}
