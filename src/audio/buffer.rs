use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Duration of a raw 16-bit PCM byte buffer in milliseconds
pub fn pcm_duration_ms(byte_len: usize, sample_rate: u32, channels: u16) -> u64 {
    let bytes_per_second = sample_rate as u64 * channels as u64 * 2;
    if bytes_per_second == 0 {
        return 0;
    }
    byte_len as u64 * 1000 / bytes_per_second
}

/// Accumulated audio for one participant
#[derive(Default)]
struct Segment {
    bytes: Vec<u8>,
    duration_ms: u64,
}

/// Per-participant audio accumulation with time-bounded windows
///
/// Chunks accumulate until `min_buffer_ms` of audio is present, at which
/// point the concatenated segment is returned and the buffer resets. If a
/// burst pushes the accumulation past `max_buffer_ms`, only the most
/// recent max-window worth of bytes is kept (recency over completeness,
/// so transcription latency stays bounded).
///
/// Buffers are independent per participant; the map lock is held only
/// for the extend/take itself.
pub struct AudioIngestBuffer {
    min_buffer_ms: u64,
    max_buffer_ms: u64,
    segments: Mutex<HashMap<String, Segment>>,
}

impl AudioIngestBuffer {
    pub fn new(min_buffer_ms: u64, max_buffer_ms: u64) -> Self {
        Self {
            min_buffer_ms,
            max_buffer_ms,
            segments: Mutex::new(HashMap::new()),
        }
    }

    /// Add a chunk; returns the accumulated segment once the minimum
    /// window is reached
    pub fn add_chunk(
        &self,
        participant_id: &str,
        bytes: &[u8],
        duration_ms: u64,
    ) -> Option<Vec<u8>> {
        let mut segments = self.segments.lock();
        let segment = segments.entry(participant_id.to_string()).or_default();

        segment.bytes.extend_from_slice(bytes);
        segment.duration_ms += duration_ms;

        if segment.duration_ms < self.min_buffer_ms {
            return None;
        }

        if segment.duration_ms > self.max_buffer_ms {
            Self::truncate_to_recent(segment, self.max_buffer_ms);
            debug!(
                "Audio burst for {} truncated to most recent {}ms",
                participant_id, self.max_buffer_ms
            );
        }

        let ready = std::mem::take(&mut segment.bytes);
        segment.duration_ms = 0;
        Some(ready)
    }

    /// Return whatever has accumulated, regardless of the minimum window
    pub fn flush(&self, participant_id: &str) -> Option<Vec<u8>> {
        let mut segments = self.segments.lock();
        let segment = segments.remove(participant_id)?;
        if segment.bytes.is_empty() {
            return None;
        }
        Some(segment.bytes)
    }

    /// Discard any accumulated audio for the participant
    pub fn clear(&self, participant_id: &str) {
        self.segments.lock().remove(participant_id);
    }

    /// Drop the oldest bytes so the segment covers at most `max_ms`,
    /// proportional to the byte/duration ratio
    fn truncate_to_recent(segment: &mut Segment, max_ms: u64) {
        if segment.duration_ms <= max_ms || segment.bytes.is_empty() {
            return;
        }

        let keep =
            (segment.bytes.len() as u128 * max_ms as u128 / segment.duration_ms as u128) as usize;
        let drop = segment.bytes.len() - keep;
        segment.bytes.drain(..drop);
        segment.duration_ms = max_ms;
    }
}
