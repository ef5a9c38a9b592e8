//! Memory usage reconstruction
//!
//! ALLOC/FREE events carry a byte count in their reason field. Folding them in
//! time order yields a step curve of bytes in use, one sample per tick. A FREE
//! larger than what is in use clamps the total at zero; the simulator logs
//! block sizes after coalescing, so this happens on legitimate traces.

use crate::error::{Result, TraceError};
use crate::event::{Event, MemoryAction, Tick};
use crate::intervals::tick_buffer;
use serde::{Deserialize, Serialize};

/// Bytes in use at every tick from 0 to the curve's last tick inclusive
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemoryCurve {
    samples: Vec<u64>,
}

impl MemoryCurve {
    /// Usage at `tick`, `None` past the end of the curve
    pub fn at(&self, tick: Tick) -> Option<u64> {
        usize::try_from(tick)
            .ok()
            .and_then(|idx| self.samples.get(idx).copied())
    }

    pub fn as_slice(&self) -> &[u64] {
        &self.samples
    }

    /// `(tick, bytes)` pairs in tick order
    pub fn points(&self) -> impl Iterator<Item = (Tick, u64)> + '_ {
        self.samples
            .iter()
            .enumerate()
            .map(|(tick, bytes)| (tick as Tick, *bytes))
    }

    pub fn peak(&self) -> u64 {
        self.samples.iter().copied().max().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

/// Fold state: usage so far, plus the samples already settled
///
/// `curve.len()` is the first tick whose value is not yet known.
#[derive(Debug)]
struct MemoryFold {
    running_total: u64,
    curve: Vec<u64>,
}

impl MemoryFold {
    fn apply(mut self, time: Tick, action: MemoryAction, bytes: u64) -> Self {
        let tick = time as usize;
        if tick > self.curve.len() {
            self.curve.resize(tick, self.running_total);
        }

        self.running_total = match action {
            MemoryAction::Alloc => self.running_total.saturating_add(bytes),
            MemoryAction::Free => {
                if bytes > self.running_total {
                    tracing::debug!(
                        time,
                        bytes,
                        in_use = self.running_total,
                        "FREE exceeds usage, clamping to 0"
                    );
                }
                self.running_total.saturating_sub(bytes)
            }
        };
        self
    }
}

/// Rebuild the usage curve over ticks `0..=max_time`
///
/// State events are ignored, as are memory events after `max_time`. With no
/// memory events the curve is all zeros. Fails with `MalformedTrace` when
/// `max_time + 1` samples cannot be allocated.
pub fn reconstruct_memory_curve(events: &[Event], max_time: Tick) -> Result<MemoryCurve> {
    let ticks = max_time.checked_add(1).ok_or_else(|| {
        TraceError::malformed(format!("memory curve past tick {} overflows", max_time))
    })?;
    let start = MemoryFold {
        running_total: 0,
        curve: tick_buffer(ticks)?,
    };

    let fold = events
        .iter()
        .filter(|e| e.time <= max_time)
        .filter_map(|e| e.memory_action().map(|action| (e.time, action, e.memory_size())))
        .fold(start, |state, (time, action, bytes)| {
            state.apply(time, action, bytes)
        });

    let MemoryFold {
        running_total,
        mut curve,
    } = fold;
    curve.resize(ticks as usize, running_total);

    Ok(MemoryCurve { samples: curve })
}
