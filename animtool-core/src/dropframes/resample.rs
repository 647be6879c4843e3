use crate::foundation::core::{TimeRange, round_to_u32};
use crate::foundation::error::{AnimError, AnimResult};

/// Outcome of feeding one source frame to the [`Resampler`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Step {
    /// Output interval when the frame is kept.
    pub(crate) emit: Option<TimeRange>,
    /// The duration cap has been reached; no further frame is wanted.
    pub(crate) stop: bool,
}

/// Frame-rate and duration resampling over a contiguous source timeline.
///
/// A source frame is kept when it covers the current output boundary. A kept frame is shown
/// from the boundary to the next multiple of the target period past its own end.
#[derive(Clone, Debug)]
pub(crate) struct Resampler {
    period: u64,
    cap: u64,
    input_total: u64,
    boundary: u64,
    frames_in: u64,
    frames_out: u64,
}

impl Resampler {
    /// `frame_rate` and `total_duration` of 0 mean unlimited.
    pub(crate) fn new(frame_rate: u32, total_duration: u64) -> Self {
        let period = if frame_rate == 0 {
            0
        } else {
            u64::from(round_to_u32(1000.0 / f64::from(frame_rate)).max(1))
        };
        Self {
            period,
            cap: total_duration,
            input_total: 0,
            boundary: 0,
            frames_in: 0,
            frames_out: 0,
        }
    }

    pub(crate) fn step(&mut self, span: TimeRange) -> AnimResult<Step> {
        if span.start != self.input_total {
            return Err(AnimError::decode(format!(
                "frame {} starts at {} ms but the previous frame ended at {} ms",
                self.frames_in, span.start, self.input_total
            )));
        }
        self.frames_in += 1;

        if self.cap > 0 && span.start >= self.cap {
            return Ok(Step {
                emit: None,
                stop: true,
            });
        }

        let mut end = span.end;
        let mut stop = false;
        if self.cap > 0 && end > self.cap {
            end = self.cap;
            stop = true;
        }
        self.input_total = end;

        let keep = span.start <= self.boundary && (span.start == end || self.boundary < end);
        if !keep {
            return Ok(Step { emit: None, stop });
        }

        let mut next = if self.period > 0 {
            let left = end.saturating_sub(self.boundary);
            self.boundary + self.period * left.div_ceil(self.period)
        } else {
            end.max(self.boundary)
        };
        if self.cap > 0 {
            next = next.min(self.cap.max(self.boundary));
        }
        let emit = TimeRange::new(self.boundary, next)?;
        self.boundary = next;
        self.frames_out += 1;
        Ok(Step {
            emit: Some(emit),
            stop,
        })
    }

    /// Closing timestamp for the encoders.
    pub(crate) fn final_timestamp(&self) -> u64 {
        self.input_total.max(self.boundary)
    }

    pub(crate) fn frames_in(&self) -> u64 {
        self.frames_in
    }

    pub(crate) fn frames_out(&self) -> u64 {
        self.frames_out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/dropframes/resample.rs"]
mod tests;
