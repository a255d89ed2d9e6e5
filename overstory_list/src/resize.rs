// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::time::Duration;

use serde::Deserialize;
use understory_timing::{Debouncer, FrameCoalescer};
use web_time::Instant;

/// How the host reports container resizes.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResizeMode {
    /// An element-level resize observer; sizes are applied on the next frame.
    #[default]
    Observer,
    /// Window resize events; sizes are applied once they settle.
    WindowFallback,
}

/// Coalesces container height changes.
#[derive(Clone, Debug)]
pub struct ResizeTracker {
    mode: ResizeMode,
    frame: FrameCoalescer<f64>,
    settle: Debouncer,
    pending: Option<f64>,
}

impl ResizeTracker {
    /// Creates a tracker; `settle` is only used in
    /// [`ResizeMode::WindowFallback`].
    #[must_use]
    pub fn new(mode: ResizeMode, settle: Duration) -> Self {
        Self {
            mode,
            frame: FrameCoalescer::new(),
            settle: Debouncer::new(settle),
            pending: None,
        }
    }

    /// The delivery mode.
    #[must_use]
    pub fn mode(&self) -> ResizeMode {
        self.mode
    }

    /// Records a new container height.
    ///
    /// Returns `true` if the host must schedule a frame. In fallback mode the
    /// host instead waits for [`deadline`](Self::deadline).
    pub fn on_resize(&mut self, height: f64, now: Instant) -> bool {
        match self.mode {
            ResizeMode::Observer => self.frame.push(height),
            ResizeMode::WindowFallback => {
                self.pending = Some(height);
                self.settle.poke(now);
                false
            }
        }
    }

    /// When a pending fallback resize settles.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.settle.deadline()
    }

    /// Takes the height to apply this frame, if any.
    pub fn poll(&mut self, now: Instant) -> Option<f64> {
        match self.mode {
            ResizeMode::Observer => self.frame.take(),
            ResizeMode::WindowFallback => {
                if self.settle.fire_if_due(now) {
                    self.pending.take()
                } else {
                    None
                }
            }
        }
    }

    /// Drops any pending resize.
    pub fn clear(&mut self) {
        self.frame.clear();
        self.settle.cancel();
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use core::time::Duration;

    use web_time::Instant;

    use super::{ResizeMode, ResizeTracker};

    #[test]
    fn observer_mode_applies_latest_height_next_frame() {
        let now = Instant::now();
        let mut resize = ResizeTracker::new(ResizeMode::Observer, Duration::from_millis(100));
        assert!(resize.on_resize(300.0, now));
        assert!(!resize.on_resize(320.0, now));
        assert_eq!(resize.poll(now), Some(320.0));
        assert_eq!(resize.poll(now), None);
    }

    #[test]
    fn fallback_waits_for_the_burst_to_settle() {
        let t0 = Instant::now();
        let ms = Duration::from_millis;
        let mut resize = ResizeTracker::new(ResizeMode::WindowFallback, ms(100));
        assert!(!resize.on_resize(300.0, t0));
        assert!(!resize.on_resize(500.0, t0 + ms(50)));
        assert_eq!(resize.poll(t0 + ms(120)), None);
        assert_eq!(resize.deadline(), Some(t0 + ms(150)));
        assert_eq!(resize.poll(t0 + ms(150)), Some(500.0));
        assert_eq!(resize.poll(t0 + ms(300)), None);
    }
}
