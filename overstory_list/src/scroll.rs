// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use core::time::Duration;

use understory_timing::{Debouncer, FrameCoalescer};
use web_time::Instant;

/// What one frame callback observed.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ScrollSample {
    /// Scroll offset read this frame.
    pub scroll_top: f64,
    /// Whether the offset differs from the previous frame.
    pub changed: bool,
    /// Whether the scroll-end debounce fired this frame.
    pub ended: bool,
    /// Whether the host must schedule another frame.
    pub reschedule: bool,
}

/// Frame-scheduled scroll sampling with scroll-end detection.
///
/// Scroll events only mark the tracker as scrolling and request a frame;
/// the offset is read once per frame in [`ScrollTracker::on_frame`]. Frames
/// keep being requested until no scroll event has arrived for the debounce
/// delay.
#[derive(Clone, Debug)]
pub struct ScrollTracker {
    active: bool,
    scrolling: bool,
    last_scroll_top: f64,
    frame: FrameCoalescer<Instant>,
    scroll_end: Debouncer,
}

impl ScrollTracker {
    /// Creates an inactive tracker with the given scroll-end debounce.
    #[must_use]
    pub fn new(scroll_end: Duration) -> Self {
        Self {
            active: false,
            scrolling: false,
            last_scroll_top: 0.0,
            frame: FrameCoalescer::new(),
            scroll_end: Debouncer::new(scroll_end),
        }
    }

    /// Starts accepting scroll events.
    pub fn start(&mut self) {
        self.active = true;
    }

    /// Stops accepting scroll events and drops any pending frame.
    pub fn stop(&mut self) {
        self.active = false;
        self.scrolling = false;
        self.frame.clear();
        self.scroll_end.cancel();
    }

    /// Returns `true` between [`start`](Self::start) and [`stop`](Self::stop).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Returns `true` while a scroll gesture is in progress.
    #[must_use]
    pub fn is_scrolling(&self) -> bool {
        self.scrolling
    }

    /// Offset read by the most recent frame.
    #[must_use]
    pub fn last_scroll_top(&self) -> f64 {
        self.last_scroll_top
    }

    /// When scrolling will be considered ended, if a gesture is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.scroll_end.deadline()
    }

    /// Records a scroll event. Returns `true` if the host must schedule a
    /// frame.
    pub fn on_scroll(&mut self, now: Instant) -> bool {
        if !self.active {
            return false;
        }
        self.scrolling = true;
        self.scroll_end.poke(now);
        self.frame.push(now)
    }

    /// Samples `scroll_top` for the current frame.
    pub fn on_frame(&mut self, scroll_top: f64, now: Instant) -> ScrollSample {
        self.frame.take();
        let changed = scroll_top != self.last_scroll_top;
        self.last_scroll_top = scroll_top;
        let ended = self.scroll_end.fire_if_due(now);
        if ended {
            self.scrolling = false;
        }
        let reschedule = self.active && self.scrolling && self.frame.push(now);
        ScrollSample {
            scroll_top,
            changed,
            ended,
            reschedule,
        }
    }
}
