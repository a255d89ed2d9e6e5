// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Understory Timing: host-agnostic debounce and frame-coalescing primitives.
//!
//! UI runtimes deliver bursts of high-frequency input (scroll, resize, pointer
//! motion) that should be processed at most once per frame, and often want to
//! know when a burst has *ended*. This crate provides two tiny building blocks
//! for that:
//!
//! - [`Debouncer`]: tracks the time of the most recent event and reports when a
//!   quiet period has elapsed since it.
//! - [`FrameCoalescer`]: keeps only the latest value pushed between two frames
//!   and tells the host when it needs to schedule a frame.
//!
//! Neither type reads a clock. The host passes `now` explicitly (an
//! [`Instant`](web_time::Instant), which works on native and `wasm32`), which
//! keeps behavior deterministic under test and lets the host drive time from
//! its own frame callback.
//!
//! ## Minimal example
//!
//! ```rust
//! use core::time::Duration;
//! use understory_timing::{Debouncer, FrameCoalescer};
//! use web_time::Instant;
//!
//! let start = Instant::now();
//! let mut settle = Debouncer::new(Duration::from_millis(150));
//! let mut frames = FrameCoalescer::new();
//!
//! // Three scroll events in one frame: only one frame is requested.
//! assert!(frames.push(10.0));
//! assert!(!frames.push(20.0));
//! assert!(!frames.push(30.0));
//! settle.poke(start);
//!
//! // The frame sees only the latest value.
//! assert_eq!(frames.take(), Some(30.0));
//!
//! // 150ms later the burst is over.
//! assert!(settle.fire_if_due(start + Duration::from_millis(150)));
//! ```

use core::time::Duration;

use web_time::Instant;

/// Reports when a quiet period has elapsed since the most recent event.
///
/// Each call to [`Debouncer::poke`] pushes the deadline out to
/// `now + delay`. [`Debouncer::fire_if_due`] returns `true` exactly once per
/// burst, the first time it is called at or after the deadline.
#[derive(Clone, Debug)]
pub struct Debouncer {
    delay: Duration,
    last_event: Option<Instant>,
}

impl Debouncer {
    /// Creates a debouncer with the given quiet period.
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self {
            delay,
            last_event: None,
        }
    }

    /// Returns the configured quiet period.
    #[must_use]
    pub const fn delay(&self) -> Duration {
        self.delay
    }

    /// Sets the quiet period. A pending burst keeps its last event time.
    pub fn set_delay(&mut self, delay: Duration) {
        self.delay = delay;
    }

    /// Records an event at `now`, restarting the quiet period.
    pub fn poke(&mut self, now: Instant) {
        self.last_event = Some(now);
    }

    /// Returns `true` while a burst is pending (poked but not yet fired).
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.last_event.is_some()
    }

    /// Returns the instant at which the pending burst settles, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Instant> {
        self.last_event.map(|last| last + self.delay)
    }

    /// Returns `true` if a burst is pending and its deadline has passed.
    ///
    /// Does not consume the burst; see [`Debouncer::fire_if_due`].
    #[must_use]
    pub fn is_due(&self, now: Instant) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Consumes the pending burst if its deadline has passed.
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        if self.is_due(now) {
            self.last_event = None;
            true
        } else {
            false
        }
    }

    /// Drops any pending burst without firing.
    pub fn cancel(&mut self) {
        self.last_event = None;
    }
}

/// Keeps the latest value pushed between two frames.
///
/// [`FrameCoalescer::push`] returns `true` only for the first push after a
/// [`FrameCoalescer::take`], which is the host's cue to schedule exactly one
/// frame callback. Later pushes overwrite the pending value.
#[derive(Clone, Debug)]
pub struct FrameCoalescer<T> {
    pending: Option<T>,
    frame_requested: bool,
}

impl<T> Default for FrameCoalescer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FrameCoalescer<T> {
    /// Creates an empty coalescer with no frame requested.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            pending: None,
            frame_requested: false,
        }
    }

    /// Stores `value` as the pending value for the next frame.
    ///
    /// Returns `true` if the caller must request a frame.
    pub fn push(&mut self, value: T) -> bool {
        self.pending = Some(value);
        if self.frame_requested {
            false
        } else {
            self.frame_requested = true;
            true
        }
    }

    /// Returns `true` if a frame has been requested and not yet taken.
    #[must_use]
    pub fn is_frame_requested(&self) -> bool {
        self.frame_requested
    }

    /// Returns the pending value without taking it.
    #[must_use]
    pub fn peek(&self) -> Option<&T> {
        self.pending.as_ref()
    }

    /// Takes the pending value at frame time and clears the frame request.
    pub fn take(&mut self) -> Option<T> {
        self.frame_requested = false;
        self.pending.take()
    }

    /// Drops the pending value and any frame request.
    pub fn clear(&mut self) {
        self.pending = None;
        self.frame_requested = false;
    }
}
