// Copyright 2025 the Understory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=overstory_list --heading-base-level=0

//! Overstory List: a virtualized, incrementally loaded list controller.
//!
//! [`ListManager`] ties together the Understory pieces needed for a long,
//! remotely backed list:
//!
//! - an [`understory_collection::Collection`] holding the loaded items,
//! - a [`DataAdapter`](understory_data_adapter::DataAdapter) reading them
//!   range by range,
//! - [`understory_virtual_list`] range math, spacer sizing, and element
//!   pooling,
//! - [`understory_timing`] frame coalescing and debouncing for scroll and
//!   resize events.
//!
//! The host owns the event loop. It forwards scroll and resize events,
//! calls [`ListManager::on_frame`] when asked to, and drives any boundary
//! load the frame hands back:
//!
//! ```text
//! on_scroll(now) -> true      schedule a frame
//! on_frame(now)  -> outcome   range, spacer, and elements updated
//!   outcome.load: Some(ticket)
//!     ticket.fetch().await    no borrow of the list held here
//!     list.apply(completion)  merged, or discarded if stale
//! ```
//!
//! ## Loads and generations
//!
//! Every load is tagged with the generation current when it began.
//! [Jumps](ListManager::jump_to_page), [refreshes](ListManager::refresh), and
//! [teardown](ListManager::destroy) start a new generation and abort the
//! adapter's outstanding requests, so a response that arrives late can never
//! overwrite newer state. A second load for a range already in flight is
//! suppressed, and a boundary load for a range already in the window is
//! blocked.
//!
//! Boundary failures leave the window untouched, are published on the
//! collection's error feed, and pause automatic loading until
//! [`retry`](ListManager::retry). A batch the collection rejects counts as a
//! failure of its load. A jump that comes back empty keeps the current
//! window.
//!
//! ## Minimal example
//!
//! ```rust
//! use overstory_list::{ItemRenderer, ListConfig, ListManager, ListSource, ScrollContainer};
//! use understory_collection::Keyed;
//! use web_time::Instant;
//!
//! struct Row(String);
//!
//! impl Keyed for Row {
//!     fn id(&self) -> &str {
//!         &self.0
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Viewport {
//!     top: f64,
//!     spacer: f64,
//! }
//!
//! impl ScrollContainer for Viewport {
//!     fn scroll_top(&self) -> f64 { self.top }
//!     fn client_height(&self) -> f64 { 400.0 }
//!     fn scroll_height(&self) -> f64 { self.spacer }
//!     fn set_scroll_top(&mut self, top: f64) { self.top = top; }
//!     fn set_spacer_extent(&mut self, extent: f64) { self.spacer = extent; }
//! }
//!
//! struct Labels;
//!
//! impl ItemRenderer<Row> for Labels {
//!     type Element = String;
//!     fn create(&mut self, _: usize, row: &Row) -> String { row.0.clone() }
//!     fn update(&mut self, label: &mut String, _: usize, row: &Row) { label.clone_from(&row.0); }
//! }
//!
//! let rows = (0..1000).map(|i| Row(format!("row-{i}"))).collect();
//! let config = ListConfig::default().with_item_height(40.0).with_overscan(0);
//! let mut list = ListManager::new(config, ListSource::Static(rows), Viewport::default(), Labels);
//!
//! let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! rt.block_on(list.initialize()).unwrap();
//! assert_eq!(list.container().spacer, 40_000.0);
//! assert_eq!(list.state().visible_range().visible(), 0..10);
//!
//! list.container_mut().top = 800.0;
//! let now = Instant::now();
//! assert!(list.on_scroll(now));
//! let frame = list.on_frame(now);
//! assert_eq!(frame.range.visible(), 20..30);
//! assert_eq!(list.element(20).map(String::as_str), Some("row-20"));
//! ```

mod config;
mod container;
mod error;
mod load;
mod manager;
mod render;
mod resize;
mod scroll;
mod state;

pub use config::ListConfig;
pub use container::ScrollContainer;
pub use error::ListError;
pub use load::{LoadCompletion, LoadOutcome, LoadTicket};
pub use manager::{FrameChanges, FrameOutcome, ListDebugInfo, ListManager, ListSource, LoadStatus};
pub use render::ItemRenderer;
pub use resize::{ResizeMode, ResizeTracker};
pub use scroll::{ScrollSample, ScrollTracker};
pub use state::{Direction, ListState, LoadKind, LoadPhase};
