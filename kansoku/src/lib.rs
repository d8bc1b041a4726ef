#![cfg_attr(docsrs, feature(doc_cfg))]
//! # Kansoku
//!
//! Record and assert on the events an object raises.
//!
//! Kansoku attaches to every event a subject declares, records each raise
//! with its arguments and a global sequence number, and lets tests query
//! what happened: did an event occur, how often, with which arguments, and
//! in what order relative to other events.
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use kansoku::{EventHub, impl_observable, params};
//!
//! struct Thermostat {
//!     events: EventHub,
//! }
//!
//! impl_observable!(Thermostat, events);
//!
//! impl Thermostat {
//!     fn set(&self, celsius: f32) {
//!         self.events.raise("TargetChanged", params!["thermostat", celsius]);
//!     }
//! }
//!
//! let thermostat = Arc::new(Thermostat {
//!     events: EventHub::new(["TargetChanged", "PropertyChanged"]),
//! });
//! let monitor = kansoku::monitor(&thermostat)?;
//!
//! thermostat.set(21.5);
//! thermostat.set(19.0);
//!
//! let target = monitor.recording_for("TargetChanged")?;
//! assert_eq!(target.count(), 2);
//!
//! let warm = target.with_args::<f32, _>(|c| *c > 20.0)?;
//! assert_eq!(warm.count(), 1);
//! # Ok::<(), kansoku::Error>(())
//! ```
//!
//! ## Core Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Monitor`] | Attaches to a subject and records everything it raises |
//! | [`EventRecording`] | Lazy, filterable view of one event's occurrences |
//! | [`OccurredEvent`] | A single recorded raise: name, sequence, timestamp, arguments |
//! | [`Observable`] | Capability a subject implements to be monitored |
//! | [`EventHub`] | Ready-made [`Observable`] to embed in a subject |
//! | [`Parameters`] | Type-erased arguments of a raise |
//! | [`PropertyChangedArgs`] | Payload of the conventional `PropertyChanged` event |
//!
//! ## Property Changes
//!
//! Subjects that report property changes raise a single
//! [`PROPERTY_CHANGED`] event with a [`PropertyChangedArgs`] payload.
//! [`Monitor::property_changes`] narrows the recording to one property, or
//! to all of them with `None`:
//!
//! ```rust,ignore
//! assert!(monitor.property_changes(Some("Age"))?.any());
//! assert_eq!(monitor.property_changes(None)?.count(), 2);
//! ```
//!
//! ## Features
//!
//! - **`tokio`** - [`EventRecording::settle_on`] for waiting on events raised
//!   by background threads or tasks
//!
//! ## Examples
//!
//! See the [`examples/`](https://github.com/kansoku-rs/kansoku/tree/main/kansoku/examples) directory:
//!
//! - `property_changes.rs` - Monitoring a subject with observable properties
//! - `background_producer.rs` - Waiting for events raised from another thread

mod error;
mod event_hub;
mod event_name;
mod event_recording;
mod monitor;
mod monitor_config;
mod observable;
mod occurred_event;
mod occurrence_log;
mod parameters;
mod property_changed;

#[cfg(feature = "tokio")]
mod expectation;

pub use error::Error;
pub use event_hub::EventHub;
pub use event_name::EventName;
pub use event_recording::EventRecording;
pub use monitor::{Monitor, MonitorId, monitor};
pub use monitor_config::MonitorConfig;
pub use observable::{Handler, HandlerId, Observable};
pub use occurred_event::OccurredEvent;
pub use occurrence_log::OccurrenceLog;
pub use parameters::{Arg, Parameters};
pub use property_changed::{PROPERTY_CHANGED, PropertyChangedArgs, property_filter};

#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub use expectation::Expectation;

/// Convenience alias for `Result<T, kansoku::Error>`.
pub type Result<T = ()> = std::result::Result<T, Error>;
