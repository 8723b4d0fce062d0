//! # meet-recorder-core
//!
//! Detection and activation engine for automatically starting a meeting
//! recording once the local user is in the call and appears to be the host.
//!
//! ## Design Principles
//!
//! - **Synchronous**: No async runtime. Waits are scheduled continuations.
//! - **Page-agnostic**: The engine sees the page only through the `Page` trait.
//! - **Label-driven**: Controls are found by declarative queries over labels and
//!   attributes, recomputed on every read.
//! - **Bounded**: Every retry loop has a counter; nothing waits forever.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use meet_recorder_core::{Detector, FixturePage, MemorySettingsStore, PageRuntime, RecorderConfig};
//!
//! let page = FixturePage::load("meeting.json".as_ref())?;
//! let detector = Detector::new(RecorderConfig::default(), Arc::new(MemorySettingsStore::default()));
//! let mut runtime = PageRuntime::new(detector, page);
//! runtime.page_ready();
//! runtime.run_until_idle();
//! let reports = runtime.drain_reports();
//! ```

pub mod backoff;
pub mod config;
pub mod confirm;
pub mod detector;
pub mod dom;
pub mod error;
pub mod labels;
pub mod locator;
pub mod observer;
pub mod orchestrator;
pub mod patterns;
pub mod query;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod settings;
pub mod storage;
pub mod trace;
pub mod transition;

pub use config::{load_config, parse_config, RecorderConfig};
pub use detector::{HostSignal, JoinAssessment};
pub use dom::{Document, ElementSpec, FixturePage, FixtureSpec, Mutation, NodeId, Page};
pub use error::{FailureKind, RecorderError, Result};
pub use locator::{ControlKind, Surface};
pub use orchestrator::{CompletionSource, Detector};
pub use runtime::{Pace, PageRuntime};
pub use scheduler::{Continuation, Millis, Scheduler, VirtualScheduler, Wake};
pub use session::{DetectionSession, Phase};
pub use settings::{FileSettingsStore, MemorySettingsStore, SettingsStore};
pub use storage::StorageConfig;
pub use trace::{format_trace, ActivationTrace, TraceEntry};
pub use transition::{next_phase, PhaseEvent};
