//! Slipway Client Library
//!
//! Client-side counterpart to the orchestrator: resolves the route's build
//! reference, polls the CI status feed to decide whether the displayed build
//! is still the most recent one, and gates automatic advancement to a newer
//! build behind explicit user acceptance.

pub mod error;
pub mod fakes;
pub mod resolver;
pub mod staleness;
pub mod status_feed;
pub mod toast;

pub use error::StalenessError;
pub use resolver::{BuildRef, LatestBuildFeed, ResolveError};
pub use staleness::{
    evaluate, MonitorHandle, ReferenceBuild, StalenessDetector, StalenessMonitor, StalenessResult,
    StalenessStatus, DEFAULT_SAMPLE_WINDOW,
};
pub use status_feed::{build_results_link, CiStatusFeed, CiStatusSample, LifecycleState, Outcome};
pub use toast::{GateDriver, GateDriverHandle, ToastGate, ToastNotice};
