//! Frameprobe Core Library
//!
//! Client for a remote frame-analysis service: uploads a video or an image
//! sequence, polls the resulting job, and turns the returned findings into
//! severity groups, reports and export artifacts.
//!
//! The analysis itself happens server-side. This crate never decodes media.

pub mod core;
pub mod display;
pub mod logging;

pub use crate::core::session::AnalysisSession;
pub use crate::core::{CoreError, CoreResult};
pub use crate::logging::init_logging;
