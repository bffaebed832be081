//! Coaching backend API: wire types and the HTTP client.

mod session_service;
pub mod types;

pub use session_service::{DEFAULT_REQUEST_TIMEOUT, ReportError, SessionService};
pub use types::{
    AudioConfig, BackendTool, BackendToolParameter, BackendToolParameters, EphemeralSessionData,
    InterviewMood, InterviewReport, InterviewSetup, ReportRole, ReportTurn,
};
