//! Wire types exchanged with the coaching backend.
//!
//! The backend speaks camelCase JSON and wraps every payload in a
//! `{ successful, data, error }` envelope.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Tool Declarations
// =============================================================================

/// A single parameter declared by the backend for a tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendToolParameter {
    /// Declared JSON type (string, number, boolean, array, object)
    #[serde(rename = "type")]
    pub param_type: String,
    /// Human readable description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the field must be present
    #[serde(default)]
    pub required: bool,
    /// Closed set of accepted string values
    #[serde(default, rename = "enum", skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,
}

/// Parameter block of a backend tool.
///
/// Properties are kept in a `BTreeMap` so compilation order is stable
/// regardless of the order the backend serialized them in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendToolParameters {
    #[serde(rename = "type", default = "default_parameters_type")]
    pub schema_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, BackendToolParameter>,
}

fn default_parameters_type() -> String {
    "object".to_string()
}

impl Default for BackendToolParameters {
    fn default() -> Self {
        Self {
            schema_type: default_parameters_type(),
            properties: BTreeMap::new(),
        }
    }
}

/// A tool declared by the backend for the agent to call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BackendToolParameters,
}

// =============================================================================
// Audio Configuration
// =============================================================================

/// Input transcription settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTranscriptionConfig {
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub prompt: String,
}

/// Turn detection settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioTurnDetectionConfig {
    /// Detection strategy (e.g. "semantic_vad", "server_vad")
    #[serde(rename = "type", default)]
    pub detection_type: String,
    #[serde(default)]
    pub create_response: bool,
    #[serde(default)]
    pub eagerness: String,
    #[serde(default)]
    pub interrupt_response: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioInputConfig {
    #[serde(default)]
    pub transcription: AudioTranscriptionConfig,
    #[serde(default)]
    pub turn_detection: AudioTurnDetectionConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioOutputConfig {
    #[serde(default)]
    pub voice: String,
}

/// Audio configuration handed through to the transport untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioConfig {
    #[serde(default)]
    pub input: AudioInputConfig,
    #[serde(default)]
    pub output: AudioOutputConfig,
}

// =============================================================================
// Provisioning
// =============================================================================

/// Interviewer mood selected at setup time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum InterviewMood {
    #[default]
    Friendly,
    Neutral,
    Rude,
}

impl From<InterviewMood> for u8 {
    fn from(mood: InterviewMood) -> Self {
        match mood {
            InterviewMood::Friendly => 1,
            InterviewMood::Neutral => 2,
            InterviewMood::Rude => 3,
        }
    }
}

impl TryFrom<u8> for InterviewMood {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(InterviewMood::Friendly),
            2 => Ok(InterviewMood::Neutral),
            3 => Ok(InterviewMood::Rude),
            other => Err(format!("unknown interview mood: {other}")),
        }
    }
}

impl InterviewMood {
    /// Parse a mood from its name or numeric code.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "1" | "friendly" => Some(InterviewMood::Friendly),
            "2" | "neutral" => Some(InterviewMood::Neutral),
            "3" | "rude" => Some(InterviewMood::Rude),
            _ => None,
        }
    }
}

impl fmt::Display for InterviewMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InterviewMood::Friendly => write!(f, "friendly"),
            InterviewMood::Neutral => write!(f, "neutral"),
            InterviewMood::Rude => write!(f, "rude"),
        }
    }
}

/// Parameters describing the interview to provision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewSetup {
    pub mood: InterviewMood,
    pub talent_id: String,
    pub job_id: String,
}

impl InterviewSetup {
    /// Build a setup, trimming identifiers. Returns `None` when either id is blank.
    pub fn new(mood: InterviewMood, talent_id: &str, job_id: &str) -> Option<Self> {
        let talent_id = talent_id.trim();
        let job_id = job_id.trim();
        if talent_id.is_empty() || job_id.is_empty() {
            return None;
        }
        Some(Self {
            mood,
            talent_id: talent_id.to_string(),
            job_id: job_id.to_string(),
        })
    }
}

/// Everything needed to open one realtime session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EphemeralSessionData {
    #[serde(default)]
    pub ephemeral_token: String,
    #[serde(default)]
    pub tools: Vec<BackendTool>,
    #[serde(default)]
    pub audio_config: Option<AudioConfig>,
}

/// Response envelope of the initialize endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub error: Option<String>,
}

// =============================================================================
// Reports
// =============================================================================

/// Speaker code used by the report endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ReportRole {
    User,
    Assistant,
}

impl From<ReportRole> for u8 {
    fn from(role: ReportRole) -> Self {
        match role {
            ReportRole::User => 1,
            ReportRole::Assistant => 2,
        }
    }
}

impl TryFrom<u8> for ReportRole {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ReportRole::User),
            2 => Ok(ReportRole::Assistant),
            other => Err(format!("unknown report role: {other}")),
        }
    }
}

/// One transcript turn submitted for report generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportTurn {
    pub role: ReportRole,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateReportRequest {
    pub talent_id: String,
    pub job_id: String,
    pub transcription: Vec<ReportTurn>,
}

/// Structured interview assessment returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InterviewReport {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub excitement: u8,
    #[serde(default)]
    pub rapport: u8,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub rbr_group: String,
    #[serde(default)]
    pub english_proficiency: u8,
    #[serde(default)]
    pub communication: u8,
    #[serde(default)]
    pub confidence: u8,
    #[serde(default)]
    pub insights: Vec<String>,
}

impl InterviewReport {
    /// Human label for the numeric English proficiency level.
    pub fn english_level(&self) -> &'static str {
        match self.english_proficiency {
            0 => "Beginner",
            1 => "Proficient",
            2 => "Expert",
            3 => "Native",
            _ => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportErrorBody {
    #[serde(default)]
    pub message: String,
}

/// Response envelope of the report endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct ReportResponse {
    #[serde(default)]
    pub data: Option<InterviewReport>,
    #[serde(default)]
    pub successful: bool,
    #[serde(default)]
    pub error: Option<ReportErrorBody>,
}
