pub mod realtime;
pub mod tools;
pub mod transcript;

// Re-export commonly used types for convenience
pub use realtime::{
    RealtimeError, RealtimeResult, RealtimeTransport, SessionController, SessionStatus,
    TransportEvent,
};
pub use tools::{ExecutorRegistry, ToolCompiler, ToolDescriptor};
pub use transcript::{SharedTranscript, Transcript, TranscriptItem};
