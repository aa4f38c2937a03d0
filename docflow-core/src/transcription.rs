//! Transcription widget wire protocol
//!
//! The widget opens a WebSocket to `/ws/transcribe/`, sends one JSON
//! [`Handshake`], then streams raw audio chunks as binary frames. The server
//! answers with JSON frames tagged by `type`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const TRANSCRIBE_PATH: &str = "/ws/transcribe/";

/// WebSocket URL of the transcription endpoint on `host`
pub fn transcribe_url(host: &str, secure: bool) -> String {
    let scheme = if secure { "wss" } else { "ws" };
    format!(
        "{}://{}{}",
        scheme,
        host.trim_end_matches('/'),
        TRANSCRIBE_PATH
    )
}

/// First message of a transcription session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handshake {
    pub token: String,
    pub backend: String,
    pub model: String,
    pub transaction_id: String,
    pub section_id: String,
}

impl Handshake {
    /// Handshake for a new session with a fresh transaction id
    pub fn new(
        token: impl Into<String>,
        backend: impl Into<String>,
        model: impl Into<String>,
        section_id: impl Into<String>,
    ) -> Self {
        Self {
            token: token.into(),
            backend: backend.into(),
            model: model.into(),
            transaction_id: Uuid::new_v4().to_string(),
            section_id: section_id.into(),
        }
    }
}

/// A speaker turn reported by diarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeakerSegment {
    pub speaker: String,
    /// Seconds from session start
    pub start: f64,
    pub end: f64,
}

/// Frames pushed by the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerFrame {
    Start {
        session_id: Option<String>,
    },
    Recognition {
        text: String,
        /// Partial results are replaced by the next recognition frame
        #[serde(default)]
        is_final: bool,
    },
    Diarization {
        #[serde(default)]
        segments: Vec<SpeakerSegment>,
    },
    Error {
        message: String,
        code: Option<String>,
    },
}

impl ServerFrame {
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Running transcript assembled from server frames
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transcript {
    pub session_id: Option<String>,
    pub segments: Vec<String>,
    pub partial: Option<String>,
    pub speakers: Vec<SpeakerSegment>,
    pub errors: Vec<String>,
}

impl Transcript {
    pub fn apply(&mut self, frame: ServerFrame) {
        match frame {
            ServerFrame::Start { session_id } => self.session_id = session_id,
            ServerFrame::Recognition { text, is_final } => {
                if is_final {
                    self.partial = None;
                    if !text.trim().is_empty() {
                        self.segments.push(text);
                    }
                } else {
                    self.partial = Some(text);
                }
            }
            ServerFrame::Diarization { segments } => self.speakers.extend(segments),
            ServerFrame::Error { message, code } => self.errors.push(match code {
                Some(code) => format!("{}: {}", code, message),
                None => message,
            }),
        }
    }

    /// Final segments followed by the current partial result
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .map(String::as_str)
            .chain(self.partial.as_deref())
            .collect::<Vec<_>>()
            .join(" ")
    }
}
