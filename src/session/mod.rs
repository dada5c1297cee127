// Capture sessions
//
// The session collaborator: list, start and stop trace sessions and hand out
// the address their messages stream from. `CaptureSessions` backs each
// session with a JSON-lines capture source (a file, or `-` for stdin).

pub mod stream;

pub use stream::{open_stream, StreamHandle};

use indexmap::IndexMap;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// Source name meaning standard input
pub const STDIN_SOURCE: &str = "-";

/// Trace kind recorded for sessions started from the command line
pub const DEFAULT_TRACE_KIND: &str = "trace_tcp";

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session '{0}' not found")]
    NotFound(String),

    #[error("cannot open capture source '{path}': {source}")]
    Source {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("standard input is already used by another session")]
    StdinConsumed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    Completed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to trace and where its messages come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRequest {
    pub source: String,
    pub kind: String,
    /// Namespace the trace is scoped to, if any
    pub namespace: Option<String>,
    pub pod_name: Option<String>,
}

impl SessionRequest {
    pub fn from_source(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            kind: DEFAULT_TRACE_KIND.to_string(),
            namespace: None,
            pod_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub id: String,
    pub kind: String,
    pub namespace: Option<String>,
    pub pod_name: Option<String>,
    pub source: String,
    pub status: SessionStatus,
}

impl Session {
    pub fn is_running(&self) -> bool {
        self.status == SessionStatus::Running
    }

    /// Short display name: the file name of the source, or `stdin`
    pub fn display_name(&self) -> String {
        if self.source == STDIN_SOURCE {
            return "stdin".to_string();
        }
        Path::new(&self.source)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.clone())
    }
}

/// Session lifecycle operations consumed by the app
pub trait SessionDirectory {
    fn list_sessions(&self) -> Vec<Session>;

    fn start_session(&mut self, request: SessionRequest) -> Result<Session, SessionError>;

    /// Stopped sessions leave the directory
    fn stop_session(&mut self, id: &str) -> Result<(), SessionError>;

    /// Address the session's message stream is read from
    fn stream_url(&self, id: &str) -> Result<String, SessionError>;

    /// The stream reported the session finished
    fn session_ended(&mut self, _id: &str) {}
}

/// Sessions backed by local capture sources, in start order
#[derive(Debug, Default)]
pub struct CaptureSessions {
    sessions: IndexMap<String, Session>,
}

impl CaptureSessions {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionDirectory for CaptureSessions {
    fn list_sessions(&self) -> Vec<Session> {
        self.sessions.values().cloned().collect()
    }

    fn start_session(&mut self, request: SessionRequest) -> Result<Session, SessionError> {
        if request.source == STDIN_SOURCE {
            if self.sessions.values().any(|s| s.source == STDIN_SOURCE) {
                return Err(SessionError::StdinConsumed);
            }
        } else {
            std::fs::metadata(&request.source).map_err(|source| SessionError::Source {
                path: request.source.clone(),
                source,
            })?;
        }

        let session = Session {
            id: Uuid::new_v4().to_string(),
            kind: request.kind,
            namespace: request.namespace,
            pod_name: request.pod_name,
            source: request.source,
            status: SessionStatus::Running,
        };

        info!(id = %session.id, source = %session.source, "Started capture session");
        self.sessions.insert(session.id.clone(), session.clone());
        Ok(session)
    }

    fn stop_session(&mut self, id: &str) -> Result<(), SessionError> {
        let session = self
            .sessions
            .shift_remove(id)
            .ok_or_else(|| SessionError::NotFound(id.to_string()))?;
        info!(id, status = %session.status, "Stopped capture session");
        Ok(())
    }

    fn stream_url(&self, id: &str) -> Result<String, SessionError> {
        self.sessions
            .get(id)
            .map(|session| session.source.clone())
            .ok_or_else(|| SessionError::NotFound(id.to_string()))
    }

    fn session_ended(&mut self, id: &str) {
        if let Some(session) = self.sessions.get_mut(id) {
            if session.is_running() {
                session.status = SessionStatus::Completed;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn capture_file() -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        writeln!(file, "{{}}").expect("write");
        file
    }

    #[test]
    fn test_start_lists_in_order() {
        let first = capture_file();
        let second = capture_file();
        let mut sessions = CaptureSessions::new();

        let a = sessions
            .start_session(SessionRequest::from_source(first.path().to_string_lossy()))
            .expect("start first");
        let b = sessions
            .start_session(SessionRequest::from_source(STDIN_SOURCE))
            .expect("start stdin");
        let c = sessions
            .start_session(SessionRequest::from_source(second.path().to_string_lossy()))
            .expect("start second");

        let ids: Vec<_> = sessions.list_sessions().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a.id.clone(), b.id, c.id]);
        assert!(a.is_running());
        assert_eq!(a.kind, DEFAULT_TRACE_KIND);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn test_missing_source_is_rejected() {
        let mut sessions = CaptureSessions::new();
        let result = sessions.start_session(SessionRequest::from_source("/definitely/not/here.jsonl"));
        assert!(matches!(result, Err(SessionError::Source { .. })));
        assert!(sessions.list_sessions().is_empty());
    }

    #[test]
    fn test_stop_and_stream_url() {
        let file = capture_file();
        let path = file.path().to_string_lossy().into_owned();
        let mut sessions = CaptureSessions::new();
        let session = sessions
            .start_session(SessionRequest::from_source(path.clone()))
            .expect("start");

        assert_eq!(sessions.stream_url(&session.id).expect("url"), path);

        sessions.stop_session(&session.id).expect("stop");
        assert!(sessions.list_sessions().is_empty());

        // A stopped session cannot be streamed again
        assert!(matches!(
            sessions.stream_url(&session.id),
            Err(SessionError::NotFound(_))
        ));
        sessions.session_ended(&session.id);
        assert!(sessions.list_sessions().is_empty());

        assert!(matches!(sessions.stop_session("nope"), Err(SessionError::NotFound(_))));
        assert!(matches!(sessions.stream_url("nope"), Err(SessionError::NotFound(_))));
    }

    #[test]
    fn test_session_ended_marks_completed() {
        let mut sessions = CaptureSessions::new();
        let session = sessions
            .start_session(SessionRequest::from_source(STDIN_SOURCE))
            .expect("start");
        sessions.session_ended(&session.id);
        assert_eq!(sessions.list_sessions()[0].status, SessionStatus::Completed);
        assert_eq!(SessionStatus::Completed.to_string(), "completed");
    }

    #[test]
    fn test_second_stdin_session_is_rejected() {
        let file = capture_file();
        let mut sessions = CaptureSessions::new();
        sessions
            .start_session(SessionRequest::from_source(STDIN_SOURCE))
            .expect("start stdin");
        sessions
            .start_session(SessionRequest::from_source(file.path().to_string_lossy()))
            .expect("start file");

        let result = sessions.start_session(SessionRequest::from_source(STDIN_SOURCE));
        assert!(matches!(result, Err(SessionError::StdinConsumed)));
        assert_eq!(sessions.list_sessions().len(), 2);
    }

    #[test]
    fn test_display_name() {
        let mut session = Session {
            id: "1".to_string(),
            kind: DEFAULT_TRACE_KIND.to_string(),
            namespace: None,
            pod_name: None,
            source: "/var/capture/shop-flows.jsonl".to_string(),
            status: SessionStatus::Running,
        };
        assert_eq!(session.display_name(), "shop-flows.jsonl");
        session.source = STDIN_SOURCE.to_string();
        assert_eq!(session.display_name(), "stdin");
    }
}
