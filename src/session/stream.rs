// Session message stream
//
// A reader thread decodes JSON lines from a capture source and forwards
// them over a channel. The UI thread is the only consumer, so every model
// mutation stays on one thread.

use super::{SessionError, STDIN_SOURCE};
use crate::flow::StreamMessage;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// How long a following reader waits at end of input before polling again
const FOLLOW_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Set once a reader thread owns stdin; a blocked read cannot be cancelled
static STDIN_CLAIMED: AtomicBool = AtomicBool::new(false);

/// Status reported when a source runs out without being followed
pub const COMPLETED_STATUS: &str = "completed";

/// Receiving end of a session stream
///
/// Dropping the handle tells the reader thread to stop at its next line.
#[derive(Debug)]
pub struct StreamHandle {
    receiver: Receiver<StreamMessage>,
    active: Arc<AtomicBool>,
}

impl StreamHandle {
    /// Every message that has arrived since the last call, in order
    pub fn drain(&self) -> Vec<StreamMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    self.active.store(false, Ordering::SeqCst);
                    break;
                }
            }
        }
        messages
    }

    /// Whether the reader thread may still send
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open the stream behind `url` and start reading it on a background thread
///
/// With `follow`, the reader keeps polling at end of input instead of
/// reporting the session as completed.
pub fn open_stream(url: &str, follow: bool) -> Result<StreamHandle, SessionError> {
    let reader: Box<dyn BufRead + Send> = if url == STDIN_SOURCE {
        claim_stdin(&STDIN_CLAIMED)?;
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(url).map_err(|source| SessionError::Source {
            path: url.to_string(),
            source,
        })?;
        Box::new(BufReader::new(file))
    };

    let (sender, receiver) = mpsc::channel();
    let active = Arc::new(AtomicBool::new(true));
    let active_clone = active.clone();
    let source = url.to_string();

    thread::Builder::new()
        .name("podflow-stream".to_string())
        .spawn(move || read_loop(reader, sender, active_clone, follow, &source))
        .map_err(|source| SessionError::Source {
            path: url.to_string(),
            source,
        })?;

    info!(source = %url, follow, "Opened session stream");
    Ok(StreamHandle { receiver, active })
}

/// Stdin can back at most one stream per process
fn claim_stdin(claimed: &AtomicBool) -> Result<(), SessionError> {
    if claimed.swap(true, Ordering::SeqCst) {
        return Err(SessionError::StdinConsumed);
    }
    Ok(())
}

fn read_loop(
    mut reader: Box<dyn BufRead + Send>,
    sender: Sender<StreamMessage>,
    active: Arc<AtomicBool>,
    follow: bool,
    source: &str,
) {
    let mut line = String::new();

    while active.load(Ordering::SeqCst) {
        match reader.read_line(&mut line) {
            Ok(0) if follow => thread::sleep(FOLLOW_POLL_INTERVAL),
            Ok(0) => {
                debug!(source, "Session stream reached end of input");
                let _ = sender.send(StreamMessage::SessionEnded {
                    status: COMPLETED_STATUS.to_string(),
                });
                break;
            }
            // Partial line from a writer still appending; wait for the rest
            Ok(_) if follow && !line.ends_with('\n') => thread::sleep(FOLLOW_POLL_INTERVAL),
            Ok(_) => {
                if !forward(&line, &sender) {
                    break;
                }
                line.clear();
            }
            Err(e) => {
                warn!(error = %e, source, "Session stream read failed");
                let _ = sender.send(StreamMessage::Error {
                    message: format!("reading {}: {}", source, e),
                });
                break;
            }
        }
    }

    active.store(false, Ordering::SeqCst);
}

/// Decode one line and send it; false once the receiver is gone
fn forward(line: &str, sender: &Sender<StreamMessage>) -> bool {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return true;
    }

    match StreamMessage::parse(trimmed) {
        Ok(message) => sender.send(message).is_ok(),
        Err(e) => {
            warn!(error = %e, "Dropping undecodable stream line");
            true
        }
    }
}
