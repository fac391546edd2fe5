//! Process ownership and the request/response cycle.

use std::io::{self, BufRead, BufReader, BufWriter, Read, Write};
use std::path::Path;
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::config::{EngineConfig, StderrMode};
use super::protocol::{self, EXIT, READY};
use super::{EngineSession, Recognition};
use crate::error::{Error, Result};

enum ReadOutcome {
    Line(String),
    Closed,
    TimedOut(Duration),
}

/// Everything touched by one request cycle; lives behind the client's mutex.
struct Channel {
    state: EngineSession,
    child: Option<Child>,
    stdin: Option<BufWriter<ChildStdin>>,
    lines: Receiver<String>,
}

impl Channel {
    fn read_line(&self, timeout: Option<Duration>) -> ReadOutcome {
        match timeout {
            Some(limit) => match self.lines.recv_timeout(limit) {
                Ok(line) => ReadOutcome::Line(line),
                Err(RecvTimeoutError::Timeout) => ReadOutcome::TimedOut(limit),
                Err(RecvTimeoutError::Disconnected) => ReadOutcome::Closed,
            },
            None => self
                .lines
                .recv()
                .map_or(ReadOutcome::Closed, ReadOutcome::Line),
        }
    }

    /// Discard output that arrived while no request was outstanding.
    fn drain_stray(&self) {
        while let Ok(line) = self.lines.try_recv() {
            warn!("Discarding unsolicited engine output: {}", line);
        }
    }

    fn exchange(&mut self, request: &str, timeout: Option<Duration>) -> Recognition {
        self.drain_stray();

        let Some(stdin) = self.stdin.as_mut() else {
            return Recognition::EngineError("engine input closed".to_string());
        };
        if let Err(e) = writeln!(stdin, "{request}").and_then(|()| stdin.flush()) {
            return Recognition::EngineError(format!("write failed: {e}"));
        }

        match self.read_line(timeout) {
            ReadOutcome::Line(line) => protocol::parse_response(&line),
            ReadOutcome::Closed => Recognition::EngineError("engine output closed".to_string()),
            ReadOutcome::TimedOut(limit) => {
                warn!("Engine did not answer within {:?}; closing session", limit);
                self.terminate();
                Recognition::EngineError(format!("timed out after {} ms", limit.as_millis()))
            }
        }
    }

    /// Best-effort `EXIT` followed by termination. No-op once closed.
    fn shutdown(&mut self) {
        if self.state == EngineSession::Closed {
            return;
        }
        if let Some(mut stdin) = self.stdin.take() {
            let _ = writeln!(stdin, "{EXIT}");
            let _ = stdin.flush();
        }
        self.terminate();
    }

    fn terminate(&mut self) {
        self.stdin = None;
        if let Some(mut child) = self.child.take() {
            let _ = child.kill();
            let _ = child.wait();
        }
        self.state = EngineSession::Closed;
    }
}

/// Owned handle to one running recognition engine.
///
/// Requests are serialized: concurrent callers queue on an internal mutex
/// around the write-then-read cycle. Per-request failures come back as
/// [`Recognition::EngineError`] and leave the session usable, except a
/// timeout, which closes it.
pub struct RecognitionEngineClient {
    config: EngineConfig,
    inner: Mutex<Channel>,
}

impl RecognitionEngineClient {
    /// Launch the engine and wait for its `READY` line.
    ///
    /// Any other first line, an early exit, or a startup timeout is an
    /// [`Error::EngineStartup`]; the process is killed before returning.
    pub fn start(config: EngineConfig) -> Result<Self> {
        info!("Starting recognition engine: {}", config.command_line());

        let launch_error = |e: io::Error| {
            Error::EngineStartup(format!("failed to launch {}: {e}", config.command_line()))
        };

        let mut command = Command::new(&config.program);
        command.args(&config.args).stdin(Stdio::piped());
        if let Some(dir) = &config.working_dir {
            command.current_dir(dir);
        }

        // Merged mode hands the child one pipe for both streams, so the
        // kernel keeps the write order of stdout and stderr lines.
        let merged = match config.stderr {
            StderrMode::Merged => {
                let (reader, writer) = io::pipe().map_err(launch_error)?;
                let stderr_writer = writer.try_clone().map_err(launch_error)?;
                command.stdout(writer).stderr(stderr_writer);
                Some(reader)
            }
            StderrMode::Separate => {
                command.stdout(Stdio::piped()).stderr(Stdio::piped());
                None
            }
        };

        let spawned = command.spawn();
        // Release our write ends so the reader sees end of stream on exit
        drop(command);
        let mut child = spawned.map_err(launch_error)?;

        let (tx, rx) = unbounded();
        let stdin = match merged {
            Some(reader) => {
                spawn_line_reader(reader, Some(tx));
                child.stdin.take()
            }
            None => match (child.stdout.take(), child.stderr.take()) {
                (Some(stdout), Some(stderr)) => {
                    spawn_line_reader(stdout, Some(tx));
                    spawn_line_reader(stderr, None);
                    child.stdin.take()
                }
                _ => None,
            },
        };
        let Some(stdin) = stdin else {
            let _ = child.kill();
            let _ = child.wait();
            return Err(Error::EngineStartup("engine pipes unavailable".to_string()));
        };

        let mut channel = Channel {
            state: EngineSession::Starting,
            child: Some(child),
            stdin: Some(BufWriter::new(stdin)),
            lines: rx,
        };

        let failure = match channel.read_line(config.startup_timeout) {
            ReadOutcome::Line(line) if line == READY => None,
            ReadOutcome::Line(line) => Some(format!("expected {READY}, got {line:?}")),
            ReadOutcome::Closed => Some("engine exited before handshake".to_string()),
            ReadOutcome::TimedOut(limit) => Some(format!("no handshake within {limit:?}")),
        };
        if let Some(reason) = failure {
            channel.terminate();
            return Err(Error::EngineStartup(reason));
        }

        channel.state = EngineSession::Ready;
        info!("Recognition engine ready");

        Ok(Self {
            config,
            inner: Mutex::new(channel),
        })
    }

    /// Configuration the engine was started with.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Current session state. Reports `Busy` while another caller holds
    /// the channel.
    #[must_use]
    pub fn state(&self) -> EngineSession {
        self.inner
            .try_lock()
            .map_or(EngineSession::Busy, |channel| channel.state)
    }

    /// Recognize the plate in one image, keeping the failure detail.
    pub fn request(&self, image: impl AsRef<Path>) -> Recognition {
        let image = image.as_ref();
        if !image.is_file() {
            return Recognition::EngineError(format!("image not found: {}", image.display()));
        }

        let path = match std::path::absolute(image) {
            Ok(path) => path.to_string_lossy().into_owned(),
            Err(e) => return Recognition::EngineError(format!("bad image path: {e}")),
        };
        if path.contains(['\n', '\r']) {
            return Recognition::EngineError("image path contains a line break".to_string());
        }

        let mut channel = self.inner.lock();
        if channel.state == EngineSession::Closed {
            return Recognition::EngineError("engine closed".to_string());
        }

        channel.state = EngineSession::Busy;
        let outcome = channel.exchange(&path, self.config.request_timeout);
        if channel.state == EngineSession::Busy {
            channel.state = EngineSession::Ready;
        }

        debug!("{} -> {:?}", path, outcome);
        outcome
    }

    /// Recognize the plate in one image.
    ///
    /// Returns `""` when no plate was found or the request failed.
    pub fn recognize(&self, image: impl AsRef<Path>) -> String {
        self.request(image).legacy_text().to_string()
    }

    /// Ask the engine to exit and terminate it.
    ///
    /// Never fails and is idempotent: after the first call the session is
    /// `Closed` and nothing more is written.
    pub fn shutdown(&self) {
        let mut channel = self.inner.lock();
        if channel.state != EngineSession::Closed {
            info!("Shutting down recognition engine");
        }
        channel.shutdown();
    }
}

impl Drop for RecognitionEngineClient {
    fn drop(&mut self) {
        self.inner.get_mut().shutdown();
    }
}

/// Forward each line of `stream` to `tx`, or to the log when `tx` is `None`.
///
/// The thread ends at end of stream; once every sender is gone the
/// receiver sees a disconnect.
fn spawn_line_reader<R>(stream: R, tx: Option<Sender<String>>)
where
    R: Read + Send + 'static,
{
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let raw = String::from_utf8_lossy(&buf);
            let text = protocol::strip_terminator(&raw).to_string();
            match &tx {
                Some(tx) => {
                    if tx.send(text).is_err() {
                        break;
                    }
                }
                None => debug!("engine stderr: {}", text),
            }
        }
    });
}
