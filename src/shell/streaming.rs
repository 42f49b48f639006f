//! Live handle over a streaming child.
//!
//! Stdout and stderr share one anonymous pipe. A reader thread moves raw
//! chunks from the pipe into a channel so the renderer can poll with a
//! timeout on every platform.

use std::io::{self, Read, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use crate::shell::process::exit_code;

const CHUNK_SIZE: usize = 4096;

/// One poll of the output channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Raw bytes from stdout or stderr.
    Output(Vec<u8>),

    /// Nothing arrived within the timeout.
    Pending,

    /// Every writer of the pipe has closed.
    Closed,
}

/// A running child with merged output and writable stdin.
///
/// Streams are closed on every exit path: explicitly through
/// [`close_streams`](Self::close_streams) or when the handle drops.
/// Closing never kills the child.
#[derive(Debug)]
pub struct StreamingProcess {
    command: String,
    child: Child,
    stdin: Option<ChildStdin>,
    output: Option<Receiver<Vec<u8>>>,
}

impl StreamingProcess {
    /// Spawn `cmd` with merged output. The `Command` is consumed so its
    /// copies of the pipe writer close once the child is running.
    pub(crate) fn spawn(mut cmd: Command, command: &str) -> io::Result<Self> {
        let (mut reader, writer) = io::pipe()?;
        cmd.stdin(Stdio::piped())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let mut child = cmd.spawn()?;
        drop(cmd);
        let stdin = child.stdin.take();

        let (tx, rx) = mpsc::channel();
        thread::spawn(move || {
            let mut buf = [0u8; CHUNK_SIZE];
            loop {
                match reader.read(&mut buf) {
                    Ok(0) => break,
                    Ok(n) => {
                        if tx.send(buf[..n].to_vec()).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            command: command.to_string(),
            child,
            stdin,
            output: Some(rx),
        })
    }

    /// The command line as the user typed it.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Process id of the child.
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Wait up to `timeout` for the next chunk of output.
    pub fn read(&mut self, timeout: Duration) -> StreamEvent {
        let Some(rx) = &self.output else {
            return StreamEvent::Closed;
        };
        match rx.recv_timeout(timeout) {
            Ok(chunk) => StreamEvent::Output(chunk),
            Err(RecvTimeoutError::Timeout) => StreamEvent::Pending,
            Err(RecvTimeoutError::Disconnected) => StreamEvent::Closed,
        }
    }

    /// Forward bytes to the child's stdin and flush.
    pub fn write_input(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::BrokenPipe, "stdin closed"))?;
        stdin.write_all(bytes)?;
        stdin.flush()
    }

    /// Exit code if the child has finished.
    pub fn try_wait(&mut self) -> io::Result<Option<i32>> {
        Ok(self.child.try_wait()?.map(exit_code))
    }

    /// Block until the child exits.
    pub fn wait(&mut self) -> io::Result<i32> {
        self.child.wait().map(exit_code)
    }

    /// Ask the child to stop: SIGINT on Unix, a hard kill elsewhere.
    pub fn interrupt(&mut self) -> io::Result<()> {
        #[cfg(unix)]
        {
            let pid = libc::pid_t::try_from(self.child.id())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
            // SAFETY: kill(2) has no memory-safety preconditions.
            let rc = unsafe { libc::kill(pid, libc::SIGINT) };
            if rc == 0 {
                return Ok(());
            }
            let err = io::Error::last_os_error();
            tracing::debug!("SIGINT to {} failed: {}", pid, err);
        }
        self.child.kill()
    }

    /// Close stdin and stop receiving output. Idempotent.
    pub fn close_streams(&mut self) {
        self.stdin.take();
        self.output.take();
    }

    /// Whether [`close_streams`](Self::close_streams) has run.
    pub fn is_closed(&self) -> bool {
        self.stdin.is_none() && self.output.is_none()
    }
}

impl Drop for StreamingProcess {
    fn drop(&mut self) {
        self.close_streams();
    }
}
