//! Agents running as separate OS processes, spoken to over a localhost TCP connection.
//!
//! For every match the submission executable is launched as
//! `<exe> <port> <action_timeout_ms>`. It must connect to `127.0.0.1:<port>` within
//! [`CONNECT_TIMEOUT`], then answer each received state line with one action line.
//! The child is killed when the agent instance is dropped. No sandboxing is applied.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use tracing::{debug, error, instrument, warn};

use crate::agent::AgentHandle;
use crate::game_interface::Agent;

/// Time a freshly launched agent has to connect back
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(1);

/// [`AgentHandle`] launching a new process per match.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    path: PathBuf,
    action_timeout: Duration,
    debug_stderr: bool,
}

impl ProcessHandle {
    /// Handle launching `path`, waiting at most `action_timeout` per action
    pub fn new(path: impl Into<PathBuf>, action_timeout: Duration) -> Self {
        Self {
            path: path.into(),
            action_timeout,
            debug_stderr: false,
        }
    }

    /// Let the agent write to our stderr
    pub fn with_debug_stderr(mut self, value: bool) -> Self {
        self.debug_stderr = value;
        self
    }

    /// Executable of the submission
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AgentHandle for ProcessHandle {
    fn instantiate(&self) -> anyhow::Result<Box<dyn Agent>> {
        Ok(Box::new(ClientHandler::init(self)?))
    }
}

/// One running agent process.
#[derive(Debug)]
pub struct ClientHandler {
    reader: BufReader<TcpStream>,
    stream: TcpStream,
    process: Child,
    action_timeout: Duration,
}

impl ClientHandler {
    /// Launches the child process and waits for its connection.
    ///
    /// Child process is killed on drop, or right away if it never connects.
    #[instrument(skip_all, fields(agent = %handle.path.display()))]
    pub fn init(handle: &ProcessHandle) -> anyhow::Result<ClientHandler> {
        let listener = TcpListener::bind("127.0.0.1:0")
            .context("server error: could not create TcpListener")?;
        let port_arg = listener.local_addr()?.port().to_string();

        let stderr = if handle.debug_stderr {
            Stdio::inherit()
        } else {
            Stdio::null()
        };
        let mut process = Command::new(&handle.path)
            .arg(&port_arg)
            .arg(handle.action_timeout.as_millis().to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(stderr)
            .spawn()
            .with_context(|| format!("could not launch '{}'", handle.path.display()))?;

        listener
            .set_nonblocking(true)
            .context("server error: setting non-blocking to true")?;

        let response_timeout = Instant::now() + CONNECT_TIMEOUT;
        while Instant::now() < response_timeout {
            if let Ok((stream, _addr)) = listener.accept() {
                debug!(port = %port_arg, "agent connected");
                return Self::connected(stream, process, handle.action_timeout);
            }
            if let Ok(Some(status)) = process.try_wait() {
                bail!("agent exited before connecting ({status})");
            }
            // at least 10 tries
            thread::sleep(Duration::from_millis(10).min(CONNECT_TIMEOUT / 10));
        }

        kill(&mut process);
        Err(anyhow!("no connection made to server"))
    }

    fn connected(
        stream: TcpStream,
        mut process: Child,
        action_timeout: Duration,
    ) -> anyhow::Result<ClientHandler> {
        let setup = || -> anyhow::Result<(BufReader<TcpStream>, TcpStream)> {
            stream
                .set_nonblocking(false)
                .context("server error: setting blocking for 'read'")?;
            stream
                .set_read_timeout(Some(action_timeout))
                .context("server error: setting read timeout")?;
            let reader = BufReader::new(stream.try_clone().context("server error: cloning stream")?);
            Ok((reader, stream))
        };
        match setup() {
            Ok((reader, stream)) => Ok(ClientHandler {
                reader,
                stream,
                process,
                action_timeout,
            }),
            Err(e) => {
                kill(&mut process);
                Err(e)
            }
        }
    }

    /// Sends one line and waits for the answer line
    pub fn send_and_recv(&mut self, msg: &str) -> anyhow::Result<String> {
        let mut line = msg.replace('\n', " ");
        line.push('\n');
        self.stream
            .write_all(line.as_bytes())
            .context("I/O error while sending state")?;

        let mut answer = String::new();
        match self.reader.read_line(&mut answer) {
            Ok(0) => Err(anyhow!("connection closed by agent")),
            Ok(_) => Ok(answer.trim_end_matches(['\r', '\n']).to_owned()),
            Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                Err(anyhow!("no answer within {:?}", self.action_timeout))
            }
            Err(e) => Err(e).context("error while reading stream"),
        }
    }
}

impl Agent for ClientHandler {
    fn select_action(&mut self, state: &str) -> anyhow::Result<String> {
        self.send_and_recv(state)
    }
}

impl Drop for ClientHandler {
    fn drop(&mut self) {
        kill(&mut self.process);
    }
}

fn kill(process: &mut Child) {
    match process.try_wait() {
        Ok(Some(_)) => {}
        _ => {
            if let Err(e) = process.kill() {
                error!("could not kill agent process {}: {e}", process.id());
            }
        }
    }
    if let Err(e) = process.wait() {
        warn!("could not reap agent process {}: {e}", process.id());
    }
}
