//! TCP console server.
//!
//! Localhost-only. The device owns the server and pumps [`update`]
//! once per frame; everything here is non-blocking except the optional
//! wait for a first client at boot.
//!
//! [`update`]: ConsoleServer::update

use std::collections::BTreeMap;
use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;

use log::{debug, info, warn};
use parking_lot::{Mutex, MutexGuard};
use serde_json::{Map, Value};

use crate::error::{ConsoleError, ConsoleResult};
use crate::log_sink;
use crate::protocol::{Request, Response};

/// A request line never grows past this; longer means the peer is not
/// speaking the protocol.
const MAX_LINE_BYTES: usize = 64 * 1024;

/// Command handler. Receives the extra fields of the request object.
pub type CommandFn = Box<dyn Fn(&Map<String, Value>) -> Result<String, String> + Send>;

struct Command {
    help: &'static str,
    f: CommandFn,
}

pub(crate) struct Client {
    id: u64,
    stream: TcpStream,
    buf: Vec<u8>,
    alive: bool,
}

#[derive(Default)]
pub(crate) struct ClientSet {
    pub(crate) clients: Vec<Client>,
}

impl ClientSet {
    /// No logging in here: the log mirror broadcasts through this set.
    fn broadcast_line(&mut self, line: &str) {
        for c in &mut self.clients {
            if !c.alive {
                continue;
            }
            if write_line(&mut c.stream, line).is_err() {
                c.alive = false;
            }
        }
    }

    fn send_line(&mut self, client_id: u64, line: &str) {
        let Some(c) = self
            .clients
            .iter_mut()
            .find(|c| c.id == client_id && c.alive)
        else {
            return;
        };
        if write_line(&mut c.stream, line).is_err() {
            c.alive = false;
        }
    }
}

fn write_line(stream: &mut TcpStream, line: &str) -> io::Result<()> {
    stream.write_all(line.as_bytes())?;
    stream.write_all(b"\n")
}

/// Shared handle to the connected clients. The log mirror writes
/// through it from any thread; slow or broken clients are dropped
/// rather than buffered.
#[derive(Clone, Default)]
pub(crate) struct ClientHub {
    set: Arc<Mutex<ClientSet>>,
}

impl ClientHub {
    #[inline]
    fn lock(&self) -> MutexGuard<'_, ClientSet> {
        self.set.lock()
    }

    pub(crate) fn broadcast_line(&self, line: &str) {
        self.lock().broadcast_line(line);
    }

    pub(crate) fn client_count(&self) -> usize {
        self.lock().clients.iter().filter(|c| c.alive).count()
    }
}

pub struct ConsoleServer {
    listener: Option<TcpListener>,
    port: Option<u16>,
    hub: ClientHub,
    commands: BTreeMap<&'static str, Command>,
    next_client_id: u64,
}

impl ConsoleServer {
    pub fn new() -> Self {
        Self {
            listener: None,
            port: None,
            hub: ClientHub::default(),
            commands: BTreeMap::new(),
            next_client_id: 1,
        }
    }

    pub fn register(&mut self, name: &'static str, help: &'static str, f: CommandFn) {
        debug!(target: "console", "command.register name='{}'", name);
        self.commands.insert(name, Command { help, f });
    }

    /// Binds `127.0.0.1:port` (0 picks a free port). With `wait`,
    /// blocks until the first client connects so nothing logged at
    /// boot is lost on the tool side.
    pub fn listen(&mut self, port: u16, wait: bool) -> ConsoleResult<()> {
        let listener =
            TcpListener::bind(("127.0.0.1", port)).map_err(|e| ConsoleError::Bind {
                port,
                source: e,
            })?;
        let bound = listener.local_addr().map_err(ConsoleError::Io)?.port();
        info!(target: "console", "listen port={} wait={}", bound, wait);

        if wait {
            let (stream, addr) = listener.accept().map_err(ConsoleError::Io)?;
            info!(target: "console", "client.connect addr={}", addr);
            self.add_client(stream)?;
        }

        listener.set_nonblocking(true).map_err(ConsoleError::Io)?;
        self.listener = Some(listener);
        self.port = Some(bound);
        log_sink::attach(self.hub.clone());
        Ok(())
    }

    /// The bound port while listening.
    #[inline]
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    #[inline]
    pub fn client_count(&self) -> usize {
        self.hub.client_count()
    }

    /// Accepts pending clients, reads requests, runs commands. Call
    /// once per frame.
    pub fn update(&mut self) {
        self.accept_pending();
        let lines = self.collect_lines();
        for (client_id, line) in lines {
            self.dispatch(client_id, &line);
        }
        self.reap();
    }

    /// Closes the socket, drops all clients and detaches from the log
    /// mirror.
    pub fn stop(&mut self) {
        if self.listener.take().is_some() {
            info!(target: "console", "stop");
        }
        log_sink::detach();
        self.hub.lock().clients.clear();
        self.port = None;
    }

    #[cfg(test)]
    pub(crate) fn hub(&self) -> ClientHub {
        self.hub.clone()
    }

    fn add_client(&mut self, stream: TcpStream) -> ConsoleResult<()> {
        stream.set_nonblocking(true).map_err(ConsoleError::Io)?;
        stream.set_nodelay(true).map_err(ConsoleError::Io)?;

        let id = self.next_client_id;
        self.next_client_id += 1;
        self.hub.lock().clients.push(Client {
            id,
            stream,
            buf: Vec::new(),
            alive: true,
        });
        Ok(())
    }

    fn accept_pending(&mut self) {
        let mut accepted = Vec::new();
        if let Some(listener) = self.listener.as_ref() {
            loop {
                match listener.accept() {
                    Ok(pair) => accepted.push(pair),
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) => {
                        warn!(target: "console", "accept failed: {}", e);
                        break;
                    }
                }
            }
        }

        for (stream, addr) in accepted {
            info!(target: "console", "client.connect addr={}", addr);
            if let Err(e) = self.add_client(stream) {
                warn!(target: "console", "client.setup failed: {}", e);
            }
        }
    }

    /// Drains readable bytes and splits complete lines. Holds the
    /// client set, so it must not log.
    fn collect_lines(&mut self) -> Vec<(u64, String)> {
        let mut out = Vec::new();
        let mut g = self.hub.lock();

        for c in &mut g.clients {
            if !c.alive {
                continue;
            }

            let mut chunk = [0u8; 4096];
            loop {
                match c.stream.read(&mut chunk) {
                    Ok(0) => {
                        c.alive = false;
                        break;
                    }
                    Ok(n) => {
                        c.buf.extend_from_slice(&chunk[..n]);
                        if c.buf.len() > MAX_LINE_BYTES {
                            c.alive = false;
                            break;
                        }
                    }
                    Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                    Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                    Err(_) => {
                        c.alive = false;
                        break;
                    }
                }
            }

            while let Some(pos) = c.buf.iter().position(|&b| b == b'\n') {
                let mut line: Vec<u8> = c.buf.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                if line.is_empty() {
                    continue;
                }
                out.push((c.id, String::from_utf8_lossy(&line).into_owned()));
            }
        }

        out
    }

    fn dispatch(&mut self, client_id: u64, line: &str) {
        let response = match serde_json::from_str::<Request>(line) {
            Ok(Request::Ping) => Response::Pong,
            Ok(Request::Command { command, rest }) => self.run_command(&command, &rest),
            Err(e) => {
                debug!(target: "console", "request.malformed error='{}'", e);
                Response::error(format!("malformed request: {}", e))
            }
        };
        self.send(client_id, &response);
    }

    fn run_command(&self, name: &str, args: &Map<String, Value>) -> Response {
        if name == "help" {
            return Response::success(self.help_text());
        }

        match self.commands.get(name) {
            Some(cmd) => {
                debug!(target: "console", "command.exec name='{}'", name);
                match (cmd.f)(args) {
                    Ok(msg) => Response::success(msg),
                    Err(msg) => Response::error(msg),
                }
            }
            None => Response::error(format!("unknown command: {}", name)),
        }
    }

    fn help_text(&self) -> String {
        let mut out = String::from("Commands:\n  help  - List commands");
        for (name, cmd) in &self.commands {
            out.push_str("\n  ");
            out.push_str(name);
            out.push_str("  - ");
            out.push_str(cmd.help);
        }
        out
    }

    fn send(&self, client_id: u64, resp: &Response) {
        let line = serde_json::to_string(resp).unwrap_or_default();
        if line.is_empty() {
            return;
        }
        self.hub.lock().send_line(client_id, &line);
    }

    fn reap(&mut self) {
        let dropped: Vec<u64> = {
            let mut g = self.hub.lock();
            let dead: Vec<u64> = g
                .clients
                .iter()
                .filter(|c| !c.alive)
                .map(|c| c.id)
                .collect();
            g.clients.retain(|c| c.alive);
            dead
        };
        for id in dropped {
            info!(target: "console", "client.disconnect id={}", id);
        }
    }
}

impl Default for ConsoleServer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ConsoleServer {
    fn drop(&mut self) {
        self.stop();
    }
}
