//! Raw-socket SCPI transport.
//!
//! Commands are sent as one newline-terminated line; each query response is
//! read up to the next newline. A query that times out leaves the link out
//! of step: whatever the instrument still sends for it is discarded before
//! the next query goes out.

use crate::resource::ResourceAddress;
use scpi_core::{Transport, TransportError};
use std::io::{self, BufRead, BufReader, Write};
use std::net::{Shutdown, TcpStream, ToSocketAddrs};
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Response timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

pub struct TcpTransport {
    resource: String,
    stream: Option<TcpStream>,
    reader: Option<BufReader<TcpStream>>,
    timeout: Duration,
    out_of_step: bool,
}

impl TcpTransport {
    #[instrument(skip_all, fields(resource = %address))]
    pub fn connect(address: &ResourceAddress, timeout: Duration) -> Result<Self, TransportError> {
        let resource = address.to_string();
        let connect_err = |reason: String| TransportError::Connect {
            resource: resource.clone(),
            reason,
        };

        let target = address
            .socket_addr()
            .to_socket_addrs()
            .map_err(|e| connect_err(e.to_string()))?
            .next()
            .ok_or_else(|| connect_err("address did not resolve".to_string()))?;

        let stream =
            TcpStream::connect_timeout(&target, timeout).map_err(|e| connect_err(e.to_string()))?;
        stream
            .set_read_timeout(Some(timeout))
            .and_then(|_| stream.set_write_timeout(Some(timeout)))
            .and_then(|_| stream.set_nodelay(true))
            .map_err(|e| connect_err(e.to_string()))?;
        let reader = stream
            .try_clone()
            .map(BufReader::new)
            .map_err(|e| connect_err(e.to_string()))?;

        debug!(peer = %target, timeout_ms = timeout.as_millis() as u64, "Connected");
        Ok(Self {
            resource,
            stream: Some(stream),
            reader: Some(reader),
            timeout,
            out_of_step: false,
        })
    }

    fn map_io(&self, command: &str, err: io::Error) -> TransportError {
        match err.kind() {
            _ if is_timeout(&err) => TransportError::Timeout {
                command: command.to_string(),
                timeout_ms: self.timeout.as_millis() as u64,
            },
            io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::UnexpectedEof => TransportError::Disconnected {
                resource: self.resource.clone(),
            },
            _ => TransportError::Io {
                resource: self.resource.clone(),
                source: err,
            },
        }
    }

    /// Discard late answers to timed-out queries, including a line cut off
    /// half-way, until the instrument stays quiet for one full timeout.
    fn resync(&mut self, command: &str) -> Result<(), TransportError> {
        if !self.out_of_step {
            return Ok(());
        }
        let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;
        let mut stale = String::new();
        let outcome = loop {
            stale.clear();
            match reader.read_line(&mut stale) {
                Ok(0) => break Err(io::ErrorKind::UnexpectedEof.into()),
                Ok(_) => {
                    warn!(response = %stale.trim_end(), "Discarding late response");
                }
                Err(e) if is_timeout(&e) => {
                    if !stale.is_empty() {
                        warn!(response = %stale, "Discarding partial response");
                    }
                    break Ok(());
                }
                Err(e) => break Err(e),
            }
        };
        outcome.map_err(|e| self.map_io(command, e))?;
        self.out_of_step = false;
        Ok(())
    }

    fn send_line(&mut self, command: &str) -> Result<(), TransportError> {
        let stream = self.stream.as_mut().ok_or(TransportError::Closed)?;
        let mut line = String::with_capacity(command.len() + 1);
        line.push_str(command);
        line.push('\n');
        let result = stream
            .write_all(line.as_bytes())
            .and_then(|_| stream.flush());
        result.map_err(|e| self.map_io(command, e))
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}

impl Transport for TcpTransport {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        self.send_line(command)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        self.resync(command)?;
        self.send_line(command)?;

        let reader = self.reader.as_mut().ok_or(TransportError::Closed)?;
        let mut response = String::new();
        match reader.read_line(&mut response) {
            Ok(0) => Err(TransportError::Disconnected {
                resource: self.resource.clone(),
            }),
            Ok(_) => Ok(response.trim_end_matches(['\r', '\n']).to_string()),
            Err(e) => {
                if is_timeout(&e) {
                    self.out_of_step = true;
                }
                Err(self.map_io(command, e))
            }
        }
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.reader = None;
        if let Some(stream) = self.stream.take() {
            match stream.shutdown(Shutdown::Both) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotConnected => {}
                Err(e) => {
                    return Err(TransportError::Io {
                        resource: self.resource.clone(),
                        source: e,
                    })
                }
            }
        }
        Ok(())
    }

    fn resource(&self) -> &str {
        &self.resource
    }
}
