// Copyright (C) 2022-2026 Michael Herstine <sp1ff@pobox.com>
//
// This file is part of tracing-excerpt.
//
// tracing-excerpt is free software: you can redistribute it and/or modify it under the terms of the
// GNU General Public License as published by the Free Software Foundation, either version 3 of the
// License, or (at your option) any later version.
//
// tracing-excerpt is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with tracing-excerpt.  If
// not, see <http://www.gnu.org/licenses/>.

//! The output sink.
//!
//! This module defines the [`Transport`] trait that all sinks must support, along with
//! implementations for the standard streams, arbitrary [`Write`] implementations, UDP, TCP & (on
//! Linux) Unix datagram sockets.
//!
//! Each call to [`Transport::send`] carries one complete record, newline included. A failed send
//! is reported as [`Error::Transport`] and is never retried; retries & backoff, if wanted, belong
//! to the sink.
//!
//! # Examples
//!
//! To send records over UDP to a GELF collector listening on port 12201 on localhost:
//!
//! ```rust
//! use tracing_excerpt::transport::UdpTransport;
//! let transpo = UdpTransport::local().unwrap();
//! ```
//!
//! On a non-standard port on another host:
//!
//! ```rust
//! use tracing_excerpt::transport::UdpTransport;
//! let transpo = UdpTransport::new("some-host.domain.io:5514");
//! assert!(transpo.is_err()); // no such host, after all
//! ```

use crate::error::{Error, Result};

use parking_lot::Mutex;

use std::{io::Write, net::TcpStream};

#[cfg(target_os = "linux")]
use std::{os::unix::net::UnixDatagram, path::Path};

////////////////////////////////////////////////////////////////////////////////////////////////////
//                                      transport mechanisms                                      //
////////////////////////////////////////////////////////////////////////////////////////////////////

/// Operations all transport layers must support.
pub trait Transport {
    /// Send a slice of bytes on this transport mechanism, returning the number of bytes written.
    fn send(&self, buf: &[u8]) -> Result<usize>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}

impl<T: Transport + ?Sized> Transport for std::sync::Arc<T> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        (**self).send(buf)
    }
}

/// Writing records to standard output.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stdout;

impl Transport for Stdout {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        // Locking keeps concurrent records from interleaving
        let mut out = std::io::stdout().lock();
        out.write_all(buf).map_err(Error::transport)?;
        out.flush().map_err(Error::transport)?;
        Ok(buf.len())
    }
}

/// Writing records to standard error.
#[derive(Clone, Copy, Debug, Default)]
pub struct Stderr;

impl Transport for Stderr {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        std::io::stderr()
            .lock()
            .write_all(buf)
            .map_err(Error::transport)?;
        Ok(buf.len())
    }
}

/// Writing records to any [`Write`] implementation (a file, an in-memory buffer, &c).
///
/// [`Transport::send`] takes `&self`, so the writer is kept behind a mutex.
pub struct WriterTransport<W: Write> {
    writer: Mutex<W>,
}

impl<W: Write> WriterTransport<W> {
    pub fn new(writer: W) -> WriterTransport<W> {
        WriterTransport {
            writer: Mutex::new(writer),
        }
    }
    /// Give back the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        let mut writer = self.writer.lock();
        writer.write_all(buf).map_err(Error::transport)?;
        writer.flush().map_err(Error::transport)?;
        Ok(buf.len())
    }
}

/// Sending records via UDP datagrams.
pub struct UdpTransport {
    socket: std::net::UdpSocket,
}

impl UdpTransport {
    /// Construct a [`Transport`] implementation via UDP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<UdpTransport> {
        // Bind to any available port on localhost...
        let socket = std::net::UdpSocket::bind("127.0.0.1:0").map_err(Error::transport)?;
        // and connect to the collector at `addr`:
        socket.connect(addr).map_err(Error::transport)?;
        Ok(UdpTransport { socket })
    }
    /// Construct a [`Transport`] implementation via UDP at localhost:12201 (the GELF default)
    pub fn local() -> Result<UdpTransport> {
        UdpTransport::new("localhost:12201")
    }
}

impl Transport for UdpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(Error::transport)
    }
}

/// Sending records via a TCP stream
///
/// Records already end in a newline, which is all a line-oriented collector needs. GELF over TCP
/// instead delimits records with a null byte; see [`TcpTransport::with_delimiter`].
pub struct TcpTransport {
    socket: TcpStream,
    delimiter: Option<u8>,
}

impl TcpTransport {
    /// Construct a [`Transport`] implementation via TCP at `addr`.
    pub fn new<A: std::net::ToSocketAddrs>(addr: A) -> Result<TcpTransport> {
        Ok(TcpTransport {
            socket: TcpStream::connect(addr).map_err(Error::transport)?,
            delimiter: None,
        })
    }
    /// Construct a [`Transport`] implementation via TCP at localhost:12201, null-delimited
    pub fn try_default() -> Result<TcpTransport> {
        Ok(TcpTransport::new("localhost:12201")?.with_delimiter(Some(0)))
    }
    /// Follow each record with `delimiter`.
    pub fn with_delimiter(mut self, delimiter: Option<u8>) -> Self {
        self.delimiter = delimiter;
        self
    }
}

impl Transport for TcpTransport {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        // `Write` is implemented for `&TcpStream` as well as `TcpStream`; declaring `writer` as a
        // `&TcpStream` lets us write through the shared reference we've been given.
        let mut writer: &TcpStream = &self.socket;
        writer.write_all(buf).map_err(Error::transport)?;
        if let Some(delimiter) = self.delimiter {
            writer.write_all(&[delimiter]).map_err(Error::transport)?;
        }
        writer.flush().map_err(Error::transport)?;
        Ok(buf.len())
    }
}

/// Sending records via Unix socket (datagram)
#[cfg(target_os = "linux")]
pub struct UnixSocket {
    socket: UnixDatagram,
}

#[cfg(target_os = "linux")]
impl UnixSocket {
    /// Construct a [`Transport`] implementation via Unix datagram sockets at `path`.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<UnixSocket> {
        let sock = UnixDatagram::unbound().map_err(Error::transport)?;
        sock.connect(path).map_err(Error::transport)?;
        Ok(UnixSocket { socket: sock })
    }
}

#[cfg(target_os = "linux")]
impl Transport for UnixSocket {
    fn send(&self, buf: &[u8]) -> Result<usize> {
        self.socket.send(buf).map_err(Error::transport)
    }
}

#[cfg(test)]
mod test {

    use super::*;

    use std::io::Read;

    #[test]
    fn writer() {
        let t = WriterTransport::new(Vec::new());
        assert_eq!(t.send(b"{}\n").unwrap(), 3);
        assert_eq!(t.send(b"{\"a\":1}\n").unwrap(), 8);
        assert_eq!(t.into_inner(), b"{}\n{\"a\":1}\n");
    }

    struct Broken;

    impl Write for Broken {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone"))
        }
        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn writer_failure() {
        let t = WriterTransport::new(Broken);
        let err = t.send(b"{}\n").unwrap_err();
        assert!(matches!(err, Error::Transport { .. }));
        assert!(format!("{}", err).contains("gone"));
    }

    #[test]
    fn no_such_host() {
        assert!(UdpTransport::new("i.am.not.there.invalid:12201").is_err());
    }

    #[test]
    fn udp() {
        let server = std::net::UdpSocket::bind("127.0.0.1:0").unwrap();
        let t = UdpTransport::new(server.local_addr().unwrap()).unwrap();
        assert_eq!(t.send(b"{\"x\":1}\n").unwrap(), 8);
        let mut buf = [0u8; 64];
        let n = server.recv(&mut buf).unwrap();
        assert_eq!(&buf[..n], b"{\"x\":1}\n");
    }

    #[test]
    fn tcp_with_delimiter() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let t = TcpTransport::new(listener.local_addr().unwrap())
            .unwrap()
            .with_delimiter(Some(0));
        let (mut conn, _) = listener.accept().unwrap();
        assert_eq!(t.send(b"{}\n").unwrap(), 3);
        drop(t);
        let mut got = Vec::new();
        conn.read_to_end(&mut got).unwrap();
        assert_eq!(got, b"{}\n\0");
    }
}
