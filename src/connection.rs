// ABOUTME: Byte transport between the driver and the modem's AT command channel
// ABOUTME: Defines the Transport trait and a buffered TCP implementation for serial bridges

use bytes::{Buf, Bytes, BytesMut};
use std::io::{self, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

/// Line-oriented duplex channel to the modem
///
/// The AT protocol has no framing beyond CR/LF line termination, so the
/// driver only needs three primitives from the channel: write raw bytes,
/// read one line with a timeout, and ask how much data is already waiting.
/// Opening and configuring the physical link (baud rate, parity, raw mode)
/// happens before a `Transport` is handed to the client.
///
/// ## Contract
/// - `read_line` blocks for at most `timeout` and returns whatever was read,
///   terminator included. An empty result means nothing arrived in time; it
///   is not an error.
/// - `bytes_available` never blocks.
/// - `read` fills as much of `buf` as arrives within `timeout` and is used
///   for raw payloads (HTTP bodies) that are not line-delimited.
pub trait Transport {
    /// Write all of `data` to the modem
    fn write_all(&mut self, data: &[u8]) -> io::Result<()>;

    /// Read a single line, waiting at most `timeout`
    fn read_line(&mut self, timeout: Duration) -> io::Result<Bytes>;

    /// Number of bytes received but not yet consumed
    fn bytes_available(&mut self) -> io::Result<usize>;

    /// Read raw bytes into `buf`, waiting at most `timeout`
    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize>;

    /// Drop everything received but not yet consumed
    fn discard_input(&mut self) -> io::Result<()> {
        while self.bytes_available()? > 0 {
            self.read_line(Duration::ZERO)?;
        }
        Ok(())
    }
}

/// Transport over a TCP connection to a serial bridge (ser2net, socat, ...)
///
/// Mirrors a serial port opened with a read timeout: `read_line` returns a
/// partial line if the terminator does not arrive in time, and an empty
/// buffer if nothing arrived at all.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,

    // Bytes received from the socket but not yet handed to the caller.
    buffer: BytesMut,
}

impl TcpTransport {
    /// Connect to a serial bridge listening at `addr`
    pub fn connect<A: ToSocketAddrs>(addr: A) -> io::Result<TcpTransport> {
        let stream = TcpStream::connect(addr)?;
        stream.set_nodelay(true)?;
        Ok(TcpTransport::new(stream))
    }

    /// Create a new `TcpTransport`, backed by `stream`
    pub fn new(stream: TcpStream) -> TcpTransport {
        TcpTransport {
            stream,
            // Modem replies are short; HTTP bodies grow the buffer as needed.
            buffer: BytesMut::with_capacity(1024),
        }
    }

    /// Take one complete line out of the buffer, if one has been received
    fn parse_line(&mut self) -> Option<Bytes> {
        let end = self.buffer.iter().position(|&b| b == b'\n')?;
        Some(self.buffer.split_to(end + 1).freeze())
    }

    /// Perform a single read from the socket, waiting at most `timeout`.
    ///
    /// Returns the number of bytes appended to the buffer; `0` means the
    /// timeout elapsed.
    fn fill_buffer(&mut self, timeout: Duration) -> io::Result<usize> {
        if timeout.is_zero() {
            return self.fill_buffer_nonblocking();
        }
        self.stream.set_read_timeout(Some(timeout))?;

        let mut chunk = [0u8; 512];
        match self.stream.read(&mut chunk) {
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection reset by peer",
            )),
            Ok(n) => {
                self.buffer.extend_from_slice(&chunk[..n]);
                Ok(n)
            }
            Err(e) if is_timeout(&e) => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn fill_buffer_nonblocking(&mut self) -> io::Result<usize> {
        self.stream.set_nonblocking(true)?;

        let mut total = 0;
        let mut chunk = [0u8; 512];
        let result = loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    break Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "connection reset by peer",
                    ));
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    total += n;
                }
                Err(e) if is_timeout(&e) => break Ok(total),
                Err(e) => break Err(e),
            }
        };

        self.stream.set_nonblocking(false)?;
        result
    }
}

impl Transport for TcpTransport {
    fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data)?;
        self.stream.flush()
    }

    fn read_line(&mut self, timeout: Duration) -> io::Result<Bytes> {
        let deadline = Instant::now() + timeout;

        loop {
            if let Some(line) = self.parse_line() {
                return Ok(line);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() || self.fill_buffer(remaining)? == 0 {
                // Timed out: hand back whatever partial line we have
                let len = self.buffer.len();
                return Ok(self.buffer.split_to(len).freeze());
            }
        }
    }

    fn bytes_available(&mut self) -> io::Result<usize> {
        self.fill_buffer_nonblocking()?;
        Ok(self.buffer.len())
    }

    fn read(&mut self, buf: &mut [u8], timeout: Duration) -> io::Result<usize> {
        if self.buffer.is_empty() && self.fill_buffer(timeout)? == 0 {
            return Ok(0);
        }
        let n = buf.len().min(self.buffer.len());
        buf[..n].copy_from_slice(&self.buffer[..n]);
        self.buffer.advance(n);
        Ok(n)
    }

    fn discard_input(&mut self) -> io::Result<()> {
        self.fill_buffer_nonblocking()?;
        self.buffer.clear();
        Ok(())
    }
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut
    )
}
