//! Direct JSON encoding of [`Field`] lists.
//!
//! The encoder writes one JSON object straight into an [`io::Write`] sink
//! through a small fixed staging buffer. Nothing is collected into an
//! intermediate map and no value is boxed, so encoding a list of strings,
//! numbers, booleans, timestamps and durations does not allocate. Only
//! [`Value::Opaque`] goes through serde.
//!
//! ```rust
//! use bolt::encoder::encode;
//! use bolt::field::Field;
//!
//! let mut out = Vec::new();
//! encode(&mut out, &[
//!     Field::string("name", "Ann"),
//!     Field::int("age", 3),
//!     Field::bool("ok", true),
//! ])?;
//! assert_eq!(out, br#"{"name":"Ann","age":3,"ok":true}"#);
//! # Ok::<(), std::io::Error>(())
//! ```

use std::io::{self, Write};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::field::{Field, Value};

/// The default size of the staging buffer.
pub const STAGING_CAPACITY: usize = 512;

const HEX: &[u8; 16] = b"0123456789abcdef";

/// How [`Value::Timestamp`] fields are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampFormat {
    /// `2024-05-01T12:30:00Z`
    #[default]
    Rfc3339,
    /// `2024-05-01T12:30:00.250Z`
    Rfc3339Millis,
    /// `Wed, 01 May 2024 12:30:00 +0000`
    Rfc2822,
}

impl TimestampFormat {
    fn pattern(self) -> &'static str {
        match self {
            TimestampFormat::Rfc3339 => "%Y-%m-%dT%H:%M:%SZ",
            TimestampFormat::Rfc3339Millis => "%Y-%m-%dT%H:%M:%S%.3fZ",
            TimestampFormat::Rfc2822 => "%a, %d %b %Y %H:%M:%S +0000",
        }
    }
}

/// Encodes `fields` as one JSON object into `sink`, with RFC 3339 timestamps.
pub fn encode<W: Write>(sink: W, fields: &[Field<'_>]) -> io::Result<()> {
    DirectEncoder::<W>::new(sink).encode(fields)
}

/// Writes field lists to a sink through an `N` byte staging buffer.
///
/// Output is byte-for-byte the same whatever `N` is; a larger buffer only
/// means fewer writes to the sink.
pub struct DirectEncoder<W, const N: usize = STAGING_CAPACITY> {
    sink: W,
    buf: [u8; N],
    len: usize,
    timestamps: TimestampFormat,
}

impl<W: Write, const N: usize> DirectEncoder<W, N> {
    pub fn new(sink: W) -> Self {
        Self {
            sink,
            buf: [0; N],
            len: 0,
            timestamps: TimestampFormat::default(),
        }
    }

    /// Sets how timestamp fields are rendered.
    pub fn timestamps(mut self, format: TimestampFormat) -> Self {
        self.timestamps = format;
        self
    }

    /// Writes `fields` as a JSON object and flushes the staging buffer.
    ///
    /// Properties appear in input order. Duplicate keys are written as given.
    /// If the sink fails, the error is returned and whatever was already
    /// written stays written.
    pub fn encode(&mut self, fields: &[Field<'_>]) -> io::Result<()> {
        self.put(b"{")?;
        for (i, field) in fields.iter().enumerate() {
            if i > 0 {
                self.put(b",")?;
            }
            self.put_str(&field.key)?;
            self.put(b":")?;
            self.put_value(&field.value)?;
        }
        self.put(b"}")?;
        self.drain()
    }

    /// Returns the sink. Bytes still staged are dropped, so call
    /// [`encode`](Self::encode) or [`flush`](Write::flush) first.
    pub fn into_inner(self) -> W {
        self.sink
    }

    fn put_value(&mut self, value: &Value<'_>) -> io::Result<()> {
        match value {
            Value::String(s) => self.put_str(s),
            Value::Bytes(b) => self.put_str(&String::from_utf8_lossy(b)),
            Value::Int(n) | Value::Int64(n) => write!(self, "{}", n),
            Value::Float64(n) => serde_json::to_writer(&mut *self, n).map_err(io::Error::from),
            Value::Bool(true) => self.put(b"true"),
            Value::Bool(false) => self.put(b"false"),
            Value::Timestamp(t) => self.put_time(t),
            Value::Duration(d) => self.put_duration(*d),
            Value::Opaque(v) => v.write_json(self),
        }
    }

    fn put_str(&mut self, s: &str) -> io::Result<()> {
        self.put(b"\"")?;

        let bytes = s.as_bytes();
        let mut start = 0;
        for (i, &b) in bytes.iter().enumerate() {
            let short = match b {
                b'"' => b'"',
                b'\\' => b'\\',
                0x08 => b'b',
                0x0c => b'f',
                b'\n' => b'n',
                b'\r' => b'r',
                b'\t' => b't',
                0x00..=0x1f => 0,
                _ => continue,
            };

            self.put(&bytes[start..i])?;
            start = i + 1;

            if short != 0 {
                self.put(&[b'\\', short])?;
            } else {
                self.put(&[
                    b'\\',
                    b'u',
                    b'0',
                    b'0',
                    HEX[(b >> 4) as usize],
                    HEX[(b & 0xf) as usize],
                ])?;
            }
        }

        self.put(&bytes[start..])?;
        self.put(b"\"")
    }

    fn put_time(&mut self, t: &DateTime<Utc>) -> io::Result<()> {
        let pattern = self.timestamps.pattern();
        write!(self, "\"{}\"", t.format(pattern))
    }

    // 1h2m3.5s, 2m0s, 1.5ms, 250ns, 0s
    fn put_duration(&mut self, d: Duration) -> io::Result<()> {
        let nanos = d.as_nanos();
        self.put(b"\"")?;

        if nanos == 0 {
            self.put(b"0s")?;
        } else if nanos < 1_000 {
            write!(self, "{}ns", nanos)?;
        } else if nanos < 1_000_000 {
            self.put_fraction(nanos, 1_000)?;
            self.put("µs".as_bytes())?;
        } else if nanos < 1_000_000_000 {
            self.put_fraction(nanos, 1_000_000)?;
            self.put(b"ms")?;
        } else {
            let secs = d.as_secs();
            if secs >= 3600 {
                write!(self, "{}h", secs / 3600)?;
            }
            if secs >= 60 {
                write!(self, "{}m", secs / 60 % 60)?;
            }
            let rem = u128::from(secs % 60) * 1_000_000_000 + u128::from(d.subsec_nanos());
            self.put_fraction(rem, 1_000_000_000)?;
            self.put(b"s")?;
        }

        self.put(b"\"")
    }

    // `value / unit` with the remainder as a decimal fraction, trailing zeros trimmed.
    fn put_fraction(&mut self, value: u128, unit: u128) -> io::Result<()> {
        write!(self, "{}", value / unit)?;

        let mut frac = value % unit;
        if frac == 0 {
            return Ok(());
        }

        let mut width = 0;
        let mut u = unit;
        while u > 1 {
            u /= 10;
            width += 1;
        }
        while frac % 10 == 0 {
            frac /= 10;
            width -= 1;
        }

        write!(self, ".{:0width$}", frac, width = width)
    }

    fn put(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.len + bytes.len() > N {
            self.drain()?;
        }

        if bytes.len() >= N {
            return self.sink.write_all(bytes);
        }

        self.buf[self.len..self.len + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        Ok(())
    }

    fn drain(&mut self) -> io::Result<()> {
        if self.len > 0 {
            let len = self.len;
            self.len = 0;
            self.sink.write_all(&self.buf[..len])?;
        }
        Ok(())
    }
}

impl<W: Write, const N: usize> Write for DirectEncoder<W, N> {
    fn write(&mut self, bytes: &[u8]) -> io::Result<usize> {
        self.put(bytes)?;
        Ok(bytes.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.drain()?;
        self.sink.flush()
    }
}
