/*
Copyright (C) 2024 David Hamelin
This program is free software: you can redistribute it and/or modify it under the terms of the 
GNU General Public License as published by the Free Software Foundation, version 3.
This program is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; 
without even the implied warranty of MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. 
See the GNU General Public License for more details. 
You should have received a copy of the GNU General Public License along with this program. 
If not, see <https://www.gnu.org/licenses/>. 
*/

use chrono::{DateTime, Utc};
use std::fmt;
use std::io::{self, Stdout, Write};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Timestamped event lines, one per notable step: `<timestamp>: <message>`.
pub struct EventLog<W: Write> {
    sink: W,
    clock: fn() -> DateTime<Utc>,
}

impl EventLog<Stdout> {
    pub fn stdout() -> Self {
        EventLog::new(io::stdout())
    }
}

impl<W: Write> EventLog<W> {
    pub fn new(sink: W) -> Self {
        EventLog::with_clock(sink, Utc::now)
    }

    pub fn with_clock(sink: W, clock: fn() -> DateTime<Utc>) -> Self {
        EventLog { sink, clock }
    }

    pub fn record(&mut self, message: fmt::Arguments<'_>) {
        let now = (self.clock)().format(TIMESTAMP_FORMAT);
        // A broken sink must not take the relay down with it.
        if let Err(err) = writeln!(self.sink, "{now}: {message}").and_then(|_| self.sink.flush()) {
            log::debug!("event log write failed: {err}");
        }
    }

    #[cfg(test)]
    pub fn sink(&self) -> &W {
        &self.sink
    }
}

/// `event!(log, "read {} bytes", n)`
#[macro_export]
macro_rules! event {
    ($log:expr, $($arg:tt)*) => {
        $log.record(format_args!($($arg)*))
    };
}

#[cfg(test)]
pub(crate) mod tests {
    use super::EventLog;
    use anyhow::Result;
    use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
    use std::io::{self, Write};

    pub(crate) fn fixed_clock() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2016, 3, 7, 18, 4, 9).unwrap()
    }

    /// Lines written so far, with the timestamp prefix stripped.
    pub(crate) fn messages(log: &EventLog<Vec<u8>>) -> Vec<String> {
        String::from_utf8_lossy(log.sink())
            .lines()
            .map(|line| line.split_once(": ").map(|(_, msg)| msg).unwrap_or(line).to_string())
            .collect()
    }

    #[test]
    fn test_line_format() -> Result<()> {
        let mut log = EventLog::with_clock(Vec::new(), fixed_clock);
        crate::event!(log, "listening");
        crate::event!(log, "read {} bytes from socket", 12);
        assert_eq!(
            String::from_utf8(log.sink().clone())?,
            "2016-03-07T18:04:09Z: listening\n2016-03-07T18:04:09Z: read 12 bytes from socket\n"
        );
        Ok(())
    }

    #[test]
    fn test_wall_clock_timestamp_shape() -> Result<()> {
        let mut log = EventLog::new(Vec::new());
        crate::event!(log, "connected");
        let text = String::from_utf8(log.sink().clone())?;
        let (stamp, msg) = text.split_once(": ").ok_or_else(|| anyhow::anyhow!("no separator"))?;
        assert_eq!(stamp.len(), "2014-01-01T01:00:00Z".len());
        NaiveDateTime::parse_from_str(stamp, "%Y-%m-%dT%H:%M:%SZ")?;
        assert_eq!(msg, "connected\n");
        Ok(())
    }

    struct BrokenSink;

    impl Write for BrokenSink {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_broken_sink_is_ignored() -> Result<()> {
        let mut log = EventLog::with_clock(BrokenSink, fixed_clock);
        crate::event!(log, "entering poll");
        Ok(())
    }
}
