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

use flexi_logger::{DeferredNow, FlexiLoggerError, Logger, LoggerHandle};
use log::{Level, Record};
use std::io::{self, Write};

/// Starts the trace logger on stderr. Level comes from `RUST_LOG`, default `warn`.
/// Fatal errors bypass it and are always printed by `main`.
/// Keep the returned handle alive for the lifetime of the process.
pub fn initialize() -> Result<LoggerHandle, FlexiLoggerError> {
    Logger::try_with_env_or_str("warn")?
        .format(diagnostic_format)
        .start()
}

fn diagnostic_format(w: &mut dyn Write, _now: &mut DeferredNow, record: &Record) -> io::Result<()> {
    match record.level() {
        Level::Error | Level::Warn => write!(w, "{}: {}", env!("CARGO_PKG_NAME"), record.args()),
        level => write!(w, "{}: [{}] {}", env!("CARGO_PKG_NAME"), level, record.args()),
    }
}

#[cfg(test)]
mod tests {
    use super::diagnostic_format;
    use anyhow::Result;
    use flexi_logger::DeferredNow;
    use log::{Level, Record};

    #[test]
    fn test_errors_are_plain() -> Result<()> {
        let mut out = Vec::new();
        diagnostic_format(
            &mut out,
            &mut DeferredNow::new(),
            &Record::builder()
                .args(format_args!("connect: Connection refused"))
                .level(Level::Error)
                .build(),
        )?;
        assert_eq!(String::from_utf8(out)?, "wirecat: connect: Connection refused");
        Ok(())
    }

    #[test]
    fn test_traces_carry_level() -> Result<()> {
        let mut out = Vec::new();
        diagnostic_format(
            &mut out,
            &mut DeferredNow::new(),
            &Record::builder()
                .args(format_args!("discarded 3 bytes"))
                .level(Level::Debug)
                .build(),
        )?;
        assert_eq!(String::from_utf8(out)?, "wirecat: [DEBUG] discarded 3 bytes");
        Ok(())
    }
}
