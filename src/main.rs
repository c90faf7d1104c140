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

mod addr;
mod config;
mod error;
mod establish;
mod eventlog;
mod logging;
mod poller;
mod relay;
mod signals;

use anyhow::{Context, Result};
use config::{Config, Mode};
use error::Error;
use eventlog::EventLog;
use poller::FdPoller;
use signals::SignalWait;
use std::os::fd::AsFd;
use std::process::ExitCode;

fn main() -> ExitCode {
    let config = Config::from_args(); // Exits with the usage synopsis on bad arguments
    let _logger = match logging::initialize() {
        Ok(handle) => handle,
        Err(err) => {
            eprintln!("{}: logger: {err}", env!("CARGO_PKG_NAME"));
            return ExitCode::FAILURE;
        }
    };

    match run(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Printed regardless of RUST_LOG: the logger only carries traces.
            eprintln!("{}: {err:#}", env!("CARGO_PKG_NAME"));
            exit_code(&err)
        }
    }
}

fn run(config: Config) -> Result<()> {
    let mut log = EventLog::stdout();
    let mut conn = match config.mode {
        Mode::Listen { port } => establish::listen(port, &mut log)?,
        Mode::Connect(addr) => establish::connect(addr, &mut log)?,
    };

    let mut stdin = poller::raw_stdin().context("stdin")?;
    let mut mux = FdPoller::new(&[stdin.as_fd(), conn.stream.as_fd()]).context("poll")?;
    relay::relay(&mut conn.stream, &mut stdin, &mut mux, &mut SignalWait::new(), &mut log)?;
    Ok(())
}

fn exit_code(err: &anyhow::Error) -> ExitCode {
    match err.downcast_ref::<Error>() {
        Some(err) if err.is_usage() => ExitCode::from(2),
        _ => ExitCode::FAILURE,
    }
}
