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

use crate::addr::{parse_ipv4, parse_port};
use crate::error::Error;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::net::SocketAddrV4;

const USAGE: &str = "wirecat [-n] -l -p LISTEN_PORT\n       wirecat [-n] HOST PORT";

/// Relay stdin to a single TCP connection, logging every step.
#[derive(Parser, Debug)]
#[command(name = "wirecat", version, override_usage = USAGE)]
pub struct Cli {
    /// Do not resolve hostnames (they are never resolved; silences the note on a bad HOST)
    #[arg(short = 'n')]
    pub numeric: bool,

    /// Accept one inbound connection instead of connecting out
    #[arg(short = 'l', requires = "listen_port", conflicts_with_all = ["host", "port"])]
    pub listen: bool,

    /// Local TCP port for -l
    #[arg(short = 'p', value_name = "LISTEN_PORT", value_parser = parse_port)]
    pub listen_port: Option<u16>,

    /// Dotted-decimal IPv4 address to connect to
    #[arg(value_name = "HOST", required_unless_present = "listen")]
    pub host: Option<String>,

    /// TCP port to connect to
    #[arg(value_name = "PORT", value_parser = parse_port, required_unless_present = "listen")]
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Listen { port: u16 },
    Connect(SocketAddrV4),
}

/// Everything the establisher and relay need, built once from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub mode: Mode,
}

impl Cli {
    pub fn into_config(self) -> Result<Config, Error> {
        // clap enforces the argument combinations; the last arm covers a Cli built by hand.
        let mode = match self {
            Cli { listen: true, listen_port: Some(port), .. } => Mode::Listen { port },
            // -p is accepted in connect mode, but the positional PORT wins.
            Cli { listen: false, host: Some(host), port: Some(port), .. } => {
                Mode::Connect(SocketAddrV4::new(parse_ipv4(&host)?, port))
            }
            _ => return Err(Error::Usage("-l requires -p, otherwise HOST and PORT are required")),
        };
        Ok(Config { mode })
    }
}

impl Config {
    pub fn try_parse_from<I, T>(args: I) -> Result<Config, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let cli = Cli::try_parse_from(args)?;
        let numeric = cli.numeric;
        cli.into_config().map_err(|err| {
            let message = match err {
                Error::InvalidAddress(_) if !numeric => format!("{err}\nnote: hostnames not supported"),
                err => err.to_string(),
            };
            Cli::command().error(ErrorKind::ValueValidation, message)
        })
    }

    /// Parses the process arguments, printing usage and exiting with status 2 on failure.
    pub fn from_args() -> Config {
        Config::try_parse_from(std::env::args_os()).unwrap_or_else(|err| err.exit())
    }
}

#[cfg(test)]
mod tests {
    use super::{Cli, Config, Mode};
    use crate::error::Error;
    use anyhow::{anyhow, Result};
    use clap::error::ErrorKind;
    use std::net::{Ipv4Addr, SocketAddrV4};

    fn rejected(args: &[&str]) -> Result<clap::Error> {
        let argv = std::iter::once("wirecat").chain(args.iter().copied());
        match Config::try_parse_from(argv) {
            Ok(config) => Err(anyhow!("{args:?} parsed as {config:?}")),
            Err(err) => Ok(err),
        }
    }

    #[test]
    fn test_listen_mode() -> Result<()> {
        let config = Config::try_parse_from(["wirecat", "-l", "-p", "8080"])?;
        assert_eq!(config.mode, Mode::Listen { port: 8080 });

        let config = Config::try_parse_from(["wirecat", "-n", "-p", "0", "-l"])?;
        assert_eq!(config.mode, Mode::Listen { port: 0 });
        Ok(())
    }

    #[test]
    fn test_connect_mode() -> Result<()> {
        let config = Config::try_parse_from(["wirecat", "10.1.2.3", "443"])?;
        assert_eq!(config.mode, Mode::Connect(SocketAddrV4::new(Ipv4Addr::new(10, 1, 2, 3), 443)));

        // -p is ignored outside of listen mode.
        let config = Config::try_parse_from(["wirecat", "-p", "1", "-n", "127.0.0.1", "2"])?;
        assert_eq!(config.mode, Mode::Connect(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 2)));
        Ok(())
    }

    #[test]
    fn test_usage_errors_exit_2() -> Result<()> {
        let cases: &[&[&str]] = &[
            &[],
            &["-l"],
            &["-l", "-p"],
            &["-l", "-p", "80", "127.0.0.1"],
            &["127.0.0.1"],
            &["127.0.0.1", "80", "extra"],
            &["127.0.0.1", "80x"],
            &["127.0.0.1", "65536"],
            &["-l", "-p", "http"],
            &["-x", "127.0.0.1", "80"],
            &["localhost", "80"],
        ];
        for args in cases {
            let err = rejected(args)?;
            assert_eq!(err.exit_code(), 2, "{args:?}");
        }
        Ok(())
    }

    #[test]
    fn test_hostname_note() -> Result<()> {
        let err = rejected(&["localhost", "80"])?;
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        let text = err.to_string();
        assert!(text.contains("invalid IP address: localhost"));
        assert!(text.contains("note: hostnames not supported"));
        assert!(text.contains("wirecat [-n] HOST PORT"));

        let err = rejected(&["-n", "localhost", "80"])?;
        assert!(err.to_string().contains("invalid IP address: localhost"));
        assert!(!err.to_string().contains("hostnames not supported"));
        Ok(())
    }

    #[test]
    fn test_incomplete_cli_is_usage_error() -> Result<()> {
        let incomplete = [
            Cli { numeric: false, listen: true, listen_port: None, host: None, port: None },
            Cli { numeric: false, listen: false, listen_port: Some(80), host: None, port: None },
            Cli { numeric: true, listen: false, listen_port: None, host: Some("127.0.0.1".into()), port: None },
        ];
        for cli in incomplete {
            let err = cli.into_config().err().ok_or_else(|| anyhow!("incomplete arguments accepted"))?;
            assert!(matches!(err, Error::Usage(_)));
            assert!(err.is_usage());
        }
        Ok(())
    }

    #[test]
    fn test_invalid_port_message() -> Result<()> {
        let err = rejected(&["127.0.0.1", "80x"])?;
        assert!(err.to_string().contains("invalid TCP port: 80x"));
        Ok(())
    }
}
