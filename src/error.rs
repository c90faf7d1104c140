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

use std::io;
use thiserror::Error;

/// Everything that can end a session early.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid TCP port: {0}")]
    InvalidPort(String),

    #[error("invalid IP address: {0}")]
    InvalidAddress(String),

    #[error("{0}")]
    Usage(&'static str),

    /// Socket setup failed before any byte was relayed. The OS error is the source.
    #[error("{op}")]
    Setup {
        op: &'static str,
        source: io::Error,
    },

    /// A read, write or wait failed while relaying.
    #[error("{op}")]
    Io {
        op: &'static str,
        source: io::Error,
    },

    /// The stream accepted fewer bytes than were read from stdin. Never resumed.
    #[error("short write: expected {expected}, wrote {written}")]
    ShortWrite { expected: usize, written: usize },
}

impl Error {
    pub fn setup(op: &'static str) -> impl FnOnce(io::Error) -> Error {
        move |source| Error::Setup { op, source }
    }

    pub fn io(op: &'static str) -> impl FnOnce(io::Error) -> Error {
        move |source| Error::Io { op, source }
    }

    /// Argument problems are reported with the usage synopsis rather than as runtime failures.
    pub fn is_usage(&self) -> bool {
        matches!(self, Error::InvalidPort(_) | Error::InvalidAddress(_) | Error::Usage(_))
    }
}
