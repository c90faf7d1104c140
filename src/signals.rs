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

use crate::relay::TerminalWait;
use nix::sys::signal::{SigSet, Signal};
use std::io;

const TERMINATION_SIGNALS: [Signal; 3] = [Signal::SIGINT, Signal::SIGTERM, Signal::SIGHUP];

/// Waits for SIGINT, SIGTERM or SIGHUP with sigwait(2), so the process can exit cleanly
/// instead of dying from the default disposition.
pub struct SignalWait {
    set: SigSet,
}

impl SignalWait {
    pub fn new() -> Self {
        let mut set = SigSet::empty();
        for signal in TERMINATION_SIGNALS {
            set.add(signal);
        }
        SignalWait { set }
    }
}

impl TerminalWait for SignalWait {
    fn arm(&mut self) -> io::Result<()> {
        Ok(self.set.thread_block()?)
    }

    fn wait(&mut self) -> io::Result<Signal> {
        Ok(self.set.wait()?)
    }
}
