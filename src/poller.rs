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

use crate::relay::{Multiplexer, Watch};
use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use std::fs::File;
use std::io;
use std::os::fd::{AsFd, BorrowedFd, OwnedFd};

/// poll(2) over a fixed list of descriptors, one per [Watch] slot.
///
/// Descriptors are duplicated on construction so the poller never borrows the handles the
/// relay reads from.
pub struct FdPoller {
    sources: Vec<OwnedFd>,
}

impl FdPoller {
    pub fn new(sources: &[BorrowedFd<'_>]) -> io::Result<Self> {
        let sources = sources
            .iter()
            .map(|fd| fd.try_clone_to_owned())
            .collect::<io::Result<Vec<_>>>()?;
        Ok(FdPoller { sources })
    }
}

impl Multiplexer for FdPoller {
    fn wait(&mut self, watches: &mut [Watch]) -> io::Result<()> {
        // Sources we no longer care about are left out entirely: poll(2) reports POLLHUP even
        // with an empty event mask, which would spin the loop.
        let mut slots = Vec::with_capacity(watches.len());
        let mut fds = Vec::with_capacity(watches.len());
        for (slot, (source, watch)) in self.sources.iter().zip(watches.iter()).enumerate() {
            if watch.interested {
                slots.push(slot);
                fds.push(PollFd::new(source.as_fd(), PollFlags::POLLIN));
            }
        }

        poll(&mut fds, PollTimeout::NONE)?;

        for watch in watches.iter_mut() {
            watch.revents = PollFlags::empty();
        }
        for (slot, fd) in slots.into_iter().zip(&fds) {
            watches[slot].revents = fd.revents().unwrap_or(PollFlags::empty());
        }
        Ok(())
    }
}

/// Unbuffered handle on the process's standard input. `io::Stdin` buffers internally, which
/// would hide pending bytes from poll(2).
pub fn raw_stdin() -> io::Result<File> {
    Ok(File::from(io::stdin().as_fd().try_clone_to_owned()?))
}
