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

//! The relay loop: waits for stdin or the stream to become readable and moves one chunk at a
//! time until both have reached end-of-stream, then parks until a termination signal.
//!
//! Bytes read from the stream are logged and dropped, never copied to stdout. Only the
//! stdin -> stream direction forwards data.

use crate::error::Error;
use crate::event;
use crate::eventlog::EventLog;
use nix::poll::PollFlags;
use nix::sys::signal::Signal;
use std::io::{self, Read, Write};

/// Largest read issued on either source per readiness event.
pub const CHUNK_SIZE: usize = 128;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    StdinToStream = 0,
    StreamToStdout = 1,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionState {
    Open,
    HalfClosed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Relaying,
    /// Both directions have half-closed; nothing is polled any more.
    Closed,
    /// Parked until a signal.
    Terminal,
}

/// One watched source: whether we still care about it and what the last wait reported.
#[derive(Clone, Copy, Debug)]
pub struct Watch {
    pub interested: bool,
    pub revents: PollFlags,
}

impl Default for Watch {
    fn default() -> Self {
        Watch { interested: true, revents: PollFlags::empty() }
    }
}

impl Watch {
    fn ready(&self) -> bool {
        self.revents
            .intersects(PollFlags::POLLIN | PollFlags::POLLHUP | PollFlags::POLLERR)
    }
}

/// Blocks until at least one interested watch is readable or hung up.
pub trait Multiplexer {
    /// `watches` is indexed by [Direction]. Implementations overwrite every `revents`.
    fn wait(&mut self, watches: &mut [Watch]) -> io::Result<()>;
}

/// The final indefinite wait once nothing is left to relay.
pub trait TerminalWait {
    /// Called before the pause is announced, so a signal sent right after is not lost.
    fn arm(&mut self) -> io::Result<()>;
    fn wait(&mut self) -> io::Result<Signal>;
}

pub struct Session<'a, I, S, W: Write> {
    stdin: &'a mut I,
    stream: &'a mut S,
    log: &'a mut EventLog<W>,
    states: [DirectionState; 2],
    phase: Phase,
}

impl<'a, I: Read, S: Read + Write, W: Write> Session<'a, I, S, W> {
    pub fn new(stdin: &'a mut I, stream: &'a mut S, log: &'a mut EventLog<W>) -> Self {
        Session {
            stdin,
            stream,
            log,
            states: [DirectionState::Open; 2],
            phase: Phase::Relaying,
        }
    }

    pub fn state(&self, direction: Direction) -> DirectionState {
        self.states[direction as usize]
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    fn is_open(&self, direction: Direction) -> bool {
        self.state(direction) == DirectionState::Open
    }

    fn half_close(&mut self, direction: Direction) {
        self.states[direction as usize] = DirectionState::HalfClosed;
        if self.states.iter().all(|s| *s == DirectionState::HalfClosed) {
            self.phase = Phase::Closed;
        }
    }

    /// Relays until both directions have half-closed. Any failure ends the session at once.
    pub fn run<M: Multiplexer>(&mut self, mux: &mut M) -> Result<(), Error> {
        let mut watches = [Watch::default(); 2];
        let mut buf = [0u8; CHUNK_SIZE];

        loop {
            event!(self.log, "entering poll()");
            if self.phase != Phase::Relaying {
                break;
            }

            for (watch, state) in watches.iter_mut().zip(self.states) {
                watch.interested = state == DirectionState::Open;
            }
            mux.wait(&mut watches).map_err(Error::io("poll"))?;
            event!(
                self.log,
                "poll returned events {:#x}/{:#x}",
                watches[0].revents.bits(),
                watches[1].revents.bits()
            );

            if watches[Direction::StdinToStream as usize].ready() && self.is_open(Direction::StdinToStream) {
                self.forward_stdin(&mut buf)?;
            }
            if watches[Direction::StreamToStdout as usize].ready() && self.is_open(Direction::StreamToStdout) {
                self.drain_stream(&mut buf)?;
            }
        }

        event!(self.log, "read end-of-stream from both socket and stdin");
        Ok(())
    }

    fn forward_stdin(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        event!(self.log, "reading from stdin");
        let nread = self.stdin.read(buf).map_err(Error::io("read"))?;
        if nread == 0 {
            event!(self.log, "read end-of-stream from stdin");
            self.half_close(Direction::StdinToStream);
            return Ok(());
        }

        event!(self.log, "writing {} bytes read from stdin to socket", nread);
        let written = self.stream.write(&buf[..nread]).map_err(Error::io("write"))?;
        if written != nread {
            return Err(Error::ShortWrite { expected: nread, written });
        }
        Ok(())
    }

    fn drain_stream(&mut self, buf: &mut [u8]) -> Result<(), Error> {
        event!(self.log, "reading from socket");
        let nread = self.stream.read(buf).map_err(Error::io("read"))?;
        if nread == 0 {
            event!(self.log, "read end-of-stream from socket");
            self.half_close(Direction::StreamToStdout);
        }
        event!(self.log, "read {} bytes from socket", nread);
        log::debug!("discarded {nread} bytes from socket");
        Ok(())
    }

    /// Parks until a termination signal arrives. Only reachable once both directions are closed.
    pub fn pause<T: TerminalWait>(&mut self, terminal: &mut T) -> Result<(), Error> {
        debug_assert_eq!(self.phase, Phase::Closed);
        terminal.arm().map_err(Error::io("sigprocmask"))?;
        self.phase = Phase::Terminal;
        event!(self.log, "pausing until signal");
        let signal = terminal.wait().map_err(Error::io("sigwait"))?;
        event!(self.log, "received {}", signal);
        Ok(())
    }
}

/// Relays between `stream` and `stdin` until both close, then waits for a termination signal.
/// The caller keeps ownership of `stream` and closes it after this returns.
pub fn relay<S, I, M, T, W>(
    stream: &mut S,
    stdin: &mut I,
    mux: &mut M,
    terminal: &mut T,
    log: &mut EventLog<W>,
) -> Result<(), Error>
where
    S: Read + Write,
    I: Read,
    M: Multiplexer,
    T: TerminalWait,
    W: Write,
{
    let mut session = Session::new(stdin, stream, log);
    session.run(mux)?;
    session.pause(terminal)
}
