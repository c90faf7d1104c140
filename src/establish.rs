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

use crate::error::Error;
use crate::event;
use crate::eventlog::EventLog;
use socket2::{Domain, SockAddr, Socket, Type};
use std::io::Write;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, TcpStream};

const LISTEN_BACKLOG: i32 = 256;

/// An established connection. In listen mode the listening socket is kept open alongside it
/// and both are closed together when this is dropped.
pub struct Connection {
    pub stream: TcpStream,
    _listener: Option<Socket>,
}

/// A bound and listening socket waiting for its single client.
pub struct Listener {
    socket: Socket,
}

impl Listener {
    /// Binds `0.0.0.0:port` and starts listening.
    pub fn bind<W: Write>(port: u16, log: &mut EventLog<W>) -> Result<Listener, Error> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, None).map_err(Error::setup("socket"))?;
        let addr = SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port);
        socket.bind(&addr.into()).map_err(Error::setup("bind"))?;
        socket.listen(LISTEN_BACKLOG).map_err(Error::setup("listen"))?;

        let listener = Listener { socket };
        match listener.local_addr() {
            Some(local) => event!(log, "listening on {}", local),
            None => event!(log, "listening"),
        }
        Ok(listener)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok().and_then(|addr| addr.as_socket())
    }

    /// Blocks until exactly one client connects.
    pub fn accept<W: Write>(self, log: &mut EventLog<W>) -> Result<Connection, Error> {
        let (client, peer) = self.socket.accept().map_err(Error::setup("accept"))?;
        event!(log, "accepted connection from {}", describe(&peer));
        Ok(Connection {
            stream: client.into(),
            _listener: Some(self.socket),
        })
    }
}

pub fn listen<W: Write>(port: u16, log: &mut EventLog<W>) -> Result<Connection, Error> {
    Listener::bind(port, log)?.accept(log)
}

pub fn connect<W: Write>(addr: SocketAddrV4, log: &mut EventLog<W>) -> Result<Connection, Error> {
    let socket = Socket::new(Domain::IPV4, Type::STREAM, None).map_err(Error::setup("socket"))?;
    event!(log, "establishing connection");
    socket.connect(&addr.into()).map_err(Error::setup("connect"))?;
    event!(log, "connected");
    Ok(Connection {
        stream: socket.into(),
        _listener: None,
    })
}

fn describe(addr: &SockAddr) -> String {
    addr.as_socket()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|| "unknown peer".to_string())
}
