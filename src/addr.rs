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
use std::net::Ipv4Addr;

/// Parses a decimal TCP port. Trailing characters and values above 65535 are rejected.
pub fn parse_port(text: &str) -> Result<u16, Error> {
    text.parse::<u16>().map_err(|_| Error::InvalidPort(text.to_string()))
}

/// Parses a dotted-decimal IPv4 literal. Hostnames are never resolved.
pub fn parse_ipv4(text: &str) -> Result<Ipv4Addr, Error> {
    text.parse::<Ipv4Addr>().map_err(|_| Error::InvalidAddress(text.to_string()))
}
