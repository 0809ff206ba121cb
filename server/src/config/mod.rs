/*
 * Created on Mon Jul 18 2022
 *
 * This file is a part of Arbordb
 * Arbordb is a free and open-source concurrent in-memory tree database
 * written by Sayan Nandan ("the Author") with the vision to provide
 * a simple, safe and concurrent alternative for ordered key/value storage.
 *
 * Copyright (c) 2022, Sayan Nandan <ohsayan@outlook.com>
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program. If not, see <https://www.gnu.org/licenses/>.
 *
*/

//! Server configuration
//!
//! The server takes exactly one positional argument: the port to listen on.
//! Everything else (the bind host, the log filter) has a fixed default.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr};

/// The default host: this is a local-first database
pub const DEFAULT_HOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);

/// The runtime configuration for the server
#[derive(Debug, PartialEq)]
pub struct ServerConfig {
    /// The host to bind to
    pub host: IpAddr,
    /// The port to bind to
    pub port: u16,
}

/// Errors that can occur while parsing the command line
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// No port was supplied
    MissingPort,
    /// The supplied port failed to parse as a 16-bit unsigned integer
    InvalidPort(String),
    /// More arguments were supplied than we know what to do with
    TooManyArgs,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingPort => write!(f, "incorrect arguments: please supply a port number"),
            Self::InvalidPort(bad) => write!(f, "'{}' is not a valid port number", bad),
            Self::TooManyArgs => write!(f, "expected a single argument: the port number"),
        }
    }
}

/// Parse the command line arguments (with the binary name already skipped)
/// into a [`ServerConfig`]
pub fn parse_cli(mut args: impl Iterator<Item = String>) -> Result<ServerConfig, ConfigError> {
    let port = match args.next() {
        Some(port) => port,
        None => return Err(ConfigError::MissingPort),
    };
    if args.next().is_some() {
        return Err(ConfigError::TooManyArgs);
    }
    let port: u16 = port
        .parse()
        .map_err(|_| ConfigError::InvalidPort(port.clone()))?;
    Ok(ServerConfig {
        host: DEFAULT_HOST,
        port,
    })
}
