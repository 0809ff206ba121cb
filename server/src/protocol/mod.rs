/*
 * Created on Thu Aug 11 2022
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

//! # The wire protocol
//!
//! Commands are single lines of text. The first byte selects the operation
//! and the remainder of the line is split into whitespace-delimited tokens:
//!
//! | Selector | Arguments      | Operation                               |
//! |----------|----------------|-----------------------------------------|
//! | `q`      | `NAME`         | query a name                            |
//! | `a`      | `NAME` `VALUE` | add a name/value pair                   |
//! | `d`      | `NAME`         | delete a name                           |
//! | `f`      | `PATH`         | run commands from a server-local file   |
//!
//! Anything else is ill-formed. Tokens are capped at [`MAX_TOKEN_LEN`]
//! bytes; replies are single lines too.

pub mod responses;
#[cfg(test)]
mod tests;

use std::str;

/// The maximum length (in bytes) of a single command token
pub const MAX_TOKEN_LEN: usize = 255;

/// A parsed client command
#[derive(Debug, PartialEq)]
pub enum Query {
    /// `q NAME`
    Get(String),
    /// `a NAME VALUE`
    Add(String, String),
    /// `d NAME`
    Del(String),
    /// `f PATH`
    File(String),
}

/// Why a command line failed to parse. Every variant is reported to the
/// client as `ill-formed command`
#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// Missing selector/arguments, or an unknown selector
    Malformed,
    /// A token exceeded [`MAX_TOKEN_LEN`] bytes
    TokenTooLong,
    /// The line was not valid UTF-8
    BadEncoding,
}

/// The reply to a single command
#[derive(Debug, PartialEq)]
pub enum Response {
    /// One of the fixed response strings in [`responses`]
    Group(&'static str),
    /// A value copied out of the store
    Value(String),
}

impl Response {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Group(group) => group.as_bytes(),
            Self::Value(value) => value.as_bytes(),
        }
    }
}

/// Parse one command line (without its terminating newline)
pub fn parse(buf: &[u8]) -> Result<Query, ParseError> {
    let line = str::from_utf8(buf).map_err(|_| ParseError::BadEncoding)?;
    let mut chars = line.chars();
    let selector = match chars.next() {
        Some(selector) => selector,
        None => return Err(ParseError::Malformed),
    };
    let mut tokens = chars.as_str().split_whitespace();
    let query = match selector {
        'q' => Query::Get(take_token(&mut tokens)?),
        'a' => {
            let name = take_token(&mut tokens)?;
            let value = take_token(&mut tokens)?;
            Query::Add(name, value)
        }
        'd' => Query::Del(take_token(&mut tokens)?),
        'f' => Query::File(take_token(&mut tokens)?),
        _ => return Err(ParseError::Malformed),
    };
    Ok(query)
}

fn take_token<'a>(tokens: &mut impl Iterator<Item = &'a str>) -> Result<String, ParseError> {
    let token = tokens.next().ok_or(ParseError::Malformed)?;
    if token.len() > MAX_TOKEN_LEN {
        return Err(ParseError::TokenTooLong);
    }
    Ok(token.to_owned())
}
