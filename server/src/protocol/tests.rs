/*
 * Created on Fri Aug 19 2022
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

use super::{parse, ParseError, Query, MAX_TOKEN_LEN};

#[test]
fn test_parse_query() {
    assert_eq!(parse(b"q cat").unwrap(), Query::Get("cat".to_owned()));
    // whitespace between the selector and the first token is optional,
    // exactly like the scanf-style parsers this protocol descends from
    assert_eq!(parse(b"qcat").unwrap(), Query::Get("cat".to_owned()));
    assert_eq!(parse(b"q   cat  ").unwrap(), Query::Get("cat".to_owned()));
}

#[test]
fn test_parse_add() {
    assert_eq!(
        parse(b"a cat meow").unwrap(),
        Query::Add("cat".to_owned(), "meow".to_owned())
    );
    // extra tokens are ignored
    assert_eq!(
        parse(b"a cat meow woof").unwrap(),
        Query::Add("cat".to_owned(), "meow".to_owned())
    );
    assert_eq!(parse(b"a cat").unwrap_err(), ParseError::Malformed);
}

#[test]
fn test_parse_del_and_file() {
    assert_eq!(parse(b"d cat").unwrap(), Query::Del("cat".to_owned()));
    assert_eq!(
        parse(b"f /tmp/commands.txt").unwrap(),
        Query::File("/tmp/commands.txt".to_owned())
    );
    assert_eq!(parse(b"d").unwrap_err(), ParseError::Malformed);
    assert_eq!(parse(b"f").unwrap_err(), ParseError::Malformed);
}

#[test]
fn test_parse_rejects_garbage() {
    assert_eq!(parse(b"").unwrap_err(), ParseError::Malformed);
    assert_eq!(parse(b"x cat").unwrap_err(), ParseError::Malformed);
    assert_eq!(parse(b" q cat").unwrap_err(), ParseError::Malformed);
    assert_eq!(parse(b"q").unwrap_err(), ParseError::Malformed);
    assert_eq!(parse(b"\xff\xfe").unwrap_err(), ParseError::BadEncoding);
}

#[test]
fn test_parse_token_bound() {
    let fits = format!("q {}", "x".repeat(MAX_TOKEN_LEN));
    let too_long = format!("q {}", "x".repeat(MAX_TOKEN_LEN + 1));
    assert!(parse(fits.as_bytes()).is_ok());
    assert_eq!(
        parse(too_long.as_bytes()).unwrap_err(),
        ParseError::TokenTooLong
    );
}
