/*
 * Created on Sat Jul 09 2022
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

pub mod terminal {
    //! Colored terminal output for the server's few human-facing moments:
    //! the parting note on a clean shutdown and fatal errors raised before
    //! the logger is worth anything to the operator. Informational text goes
    //! to stdout, errors to stderr
    use std::fmt;
    use std::io::{self, Write};
    use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

    fn write_colored<T: fmt::Display>(
        mut stream: StandardStream,
        item: T,
        color: Color,
    ) -> io::Result<()> {
        stream.set_color(ColorSpec::new().set_fg(Some(color)))?;
        write!(stream, "{}", item)?;
        stream.reset()
    }
    /// Write an informational note to stdout, in cyan
    pub fn write_info<T: fmt::Display>(item: T) -> io::Result<()> {
        write_colored(StandardStream::stdout(ColorChoice::Auto), item, Color::Cyan)
    }
    /// Write a fatal error to stderr, in red
    pub fn write_error<T: fmt::Display>(item: T) -> io::Result<()> {
        write_colored(StandardStream::stderr(ColorChoice::Auto), item, Color::Red)
    }
}
