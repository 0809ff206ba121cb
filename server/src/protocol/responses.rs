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

//! The fixed response strings. Clients match on these literally, so they
//! are part of the wire contract

pub const ADDED: &str = "added";
pub const ALREADY_IN_DATABASE: &str = "already in database";
pub const REMOVED: &str = "removed";
pub const NOT_IN_DATABASE: &str = "not in database";
pub const NOT_FOUND: &str = "not found";
pub const ILL_FORMED: &str = "ill-formed command";
pub const FILE_PROCESSED: &str = "file processed";
pub const BAD_FILE_NAME: &str = "bad file name";
