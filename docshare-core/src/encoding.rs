// Copyright 2025 Sushanth (https://github.com/sushanthpy)
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Content encoding for the `fileString` wire field.
//!
//! Raw file bytes travel as `"#"` followed by standard (padded) base64.
//! The bare sentinel `"#"` is the encoding of empty content.

use crate::error::{DocError, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// Prefix carried by every encoded payload.
pub const CONTENT_SENTINEL: char = '#';

/// Encode raw bytes into the wire representation.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(1 + bytes.len().div_ceil(3) * 4);
    out.push(CONTENT_SENTINEL);
    STANDARD.encode_string(bytes, &mut out);
    out
}

/// Decode the wire representation back into raw bytes.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let body = encoded.strip_prefix(CONTENT_SENTINEL).ok_or_else(|| {
        DocError::Malformed("content is missing the '#' sentinel prefix".to_string())
    })?;

    STANDARD
        .decode(body)
        .map_err(|e| DocError::Malformed(format!("content is not valid base64: {}", e)))
}
