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

//! Identifier generation for networks and documents.
//!
//! Both shapes are random uppercase letters followed by the current epoch
//! time in milliseconds. Collisions are unlikely but not ruled out.

use crate::error::{DocError, Result};
use chrono::Utc;
use rand::Rng;

/// Number of random letters in a generated id.
pub const ID_LETTERS: usize = 3;

/// Prefix of every document id.
pub const DOCUMENT_ID_PREFIX: &str = "doc";

const ALPHABET: &[u8; 26] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ";

fn random_letters<R: Rng + ?Sized>(rng: &mut R) -> String {
    (0..ID_LETTERS)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// `<3 letters><epoch millis>`
pub fn generate_network_id() -> String {
    let mut rng = rand::thread_rng();
    format!("{}{}", random_letters(&mut rng), Utc::now().timestamp_millis())
}

/// `doc<3 letters><epoch millis>`
pub fn generate_document_id() -> String {
    let mut rng = rand::thread_rng();
    format!(
        "{}{}{}",
        DOCUMENT_ID_PREFIX,
        random_letters(&mut rng),
        Utc::now().timestamp_millis()
    )
}

/// Reject network ids that would not name exactly one top-level namespace.
///
/// An empty id addresses the store root and a `/` reaches into another
/// network, so both are `InvalidArgument`.
pub fn validate_network_id(network: &str) -> Result<()> {
    if network.is_empty() {
        return Err(DocError::InvalidArgument(
            "network id must not be empty".to_string(),
        ));
    }
    if network.contains('/') {
        return Err(DocError::InvalidArgument(format!(
            "network id must not contain '/': {}",
            network
        )));
    }
    Ok(())
}
