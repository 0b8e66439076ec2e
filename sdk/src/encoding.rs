// Copyright 2024 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Unless required by applicable law or agreed to in writing,
// this software is distributed on an "AS IS" BASIS, WITHOUT
// WARRANTIES OR REPRESENTATIONS OF ANY KIND, either express or
// implied. See the LICENSE-MIT and LICENSE-APACHE files for the
// specific language governing permissions and limitations under
// each license.

//! Input encoding detection for signed envelopes.

use std::fmt;

use serde::Serialize;

use crate::base64;

const PEM_MARKER: &[u8] = b"-----BEGIN";

/// Only this many leading bytes are searched for [`PEM_MARKER`].
const PEM_SNIFF_LEN: usize = 100;

/// The transport encoding an envelope was supplied in.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Encoding {
    /// Base64 text, optionally wrapped over several lines.
    Base64,

    /// PEM armored text (`-----BEGIN PKCS7-----` and friends).
    Pem,

    /// Raw binary DER (or BER). Also the fallback when nothing else matches.
    Der,
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Encoding::Base64 => write!(f, "base64"),
            Encoding::Pem => write!(f, "pem"),
            Encoding::Der => write!(f, "der"),
        }
    }
}

/// Classifies `raw` and returns it converted to binary form.
///
/// Base64 is recognized only when the decoded bytes re-encode to exactly the
/// input text (ignoring line breaks and surrounding whitespace), so binary
/// input that happens to decode cleanly is not mistaken for Base64. PEM is
/// recognized by its header marker and the armor is removed. Anything else is
/// treated as DER and passed through unchanged; detection never fails.
pub fn detect_and_normalize(raw: &[u8]) -> (Encoding, Vec<u8>) {
    if let Some(decoded) = decode_base64(raw) {
        return (Encoding::Base64, decoded);
    }

    if is_pem(raw) {
        return match pem::parse(raw) {
            Ok(block) => {
                log::debug!("stripped PEM armor labelled {}", block.tag());
                (Encoding::Pem, block.contents().to_vec())
            }
            Err(err) => {
                log::warn!("PEM header found but armor could not be parsed: {err}");
                (Encoding::Pem, raw.to_vec())
            }
        };
    }

    (Encoding::Der, raw.to_vec())
}

fn decode_base64(raw: &[u8]) -> Option<Vec<u8>> {
    let text = std::str::from_utf8(raw.trim_ascii()).ok()?;
    let text = base64::strip_line_breaks(text);
    if text.is_empty() {
        return None;
    }

    let decoded = base64::decode(&text).ok()?;
    (base64::encode(&decoded) == text).then_some(decoded)
}

fn is_pem(raw: &[u8]) -> bool {
    let head = &raw[..raw.len().min(PEM_SNIFF_LEN)];
    head.windows(PEM_MARKER.len()).any(|w| w == PEM_MARKER)
}
