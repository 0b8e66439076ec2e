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

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{
    certificate::{find_by_serial, SerialNumber},
    encoding::{detect_and_normalize, Encoding},
    envelope::Envelope,
    signature_record::SignatureRecord,
    settings::Settings,
    Error,
};

/// Why the walk down the chain of nested envelopes stopped.
#[derive(Debug)]
pub enum Termination {
    /// The innermost envelope has no encapsulated content (detached signature).
    NoContent,

    /// The innermost envelope's content is not itself an envelope. This is the
    /// normal end of a chain; the content is the signed document.
    Payload,

    /// The input is not a signed envelope at all.
    Unparsable(Error),

    /// Another envelope was found below the configured maximum depth.
    TooDeep(Error),
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::NoContent => write!(f, "no encapsulated content"),
            Termination::Payload => write!(f, "reached the signed payload"),
            Termination::Unparsable(err) => write!(f, "not a signed envelope: {err}"),
            Termination::TooDeep(err) => write!(f, "{err}"),
        }
    }
}

impl Serialize for Termination {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// The outcome of analyzing one input.
#[derive(Debug, Serialize)]
pub struct Analysis {
    /// Encoding the outermost input was supplied in.
    pub encoding: Encoding,

    /// One record per signer, outermost envelope first.
    pub records: Vec<SignatureRecord>,

    /// Number of signed envelopes that were analyzed. Fully unwrapping the
    /// input takes this many verification passes.
    pub levels: usize,

    pub termination: Termination,

    /// The innermost content, when the chain ended at [`Termination::Payload`].
    #[serde(skip)]
    pub payload: Option<Vec<u8>>,
}

/// Walks a chain of nested signed envelopes.
///
/// Failures never escape: input that is not an envelope yields no records, and
/// content that is not a further envelope simply ends the chain. The reason
/// the chain ended is reported in [`Analysis::termination`].
#[derive(Clone, Debug, Default)]
pub struct Analyzer {
    settings: Settings,
    reference_time: Option<DateTime<Utc>>,
}

impl Analyzer {
    pub fn new(settings: Settings) -> Self {
        Analyzer {
            settings,
            reference_time: None,
        }
    }

    /// Judges certificate validity at `now` instead of the current time.
    pub fn with_reference_time(mut self, now: DateTime<Utc>) -> Self {
        self.reference_time = Some(now);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Analyzes `raw`, which may be DER, Base64 or PEM.
    pub fn analyze(&self, raw: &[u8]) -> Analysis {
        let now = self.reference_time.unwrap_or_else(Utc::now);
        let max_depth = self.settings.max_nesting_depth;

        let (encoding, mut current) = detect_and_normalize(raw);
        log::debug!("input detected as {encoding}");

        let mut records = Vec::new();
        let mut levels = 0;
        let mut payload = None;

        let termination = loop {
            let level = levels + 1;

            let envelope = match Envelope::parse(&current) {
                Ok(envelope) => envelope,
                Err(err) if level == 1 => {
                    log::debug!("input is not a signed envelope: {err}");
                    break Termination::Unparsable(err);
                }
                Err(err) => {
                    log::debug!("content of level {levels} is the payload: {err}");
                    payload = Some(current);
                    break Termination::Payload;
                }
            };

            if level > max_depth {
                log::warn!("envelope at level {level} is below the maximum depth {max_depth}");
                break Termination::TooDeep(Error::TooDeep { max_depth });
            }

            log::debug!(
                "level {level}: {} signer(s), {} certificate(s)",
                envelope.signer_infos().len(),
                envelope.certificates().len()
            );
            records.extend(signature_records(&envelope, level, now));
            levels = level;

            match envelope.into_encapsulated_content() {
                Some(content) => current = content,
                None => break Termination::NoContent,
            }
        };

        Analysis {
            encoding,
            records,
            levels,
            termination,
            payload,
        }
    }
}

fn signature_records(
    envelope: &Envelope,
    level: usize,
    now: DateTime<Utc>,
) -> Vec<SignatureRecord> {
    envelope
        .signer_infos()
        .iter()
        .enumerate()
        .map(|(index, signer_info)| {
            let certificate = signer_info.serial_number().and_then(|serial| {
                find_by_serial(
                    envelope.certificates(),
                    &SerialNumber::from_integer_bytes(serial),
                )
            });

            SignatureRecord::extract(index + 1, level, signer_info, certificate, now)
        })
        .collect()
}

/// Analyzes `raw` with default settings and returns the signature records.
///
/// Input that is not a signed envelope yields an empty list.
pub fn analyze(raw: &[u8]) -> Vec<SignatureRecord> {
    Analyzer::default().analyze(raw).records
}
