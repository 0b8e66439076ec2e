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

use std::convert::Infallible;

use thiserror::Error;

/// `Error` enumerates errors returned by envelope analysis operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The input is not a well-formed ASN.1 structure of the expected shape.
    #[error("ASN.1 decoding failed: {0}")]
    Asn1Decode(String),

    /// The `ContentInfo` was decoded but does not carry signed data.
    #[error("content type {content_type} is not signed data")]
    NotSignedData { content_type: String },

    /// An embedded certificate could not be decoded as X.509.
    #[error("invalid certificate: {0}")]
    InvalidCertificate(String),

    /// Envelopes are nested deeper than the configured maximum.
    #[error("envelope nesting exceeds the maximum depth of {max_depth}")]
    TooDeep { max_depth: usize },

    #[error("bad parameter: {0}")]
    BadParam(String),

    #[error("type is unsupported")]
    UnsupportedType,

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}

impl From<bcder::decode::DecodeError<Infallible>> for Error {
    fn from(err: bcder::decode::DecodeError<Infallible>) -> Self {
        Error::Asn1Decode(err.to_string())
    }
}

/// A specialized `Result` type for envelope analysis operations.
pub type Result<T> = std::result::Result<T, Error>;
