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

#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unwrap_used)]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! This library inspects CMS/CAdES signed envelopes (`.p7m` files) and reports
//! who signed them, when, and whether the signing certificates were valid.
//!
//! Envelopes may be nested: a signed envelope can carry another signed
//! envelope as its content. The analyzer walks the whole chain and returns one
//! [`SignatureRecord`] per signer, tagged with the envelope level it was found
//! at.
//!
//! # Example: Listing the signers of an envelope
//!
//! ```
//! # use p7m::Result;
//! # fn main() -> Result<()> {
//! let bytes = std::fs::read("tests/fixtures/nested.p7m")?;
//!
//! for record in p7m::analyze(&bytes) {
//!     println!(
//!         "level {} signer {}: {}",
//!         record.envelope_level,
//!         record.signer_index,
//!         record.identity.unwrap_or_default()
//!     );
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Example: Configuring the analyzer
//!
//! ```
//! # use p7m::Result;
//! use p7m::{Analyzer, Settings, Termination};
//!
//! # fn main() -> Result<()> {
//! let settings = Settings::from_toml("max_nesting_depth = 4")?;
//! let bytes = std::fs::read("tests/fixtures/single.p7m")?;
//!
//! let analysis = Analyzer::new(settings).analyze(&bytes);
//! assert_eq!(analysis.levels, 1);
//! assert!(matches!(analysis.termination, Termination::Payload));
//! # Ok(())
//! # }
//! ```

mod analyzer;
pub use analyzer::{analyze, Analysis, Analyzer, Termination};

pub mod asn1;

pub(crate) mod base64;

mod certificate;
pub use certificate::{find_by_serial, SerialNumber, SignerCertificate, SubjectFields};

mod encoding;
pub use encoding::{detect_and_normalize, Encoding};

mod envelope;
pub use envelope::Envelope;

mod error;
pub use error::{Error, Result};

mod settings;
pub use settings::Settings;

mod signature_record;
pub use signature_record::{CertificateStatus, Organization, SignatureRecord};
