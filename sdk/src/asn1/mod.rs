// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

/*! Holds Rust struct definitions for the ASN.1 structures of signed envelopes. */

// The decoders follow the layout of the cryptographic-message-syntax crate
// located at:
// https://github.com/indygreg/cryptography-rs/tree/main/cryptographic-message-syntax/src/asn1
//
// Only the parts of RFC 5652 needed to walk an envelope are decoded. Everything
// else (digest algorithms, CRLs, signature values) is skipped.

#![allow(missing_docs)]

pub mod rfc5652;
