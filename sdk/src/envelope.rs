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

use bcder::Oid;

use crate::{
    asn1::rfc5652::{ContentInfo, SignedData, SignerInfo},
    certificate::SignerCertificate,
    Error, Result,
};

/// One CMS `SignedData` structure: a single level of a possibly nested
/// signed envelope.
#[derive(Clone, Debug)]
pub struct Envelope {
    version: u64,
    content_type: Oid,
    certificates: Vec<SignerCertificate>,
    signer_infos: Vec<SignerInfo>,
    encapsulated_content: Option<Vec<u8>>,
}

impl Envelope {
    /// Parses a BER or DER encoded `ContentInfo` carrying signed data.
    ///
    /// Fails with [`Error::NotSignedData`] when the content type is anything
    /// else, and with [`Error::Asn1Decode`] when the structure is malformed.
    /// Certificates that are not valid X.509 are dropped from the set.
    pub fn parse(der: &[u8]) -> Result<Self> {
        let content_info = ContentInfo::decode_ber(der)?;
        if !content_info.is_signed_data() {
            return Err(Error::NotSignedData {
                content_type: content_info.content_type.to_string(),
            });
        }

        let signed_data = SignedData::decode_content(content_info.content)?;

        let certificates = signed_data
            .certificates
            .iter()
            .filter_map(
                |captured| match SignerCertificate::from_der(captured.as_slice()) {
                    Ok(cert) => Some(cert),
                    Err(err) => {
                        log::warn!("skipping embedded certificate: {err}");
                        None
                    }
                },
            )
            .collect();

        Ok(Self {
            version: signed_data.version,
            content_type: signed_data.content_info.content_type,
            certificates,
            signer_infos: signed_data.signer_infos,
            encapsulated_content: signed_data
                .content_info
                .content
                .map(|content| content.to_bytes().to_vec()),
        })
    }

    /// The `SignedData` syntax version.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The declared type of the encapsulated content.
    pub fn content_type(&self) -> &Oid {
        &self.content_type
    }

    pub fn certificates(&self) -> &[SignerCertificate] {
        &self.certificates
    }

    /// Signer infos in the order they are encoded.
    pub fn signer_infos(&self) -> &[SignerInfo] {
        &self.signer_infos
    }

    /// The signed payload, or `None` for a detached signature.
    pub fn encapsulated_content(&self) -> Option<&[u8]> {
        self.encapsulated_content.as_deref()
    }

    pub fn into_encapsulated_content(self) -> Option<Vec<u8>> {
        self.encapsulated_content
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::panic)]
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::asn1::rfc5652::OID_ID_DATA;

    const SINGLE: &[u8] = include_bytes!("../tests/fixtures/single.p7m");
    const NESTED: &[u8] = include_bytes!("../tests/fixtures/nested.p7m");
    const DETACHED: &[u8] = include_bytes!("../tests/fixtures/detached.p7m");

    #[test]
    fn parses_single_envelope() {
        let envelope = Envelope::parse(SINGLE).unwrap();

        assert_eq!(envelope.version(), 1);
        assert_eq!(*envelope.content_type(), OID_ID_DATA);
        assert_eq!(envelope.certificates().len(), 1);
        assert_eq!(envelope.signer_infos().len(), 1);
        assert_eq!(
            envelope.encapsulated_content(),
            Some(&b"Contratto di prova\n"[..])
        );
    }

    #[test]
    fn nested_content_is_an_envelope() {
        let outer = Envelope::parse(NESTED).unwrap();
        let inner_bytes = outer.into_encapsulated_content().unwrap();
        assert_eq!(inner_bytes, SINGLE);

        let inner = Envelope::parse(&inner_bytes).unwrap();
        assert_eq!(inner.signer_infos().len(), 1);
    }

    #[test]
    fn detached_has_no_content() {
        let envelope = Envelope::parse(DETACHED).unwrap();
        assert_eq!(envelope.encapsulated_content(), None);
        assert_eq!(envelope.signer_infos().len(), 1);
    }

    #[test]
    fn payload_is_not_an_envelope() {
        assert!(matches!(
            Envelope::parse(b"Contratto di prova\n"),
            Err(Error::Asn1Decode(_))
        ));
    }

    #[test]
    fn other_content_types_are_rejected() {
        // SEQUENCE { OID id-data, [0] { OCTET STRING "hi!!" } }
        let der = [
            0x30, 0x13, 0x06, 0x09, 42, 134, 72, 134, 247, 13, 1, 7, 1, 0xa0, 0x06, 0x04, 0x04,
            b'h', b'i', b'!', b'!',
        ];
        match Envelope::parse(&der) {
            Err(Error::NotSignedData { content_type }) => {
                assert_eq!(content_type, "1.2.840.113549.1.7.1")
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
