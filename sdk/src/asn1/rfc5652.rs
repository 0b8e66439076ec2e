// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! ASN.1 types defined by [RFC 5652].
//!
//! The types defined in this module are intended to be extremely low-level
//! and only to be used for deserialization. See [`Envelope`] for the
//! higher-level view.
//!
//! [RFC 5652]: https://datatracker.ietf.org/doc/html/rfc5652
//! [`Envelope`]: crate::Envelope

use std::convert::Infallible;

use asn1_rs::{Any, FromBer};
use bcder::{
    decode::{Constructed, DecodeError, Source},
    Captured, ConstOid, Mode, OctetString, Oid, Tag,
};

/// The data content type.
///
/// `id-data` in the specification.
///
/// 1.2.840.113549.1.7.1
pub const OID_ID_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 1]);

/// The signed-data content type.
///
/// 1.2.840.113549.1.7.2
pub const OID_ID_SIGNED_DATA: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 7, 2]);

/// Identifies the content type of the encapsulated content.
///
/// 1.2.840.113549.1.9.3
pub const OID_CONTENT_TYPE: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 3]);

/// Identifies the time the signer claims to have signed.
///
/// 1.2.840.113549.1.9.5
pub const OID_SIGNING_TIME: ConstOid = Oid(&[42, 134, 72, 134, 247, 13, 1, 9, 5]);

/// Content info.
///
/// ```ASN.1
/// ContentInfo ::= SEQUENCE {
///   contentType ContentType,
///   content [0] EXPLICIT ANY DEFINED BY contentType }
/// ```
#[derive(Clone, Debug)]
pub struct ContentInfo {
    pub content_type: Oid,
    pub content: Captured,
}

impl ContentInfo {
    /// Attempt to decode BER encoded bytes to a parsed data structure.
    ///
    /// Only the first encoded value is decoded. Anything after it, such as
    /// a line break or zero padding added in transit, is ignored.
    pub fn decode_ber(data: &[u8]) -> Result<Self, DecodeError<Infallible>> {
        let data = match Any::from_ber(data) {
            Ok((rest, _)) if !rest.is_empty() => {
                log::debug!("ignoring {} bytes after the content info", rest.len());
                &data[..data.len() - rest.len()]
            }
            _ => data,
        };

        Constructed::decode(data, Mode::Ber, |cons| Self::take_from(cons))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_type = Oid::take_from(cons)?;
            let content = cons.take_constructed_if(Tag::CTX_0, |cons| cons.capture_one())?;

            Ok(Self {
                content_type,
                content,
            })
        })
    }

    pub fn is_signed_data(&self) -> bool {
        self.content_type == OID_ID_SIGNED_DATA
    }
}

/// Represents signed data.
///
/// ASN.1 type specification:
///
/// ```ASN.1
/// SignedData ::= SEQUENCE {
///   version CMSVersion,
///   digestAlgorithms DigestAlgorithmIdentifiers,
///   encapContentInfo EncapsulatedContentInfo,
///   certificates [0] IMPLICIT CertificateSet OPTIONAL,
///   crls [1] IMPLICIT RevocationInfoChoices OPTIONAL,
///   signerInfos SignerInfos }
/// ```
///
/// Digest algorithms and CRLs are skipped. Only the plain X.509 entries of
/// the certificate set are kept, as raw captured bytes.
#[derive(Clone, Debug)]
pub struct SignedData {
    pub version: u64,
    pub content_info: EncapsulatedContentInfo,
    pub certificates: Vec<Captured>,
    pub signer_infos: Vec<SignerInfo>,
}

impl SignedData {
    /// Decodes the `content` of a [`ContentInfo`] whose type is signed data.
    pub fn decode_content(content: Captured) -> Result<Self, DecodeError<Infallible>> {
        content.decode(|cons| Self::take_from(cons))
    }

    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let version = cons.take_u64()?;

            // digestAlgorithms
            cons.take_set(|cons| cons.skip_all())?;

            let content_info = EncapsulatedContentInfo::take_from(cons)?;

            let certificates = cons
                .take_opt_constructed_if(Tag::CTX_0, |cons| CertificateSet::take_from(cons))?
                .unwrap_or_default();

            // crls
            cons.take_opt_constructed_if(Tag::CTX_1, |cons| cons.skip_all())?;

            let signer_infos = cons.take_set(|cons| {
                let mut infos = Vec::new();

                while let Some(info) = SignerInfo::take_opt_from(cons)? {
                    infos.push(info);
                }

                Ok(infos)
            })?;

            Ok(Self {
                version,
                content_info,
                certificates,
                signer_infos,
            })
        })
    }
}

/// Encapsulated content info.
///
/// ```ASN.1
/// EncapsulatedContentInfo ::= SEQUENCE {
///   eContentType ContentType,
///   eContent [0] EXPLICIT OCTET STRING OPTIONAL }
/// ```
#[derive(Clone, Debug)]
pub struct EncapsulatedContentInfo {
    pub content_type: Oid,
    pub content: Option<OctetString>,
}

impl EncapsulatedContentInfo {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let content_type = Oid::take_from(cons)?;
            let content =
                cons.take_opt_constructed_if(Tag::CTX_0, |cons| OctetString::take_from(cons))?;

            Ok(Self {
                content_type,
                content,
            })
        })
    }
}

/// Certificate set.
///
/// ```ASN.1
/// CertificateSet ::= SET OF CertificateChoices
/// ```
pub struct CertificateSet;

impl CertificateSet {
    /// Returns the plain certificates of the set, dropping every other choice.
    pub fn take_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Vec<Captured>, DecodeError<S::Error>> {
        let mut certificates = Vec::new();

        while let Some(choice) = CertificateChoices::take_opt_from(cons)? {
            if let CertificateChoices::Certificate(captured) = choice {
                certificates.push(captured);
            }
        }

        Ok(certificates)
    }
}

/// Certificate choices.
///
/// ```ASN.1
/// CertificateChoices ::= CHOICE {
///   certificate Certificate,
///   extendedCertificate [0] IMPLICIT ExtendedCertificate, -- Obsolete
///   v1AttrCert [1] IMPLICIT AttributeCertificateV1,       -- Obsolete
///   v2AttrCert [2] IMPLICIT AttributeCertificateV2,
///   other [3] IMPLICIT OtherCertificateFormat }
/// ```
#[derive(Clone, Debug)]
pub enum CertificateChoices {
    /// The complete DER of an X.509 certificate, tag and length included.
    Certificate(Captured),
    ExtendedCertificate,
    AttributeCertificateV1,
    AttributeCertificateV2,
    Other,
}

impl CertificateChoices {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        let skipped = [
            (Tag::CTX_0, Self::ExtendedCertificate),
            (Tag::CTX_1, Self::AttributeCertificateV1),
            (Tag::CTX_2, Self::AttributeCertificateV2),
            (Tag::CTX_3, Self::Other),
        ];

        for (tag, choice) in skipped {
            if cons
                .take_opt_constructed_if(tag, |cons| cons.skip_all())?
                .is_some()
            {
                return Ok(Some(choice));
            }
        }

        let captured = cons.capture(|cons| {
            cons.take_opt_sequence(|cons| cons.skip_all())?;
            Ok(())
        })?;

        if captured.as_slice().is_empty() {
            Ok(None)
        } else {
            Ok(Some(Self::Certificate(captured)))
        }
    }
}

/// Per-signer information.
///
/// ```ASN.1
/// SignerInfo ::= SEQUENCE {
///   version CMSVersion,
///   sid SignerIdentifier,
///   digestAlgorithm DigestAlgorithmIdentifier,
///   signedAttrs [0] IMPLICIT SignedAttributes OPTIONAL,
///   signatureAlgorithm SignatureAlgorithmIdentifier,
///   signature SignatureValue,
///   unsignedAttrs [1] IMPLICIT UnsignedAttributes OPTIONAL }
/// ```
#[derive(Clone, Debug)]
pub struct SignerInfo {
    pub version: u64,
    pub sid: SignerIdentifier,
    pub signed_attributes: Option<Vec<Attribute>>,
}

impl SignerInfo {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| Self::from_sequence(cons))
    }

    pub fn from_sequence<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Self, DecodeError<S::Error>> {
        let version = cons.take_u64()?;
        let sid = SignerIdentifier::take_from(cons)?;

        // digestAlgorithm
        cons.take_sequence(|cons| cons.skip_all())?;

        let signed_attributes = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            let mut attributes = Vec::new();

            while let Some(attribute) = Attribute::take_opt_from(cons)? {
                attributes.push(attribute);
            }

            Ok(attributes)
        })?;

        // signatureAlgorithm, signature, unsignedAttrs
        cons.take_sequence(|cons| cons.skip_all())?;
        OctetString::take_from(cons)?;
        cons.take_opt_constructed_if(Tag::CTX_1, |cons| cons.skip_all())?;

        Ok(Self {
            version,
            sid,
            signed_attributes,
        })
    }

    /// The serial number the signer references, when it identifies its
    /// certificate by issuer and serial number.
    pub fn serial_number(&self) -> Option<&[u8]> {
        match &self.sid {
            SignerIdentifier::IssuerAndSerialNumber(issuer_and_serial) => {
                Some(&issuer_and_serial.serial_number)
            }
            SignerIdentifier::SubjectKeyIdentifier(_) => None,
        }
    }

    /// The first signed attribute of type `oid`.
    pub fn signed_attribute(&self, oid: &ConstOid) -> Option<&Attribute> {
        self.signed_attributes
            .as_ref()?
            .iter()
            .find(|attr| attr.typ == *oid)
    }
}

/// Identifies the signer.
///
/// ```ASN.1
/// SignerIdentifier ::= CHOICE {
///   issuerAndSerialNumber IssuerAndSerialNumber,
///   subjectKeyIdentifier [0] SubjectKeyIdentifier }
/// ```
#[derive(Clone, Debug)]
pub enum SignerIdentifier {
    IssuerAndSerialNumber(IssuerAndSerialNumber),
    SubjectKeyIdentifier(Vec<u8>),
}

impl SignerIdentifier {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        if let Some(identifier) =
            cons.take_opt_primitive_if(Tag::CTX_0, |prim| prim.take_all())?
        {
            Ok(Self::SubjectKeyIdentifier(identifier.to_vec()))
        } else if let Some(identifier) = cons.take_opt_constructed_if(Tag::CTX_0, |cons| {
            // BER segmented form of the implicit OCTET STRING.
            let mut identifier = Vec::new();
            while let Some(segment) =
                cons.take_opt_primitive_if(Tag::OCTET_STRING, |prim| prim.take_all())?
            {
                identifier.extend_from_slice(&segment);
            }
            Ok(identifier)
        })? {
            Ok(Self::SubjectKeyIdentifier(identifier))
        } else {
            Ok(Self::IssuerAndSerialNumber(
                IssuerAndSerialNumber::take_from(cons)?,
            ))
        }
    }
}

/// Issuer and serial number.
///
/// ```ASN.1
/// IssuerAndSerialNumber ::= SEQUENCE {
///   issuer Name,
///   serialNumber CertificateSerialNumber }
/// ```
#[derive(Clone, Debug)]
pub struct IssuerAndSerialNumber {
    pub issuer: Captured,

    /// Content octets of the serial number INTEGER.
    pub serial_number: Vec<u8>,
}

impl IssuerAndSerialNumber {
    pub fn take_from<S: Source>(cons: &mut Constructed<S>) -> Result<Self, DecodeError<S::Error>> {
        cons.take_sequence(|cons| {
            let issuer = cons.capture_one()?;
            let serial_number = cons.take_primitive_if(Tag::INTEGER, |prim| prim.take_all())?;

            Ok(Self {
                issuer,
                serial_number: serial_number.to_vec(),
            })
        })
    }
}

/// Attribute.
///
/// ```ASN.1
/// Attribute ::= SEQUENCE {
///   attrType OBJECT IDENTIFIER,
///   attrValues SET OF AttributeValue }
/// ```
#[derive(Clone, Debug)]
pub struct Attribute {
    pub typ: Oid,

    /// Content of the `attrValues` set: the encoded values back to back.
    pub values: Captured,
}

impl Attribute {
    pub fn take_opt_from<S: Source>(
        cons: &mut Constructed<S>,
    ) -> Result<Option<Self>, DecodeError<S::Error>> {
        cons.take_opt_sequence(|cons| {
            let typ = Oid::take_from(cons)?;
            let values = cons.take_set(|cons| cons.capture_all())?;

            Ok(Self { typ, values })
        })
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    const SINGLE: &[u8] = include_bytes!("../../tests/fixtures/single.p7m");
    const KEYID: &[u8] = include_bytes!("../../tests/fixtures/keyid.p7m");
    const NOCERT: &[u8] = include_bytes!("../../tests/fixtures/nocert.p7m");
    const DETACHED: &[u8] = include_bytes!("../../tests/fixtures/detached.p7m");

    fn signed_data(der: &[u8]) -> SignedData {
        let content_info = ContentInfo::decode_ber(der).unwrap();
        assert!(content_info.is_signed_data());
        SignedData::decode_content(content_info.content).unwrap()
    }

    #[test]
    fn decodes_single_signer() {
        let signed_data = signed_data(SINGLE);

        assert_eq!(signed_data.version, 1);
        assert_eq!(signed_data.content_info.content_type, OID_ID_DATA);
        assert_eq!(
            signed_data
                .content_info
                .content
                .as_ref()
                .unwrap()
                .to_bytes()
                .to_vec(),
            b"Contratto di prova\n".to_vec()
        );
        assert_eq!(signed_data.certificates.len(), 1);
        assert_eq!(signed_data.signer_infos.len(), 1);

        let signer = &signed_data.signer_infos[0];
        assert_eq!(signer.version, 1);
        assert_eq!(signer.serial_number(), Some(&[0x1a, 0x2b, 0x3c][..]));
        assert!(signer.signed_attribute(&OID_SIGNING_TIME).is_some());
        assert!(signer.signed_attribute(&OID_CONTENT_TYPE).is_some());
    }

    #[test]
    fn certificate_is_captured_with_header() {
        let signed_data = signed_data(SINGLE);
        let cert = signed_data.certificates[0].as_slice();

        // SEQUENCE with a two byte long form length.
        assert_eq!(cert[0], 0x30);
        assert_eq!(cert[1], 0x82);
        let len = ((cert[2] as usize) << 8) | cert[3] as usize;
        assert_eq!(cert.len(), len + 4);
    }

    #[test]
    fn subject_key_identifier_signer() {
        let signed_data = signed_data(KEYID);
        let signer = &signed_data.signer_infos[0];

        assert_eq!(signer.version, 3);
        assert!(matches!(
            signer.sid,
            SignerIdentifier::SubjectKeyIdentifier(ref id) if id.len() == 20
        ));
        assert_eq!(signer.serial_number(), None);
    }

    #[test]
    fn certificates_are_optional() {
        let signed_data = signed_data(NOCERT);
        assert!(signed_data.certificates.is_empty());
        assert_eq!(signed_data.signer_infos.len(), 1);
    }

    #[test]
    fn detached_content_is_absent() {
        let signed_data = signed_data(DETACHED);
        assert!(signed_data.content_info.content.is_none());
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(ContentInfo::decode_ber(b"definitely not a signed envelope").is_err());
        assert!(ContentInfo::decode_ber(&[]).is_err());
    }

    #[test]
    fn trailing_bytes_are_ignored() {
        for tail in [&b"\r\n"[..], &[0u8; 4][..], &b"garbage"[..]] {
            let mut der = SINGLE.to_vec();
            der.extend_from_slice(tail);

            let content_info = ContentInfo::decode_ber(&der).unwrap();
            assert!(content_info.is_signed_data());
            let signed_data = SignedData::decode_content(content_info.content).unwrap();
            assert_eq!(signed_data.signer_infos.len(), 1);
        }
    }

    #[test]
    fn segmented_subject_key_identifier() {
        // [0] constructed, indefinite length, two OCTET STRING segments.
        let ber = [
            0xa0, 0x80, 0x04, 0x02, 0x01, 0x02, 0x04, 0x01, 0x03, 0x00, 0x00,
        ];
        let sid = Constructed::decode(&ber[..], Mode::Ber, |cons| {
            SignerIdentifier::take_from(cons)
        })
        .unwrap();
        assert!(matches!(
            sid,
            SignerIdentifier::SubjectKeyIdentifier(ref id) if id == &[1, 2, 3]
        ));

        let der = [0x80, 0x03, 0x01, 0x02, 0x03];
        let sid = Constructed::decode(&der[..], Mode::Der, |cons| {
            SignerIdentifier::take_from(cons)
        })
        .unwrap();
        assert!(matches!(
            sid,
            SignerIdentifier::SubjectKeyIdentifier(ref id) if id == &[1, 2, 3]
        ));
    }

    #[test]
    fn data_content_is_not_signed_data() {
        // SEQUENCE { OID id-data, [0] { OCTET STRING "hi" } }
        let der = [
            0x30, 0x13, 0x06, 0x09, 42, 134, 72, 134, 247, 13, 1, 7, 1, 0xa0, 0x06, 0x04, 0x04,
            b'h', b'i', b'!', b'!',
        ];
        let content_info = ContentInfo::decode_ber(&der).unwrap();
        assert!(!content_info.is_signed_data());
        assert_eq!(content_info.content_type, OID_ID_DATA);
    }
}
