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

//! Signer certificates embedded in an envelope, and the lookup that ties a
//! signer to one of them.

use std::fmt;

use asn1_rs::Tag;
use chrono::{DateTime, Utc};
use x509_parser::{
    prelude::{FromDer, X509Certificate},
    time::ASN1Time,
    x509::{AttributeTypeAndValue, X509Name},
};

use crate::{Error, Result};

/// A certificate serial number, compared by numeric value.
///
/// DER integers are two's complement and minimally encoded, but BER producers
/// occasionally pad them. Redundant sign octets are dropped on construction so
/// that equal numbers compare equal regardless of encoding.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct SerialNumber(Vec<u8>);

impl SerialNumber {
    /// Creates a serial number from the content octets of an ASN.1 INTEGER.
    pub fn from_integer_bytes(bytes: &[u8]) -> Self {
        let mut start = 0;
        while start + 1 < bytes.len() {
            let redundant = match bytes[start] {
                0x00 => bytes[start + 1] & 0x80 == 0,
                0xff => bytes[start + 1] & 0x80 != 0,
                _ => false,
            };
            if !redundant {
                break;
            }
            start += 1;
        }
        Self(bytes[start..].to_vec())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for SerialNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(&self.0))
    }
}

/// The subject attributes used to describe a signer.
///
/// Each field holds the first occurrence of the attribute in the subject name.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SubjectFields {
    pub common_name: Option<String>,
    pub given_name: Option<String>,
    pub surname: Option<String>,
    pub serial_number: Option<String>,
    pub organization: Option<String>,
    pub organizational_unit: Option<String>,
    pub dn_qualifier: Option<String>,
}

impl SubjectFields {
    fn from_name(name: &X509Name) -> Self {
        let mut fields = Self::default();

        for attr in name.iter_attributes() {
            let slot = match attr.attr_type().to_id_string().as_str() {
                "2.5.4.3" => &mut fields.common_name,          // commonName
                "2.5.4.4" => &mut fields.surname,              // surname
                "2.5.4.5" => &mut fields.serial_number,        // serialNumber
                "2.5.4.10" => &mut fields.organization,        // organizationName
                "2.5.4.11" => &mut fields.organizational_unit, // organizationalUnitName
                "2.5.4.42" => &mut fields.given_name,          // givenName
                "2.5.4.46" => &mut fields.dn_qualifier,        // dnQualifier
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(attribute_string(attr));
            }
        }

        fields
    }
}

/// Renders a directory string whatever its ASN.1 string type.
fn attribute_string(attr: &AttributeTypeAndValue) -> String {
    if let Ok(s) = attr.as_str() {
        return s.to_owned();
    }

    let value = attr.attr_value();
    match value.header.tag() {
        Tag::BmpString => {
            let units: Vec<u16> = value
                .data
                .chunks_exact(2)
                .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
                .collect();
            String::from_utf16_lossy(&units)
        }
        // Teletex strings in the wild are Latin-1.
        Tag::T61String => value.data.iter().map(|b| char::from(*b)).collect(),
        _ => String::from_utf8_lossy(value.data).into_owned(),
    }
}

/// The parts of an X.509 certificate needed to describe a signer.
#[derive(Clone, Debug)]
pub struct SignerCertificate {
    serial: SerialNumber,
    subject: SubjectFields,
    issuer: String,
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
}

impl SignerCertificate {
    /// Decodes a DER encoded X.509 certificate.
    pub fn from_der(der: &[u8]) -> Result<Self> {
        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| Error::InvalidCertificate(e.to_string()))?;

        let validity = cert.validity();

        Ok(Self {
            serial: SerialNumber::from_integer_bytes(cert.raw_serial()),
            subject: SubjectFields::from_name(cert.subject()),
            issuer: cert.issuer().to_string(),
            not_before: to_datetime(&validity.not_before)?,
            not_after: to_datetime(&validity.not_after)?,
        })
    }

    pub fn serial(&self) -> &SerialNumber {
        &self.serial
    }

    pub fn subject(&self) -> &SubjectFields {
        &self.subject
    }

    /// The issuer distinguished name in its customary one line form.
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        self.not_before
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        self.not_after
    }
}

fn to_datetime(time: &ASN1Time) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(time.timestamp(), 0)
        .ok_or_else(|| Error::InvalidCertificate(format!("validity time {time} out of range")))
}

/// Finds the certificate whose serial number equals `serial`.
pub fn find_by_serial<'a>(
    certificates: &'a [SignerCertificate],
    serial: &SerialNumber,
) -> Option<&'a SignerCertificate> {
    certificates.iter().find(|cert| cert.serial() == serial)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use crate::Envelope;

    const SINGLE: &[u8] = include_bytes!("../tests/fixtures/single.p7m");
    const MULTI: &[u8] = include_bytes!("../tests/fixtures/multi.p7m");

    fn certificates(der: &[u8]) -> Vec<SignerCertificate> {
        Envelope::parse(der).unwrap().certificates().to_vec()
    }

    #[test]
    fn serial_ignores_sign_padding() {
        let padded = SerialNumber::from_integer_bytes(&[0x00, 0x00, 0x1a, 0x2b]);
        let minimal = SerialNumber::from_integer_bytes(&[0x1a, 0x2b]);
        assert_eq!(padded, minimal);

        // The zero keeps a high-bit number positive.
        let positive = SerialNumber::from_integer_bytes(&[0x00, 0x80]);
        let negative = SerialNumber::from_integer_bytes(&[0x80]);
        assert_ne!(positive, negative);

        let negative_padded = SerialNumber::from_integer_bytes(&[0xff, 0x80]);
        assert_eq!(negative_padded, negative);

        assert_eq!(SerialNumber::from_integer_bytes(&[0x00]).as_bytes(), &[0x00]);
    }

    #[test]
    fn serial_display_is_hex() {
        let serial = SerialNumber::from_integer_bytes(&[0x1a, 0x2b, 0x3c]);
        assert_eq!(serial.to_string(), "1a2b3c");
    }

    #[test]
    fn decodes_subject_fields() {
        let certs = certificates(SINGLE);
        assert_eq!(certs.len(), 1);

        let subject = certs[0].subject();
        assert_eq!(subject.common_name.as_deref(), Some("Mario Rossi"));
        assert_eq!(subject.given_name.as_deref(), Some("Mario"));
        assert_eq!(subject.surname.as_deref(), Some("Rossi"));
        assert_eq!(
            subject.serial_number.as_deref(),
            Some("TINIT:RSSMRA80A01H501U")
        );
        assert_eq!(subject.organization.as_deref(), Some("Studio Rossi"));
        assert_eq!(subject.organizational_unit, None);
        assert_eq!(subject.dn_qualifier, None);

        assert!(certs[0].issuer().contains("CN=Mario Rossi"));
        assert!(certs[0].not_before() < certs[0].not_after());
    }

    #[test]
    fn finds_certificate_by_serial() {
        let certs = certificates(MULTI);
        assert_eq!(certs.len(), 2);

        let rossi = SerialNumber::from_integer_bytes(&[0x1a, 0x2b, 0x3c]);
        let found = find_by_serial(&certs, &rossi).unwrap();
        assert_eq!(found.subject().common_name.as_deref(), Some("Mario Rossi"));

        // 4242 == 0x1092
        let bianchi = SerialNumber::from_integer_bytes(&[0x10, 0x92]);
        let found = find_by_serial(&certs, &bianchi).unwrap();
        assert_eq!(found.subject().common_name.as_deref(), Some("Laura Bianchi"));
        assert_eq!(
            found.subject().dn_qualifier.as_deref(),
            Some("BNCLRA85M41F205X")
        );

        let unknown = SerialNumber::from_integer_bytes(&[0x01]);
        assert!(find_by_serial(&certs, &unknown).is_none());
    }

    #[test]
    fn rejects_invalid_der() {
        assert!(matches!(
            SignerCertificate::from_der(&[0x30, 0x03, 0x02, 0x01, 0x01]),
            Err(Error::InvalidCertificate(_))
        ));
    }
}
