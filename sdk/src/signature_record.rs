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
use x509_certificate::asn1time::Time;

use crate::{
    asn1::rfc5652::{SignerInfo, OID_SIGNING_TIME},
    certificate::{SignerCertificate, SubjectFields},
};

/// Validity of a certificate at a given instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    Valid,
    Expired,
    NotYetValid,
}

impl CertificateStatus {
    /// Judges `now` against the closed interval `[not_before, not_after]`.
    pub fn at(not_before: DateTime<Utc>, not_after: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now > not_after {
            CertificateStatus::Expired
        } else if now < not_before {
            CertificateStatus::NotYetValid
        } else {
            CertificateStatus::Valid
        }
    }
}

impl fmt::Display for CertificateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CertificateStatus::Valid => write!(f, "valid"),
            CertificateStatus::Expired => write!(f, "expired"),
            CertificateStatus::NotYetValid => write!(f, "not yet valid"),
        }
    }
}

/// The organization a signer belongs to.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Organization {
    Name(String),

    /// Neither an organization nor an organizational unit is named.
    NotPresent,
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Organization::Name(name) => write!(f, "{name}"),
            Organization::NotPresent => write!(f, "not present"),
        }
    }
}

impl Serialize for Organization {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// What the analyzer learned about one signer of one envelope.
///
/// When the signer's certificate could not be found only `error` is set, in
/// addition to the position fields.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SignatureRecord {
    /// 1-based position of the signer within its envelope.
    pub signer_index: usize,

    /// 1-based nesting depth of the envelope; 1 is the outermost.
    pub envelope_level: usize,

    /// Given name and surname, or the common name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity: Option<String>,

    /// Fiscal identifier with any `prefix:` removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_code: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<Organization>,

    /// The signing time the signer claims in its signed attributes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signing_time: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_valid_now: Option<CertificateStatus>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_from: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub issuer_display: Option<String>,

    /// Whether `signing_time` falls within the certificate validity window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_valid_at_signing: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SignatureRecord {
    /// Describes `signer_info` using its certificate, judged at `now`.
    ///
    /// Without a certificate the record carries only a diagnostic.
    pub fn extract(
        signer_index: usize,
        envelope_level: usize,
        signer_info: &SignerInfo,
        certificate: Option<&SignerCertificate>,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(cert) = certificate else {
            return Self::uncorrelated(signer_index, envelope_level);
        };

        let signing_time = signing_time(signer_info);
        let (not_before, not_after) = (cert.not_before(), cert.not_after());

        SignatureRecord {
            signer_index,
            envelope_level,
            identity: Some(identity(cert.subject())),
            tax_code: Some(tax_code(cert.subject())),
            organization: Some(organization(cert.subject())),
            signing_time,
            cert_valid_now: Some(CertificateStatus::at(not_before, not_after, now)),
            valid_from: Some(not_before),
            valid_until: Some(not_after),
            issuer_display: Some(cert.issuer().to_owned()),
            signature_valid_at_signing: signing_time
                .map(|time| valid_at_signing(not_before, not_after, time)),
            error: None,
        }
    }

    fn uncorrelated(signer_index: usize, envelope_level: usize) -> Self {
        SignatureRecord {
            signer_index,
            envelope_level,
            identity: None,
            tax_code: None,
            organization: None,
            signing_time: None,
            cert_valid_now: None,
            valid_from: None,
            valid_until: None,
            issuer_display: None,
            signature_valid_at_signing: None,
            error: Some("no certificate found for this signer".to_owned()),
        }
    }
}

/// Whether `signing_time` lies within `[not_before, not_after]`.
fn valid_at_signing(
    not_before: DateTime<Utc>,
    not_after: DateTime<Utc>,
    signing_time: DateTime<Utc>,
) -> bool {
    not_before <= signing_time && signing_time <= not_after
}

fn identity(subject: &SubjectFields) -> String {
    match (&subject.given_name, &subject.surname) {
        (Some(given_name), Some(surname)) => format!("{given_name} {surname}"),
        _ => subject.common_name.clone().unwrap_or_default(),
    }
}

fn tax_code(subject: &SubjectFields) -> String {
    match &subject.serial_number {
        Some(serial_number) => strip_prefix(serial_number).to_owned(),
        None => subject.dn_qualifier.clone().unwrap_or_default(),
    }
}

/// Keeps only what follows the last `:`, e.g. `TINIT:RSSMRA80A01H501U`.
fn strip_prefix(value: &str) -> &str {
    value.rsplit(':').next().unwrap_or(value)
}

fn organization(subject: &SubjectFields) -> Organization {
    subject
        .organization
        .as_ref()
        .or(subject.organizational_unit.as_ref())
        .map(|name| Organization::Name(name.clone()))
        .unwrap_or(Organization::NotPresent)
}

/// The first value of the signing-time signed attribute, if present and
/// decodable.
fn signing_time(signer_info: &SignerInfo) -> Option<DateTime<Utc>> {
    let attr = signer_info.signed_attribute(&OID_SIGNING_TIME)?;

    let time = attr
        .values
        .clone()
        .decode(|cons| {
            let time = Time::take_from(cons)?;
            cons.skip_all()?;
            Ok(time)
        })
        .map_err(|err| log::debug!("undecodable signing time: {err}"))
        .ok()?;

    Some(match time {
        Time::UtcTime(u) => *u,
        Time::GeneralTime(gt) => gt.into(),
    })
}
