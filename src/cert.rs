use crate::error::{AppResult, ErrorReason};
use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use x509_certificate::{asn1time::Time, X509Certificate};

/// SHA-256 of `data`, rendered as uppercase hex. This is the canonical
/// identity key for certificates and the change-detection checksum for
/// vendor payloads.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode_upper(Sha256::digest(data))
}

pub(crate) fn sha256_digest(data: &[u8]) -> [u8; 32] {
    Sha256::digest(data).into()
}

/// A certificate from the local root store. The raw DER bytes are fixed at
/// construction; everything else is a derived, read-only view.
#[derive(Clone, Debug)]
pub struct CertRecord {
    raw: Vec<u8>,
    checksum: String,
    parsed: X509Certificate,
}

impl CertRecord {
    pub fn from_der(raw: Vec<u8>) -> AppResult<Self> {
        if raw.is_empty() {
            return Err(ErrorReason::EmptyCertificate.into());
        }
        let parsed = X509Certificate::from_der(&raw)?;
        let checksum = sha256_hex(&raw);
        Ok(Self {
            raw,
            checksum,
            parsed,
        })
    }

    pub fn raw(&self) -> &[u8] {
        &self.raw
    }

    pub fn checksum(&self) -> &str {
        &self.checksum
    }

    pub fn subject_name(&self) -> Option<String> {
        self.parsed.subject_common_name()
    }

    pub fn issuer_name(&self) -> Option<String> {
        self.parsed.issuer_common_name()
    }

    pub fn not_before(&self) -> DateTime<Utc> {
        asn1_to_utc(&self.parsed.as_ref().tbs_certificate.validity.not_before)
    }

    pub fn not_after(&self) -> DateTime<Utc> {
        asn1_to_utc(&self.parsed.as_ref().tbs_certificate.validity.not_after)
    }
}

fn asn1_to_utc(time: &Time) -> DateTime<Utc> {
    match time {
        Time::UtcTime(t) => *t.clone(),
        Time::GeneralTime(t) => DateTime::<Utc>::from(t.clone()),
    }
}
