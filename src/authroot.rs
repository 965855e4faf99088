//! Decoder for Microsoft's signed certificate trust list (authroot.stl).
//!
//! The file is a CMS `SignedData` envelope whose encapsulated content is a
//! `CertificateTrustList` as laid out in MS-CAESO. The signature is not
//! verified here; the delivery channel is the trust boundary.

use crate::{
    ctl::EntryMap,
    error::{AppResult, ErrorReason},
};
use cms::{content_info::ContentInfo, signed_data::SignedData};
use der::asn1::{Any, ObjectIdentifier, OctetString, OctetStringRef, Uint};
use der::{Decode, Enumerated, Sequence};
use x509_cert::attr::Attributes;
use x509_cert::spki::AlgorithmIdentifierOwned;
use x509_cert::time::Time;

/// RFC 5652 `SignedData` content type.
pub const ID_SIGNED_DATA: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.7.2");

/// Content type of a certificate trust list (szOID_CTL).
pub const ID_CERT_TRUST_LIST: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.1");

/// Subject usage of a CTL carrying trusted roots (szOID_ROOT_LIST_SIGNER).
pub const ID_ROOT_LIST_SIGNER: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.3.9");

/// Subject attribute holding the UTF-16 friendly name.
pub const ID_CERT_FRIENDLY_NAME_PROP: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.11.11");

/// Subject attribute holding the SHA-256 thumbprint.
pub const ID_CERT_AUTHROOT_SHA256_PROP: ObjectIdentifier =
    ObjectIdentifier::new_unwrap("1.3.6.1.4.1.311.10.11.98");

/// ```asn1
/// CTLVersion ::= INTEGER {v1(0)}
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Enumerated)]
#[asn1(type = "INTEGER")]
#[repr(u8)]
pub enum CtlVersion {
    #[default]
    V1 = 0,
}

/// One entry of the trust list.
///
/// ```asn1
/// TrustedSubject ::= SEQUENCE {
///   subjectIdentifier OCTETSTRING,
///   subjectAttributes Attributes OPTIONAL
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct TrustedSubject {
    pub identifier: OctetString,
    pub attributes: Option<Attributes>,
}

/// The encapsulated trust list structure, MS-CAESO pages 47-48.
///
/// ```asn1
/// CertificateTrustList ::= SEQUENCE {
///   version CTLVersion DEFAULT v1,
///   subjectUsage SubjectUsage,
///   listIdentifier ListIdentifier OPTIONAL,
///   sequenceNumber HUGEINTEGER OPTIONAL,
///   ctlThisUpdate ChoiceOfTime,
///   ctlNextUpdate ChoiceOfTime OPTIONAL,
///   subjectAlgorithm AlgorithmIdentifier,
///   trustedSubjects TrustedSubjects OPTIONAL,
///   ctlExtensions [0] EXPLICIT Extensions OPTIONAL
/// }
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Sequence)]
pub struct CertificateTrustList {
    #[asn1(default = "Default::default")]
    pub version: CtlVersion,

    pub subject_usage: Vec<ObjectIdentifier>,

    pub list_identifier: Option<OctetString>,

    pub sequence_number: Option<Uint>,

    pub this_update: Time,

    pub next_update: Option<Time>,

    pub subject_algorithm: AlgorithmIdentifierOwned,

    pub trusted_subjects: Option<Vec<TrustedSubject>>,

    #[asn1(context_specific = "0", optional = "true", tag_mode = "EXPLICIT")]
    pub ctl_extensions: Option<Any>,
}

/// Unwrap the CMS envelope and decode the trust list into hash to friendly
/// name entries. Subjects without a SHA-256 attribute are skipped.
pub fn parse(raw: &[u8]) -> AppResult<EntryMap> {
    let content_info = ContentInfo::from_der(raw)?;
    if content_info.content_type != ID_SIGNED_DATA {
        return Err(ErrorReason::NotSignedData(content_info.content_type).into());
    }
    let signed_data: SignedData = content_info.content.decode_as()?;

    let encap = signed_data.encap_content_info;
    if encap.econtent_type != ID_CERT_TRUST_LIST {
        return Err(ErrorReason::TrustListContentType(encap.econtent_type).into());
    }
    let Some(econtent) = encap.econtent else {
        return Err(ErrorReason::MissingTrustListContent.into());
    };
    // eContent is an OCTET STRING wrapping the DER of the list itself.
    let inner = econtent.decode_as::<OctetStringRef>()?;
    let ctl = CertificateTrustList::from_der(inner.as_bytes())?;

    if ctl.subject_usage.len() != 1 || ctl.subject_usage[0] != ID_ROOT_LIST_SIGNER {
        return Err(ErrorReason::SubjectUsage.into());
    }

    let mut entries = EntryMap::new();
    for subject in ctl.trusted_subjects.iter().flatten() {
        let mut sha256_hash = String::new();
        let mut friendly_name = String::new();
        for attr in subject.attributes.iter().flat_map(|attrs| attrs.iter()) {
            let Some(value) = attr.values.iter().next() else {
                continue;
            };
            if attr.oid == ID_CERT_AUTHROOT_SHA256_PROP {
                let bytes = value.decode_as::<OctetStringRef>()?;
                sha256_hash = hex::encode_upper(bytes.as_bytes());
            } else if attr.oid == ID_CERT_FRIENDLY_NAME_PROP {
                let bytes = value.decode_as::<OctetStringRef>()?;
                friendly_name = decode_wide_name(bytes.as_bytes())?;
            }
        }
        if !sha256_hash.is_empty() {
            entries.insert(sha256_hash, friendly_name);
        }
    }

    Ok(entries)
}

/// Decode a UTF-16 byte payload as Windows writes it: an optional byte
/// order mark (`FF FE` little endian, `FE FF` big endian, absent means
/// little endian), then code units, often NUL padded at the end.
fn decode_wide_name(bytes: &[u8]) -> AppResult<String> {
    if bytes.is_empty() {
        return Ok(String::new());
    }
    if bytes.len() % 2 != 0 {
        return Err(ErrorReason::OddUtf16Length.into());
    }

    let (payload, big_endian) = match bytes {
        [0xff, 0xfe, rest @ ..] => (rest, false),
        [0xfe, 0xff, rest @ ..] => (rest, true),
        _ => (bytes, false),
    };

    let units: Vec<u16> = payload
        .chunks_exact(2)
        .map(|pair| {
            if big_endian {
                u16::from_be_bytes([pair[0], pair[1]])
            } else {
                u16::from_le_bytes([pair[0], pair[1]])
            }
        })
        .collect();

    let decoded = String::from_utf16(&units).map_err(|_| ErrorReason::Utf16)?;
    Ok(decoded.trim_end_matches('\0').to_string())
}
