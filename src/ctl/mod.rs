use crate::{cert::CertRecord, error::AppResult, fetch::Fetcher};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

mod apple;
mod microsoft;
mod mozilla;

pub use apple::{AppleCtl, APPLE_KB_URL};
pub use microsoft::{MicrosoftCtl, MICROSOFT_AUTHROOT_STL_URL, MICROSOFT_CCADB_CSV_URL};
pub use mozilla::{MozillaCtl, MOZILLA_INCLUDED_CSV_URL, MOZILLA_REMOVED_CSV_URL};

/// Content hash (uppercase hex SHA-256) to display name.
pub type EntryMap = BTreeMap<String, String>;

/// Vendor-curated trust list state. Vendor ingestors embed this and add
/// their own provenance fields around it.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Ctl {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub trusted: EntryMap,
    #[serde(default, skip_serializing_if = "EntryMap::is_empty")]
    pub removed: EntryMap,
}

impl Ctl {
    /// Classify every store record against this list. Pure: no I/O, the
    /// inputs are untouched.
    ///
    /// Priority is fixed: vendor-trusted wins over a user allow override,
    /// which wins over vendor-removed. Trusted and Removed should be
    /// disjoint upstream, but the order keeps a double-listed root from
    /// being reported as removed.
    pub fn verify<'a>(&self, certs: &'a [CertRecord], allow: &EntryMap) -> VerifyResult<'a> {
        let mut result = VerifyResult::new(certs.len());
        for cert in certs {
            let hash = cert.checksum();
            if self.trusted.contains_key(hash) {
                result.trusted.push(cert);
            } else if allow.contains_key(hash) {
                result.allowed.push(cert);
            } else if self.removed.contains_key(hash) {
                result.removed.push(cert);
            } else {
                result.unknown.push(cert);
            }
        }
        result
    }
}

/// Outcome of one reconciliation pass. The four lists partition the input.
#[derive(Clone, Debug)]
pub struct VerifyResult<'a> {
    pub total: usize,
    pub trusted: Vec<&'a CertRecord>,
    pub allowed: Vec<&'a CertRecord>,
    pub removed: Vec<&'a CertRecord>,
    pub unknown: Vec<&'a CertRecord>,
}

impl<'a> VerifyResult<'a> {
    fn new(total: usize) -> Self {
        Self {
            total,
            trusted: Vec::new(),
            allowed: Vec::new(),
            removed: Vec::new(),
            unknown: Vec::new(),
        }
    }
}

/// One vendor's trust list: how to bring it up to date and how to judge a
/// certificate store against it. Concrete sources are picked at
/// composition time, not through trait objects.
#[allow(async_fn_in_trait)]
pub trait TrustSource {
    /// Human-readable vendor label for logs and reports.
    fn name(&self) -> &'static str;

    /// Where a user can look up why a root was removed.
    fn removal_reference(&self) -> &'static str;

    /// Bring the vendor state up to date, all sources or nothing.
    async fn fetch(&mut self, fetcher: &Fetcher) -> AppResult<()>;

    /// Classify `certs` against the vendor state.
    fn verify<'a>(&self, certs: &'a [CertRecord], allow: &EntryMap) -> VerifyResult<'a>;
}

/// Vendor selector; the default follows the platform whose root store we
/// are auditing.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum Vendor {
    Mozilla,
    Microsoft,
    Apple,
}

impl Vendor {
    pub fn platform_default() -> Self {
        if cfg!(target_os = "windows") {
            Vendor::Microsoft
        } else if cfg!(target_os = "macos") {
            Vendor::Apple
        } else {
            Vendor::Mozilla
        }
    }
}

impl Display for Vendor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Vendor::Mozilla => "mozilla",
            Vendor::Microsoft => "microsoft",
            Vendor::Apple => "apple",
        };
        f.write_str(name)
    }
}
