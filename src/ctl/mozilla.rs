use crate::{
    cert::{sha256_hex, CertRecord},
    ctl::{Ctl, EntryMap, TrustSource, VerifyResult},
    error::AppResult,
    fetch::Fetcher,
    tabular,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const MOZILLA_INCLUDED_CSV_URL: &str =
    "https://ccadb-public.secure.force.com/mozilla/IncludedCACertificateReportCSVFormat";
pub const MOZILLA_REMOVED_CSV_URL: &str =
    "https://ccadb-public.secure.force.com/mozilla/RemovedCACertificateReportCSVFormat";

/// Mozilla's NSS root program, published through CCADB as two CSV
/// reports: included roots and removed roots.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MozillaCtl {
    #[serde(flatten)]
    pub ctl: Ctl,
    #[serde(default = "default_included_url")]
    pub url_included: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum_included: String,
    #[serde(default = "default_removed_url")]
    pub url_removed: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub checksum_removed: String,
}

impl Default for MozillaCtl {
    fn default() -> Self {
        Self {
            ctl: Ctl::default(),
            url_included: default_included_url(),
            checksum_included: String::new(),
            url_removed: default_removed_url(),
            checksum_removed: String::new(),
        }
    }
}

fn default_included_url() -> String {
    MOZILLA_INCLUDED_CSV_URL.to_owned()
}

fn default_removed_url() -> String {
    MOZILLA_REMOVED_CSV_URL.to_owned()
}

impl MozillaCtl {
    /// Merge freshly fetched report bodies. Each source is checksum-gated
    /// on its own; byte-identical input is skipped without re-parsing.
    /// Nothing is committed until every changed source has parsed.
    pub fn ingest(&mut self, included: &[u8], removed: &[u8]) -> AppResult<()> {
        let checksum_included = sha256_hex(included);
        let checksum_removed = sha256_hex(removed);

        let new_trusted = if checksum_included != self.checksum_included {
            Some(parse_included(included)?)
        } else {
            debug!("mozilla included report unchanged, skipping re-parse");
            None
        };
        let new_removed = if checksum_removed != self.checksum_removed {
            Some(parse_removed(removed)?)
        } else {
            debug!("mozilla removed report unchanged, skipping re-parse");
            None
        };
        if new_trusted.is_none() && new_removed.is_none() {
            return Ok(());
        }

        if let Some(trusted) = new_trusted {
            info!("mozilla included report: {} trusted roots", trusted.len());
            self.ctl.trusted = trusted;
            self.checksum_included = checksum_included;
        }
        if let Some(removed_map) = new_removed {
            info!("mozilla removed report: {} removed roots", removed_map.len());
            self.ctl.removed = removed_map;
            self.checksum_removed = checksum_removed;
        }
        self.ctl.updated_at = Some(Utc::now());
        Ok(())
    }
}

impl TrustSource for MozillaCtl {
    fn name(&self) -> &'static str {
        "Mozilla NSS"
    }

    fn removal_reference(&self) -> &'static str {
        "https://ccadb-public.secure.force.com/mozilla/RemovedCACertificateReport"
    }

    async fn fetch(&mut self, fetcher: &Fetcher) -> AppResult<()> {
        let included = fetcher.get_bytes(&self.url_included).await?;
        let removed = fetcher.get_bytes(&self.url_removed).await?;
        self.ingest(&included, &removed)
    }

    fn verify<'a>(&self, certs: &'a [CertRecord], allow: &EntryMap) -> VerifyResult<'a> {
        self.ctl.verify(certs, allow)
    }
}

fn parse_included(body: &[u8]) -> AppResult<EntryMap> {
    let mut entries = EntryMap::new();
    for row in tabular::read_rows(body)? {
        let Some(hash) = row.get("SHA-256 Fingerprint") else {
            continue;
        };
        if hash.is_empty() {
            continue;
        }
        let name = row
            .get("Common Name or Certificate Name")
            .cloned()
            .unwrap_or_default();
        entries.insert(hash.clone(), name);
    }
    Ok(entries)
}

fn parse_removed(body: &[u8]) -> AppResult<EntryMap> {
    let mut entries = EntryMap::new();
    for row in tabular::read_rows(body)? {
        let Some(hash) = row.get("SHA-256 Fingerprint") else {
            continue;
        };
        if hash.is_empty() {
            continue;
        }
        let name = row.get("Root Certificate Name").cloned().unwrap_or_default();
        entries.insert(hash.clone(), name);
    }
    Ok(entries)
}
