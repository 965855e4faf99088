use crate::{
    authroot,
    cert::{sha256_hex, CertRecord},
    ctl::{Ctl, EntryMap, TrustSource, VerifyResult},
    error::AppResult,
    fetch::Fetcher,
    tabular,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

pub const MICROSOFT_CCADB_CSV_URL: &str =
    "https://ccadb-public.secure.force.com/microsoft/IncludedCACertificateReportForMSFTCSV";
pub const MICROSOFT_AUTHROOT_STL_URL: &str =
    "http://ctldl.windowsupdate.com/msdownload/update/v3/static/trustedr/en/authroot.stl";

/// Roots shipped with the OS that appear in neither the CCADB report nor
/// authroot.stl.
/// https://docs.microsoft.com/en-us/troubleshoot/windows-server/identity/trusted-root-certificates-are-required
const OS_BUILTIN_ROOTS: [(&str, &str); 2] = [
    (
        "4898B1749717A594A2030F47C83C272BD14BAE3DCEB2EAE382174EF2EC1C75C9",
        "Microsoft Authenticode(tm) Root Authority",
    ),
    (
        "6EF914723F089D2ADAFF98D470A3651CCF1768E559FBDCC0FAAA640AA12E5753",
        "Microsoft Timestamp Root",
    ),
];

/// CCADB rows carrying these names are documentation placeholders, not
/// certificates.
const PLACEHOLDER_NAMES: [&str; 2] = ["Example Root Case", "Example Root Certificate"];

/// Microsoft's trusted root program: the CCADB report is the primary
/// source, the signed authroot.stl supplements it.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct MicrosoftCtl {
    #[serde(flatten)]
    pub ctl: Ctl,
    #[serde(default = "default_ccadb_url")]
    pub ccadb_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub ccadb_checksum: String,
    #[serde(default = "default_authroot_url")]
    pub authroot_url: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub authroot_checksum: String,
}

impl Default for MicrosoftCtl {
    fn default() -> Self {
        Self {
            ctl: Ctl::default(),
            ccadb_url: default_ccadb_url(),
            ccadb_checksum: String::new(),
            authroot_url: default_authroot_url(),
            authroot_checksum: String::new(),
        }
    }
}

fn default_ccadb_url() -> String {
    MICROSOFT_CCADB_CSV_URL.to_owned()
}

fn default_authroot_url() -> String {
    MICROSOFT_AUTHROOT_STL_URL.to_owned()
}

impl MicrosoftCtl {
    /// Merge freshly fetched source bodies. When both checksums match the
    /// stored provenance the call is a no-op. The two sources feed one
    /// merged mapping, so a change in either re-parses both, and the
    /// result replaces the previous state in one step.
    pub fn ingest(&mut self, ccadb: &[u8], stl: &[u8]) -> AppResult<()> {
        let ccadb_checksum = sha256_hex(ccadb);
        let authroot_checksum = sha256_hex(stl);
        if ccadb_checksum == self.ccadb_checksum && authroot_checksum == self.authroot_checksum {
            debug!("microsoft sources unchanged, skipping re-parse");
            return Ok(());
        }

        let (mut trusted, removed) = classify_ccadb(ccadb)?;
        info!(
            "microsoft ccadb report: {} trusted, {} removed roots",
            trusted.len(),
            removed.len()
        );

        let supplement = authroot::parse(stl)?;
        info!("authroot.stl: {} subjects", supplement.len());
        for (hash, name) in supplement {
            // The curated report outranks the binary list: a root the CSV
            // removed stays removed even while authroot.stl still carries it.
            if removed.contains_key(&hash) {
                continue;
            }
            trusted.insert(hash, name);
        }

        for (hash, name) in OS_BUILTIN_ROOTS {
            trusted.insert(hash.to_owned(), name.to_owned());
        }

        self.ctl.trusted = trusted;
        self.ctl.removed = removed;
        self.ccadb_checksum = ccadb_checksum;
        self.authroot_checksum = authroot_checksum;
        self.ctl.updated_at = Some(Utc::now());
        Ok(())
    }
}

impl TrustSource for MicrosoftCtl {
    fn name(&self) -> &'static str {
        "Microsoft"
    }

    fn removal_reference(&self) -> &'static str {
        "https://ccadb-public.secure.force.com/microsoft/IncludedCACertificateReportForMSFT"
    }

    async fn fetch(&mut self, fetcher: &Fetcher) -> AppResult<()> {
        let ccadb = fetcher.get_bytes(&self.ccadb_url).await?;
        let stl = fetcher.get_bytes(&self.authroot_url).await?;
        self.ingest(&ccadb, &stl)
    }

    fn verify<'a>(&self, certs: &'a [CertRecord], allow: &EntryMap) -> VerifyResult<'a> {
        self.ctl.verify(certs, allow)
    }
}

/// Split the CCADB report into trusted and removed mappings.
///
/// `NotBefore` marks a deprecation transition that caps new issuance; the
/// root itself stays trusted until its status moves on, so it lands in the
/// trusted half alongside `Included`.
/// https://docs.microsoft.com/en-us/security/trusted-root/deprecation
fn classify_ccadb(body: &[u8]) -> AppResult<(EntryMap, EntryMap)> {
    let mut trusted = EntryMap::new();
    let mut removed = EntryMap::new();
    for row in tabular::read_rows(body)? {
        let name = row
            .get("CA Common Name or Certificate Name")
            .cloned()
            .unwrap_or_default();
        if name.is_empty() || PLACEHOLDER_NAMES.contains(&name.as_str()) {
            continue;
        }
        let Some(hash) = row.get("SHA-256 Fingerprint") else {
            continue;
        };
        if hash.is_empty() {
            continue;
        }
        match row.get("Microsoft Status").map(String::as_str) {
            Some("Included") | Some("NotBefore") => {
                trusted.insert(hash.clone(), name);
            }
            _ => {
                removed.insert(hash.clone(), name);
            }
        }
    }
    Ok((trusted, removed))
}
