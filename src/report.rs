use crate::{cert::CertRecord, ctl::VerifyResult};
use chrono::{DateTime, Utc};

const TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Render a classification result as a plain-text report. Trusted
/// certificates are only counted; the interesting classes get detail
/// sections.
pub fn render(vendor: &str, removal_reference: &str, result: &VerifyResult) -> String {
    let mut out = String::new();

    out.push_str(&format!("Summary ({vendor} trust list)\n"));
    out.push_str(&format!(
        "  {:>7} {:>7} {:>7} {:>7} {:>7}\n",
        "Total", "Trust", "Allow", "Removal", "Unknown"
    ));
    out.push_str(&format!(
        "  {:>7} {:>7} {:>7} {:>7} {:>7}\n",
        result.total,
        result.trusted.len(),
        result.allowed.len(),
        result.removed.len(),
        result.unknown.len()
    ));

    section(
        &mut out,
        "Allowed Certificates",
        "Accepted by the allow overrides in the cache file.",
        &result.allowed,
    );
    section(
        &mut out,
        "Removed Certificates",
        &format!("Use the SHA256 to find the removal reason in:\n{removal_reference}"),
        &result.removed,
    );
    section(&mut out, "Unknown Certificates", "", &result.unknown);

    out
}

fn section(out: &mut String, title: &str, desc: &str, certs: &[&CertRecord]) {
    if certs.is_empty() {
        return;
    }
    out.push_str(&format!("\n{}: {}\n", title, certs.len()));
    if !desc.is_empty() {
        out.push_str(desc);
        out.push('\n');
    }
    for cert in certs {
        write_cert(out, cert);
    }
}

fn write_cert(out: &mut String, cert: &CertRecord) {
    let subject = cert
        .subject_name()
        .unwrap_or_else(|| "(no common name)".to_owned());
    let issuer = cert
        .issuer_name()
        .unwrap_or_else(|| "(no common name)".to_owned());
    out.push_str(&format!("SHA256: {}\n", cert.checksum()));
    out.push_str(&format!("  Subject:    {subject}\n"));
    out.push_str(&format!("  Issuer:     {issuer}\n"));
    out.push_str(&format!(
        "  Valid from: {}\n",
        cert.not_before().format(TIME_FORMAT)
    ));
    out.push_str(&format!(
        "          to: {}{}\n",
        cert.not_after().format(TIME_FORMAT),
        expiry_marker(cert.not_after())
    ));
}

fn expiry_marker(not_after: DateTime<Utc>) -> &'static str {
    if not_after < Utc::now() {
        " (expired)"
    } else {
        ""
    }
}
