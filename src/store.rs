use crate::{
    cert::{sha256_digest, CertRecord},
    error::{AppResult, ErrorReason},
};
use std::collections::HashSet;
use x509_certificate::X509Certificate;

/// Deduplicated set of local root certificates, keyed by the SHA-256 of
/// their raw DER bytes. Records are only ever appended.
#[derive(Clone, Debug, Default)]
pub struct CertStore {
    certs: Vec<CertRecord>,
    seen: HashSet<[u8; 32]>,
}

impl CertStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one DER-encoded certificate. Re-adding a certificate already in
    /// the store is a no-op.
    pub fn add_cert(&mut self, raw: Vec<u8>) -> AppResult<()> {
        if raw.is_empty() {
            return Err(ErrorReason::EmptyCertificate.into());
        }
        let digest = sha256_digest(&raw);
        if self.seen.contains(&digest) {
            return Ok(());
        }
        let record = CertRecord::from_der(raw)?;
        self.seen.insert(digest);
        self.certs.push(record);
        Ok(())
    }

    pub fn contains(&self, raw: &[u8]) -> bool {
        self.seen.contains(&sha256_digest(raw))
    }

    /// Parse a PEM concatenation (e.g. `/etc/ssl/cert.pem`) and add every
    /// certificate in it. Returns the number of records added.
    pub fn add_pem_bundle(&mut self, buf: &[u8]) -> AppResult<usize> {
        let before = self.certs.len();
        for cert in X509Certificate::from_pem_multiple(buf)? {
            self.add_cert(cert.encode_der()?)?;
        }
        Ok(self.certs.len() - before)
    }

    /// Populate the store from the platform root store. Certificates the
    /// parser rejects are skipped, not fatal.
    pub fn load_native_roots(&mut self) -> AppResult<usize> {
        let before = self.certs.len();
        for der in rustls_native_certs::load_native_certs().map_err(ErrorReason::Io)? {
            if let Err(err) = self.add_cert(der.as_ref().to_vec()) {
                warn!("skipping an unparseable root certificate: {}", err);
            }
        }
        Ok(self.certs.len() - before)
    }

    pub fn certs(&self) -> &[CertRecord] {
        &self.certs
    }

    pub fn len(&self) -> usize {
        self.certs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.certs.is_empty()
    }
}
