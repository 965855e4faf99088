#[cfg(feature = "backtrace")]
use backtrace::Backtrace;
use der::asn1::ObjectIdentifier;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use thiserror::Error;

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug)]
pub struct AppError {
    reason: ErrorReason,
    #[cfg(feature = "backtrace")]
    bt: Backtrace,
}

impl AppError {
    pub(crate) fn new(reason: ErrorReason) -> Self {
        Self {
            reason,
            #[cfg(feature = "backtrace")]
            bt: Backtrace::new(),
        }
    }

    pub fn reason(&self) -> &ErrorReason {
        &self.reason
    }
}

impl<E> From<E> for AppError
where
    E: Into<ErrorReason>,
{
    fn from(reason: E) -> Self {
        Self::new(reason.into())
    }
}

impl Display for AppError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{}", &self.reason)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.reason.source()
    }
}

#[derive(Debug, Error)]
pub enum ErrorReason {
    #[error("failed to load the configuration")]
    Config(#[from] config::ConfigError),
    #[error("IO error")]
    Io(#[from] std::io::Error),
    #[error("X509 certificate parsing error")]
    X509(#[from] x509_certificate::X509CertificateError),
    #[error("HTTP request failed")]
    Fetch(#[from] reqwest::Error),
    #[error("unexpected HTTP status {status} from {url}")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },
    #[error("malformed tabular data")]
    Csv(#[from] csv::Error),
    #[error("bad DER encoding")]
    Der(#[from] der::Error),
    #[error("expected a CMS SignedData envelope, got content type {0}")]
    NotSignedData(ObjectIdentifier),
    #[error("expected a certificate trust list payload, got content type {0}")]
    TrustListContentType(ObjectIdentifier),
    #[error("CMS envelope carries no encapsulated trust list content")]
    MissingTrustListContent,
    #[error("trust list subject usage is not the root list signer")]
    SubjectUsage,
    #[error("UTF-16 payload has an odd byte length")]
    OddUtf16Length,
    #[error("friendly name is not valid UTF-16")]
    Utf16,
    #[error("scrape failed: {0}")]
    Scrape(String),
    #[error("unrecognized date format: {0:?}")]
    DateFormat(String),
    #[error("failed to serialize or deserialize the cache document")]
    Persist(#[from] serde_yaml::Error),
    #[error("refusing to add an empty certificate to the store")]
    EmptyCertificate,
    #[error("offline mode requires a readable cache file at {}", .0.display())]
    OfflineCacheMissing(PathBuf),
}
