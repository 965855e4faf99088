use crate::ctl::Vendor;
use clap::Parser;
use std::path::PathBuf;

/// Audit the local root certificate store against a vendor-published
/// certificate trust list.
#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Classify against the cached trust list instead of fetching.
    #[arg(long)]
    pub offline: bool,

    /// Persist the refreshed trust list state back to the cache file.
    #[arg(long)]
    pub save: bool,

    /// Trust list vendor to audit against; defaults to the platform's.
    #[arg(long, value_enum)]
    pub vendor: Option<Vendor>,

    /// Cache file location, overriding the configuration.
    #[arg(long, value_name = "PATH")]
    pub cache_file: Option<PathBuf>,

    /// Audit a PEM certificate bundle instead of the platform root store.
    #[arg(long, value_name = "PATH")]
    pub pem_bundle: Option<PathBuf>,
}
