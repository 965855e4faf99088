use crate::{
    cli::Cli,
    configs::GlobalConfig,
    ctl::{EntryMap, TrustSource, Vendor},
    error::{AppError, ErrorReason},
    fetch::Fetcher,
    report,
    state::CachedState,
    store::CertStore,
};
use anyhow::{Context, Result as AnyResult};

pub struct App {
    args: Cli,
    config: GlobalConfig,
}

impl App {
    pub fn new(args: Cli, config: GlobalConfig) -> Self {
        Self { args, config }
    }

    pub async fn run(self) -> AnyResult<()> {
        let cache_file = self
            .args
            .cache_file
            .clone()
            .unwrap_or_else(|| self.config.cache_file.clone());
        let vendor = self.args.vendor.unwrap_or_else(Vendor::platform_default);
        info!("auditing against the {} trust list", vendor);

        // Read best-effort even for a live run, so vendor provenance and
        // the user's allow overrides carry over.
        let cached = CachedState::load(&cache_file)
            .with_context(|| format!("failed to read the cache file {}", cache_file.display()))?;
        let mut state = if self.args.offline {
            match cached {
                Some(state) => state,
                None => {
                    return Err(
                        AppError::from(ErrorReason::OfflineCacheMissing(cache_file)).into()
                    );
                }
            }
        } else {
            cached.unwrap_or_default()
        };

        let fetcher = if self.args.offline {
            None
        } else {
            Some(Fetcher::new(self.config.fetch_timeout)?)
        };

        let allow = state.allow.clone();
        match vendor {
            Vendor::Mozilla => {
                self.audit(&mut state.mozilla, &allow, fetcher.as_ref())
                    .await?
            }
            Vendor::Microsoft => {
                self.audit(&mut state.microsoft, &allow, fetcher.as_ref())
                    .await?
            }
            Vendor::Apple => {
                self.audit(&mut state.apple, &allow, fetcher.as_ref())
                    .await?
            }
        }

        if self.args.save && !self.args.offline {
            state.save(&cache_file).with_context(|| {
                format!("failed to write the cache file {}", cache_file.display())
            })?;
            info!("engine state saved to {}", cache_file.display());
        }
        Ok(())
    }

    async fn audit<S: TrustSource>(
        &self,
        source: &mut S,
        allow: &EntryMap,
        fetcher: Option<&Fetcher>,
    ) -> AnyResult<()> {
        if let Some(fetcher) = fetcher {
            source
                .fetch(fetcher)
                .await
                .with_context(|| format!("failed to ingest the {} trust list", source.name()))?;
        }

        let mut store = CertStore::new();
        let count = match &self.args.pem_bundle {
            Some(path) => {
                let buf = std::fs::read(path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                store
                    .add_pem_bundle(&buf)
                    .with_context(|| format!("failed to parse {}", path.display()))?
            }
            None => store
                .load_native_roots()
                .context("failed to load the system root certificates")?,
        };
        info!("{} local root certificates loaded", count);

        let result = source.verify(store.certs(), allow);
        print!(
            "{}",
            report::render(source.name(), source.removal_reference(), &result)
        );
        Ok(())
    }
}
