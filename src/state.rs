use crate::{
    ctl::{AppleCtl, EntryMap, MicrosoftCtl, MozillaCtl},
    error::AppResult,
};
use serde::{Deserialize, Serialize};
use std::{fs, io::ErrorKind, path::Path};

/// Engine state persisted between runs: every vendor's trust list with
/// its provenance, plus the user's allow overrides. Stored as one YAML
/// document so overrides can be edited by hand.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct CachedState {
    #[serde(default)]
    pub mozilla: MozillaCtl,
    #[serde(default)]
    pub microsoft: MicrosoftCtl,
    #[serde(default)]
    pub apple: AppleCtl,
    #[serde(default, skip_serializing_if = "EntryMap::is_empty")]
    pub allow: EntryMap,
}

impl CachedState {
    /// Best-effort reload: a missing file is not an error, only an absent
    /// state.
    pub fn load(path: &Path) -> AppResult<Option<Self>> {
        let data = match fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        let state = serde_yaml::from_str(&data)?;
        debug!("reloaded engine state from {}", path.display());
        Ok(Some(state))
    }

    pub fn save(&self, path: &Path) -> AppResult<()> {
        let data = serde_yaml::to_string(self)?;
        fs::write(path, data)?;
        debug!("saved engine state to {}", path.display());
        Ok(())
    }
}
