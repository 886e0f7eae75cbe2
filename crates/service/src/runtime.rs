//! Startup helpers shared by the binaries.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::clock::{Clock, SystemClock};
use crate::errors::StorageError;
use crate::progress_store::ProgressStore;
use crate::resume::{ResumeLinks, ResumeTokenRegistry};
use crate::storage::{json_file::JsonFileStorage, KeyValueStorage, StorageKeys};
use crate::wizard::{SignupWizard, WizardSettings};

/// Ensure expected directories exist; warn on missing optional ones.
pub async fn ensure_env(frontend_dir: &str, data_dir: &str) -> anyhow::Result<()> {
    common::env::ensure_env(frontend_dir, data_dir).await
}

/// Progress store and resume registry over one storage backend, plus the
/// settings new wizards are created with.
#[derive(Clone)]
pub struct SignupStores {
    pub progress: Arc<ProgressStore>,
    pub registry: Arc<ResumeTokenRegistry>,
    pub settings: WizardSettings,
}

impl SignupStores {
    pub fn new(storage: Arc<dyn KeyValueStorage>, namespace: Option<&str>, links: ResumeLinks) -> Self {
        let keys = StorageKeys::new(namespace);
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        Self {
            progress: Arc::new(ProgressStore::new(storage.clone(), keys.clone(), clock.clone())),
            registry: Arc::new(ResumeTokenRegistry::new(storage, keys, clock, links)),
            settings: WizardSettings::default(),
        }
    }

    pub fn with_settings(mut self, settings: WizardSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Open a JSON file store and drop resume tokens that expired while down.
    pub fn open_file(path: &Path, namespace: Option<&str>, links: ResumeLinks) -> Result<Self, StorageError> {
        let storage = Arc::new(JsonFileStorage::open(path)?);
        let stores = Self::new(storage, namespace, links);
        let purged = stores.registry.purge_expired();
        info!(path = %path.display(), purged, "signup storage ready");
        Ok(stores)
    }

    pub fn wizard(&self) -> SignupWizard {
        SignupWizard::new(self.progress.clone(), self.registry.clone(), self.settings.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wizard::MountSource;
    use models::FormProgress;

    #[test]
    fn file_stores_share_state_across_reopen() -> Result<(), anyhow::Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("signup.json");
        let links = ResumeLinks::new("http://127.0.0.1:4001", "/cadastro");

        let stores = SignupStores::open_file(&path, Some("t1"), links.clone())?;
        let mut p = FormProgress::default();
        p.form.full_name = "Ana".into();
        assert!(stores.progress.save_progress(&p));
        drop(stores);

        let reopened = SignupStores::open_file(&path, Some("t1"), links.clone())?;
        let mut wizard = reopened.wizard();
        assert_eq!(wizard.mount(None), MountSource::Restored);
        assert_eq!(wizard.form().full_name, "Ana");

        // another namespace sees nothing
        let other = SignupStores::open_file(&path, Some("t2"), links)?.with_settings(WizardSettings {
            resume_ttl_minutes: 5,
            ..WizardSettings::default()
        });
        assert!(other.progress.load_progress().is_none());
        assert_eq!(other.wizard().mount(None), MountSource::Fresh);
        assert_eq!(other.settings.resume_ttl_minutes, 5);
        Ok(())
    }
}
