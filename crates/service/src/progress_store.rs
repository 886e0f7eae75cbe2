//! Current wizard progress plus a newest-first version history.
//!
//! Every public operation is best-effort: storage failures are logged and
//! reported as `false`/`None`/empty, never propagated. A host without working
//! storage keeps its in-memory wizard and just loses autosave.

use std::sync::Arc;

use models::{FormProgress, ProgressVersion};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::clock::Clock;
use crate::errors::StorageError;
use crate::storage::{read_json, write_json, KeyValueStorage, StorageKeys};

/// History cap.
pub const MAX_VERSIONS: usize = 20;

pub struct ProgressStore {
    storage: Arc<dyn KeyValueStorage>,
    keys: StorageKeys,
    clock: Arc<dyn Clock>,
}

impl ProgressStore {
    pub fn new(storage: Arc<dyn KeyValueStorage>, keys: StorageKeys, clock: Arc<dyn Clock>) -> Self {
        Self { storage, keys, clock }
    }

    /// Replace current progress, pushing the previous value onto history first.
    ///
    /// # Examples
    /// ```
    /// use std::sync::Arc;
    /// use models::{FormProgress, WizardStep};
    /// use service::{clock::SystemClock, progress_store::ProgressStore};
    /// use service::storage::{memory::MemoryStorage, StorageKeys};
    ///
    /// let store = ProgressStore::new(Arc::new(MemoryStorage::new()), StorageKeys::default(), Arc::new(SystemClock));
    /// let mut progress = FormProgress::default();
    /// progress.step = WizardStep::EarningsInfo;
    /// progress.form.full_name = "Ana".into();
    /// assert!(store.save_progress(&progress));
    /// assert_eq!(store.load_progress(), Some(progress));
    /// ```
    #[instrument(skip(self, data), fields(step = %data.step))]
    pub fn save_progress(&self, data: &FormProgress) -> bool {
        match self.try_save(data) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "save_progress failed");
                false
            }
        }
    }

    fn try_save(&self, data: &FormProgress) -> Result<(), StorageError> {
        if let Some(previous) = self.try_load()? {
            // history is secondary; losing a version must not block the save
            if let Err(e) = self.push_version(previous) {
                warn!(error = %e, "could not record progress version");
            }
        }
        write_json(self.storage.as_ref(), &self.keys.progress, data)
    }

    pub fn load_progress(&self) -> Option<FormProgress> {
        match self.try_load() {
            Ok(p) => p,
            Err(e) => {
                debug!(error = %e, "load_progress returned nothing");
                None
            }
        }
    }

    fn try_load(&self) -> Result<Option<FormProgress>, StorageError> {
        match read_json(self.storage.as_ref(), &self.keys.progress) {
            // a corrupt snapshot is treated as no snapshot
            Err(StorageError::Corrupt { .. }) => Ok(None),
            other => other,
        }
    }

    /// Remove current progress; history is untouched.
    pub fn clear_progress(&self) -> bool {
        match self.storage.remove(&self.keys.progress) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "clear_progress failed");
                false
            }
        }
    }

    /// Drop the version history.
    pub fn clear_progress_versions(&self) -> bool {
        match self.storage.remove(&self.keys.versions) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "clear_progress_versions failed");
                false
            }
        }
    }

    /// Newest first.
    pub fn list_progress_versions(&self) -> Vec<ProgressVersion> {
        self.try_list().unwrap_or_else(|e| {
            debug!(error = %e, "list_progress_versions returned nothing");
            Vec::new()
        })
    }

    fn try_list(&self) -> Result<Vec<ProgressVersion>, StorageError> {
        Ok(read_json(self.storage.as_ref(), &self.keys.versions)?.unwrap_or_default())
    }

    pub fn get_progress_version(&self, id: &str) -> Option<ProgressVersion> {
        self.list_progress_versions().into_iter().find(|v| v.id == id)
    }

    /// Promote a historical version to current. The progress it replaces is
    /// pushed onto history, same as [`ProgressStore::save_progress`].
    #[instrument(skip(self))]
    pub fn restore_progress_version(&self, id: &str) -> bool {
        let Some(version) = self.get_progress_version(id) else {
            debug!("unknown progress version");
            return false;
        };
        match self.try_save(&version.data) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "restore_progress_version failed");
                false
            }
        }
    }

    fn push_version(&self, data: FormProgress) -> Result<(), StorageError> {
        let mut versions = match self.try_list() {
            Ok(v) => v,
            Err(StorageError::Corrupt { reason, .. }) => {
                warn!(%reason, "corrupt version history, starting over");
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        versions.insert(
            0,
            ProgressVersion { id: Uuid::new_v4().simple().to_string(), at: self.clock.now(), data },
        );
        versions.truncate(MAX_VERSIONS);
        write_json(self.storage.as_ref(), &self.keys.versions, &versions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::memory::MemoryStorage;
    use models::WizardStep;

    fn setup() -> (Arc<MemoryStorage>, ProgressStore) {
        let storage = Arc::new(MemoryStorage::new());
        let store = ProgressStore::new(storage.clone(), StorageKeys::default(), Arc::new(ManualClock::default()));
        (storage, store)
    }

    fn progress(step: WizardStep, name: &str) -> FormProgress {
        let mut p = FormProgress::default();
        p.step = step;
        p.form.full_name = name.into();
        p
    }

    #[test]
    fn save_then_load_round_trips() {
        let (_, store) = setup();
        let p = progress(WizardStep::EarningsInfo, "Ana");
        assert!(store.save_progress(&p));
        assert_eq!(store.load_progress(), Some(p));
        // first save has nothing to version
        assert!(store.list_progress_versions().is_empty());
    }

    #[test]
    fn overwrite_pushes_previous_newest_first() {
        let (_, store) = setup();
        store.save_progress(&progress(WizardStep::ContactInfo, "a"));
        store.save_progress(&progress(WizardStep::EarningsInfo, "b"));
        store.save_progress(&progress(WizardStep::ExampleEarnings, "c"));
        let versions = store.list_progress_versions();
        assert_eq!(versions.len(), 2);
        assert_eq!(versions[0].data.form.full_name, "b");
        assert_eq!(versions[1].data.form.full_name, "a");
    }

    #[test]
    fn history_is_capped() {
        let (_, store) = setup();
        for i in 0..50 {
            store.save_progress(&progress(WizardStep::ContactInfo, &format!("n{i}")));
            assert!(store.list_progress_versions().len() <= MAX_VERSIONS);
        }
        let versions = store.list_progress_versions();
        assert_eq!(versions.len(), MAX_VERSIONS);
        assert_eq!(versions[0].data.form.full_name, "n48");
    }

    #[test]
    fn identical_resave_still_rotates_history() {
        let (_, store) = setup();
        let p = progress(WizardStep::ContactInfo, "same");
        store.save_progress(&p);
        store.save_progress(&p);
        assert_eq!(store.load_progress(), Some(p.clone()));
        assert_eq!(store.list_progress_versions().len(), 1);
    }

    #[test]
    fn clear_keeps_history() {
        let (_, store) = setup();
        store.save_progress(&progress(WizardStep::ContactInfo, "a"));
        store.save_progress(&progress(WizardStep::ContactInfo, "b"));
        assert!(store.clear_progress());
        assert!(store.load_progress().is_none());
        assert_eq!(store.list_progress_versions().len(), 1);
        assert!(store.clear_progress_versions());
        assert!(store.list_progress_versions().is_empty());
    }

    #[test]
    fn restore_promotes_and_pushes_current() {
        let (_, store) = setup();
        store.save_progress(&progress(WizardStep::ContactInfo, "old"));
        store.save_progress(&progress(WizardStep::Credentials, "current"));
        let old = store.list_progress_versions()[0].clone();
        assert_eq!(old.data.form.full_name, "old");

        assert!(store.restore_progress_version(&old.id));
        assert_eq!(store.load_progress(), Some(old.data.clone()));
        let versions = store.list_progress_versions();
        assert_eq!(versions[0].data.form.full_name, "current");
        assert_eq!(store.get_progress_version(&old.id), Some(old));
    }

    #[test]
    fn restore_unknown_id_is_false() {
        let (_, store) = setup();
        assert!(!store.restore_progress_version("nope"));
        assert!(store.get_progress_version("nope").is_none());
    }

    #[test]
    fn storage_failures_degrade() {
        let (storage, store) = setup();
        store.save_progress(&progress(WizardStep::ContactInfo, "kept"));
        storage.set_available(false);
        assert!(!store.save_progress(&progress(WizardStep::ContactInfo, "lost")));
        assert!(store.load_progress().is_none());
        assert!(store.list_progress_versions().is_empty());
        assert!(!store.clear_progress());
        storage.set_available(true);
        assert_eq!(store.load_progress().unwrap().form.full_name, "kept");
    }

    #[test]
    fn corrupt_current_loads_as_absent() {
        let (storage, store) = setup();
        storage.set("leidy.signup.v1", "{oops").unwrap();
        assert!(store.load_progress().is_none());
        // saving over a corrupt snapshot works and records no version
        assert!(store.save_progress(&progress(WizardStep::ContactInfo, "fresh")));
        assert!(store.list_progress_versions().is_empty());
    }
}
