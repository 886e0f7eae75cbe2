use std::sync::Arc;
use std::time::Duration;

use models::{FormData, FormProgress, TrainingItem, WizardStep};
use tracing::{debug, info, instrument};

use super::autosave::{Autosave, DEFAULT_DEBOUNCE};
use super::machine::{WizardAction, WizardError, WizardEvent, WizardMachine};
use crate::progress_store::ProgressStore;
use crate::resume::{self, ResumeTokenRegistry, UrlOpener, DEFAULT_TTL_MINUTES};
use crate::validators::validate_email;

#[derive(Debug, Clone)]
pub struct WizardSettings {
    pub resume_ttl_minutes: u64,
    pub autosave_debounce: Duration,
    /// Checklist toggles on the training step are autosaved too.
    pub persist_training: bool,
}

impl Default for WizardSettings {
    fn default() -> Self {
        Self {
            resume_ttl_minutes: DEFAULT_TTL_MINUTES,
            autosave_debounce: DEFAULT_DEBOUNCE,
            persist_training: true,
        }
    }
}

/// Where the wizard state came from on mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountSource {
    Resumed,
    Restored,
    Fresh,
}

/// One signup session: current step and form plus the stores behind them.
pub struct SignupWizard {
    step: WizardStep,
    form: FormData,
    store: Arc<ProgressStore>,
    registry: Arc<ResumeTokenRegistry>,
    autosave: Autosave,
    settings: WizardSettings,
}

impl SignupWizard {
    pub fn new(store: Arc<ProgressStore>, registry: Arc<ResumeTokenRegistry>, settings: WizardSettings) -> Self {
        let autosave = Autosave::new(Arc::clone(&store), settings.autosave_debounce);
        Self {
            step: WizardStep::default(),
            form: FormData::default(),
            store,
            registry,
            autosave,
            settings,
        }
    }

    pub fn step(&self) -> WizardStep { self.step }

    pub fn form(&self) -> &FormData { &self.form }

    pub fn snapshot(&self) -> FormProgress { FormProgress::new(self.step, self.form.clone()) }

    pub fn step_label(&self) -> String { self.step.label() }

    pub fn autosave_pending(&self) -> bool { self.autosave.is_pending() }

    /// Hydrate from a resume token, then from stored progress, else start blank.
    /// A resume token is single-use and removed as soon as it is read.
    #[instrument(skip_all)]
    pub fn mount(&mut self, resume_token: Option<&str>) -> MountSource {
        if let Some(token) = resume_token.filter(|t| !t.is_empty()) {
            if let Some(progress) = self.registry.get_progress_by_token(token) {
                self.registry.remove_resume_token(token);
                self.apply(progress);
                self.schedule_autosave();
                info!(step = %self.step, "resumed from token");
                return MountSource::Resumed;
            }
            debug!("resume token invalid or expired");
        }
        if let Some(progress) = self.store.load_progress() {
            self.apply(progress);
            return MountSource::Restored;
        }
        self.apply(FormProgress::default());
        MountSource::Fresh
    }

    fn apply(&mut self, progress: FormProgress) {
        self.step = progress.step;
        self.form = progress.form;
    }

    fn schedule_autosave(&mut self) {
        self.autosave.schedule(self.snapshot());
    }

    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        self.fire(WizardEvent::Next)
    }

    pub fn back(&mut self) -> WizardStep {
        // Back has no guard
        self.fire(WizardEvent::Back).unwrap_or(self.step)
    }

    fn fire(&mut self, event: WizardEvent) -> Result<WizardStep, WizardError> {
        let (step, actions) = WizardMachine::transition(self.step, &self.form, event)?;
        let changed = step != self.step;
        self.step = step;
        if actions.contains(&WizardAction::ClearProgress) {
            self.autosave.cancel();
            self.store.clear_progress();
            info!("signup submitted, draft cleared");
        } else if changed {
            self.schedule_autosave();
        }
        Ok(self.step)
    }

    /// Edit the form in place. Ignored once the account has been submitted.
    pub fn update_form(&mut self, edit: impl FnOnce(&mut FormData)) {
        if !self.step.is_editable() {
            return;
        }
        edit(&mut self.form);
        self.schedule_autosave();
    }

    pub fn toggle_training(&mut self, item: TrainingItem) -> bool {
        let done = !self.form.training_done(item);
        self.form.set_training(item, done);
        if self.settings.persist_training {
            self.schedule_autosave();
        }
        done
    }

    /// Reload whatever the store holds, keeping the current state if nothing.
    pub fn resume_now(&mut self) -> bool {
        match self.store.load_progress() {
            Some(progress) => {
                self.autosave.cancel();
                self.apply(progress);
                true
            }
            None => false,
        }
    }

    /// Drop the draft and its version history and return to an empty form.
    pub fn start_over(&mut self) {
        self.autosave.cancel();
        self.store.clear_progress();
        self.store.clear_progress_versions();
        self.apply(FormProgress::default());
    }

    pub fn create_resume_link(&self) -> Option<String> {
        let token = self.registry.create_resume_token(&self.snapshot(), self.settings.resume_ttl_minutes)?;
        Some(self.registry.generate_resume_link(&token))
    }

    pub fn resume_sms_message(&self) -> Option<String> {
        self.create_resume_link().map(|link| resume::resume_sms_text(&link))
    }

    pub fn email_resume_link(&self, opener: &dyn UrlOpener) -> Result<(), WizardError> {
        if !validate_email(&self.form.email) {
            return Err(WizardError::InvalidResumeEmail);
        }
        let link = self.create_resume_link().ok_or(WizardError::ResumeUnavailable)?;
        if resume::send_resume_email(opener, &self.form.email, &link) {
            Ok(())
        } else {
            Err(WizardError::ResumeUnavailable)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{Clock, ManualClock};
    use crate::errors::ServiceError;
    use crate::resume::ResumeLinks;
    use crate::storage::{memory::MemoryStorage, StorageKeys};
    use std::sync::Mutex;

    struct Harness {
        storage: Arc<MemoryStorage>,
        store: Arc<ProgressStore>,
        registry: Arc<ResumeTokenRegistry>,
    }

    impl Harness {
        fn new() -> Self {
            let storage = Arc::new(MemoryStorage::new());
            let clock: Arc<dyn Clock> = Arc::new(ManualClock::default());
            let store = Arc::new(ProgressStore::new(storage.clone(), StorageKeys::default(), clock.clone()));
            let registry = Arc::new(ResumeTokenRegistry::new(
                storage.clone(),
                StorageKeys::default(),
                clock,
                ResumeLinks::new("https://faxinar.example", "/cadastro"),
            ));
            Self { storage, store, registry }
        }

        fn wizard(&self) -> SignupWizard {
            SignupWizard::new(self.store.clone(), self.registry.clone(), WizardSettings::default())
        }
    }

    fn fill_contact(f: &mut FormData) {
        f.full_name = "Ana Souza".into();
        f.email = "ana@example.com".into();
        f.phone = "(51) 98765-4321".into();
        f.cpf = "390.533.447-05".into();
        f.set_state("RS");
        f.city = "Porto Alegre".into();
    }

    #[derive(Default)]
    struct RecordingOpener(Mutex<Vec<String>>);

    impl UrlOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<(), ServiceError> {
            self.0.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }

    #[test]
    fn fresh_mount_starts_blank() {
        let h = Harness::new();
        let mut w = h.wizard();
        assert_eq!(w.mount(None), MountSource::Fresh);
        assert_eq!(w.step(), WizardStep::ContactInfo);
        assert_eq!(w.step_label(), "1 de 4");
    }

    #[test]
    fn blocked_next_keeps_step() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        assert_eq!(w.next(), Err(WizardError::IncompleteContactInfo));
        assert_eq!(w.step(), WizardStep::ContactInfo);
    }

    #[test]
    fn happy_path_clears_draft_on_submit() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        // no runtime here, so every change is written straight through
        w.update_form(fill_contact);
        assert_eq!(w.next(), Ok(WizardStep::EarningsInfo));
        assert_eq!(w.next(), Ok(WizardStep::ExampleEarnings));
        assert_eq!(w.next(), Ok(WizardStep::Credentials));
        assert_eq!(h.store.load_progress().unwrap().step, WizardStep::Credentials);

        w.update_form(|f| {
            f.password = "s3nha".into();
            f.password_confirm = "s3nha".into();
        });
        assert_eq!(w.next(), Err(WizardError::TermsNotAccepted));
        w.update_form(|f| f.terms = true);
        assert_eq!(w.next(), Ok(WizardStep::Training));
        assert!(h.store.load_progress().is_none());
        assert_eq!(w.step_label(), "Fase de Treinamento");

        // the form is frozen after submission
        w.update_form(|f| f.full_name = "changed".into());
        assert_eq!(w.form().full_name, "Ana Souza");
        assert_eq!(w.back(), WizardStep::Credentials);
    }

    #[test]
    fn mount_restores_stored_progress() {
        let h = Harness::new();
        let mut p = FormProgress::default();
        p.step = WizardStep::ExampleEarnings;
        p.form.full_name = "Bruna".into();
        h.store.save_progress(&p);

        let mut w = h.wizard();
        assert_eq!(w.mount(None), MountSource::Restored);
        assert_eq!(w.snapshot(), p);
    }

    #[test]
    fn resume_token_wins_and_is_single_use() {
        let h = Harness::new();
        let mut stored = FormProgress::default();
        stored.form.full_name = "local".into();
        h.store.save_progress(&stored);

        let mut shared = FormProgress::default();
        shared.step = WizardStep::Credentials;
        shared.form.full_name = "shared".into();
        let token = h.registry.create_resume_token(&shared, 60).unwrap();

        let mut w = h.wizard();
        assert_eq!(w.mount(Some(&token)), MountSource::Resumed);
        assert_eq!(w.step(), WizardStep::Credentials);
        assert_eq!(w.form().full_name, "shared");
        assert!(h.registry.get_progress_by_token(&token).is_none());

        let mut again = h.wizard();
        assert_eq!(again.mount(Some(&token)), MountSource::Restored);
    }

    #[test]
    fn unknown_token_falls_back() {
        let h = Harness::new();
        let mut w = h.wizard();
        assert_eq!(w.mount(Some("zzzzzzzz")), MountSource::Fresh);
    }

    #[test]
    fn start_over_and_resume_now() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        w.update_form(fill_contact);
        w.next().unwrap();
        assert!(w.resume_now());
        assert_eq!(w.step(), WizardStep::EarningsInfo);
        assert!(!h.store.list_progress_versions().is_empty());

        w.start_over();
        assert_eq!(w.step(), WizardStep::ContactInfo);
        assert!(w.form().full_name.is_empty());
        assert!(h.store.load_progress().is_none());
        assert!(h.store.list_progress_versions().is_empty());
        assert!(!w.resume_now());
    }

    #[test]
    fn toggle_training_flips() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        assert!(w.toggle_training(TrainingItem::Photo));
        assert!(w.form().training_done(TrainingItem::Photo));
        assert!(!w.toggle_training(TrainingItem::Photo));
    }

    #[test]
    fn resume_link_and_email() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        let opener = RecordingOpener::default();
        assert_eq!(w.email_resume_link(&opener), Err(WizardError::InvalidResumeEmail));

        w.update_form(fill_contact);
        let link = w.create_resume_link().unwrap();
        assert!(link.starts_with("https://faxinar.example/cadastro?resume="));
        assert!(w.resume_sms_message().unwrap().contains("?resume="));

        assert_eq!(w.email_resume_link(&opener), Ok(()));
        let opened = opener.0.lock().unwrap();
        assert!(opened[0].starts_with("mailto:ana@example.com?"));
    }

    #[test]
    fn resume_link_fails_without_storage() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        w.update_form(fill_contact);
        h.storage.set_available(false);
        assert!(w.create_resume_link().is_none());
        assert_eq!(w.email_resume_link(&RecordingOpener::default()), Err(WizardError::ResumeUnavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn submit_cancels_pending_autosave() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        w.update_form(fill_contact);
        w.update_form(|f| {
            f.password = "x".into();
            f.password_confirm = "x".into();
            f.terms = true;
        });
        for _ in 0..3 {
            w.next().unwrap();
        }
        assert!(w.autosave_pending());
        assert_eq!(w.next(), Ok(WizardStep::Training));
        assert!(!w.autosave_pending());
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(h.store.load_progress().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn edits_are_debounced() {
        let h = Harness::new();
        let mut w = h.wizard();
        w.mount(None);
        w.update_form(|f| f.full_name = "A".into());
        w.update_form(|f| f.full_name = "Ana".into());
        assert!(h.store.load_progress().is_none());
        tokio::time::sleep(Duration::from_millis(300)).await;
        while w.autosave_pending() {
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        assert_eq!(h.store.load_progress().unwrap().form.full_name, "Ana");
        assert!(h.store.list_progress_versions().is_empty());
    }
}
