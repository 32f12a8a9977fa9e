//! Client-side session/profile state machine.
//!
//! Walks a visitor from anonymous through role selection, sign-in and
//! profile setup to the dashboard, or diverts to a read-only public profile
//! when the page URL names one. State lives in [`OrchestratorState`]; this
//! module drives the async collaborator calls around it.

pub mod forms;
pub mod header_images;
pub mod public;
pub mod state;

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::{AppError, ProviderError};
use crate::models::{Credential, Partner, ProfilePatch, Screen, SessionEvent, Status, SubType};
use crate::services::auth::AuthProvider;
use crate::services::profiles::ProfileRepository;
use crate::services::rows::RowStore;
use crate::services::storage::{ObjectStorage, UploadFile};

pub use forms::{ProfileDraft, SignInForm, SignUpForm};
pub use header_images::HeaderImagePool;
pub use state::{OrchestratorState, PublicProfile, RequestTicket, RetryStep, Routing};

pub const UPDATE_FAILED_NOTICE: &str = "Failed to update profile. Please try again.";

#[derive(Debug, Clone)]
pub struct Settings {
    pub missing_config: Vec<Credential>,
    pub header_images: HeaderImagePool,
    pub public_base_url: String,
    pub request_timeout: Duration,
}

impl Settings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            missing_config: config.missing_credentials(),
            header_images: HeaderImagePool::default(),
            public_base_url: config.public_base_url.clone(),
            request_timeout: config.request_timeout(),
        }
    }
}

/// What the front end renders: the screen plus any pending user notice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    #[serde(flatten)]
    pub screen: Screen,
    pub notice: Option<String>,
}

/// A profile fetch queued by a session change, bound to that session.
#[derive(Debug, Clone)]
pub struct ProfileLoad {
    ticket: RequestTicket,
    create_with: Option<SubType>,
}

pub struct Orchestrator {
    state: Mutex<OrchestratorState>,
    auth: Arc<dyn AuthProvider>,
    profiles: ProfileRepository,
    storage: Arc<dyn ObjectStorage>,
    settings: Settings,
    screens: broadcast::Sender<Screen>,
    /// Held for the whole of a dashboard write so a revert only undoes its own patch.
    writes: Mutex<()>,
}

fn user_message(err: &ProviderError) -> String {
    match err {
        ProviderError::Timeout => {
            "The request timed out. Check your connection and try again.".to_string()
        }
        ProviderError::Connection(msg) => format!("Could not connect to the server: {msg}"),
        ProviderError::Rejected(msg) => msg.clone(),
        ProviderError::NotFound => "The requested record was not found.".to_string(),
    }
}

impl Orchestrator {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        rows: Arc<dyn RowStore>,
        storage: Arc<dyn ObjectStorage>,
        settings: Settings,
    ) -> Self {
        let (screens, _) = broadcast::channel(64);
        Self {
            state: Mutex::new(OrchestratorState::new(settings.missing_config.clone())),
            auth,
            profiles: ProfileRepository::new(rows),
            storage,
            settings,
            screens,
            writes: Mutex::new(()),
        }
    }

    pub async fn screen(&self) -> Screen {
        self.state.lock().await.screen()
    }

    pub async fn view(&self) -> View {
        let state = self.state.lock().await;
        View {
            screen: state.screen(),
            notice: state.notice.clone(),
        }
    }

    pub async fn snapshot(&self) -> OrchestratorState {
        self.state.lock().await.clone()
    }

    /// Screen changes, one message per transition.
    pub fn subscribe_screens(&self) -> broadcast::Receiver<Screen> {
        self.screens.subscribe()
    }

    fn is_configured(&self) -> bool {
        self.settings.missing_config.is_empty()
    }

    fn ensure_configured(&self) -> Result<(), AppError> {
        if self.is_configured() {
            return Ok(());
        }
        Err(AppError::Config(format!(
            "missing credentials: {:?}",
            self.settings.missing_config
        )))
    }

    async fn mutate<R>(&self, f: impl FnOnce(&mut OrchestratorState) -> R) -> R {
        let mut state = self.state.lock().await;
        let before = state.screen();
        let out = f(&mut state);
        let after = state.screen();
        if after != before {
            tracing::debug!(screen = after.name(), "screen changed");
            let _ = self.screens.send(after);
        }
        out
    }

    async fn call<T>(
        &self,
        fut: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.settings.request_timeout, fut)
            .await
            .unwrap_or(Err(ProviderError::Timeout))
    }

    // ── Routing ──

    /// Entry point: decides between the public view and session bootstrap.
    pub async fn mount(&self, page_url: &str) {
        if !self.is_configured() {
            tracing::warn!(missing = ?self.settings.missing_config, "configuration missing");
            return;
        }

        if let Some(profile_id) = public::public_target(page_url) {
            tracing::info!(profile_id = %profile_id, "entering public profile view");
            self.mutate(|s| {
                s.routing = Routing::PublicView {
                    target: profile_id,
                    profile: PublicProfile::Pending,
                };
            })
            .await;
            self.load_public_profile().await;
            return;
        }

        self.bootstrap_session().await;
    }

    async fn bootstrap_session(&self) {
        if !self.is_configured() {
            return;
        }
        let issued = self
            .mutate(|s| {
                if s.is_public_view() {
                    return None;
                }
                s.loading = true;
                s.last_error = None;
                Some(s.ticket())
            })
            .await;
        let Some(issued) = issued else {
            return;
        };

        match self.call(self.auth.current_session()).await {
            Err(e) => {
                tracing::warn!(error = %e, "failed to get current session");
                self.mutate(|s| {
                    if s.is_current(&issued) {
                        s.fail(RetryStep::Session, user_message(&e));
                    }
                })
                .await;
            }
            Ok(session) => {
                let load = self
                    .mutate(|s| {
                        if !s.is_current(&issued) {
                            // a session notification already superseded this lookup
                            return None;
                        }
                        let ticket = s.replace_session(session);
                        tracing::info!(user_id = ?ticket.user_id, "session restored");
                        ticket.user_id.is_some().then_some(ProfileLoad {
                            ticket,
                            create_with: None,
                        })
                    })
                    .await;
                if let Some(load) = load {
                    self.run_profile_load(load).await;
                }
            }
        }
    }

    /// Applies a session notification and returns the profile fetch it calls for.
    pub async fn apply_session_change(&self, event: &SessionEvent) -> Option<ProfileLoad> {
        if !self.is_configured() {
            return None;
        }
        self.mutate(|s| {
            let ticket = s.replace_session(event.session.clone());
            tracing::info!(kind = ?event.kind, user_id = ?ticket.user_id, "session changed");
            if s.is_public_view() {
                return None;
            }
            ticket.user_id.as_ref()?;
            let create_with = if event.is_fresh_sign_in() {
                s.pending_role.take()
            } else {
                None
            };
            Some(ProfileLoad {
                ticket,
                create_with,
            })
        })
        .await
    }

    pub async fn handle_session_change(&self, event: SessionEvent) {
        if let Some(load) = self.apply_session_change(&event).await {
            self.run_profile_load(load).await;
        }
    }

    /// Feeds auth notifications into the state machine for the orchestrator's
    /// lifetime. Profile fetches run on their own tasks so a slow fetch never
    /// delays the next notification.
    pub fn spawn_session_listener(self: &Arc<Self>) -> JoinHandle<()> {
        let mut events = self.auth.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => {
                        if let Some(load) = this.apply_session_change(&event).await {
                            let worker = Arc::clone(&this);
                            tokio::spawn(async move { worker.run_profile_load(load).await });
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "missed session events, resynchronising");
                        this.bootstrap_session().await;
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        tracing::info!("session event stream closed");
                        break;
                    }
                }
            }
        })
    }

    pub async fn run_profile_load(&self, load: ProfileLoad) {
        let ProfileLoad {
            ticket,
            create_with,
        } = load;
        let Some(user_id) = ticket.user_id.clone() else {
            return;
        };

        match self.call(self.profiles.fetch(&user_id)).await {
            Ok(Some(profile)) => {
                self.mutate(|s| {
                    if !s.is_current(&ticket) {
                        tracing::debug!(user_id = %user_id, "discarding stale profile fetch");
                        return;
                    }
                    tracing::info!(
                        user_id = %user_id,
                        sub_type = profile.sub_type.as_str(),
                        "profile loaded"
                    );
                    s.profile = Some(profile);
                    s.needs_setup = false;
                    s.loading = false;
                })
                .await;
            }
            Ok(None) => match create_with {
                Some(role) => {
                    // failure is already surfaced through the notice
                    let _ = self.create_profile(&ticket, role).await;
                }
                None => {
                    self.mutate(|s| {
                        if s.is_current(&ticket) {
                            tracing::info!(user_id = %user_id, "no profile yet, needs setup");
                            s.needs_setup = true;
                            s.loading = false;
                        }
                    })
                    .await;
                }
            },
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "failed to fetch profile");
                self.mutate(|s| {
                    if s.is_current(&ticket) {
                        s.fail(RetryStep::Profile { create_with }, user_message(&e));
                    }
                })
                .await;
            }
        }
    }

    // ── Onboarding ──

    pub async fn select_role(&self, role: SubType) -> Result<(), AppError> {
        self.ensure_configured()?;
        self.mutate(|s| {
            if s.is_public_view() {
                return Err(AppError::InvalidState("public view is open".to_string()));
            }
            if s.session.is_some() {
                return Err(AppError::InvalidState("already signed in".to_string()));
            }
            s.pending_role = Some(role);
            Ok(())
        })
        .await
    }

    pub async fn clear_role(&self) {
        self.mutate(|s| s.pending_role = None).await;
    }

    /// Success shows up later as a session notification.
    pub async fn sign_in(&self, form: &SignInForm) -> Result<(), AppError> {
        self.ensure_configured()?;
        form.validate()?;
        self.call(
            self.auth
                .sign_in_with_password(form.email.trim(), &form.password),
        )
        .await?;
        Ok(())
    }

    pub async fn sign_up(&self, form: &SignUpForm) -> Result<String, AppError> {
        self.ensure_configured()?;
        form.validate()?;
        let user_id = self
            .call(self.auth.sign_up(form.email.trim(), &form.password))
            .await?;
        Ok(user_id)
    }

    /// Creates the profile from the needs-setup screen.
    pub async fn complete_setup(&self, role: SubType) -> Result<(), AppError> {
        self.ensure_configured()?;
        let ticket = self
            .mutate(|s| {
                if s.session.is_none() {
                    return Err(AppError::Unauthorized);
                }
                if !s.needs_setup || s.is_public_view() {
                    return Err(AppError::InvalidState(
                        "no profile setup in progress".to_string(),
                    ));
                }
                Ok(s.ticket())
            })
            .await?;
        self.create_profile(&ticket, role).await?;
        Ok(())
    }

    async fn pick_header_image(&self, role: SubType) -> String {
        let pool = &self.settings.header_images;
        let picked = match self.call(self.profiles.count_by_sub_type(role)).await {
            Ok(existing) => pool.select(role, existing),
            Err(e) => {
                tracing::warn!(error = %e, "profile count failed, picking a random header image");
                pool.random(role)
            }
        };
        picked.unwrap_or_default().to_string()
    }

    async fn create_profile(&self, ticket: &RequestTicket, role: SubType) -> Result<(), AppError> {
        let Some(user_id) = ticket.user_id.as_deref() else {
            return Err(AppError::Unauthorized);
        };
        if !self.mutate(|s| s.begin_creation(ticket)).await {
            tracing::debug!(user_id, "profile creation already running or session changed");
            return Err(AppError::InvalidState(
                "profile creation already in progress".to_string(),
            ));
        }

        let header = self.pick_header_image(role).await;
        let partner = Partner::new_default(user_id, role, &header);

        match self.call(self.profiles.insert(&partner)).await {
            Ok(created) => {
                self.mutate(|s| {
                    if !s.is_current(ticket) {
                        tracing::debug!(user_id, "discarding stale profile creation");
                        return;
                    }
                    tracing::info!(
                        user_id,
                        sub_type = role.as_str(),
                        header = %created.header_image_url,
                        "profile created"
                    );
                    s.profile = Some(created);
                    s.needs_setup = false;
                    s.creating = false;
                    s.loading = false;
                })
                .await;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id, error = %e, "failed to create profile");
                self.mutate(|s| {
                    if s.is_current(ticket) {
                        s.needs_setup = true;
                        s.creating = false;
                        s.loading = false;
                        s.notice = Some(format!(
                            "Could not create your profile: {}",
                            user_message(&e)
                        ));
                    }
                })
                .await;
                Err(e.into())
            }
        }
    }

    // ── Dashboard ──

    /// Applies `patch` locally right away and rolls it back if the write fails.
    pub async fn update_profile(&self, patch: ProfilePatch) -> Result<(), AppError> {
        if patch.is_empty() {
            return Ok(());
        }
        let _write = self.writes.lock().await;

        let (ticket, user_id, previous) = self
            .mutate(|s| {
                let ticket = s.ticket();
                let user_id = ticket.user_id.clone()?;
                let profile = s.profile.as_mut()?;
                let previous = profile.clone();
                profile.apply(&patch);
                s.notice = None;
                Some((ticket, user_id, previous))
            })
            .await
            .ok_or(AppError::Unauthorized)?;

        match self.call(self.profiles.update(&user_id, &patch)).await {
            Ok(()) => {
                tracing::info!(user_id = %user_id, "profile updated");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(user_id = %user_id, error = %e, "profile update failed, reverting");
                self.mutate(|s| {
                    if s.is_current(&ticket) {
                        s.profile = Some(previous);
                        s.notice = Some(UPDATE_FAILED_NOTICE.to_string());
                    }
                })
                .await;
                Err(e.into())
            }
        }
    }

    /// Profile form save: uploads new images, then writes the patch.
    pub async fn save_profile(&self, draft: ProfileDraft) -> Result<(), AppError> {
        self.ensure_configured()?;
        draft.validate()?;

        let (user_id, existing_gallery) = self
            .mutate(|s| {
                let user_id = s.session.as_ref()?.user_id.clone();
                let gallery = s.profile.as_ref()?.gallery_image_urls.clone();
                Some((user_id, gallery))
            })
            .await
            .ok_or(AppError::Unauthorized)?;

        let mut patch = draft.normalized_patch();
        if draft.has_uploads() {
            tracing::debug!(
                user_id = %user_id,
                gallery = draft.gallery.len(),
                "uploading profile images"
            );
        }
        if let Some(file) = &draft.avatar {
            patch.image_url = Some(self.upload_asset(&user_id, "avatar", file).await?);
        }
        if let Some(file) = &draft.header {
            patch.header_image_url = Some(self.upload_asset(&user_id, "header", file).await?);
        }
        if let Some(file) = &draft.id_card {
            patch.id_card_image_url = Some(self.upload_asset(&user_id, "id_card", file).await?);
        }
        if !draft.gallery.is_empty() {
            let mut urls = patch.gallery_image_urls.take().unwrap_or(existing_gallery);
            for file in &draft.gallery {
                let stem = format!("gallery_{}", Uuid::new_v4().simple());
                urls.push(self.upload_asset(&user_id, &stem, file).await?);
            }
            patch.gallery_image_urls = Some(urls);
        }

        self.update_profile(patch).await
    }

    async fn upload_asset(
        &self,
        user_id: &str,
        stem: &str,
        file: &UploadFile,
    ) -> Result<String, AppError> {
        let path = format!("profiles/{user_id}/{stem}.{}", file.extension());
        match self.call(self.storage.upload(&path, file)).await {
            Ok(url) => Ok(url),
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "image upload failed");
                self.mutate(|s| {
                    s.notice = Some(format!("Failed to upload image: {}", user_message(&e)));
                })
                .await;
                Err(e.into())
            }
        }
    }

    pub async fn set_status(&self, status: Status) -> Result<(), AppError> {
        self.update_profile(ProfilePatch {
            status: Some(status),
            ..Default::default()
        })
        .await
    }

    pub async fn set_booked_dates(&self, dates: BTreeSet<NaiveDate>) -> Result<(), AppError> {
        self.update_profile(ProfilePatch {
            booked_dates: Some(dates),
            ..Default::default()
        })
        .await
    }

    pub async fn share_link(&self) -> Result<String, AppError> {
        let state = self.state.lock().await;
        let user_id = match (&state.session, &state.profile) {
            (Some(session), Some(_)) => session.user_id.clone(),
            _ => return Err(AppError::Unauthorized),
        };
        Ok(public::share_link(&self.settings.public_base_url, &user_id))
    }

    /// Requests sign-out. Clearing the profile is left to the notification
    /// that follows.
    pub async fn logout(&self) -> Result<(), AppError> {
        self.ensure_configured()?;
        match self.call(self.auth.sign_out()).await {
            Ok(()) => {
                tracing::info!("sign-out requested");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "sign-out failed");
                self.mutate(|s| {
                    s.notice = Some(format!("Error logging out: {}", user_message(&e)));
                })
                .await;
                Err(e.into())
            }
        }
    }

    // ── Errors ──

    /// Re-runs whatever step produced the current connection error.
    pub async fn retry(&self) {
        let failure = self.mutate(|s| s.last_error.clone()).await;
        let Some(failure) = failure else {
            return;
        };
        tracing::info!(step = ?failure.step, "retrying");

        match failure.step {
            RetryStep::Session => self.bootstrap_session().await,
            RetryStep::PublicProfile => self.load_public_profile().await,
            RetryStep::Profile { create_with } => {
                let load = self
                    .mutate(|s| {
                        s.last_error = None;
                        let ticket = s.ticket();
                        s.loading = ticket.user_id.is_some();
                        ticket.user_id.is_some().then_some(ProfileLoad {
                            ticket,
                            create_with,
                        })
                    })
                    .await;
                if let Some(load) = load {
                    self.run_profile_load(load).await;
                }
            }
        }
    }

    pub async fn dismiss_error(&self) {
        self.mutate(|s| s.last_error = None).await;
    }

    pub async fn dismiss_notice(&self) {
        self.mutate(|s| s.notice = None).await;
    }

    // ── Public view ──

    async fn load_public_profile(&self) {
        let target = self
            .mutate(|s| {
                let target = s.public_target()?.to_string();
                s.loading = true;
                s.last_error = None;
                Some(target)
            })
            .await;
        let Some(target) = target else {
            return;
        };

        let result = self.call(self.profiles.fetch(&target)).await;
        self.mutate(|s| {
            if s.public_target() != Some(target.as_str()) {
                return;
            }
            s.loading = false;
            let profile = match result {
                Ok(Some(profile)) => PublicProfile::Loaded(Box::new(profile)),
                Ok(None) => {
                    tracing::info!(profile_id = %target, "public profile not found");
                    PublicProfile::NotFound
                }
                Err(e) => {
                    tracing::warn!(
                        profile_id = %target,
                        error = %e,
                        "failed to fetch public profile"
                    );
                    s.fail(RetryStep::PublicProfile, user_message(&e));
                    return;
                }
            };
            s.routing = Routing::PublicView { target, profile };
        })
        .await;
    }

    /// Leaves the public view and returns `page_url` without the profile
    /// parameter, then falls back to normal session routing.
    pub async fn close_public_view(&self, page_url: &str) -> String {
        let was_public = self
            .mutate(|s| {
                let was_public = s.is_public_view();
                s.routing = Routing::Normal;
                s.last_error = None;
                was_public
            })
            .await;
        let url = public::strip_public_target(page_url);
        if was_public {
            tracing::info!("public profile view closed");
            self.bootstrap_session().await;
        }
        url
    }
}
