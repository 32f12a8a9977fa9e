use crate::models::{Credential, Partner, Screen, Session, SubType};

#[derive(Debug, Clone, PartialEq)]
pub enum PublicProfile {
    Pending,
    Loaded(Box<Partner>),
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Routing {
    #[default]
    Normal,
    PublicView {
        target: String,
        profile: PublicProfile,
    },
}

/// The step `retry` re-runs after a connection error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryStep {
    Session,
    Profile { create_with: Option<SubType> },
    PublicProfile,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConnectionFailure {
    pub message: String,
    pub step: RetryStep,
}

/// Captures which session an async request was issued under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestTicket {
    generation: u64,
    pub user_id: Option<String>,
}

/// All client-side session/profile state. Pure: every transition here is
/// synchronous, the orchestrator wraps the async parts around it.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorState {
    pub missing_config: Vec<Credential>,
    pub session: Option<Session>,
    pub profile: Option<Partner>,
    pub routing: Routing,
    pub loading: bool,
    pub last_error: Option<ConnectionFailure>,
    pub pending_role: Option<SubType>,
    pub needs_setup: bool,
    /// A profile insert is in flight for the current session.
    pub creating: bool,
    pub notice: Option<String>,
    generation: u64,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            missing_config: Vec::new(),
            session: None,
            profile: None,
            routing: Routing::Normal,
            loading: true,
            last_error: None,
            pending_role: None,
            needs_setup: false,
            creating: false,
            notice: None,
            generation: 0,
        }
    }
}

impl OrchestratorState {
    pub fn new(missing_config: Vec<Credential>) -> Self {
        Self {
            missing_config,
            ..Default::default()
        }
    }

    pub fn is_public_view(&self) -> bool {
        matches!(self.routing, Routing::PublicView { .. })
    }

    pub fn public_target(&self) -> Option<&str> {
        match &self.routing {
            Routing::PublicView { target, .. } => Some(target),
            Routing::Normal => None,
        }
    }

    pub fn ticket(&self) -> RequestTicket {
        RequestTicket {
            generation: self.generation,
            user_id: self.session.as_ref().map(|s| s.user_id.clone()),
        }
    }

    /// False once a newer session has replaced the one `ticket` was issued under.
    pub fn is_current(&self, ticket: &RequestTicket) -> bool {
        ticket.generation == self.generation
            && ticket.user_id.as_deref() == self.session.as_ref().map(|s| s.user_id.as_str())
    }

    /// Installs a new session and drops everything derived from the old one.
    pub fn replace_session(&mut self, session: Option<Session>) -> RequestTicket {
        self.generation += 1;
        self.session = session;
        self.profile = None;
        self.needs_setup = false;
        self.creating = false;
        self.notice = None;
        if !self.is_public_view() {
            self.last_error = None;
            self.loading = self.session.is_some();
        }
        self.ticket()
    }

    /// Claims the single profile creation allowed per session.
    pub fn begin_creation(&mut self, ticket: &RequestTicket) -> bool {
        if !self.is_current(ticket) || self.creating || self.profile.is_some() {
            return false;
        }
        self.creating = true;
        self.loading = true;
        true
    }

    pub fn fail(&mut self, step: RetryStep, message: impl Into<String>) {
        self.loading = false;
        self.last_error = Some(ConnectionFailure {
            message: message.into(),
            step,
        });
    }

    pub fn screen(&self) -> Screen {
        if !self.missing_config.is_empty() {
            return Screen::ConfigurationMissing {
                missing: self.missing_config.clone(),
            };
        }
        if let Routing::PublicView {
            profile: PublicProfile::Loaded(profile),
            ..
        } = &self.routing
        {
            return Screen::PublicProfile {
                profile: profile.clone(),
            };
        }
        if self.loading {
            return Screen::Loading;
        }
        if let Some(err) = &self.last_error {
            return Screen::ConnectionError {
                message: err.message.clone(),
            };
        }
        // never fall through to an auth screen while a public profile is targeted
        if let Routing::PublicView { target, profile } = &self.routing {
            return match profile {
                PublicProfile::NotFound => Screen::PublicProfileNotFound {
                    target: target.clone(),
                },
                _ => Screen::Loading,
            };
        }
        if self.session.is_none() {
            return match self.pending_role {
                Some(role) => Screen::SignIn { role },
                None => Screen::RoleSelection,
            };
        }
        if self.needs_setup {
            return Screen::NeedsProfileSetup;
        }
        match &self.profile {
            Some(profile) => Screen::Dashboard {
                profile: Box::new(profile.clone()),
            },
            None => Screen::Loading,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settled() -> OrchestratorState {
        OrchestratorState {
            loading: false,
            ..Default::default()
        }
    }

    fn partner(user_id: &str) -> Partner {
        Partner::new_default(user_id, SubType::HomeService, "h.png")
    }

    #[test]
    fn test_initial_state_is_loading() {
        assert_eq!(OrchestratorState::default().screen(), Screen::Loading);
    }

    #[test]
    fn test_configuration_missing_wins() {
        let mut state = OrchestratorState::new(vec![Credential::MapsKey]);
        state.routing = Routing::PublicView {
            target: "abc".to_string(),
            profile: PublicProfile::Loaded(Box::new(partner("abc"))),
        };
        assert_eq!(
            state.screen(),
            Screen::ConfigurationMissing {
                missing: vec![Credential::MapsKey]
            }
        );
    }

    #[test]
    fn test_no_session_without_role_shows_role_selection() {
        assert_eq!(settled().screen(), Screen::RoleSelection);
    }

    #[test]
    fn test_pending_role_shows_sign_in() {
        let mut state = settled();
        state.pending_role = Some(SubType::Place);
        assert_eq!(state.screen(), Screen::SignIn { role: SubType::Place });
    }

    #[test]
    fn test_public_view_never_shows_auth_screens() {
        let mut state = settled();
        state.routing = Routing::PublicView {
            target: "abc".to_string(),
            profile: PublicProfile::Pending,
        };
        assert_eq!(state.screen(), Screen::Loading);

        state.routing = Routing::PublicView {
            target: "abc".to_string(),
            profile: PublicProfile::NotFound,
        };
        assert_eq!(
            state.screen(),
            Screen::PublicProfileNotFound {
                target: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_loaded_public_profile_beats_loading() {
        let mut state = OrchestratorState::default();
        state.routing = Routing::PublicView {
            target: "abc".to_string(),
            profile: PublicProfile::Loaded(Box::new(partner("abc"))),
        };
        assert!(matches!(state.screen(), Screen::PublicProfile { .. }));
    }

    #[test]
    fn test_connection_error_after_loading() {
        let mut state = settled();
        state.fail(RetryStep::Session, "auth provider unreachable");
        assert_eq!(
            state.screen(),
            Screen::ConnectionError {
                message: "auth provider unreachable".to_string()
            }
        );
        state.loading = true;
        assert_eq!(state.screen(), Screen::Loading);
    }

    #[test]
    fn test_needs_setup_before_dashboard() {
        let mut state = settled();
        state.replace_session(Some(Session::new("u1", "t")));
        state.loading = false;
        state.needs_setup = true;
        assert_eq!(state.screen(), Screen::NeedsProfileSetup);

        state.needs_setup = false;
        state.profile = Some(partner("u1"));
        assert!(matches!(state.screen(), Screen::Dashboard { .. }));
    }

    #[test]
    fn test_replace_session_invalidates_tickets() {
        let mut state = settled();
        let first = state.replace_session(Some(Session::new("a", "t")));
        assert!(state.is_current(&first));
        let second = state.replace_session(Some(Session::new("b", "t")));
        assert!(!state.is_current(&first));
        assert!(state.is_current(&second));
    }

    #[test]
    fn test_creation_is_claimed_once_per_session() {
        let mut state = settled();
        let ticket = state.replace_session(Some(Session::new("a", "t")));
        assert!(state.begin_creation(&ticket));
        assert!(!state.begin_creation(&ticket));

        let next = state.replace_session(Some(Session::new("a", "t")));
        assert!(!state.begin_creation(&ticket));
        assert!(state.begin_creation(&next));
    }

    #[test]
    fn test_replace_session_clears_profile() {
        let mut state = settled();
        state.replace_session(Some(Session::new("a", "t")));
        state.profile = Some(partner("a"));
        state.replace_session(None);
        assert!(state.profile.is_none());
        assert!(!state.loading);
        assert_eq!(state.screen(), Screen::RoleSelection);
    }
}
