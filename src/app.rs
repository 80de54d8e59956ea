use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use std::time::{Duration, Instant};

use crate::api::{AuthApi, AuthError, LoginSuccess};
use crate::config::AppConfig;
use crate::session::{Session, SessionStore};

/// How long a success notice stays in the info line
const SUCCESS_CLEAR: Duration = Duration::from_secs(3);
/// Errors and info get longer so the user can actually read them
const ERROR_CLEAR: Duration = Duration::from_secs(6);
const INFO_CLEAR: Duration = Duration::from_secs(5);

/// The two mutually exclusive panels. Exactly one is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    LoginForm,
    SuccessPanel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Popup {
    None,
    Help,
    ConfirmLogout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Transient status message (shown in info line, auto-clears after timeout)
#[derive(Debug, Clone)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    shown_at: Instant,
}

pub struct App {
    pub view: View,
    pub popup: Popup,
    pub field: Field,

    // Form input buffers (credentials are transient, never persisted)
    pub username: String,
    pub password: String,

    // Current session, if logged in
    pub session: Option<Session>,

    pub notice: Option<Notice>,

    /// A login request has been accepted and not yet resolved.
    /// Guards submit against re-entry and marks the form inert.
    pub login_pending: bool,

    pub config: AppConfig,
    api: AuthApi,
    store: Box<dyn SessionStore>,
}

impl App {
    pub async fn new(config: AppConfig, store: Box<dyn SessionStore>) -> Result<Self> {
        let api = AuthApi::new(config.api_base.clone());

        // Startup health probe, logging only
        match api.health().await {
            Ok(body) => tracing::info!("Backend healthy at {}: {}", api.base_url(), body),
            Err(e) => tracing::debug!("Health check failed: {}", e),
        }

        let mut app = Self {
            view: View::LoginForm,
            popup: Popup::None,
            field: Field::Username,

            username: config.last_username.clone().unwrap_or_default(),
            password: String::new(),

            session: None,
            notice: None,
            login_pending: false,

            config,
            api,
            store,
        };

        app.restore_session();
        Ok(app)
    }

    /// Set a notice (replaces any current one, restarts its clock)
    pub fn notify(&mut self, text: impl Into<String>, kind: NoticeKind) {
        self.notice = Some(Notice {
            text: text.into(),
            kind,
            shown_at: Instant::now(),
        });
    }

    /// Adopt a previously stored session, if one exists and parses.
    /// A corrupt record is deleted by the store and treated as absent.
    pub fn restore_session(&mut self) {
        match self.store.load() {
            Some(session) => {
                tracing::info!("Restored session for {}", session.username);
                self.session = Some(session);
                self.view = View::SuccessPanel;
                self.notify("Welcome back!", NoticeKind::Success);
            }
            None => {
                self.view = View::LoginForm;
            }
        }
    }

    /// Validate the form and mark a login request pending. The actual
    /// network call happens in the next tick so the loading state gets
    /// a frame on screen first. Ignored while a request is outstanding.
    pub fn submit(&mut self) {
        if self.login_pending {
            return;
        }

        if self.username.trim().is_empty() || self.password.trim().is_empty() {
            self.notify(
                "Please enter both username and password",
                NoticeKind::Error,
            );
            return;
        }

        self.login_pending = true;
        self.notify("Signing in...", NoticeKind::Info);
    }

    /// Fold a completed login call into the UI state. Pure with respect
    /// to the network: callable from tests without a server.
    pub fn apply_login_outcome(
        &mut self,
        username: String,
        outcome: Result<LoginSuccess, AuthError>,
    ) {
        self.login_pending = false;

        match outcome {
            Ok(ok) => {
                let session = Session::new(username.clone(), ok.role, ok.token);
                if let Err(e) = self.store.save(&session) {
                    tracing::warn!("Failed to persist session: {}", e);
                }
                self.session = Some(session);
                self.view = View::SuccessPanel;
                self.password.clear();

                self.config.last_username = Some(username);
                let _ = self.config.save();

                let message = ok.message.unwrap_or_else(|| "Login successful!".to_string());
                if self.config.notifications {
                    let _ = crate::notify("torii", &message);
                }
                self.notify(message, NoticeKind::Success);
            }
            Err(e) => {
                // Stays on the form; no session is written on any error path
                self.notify(e.to_string(), NoticeKind::Error);
            }
        }
    }

    /// Clear the stored session and reset the form. Safe to call with
    /// no active session.
    pub fn logout(&mut self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!("Failed to clear stored session: {}", e);
        }
        self.session = None;
        self.username = self.config.last_username.clone().unwrap_or_default();
        self.password.clear();
        self.notice = None;
        self.field = Field::Username;
        self.popup = Popup::None;
        self.view = View::LoginForm;
    }

    pub async fn handle_key(&mut self, key: KeyEvent) -> Result<()> {
        if self.popup != Popup::None {
            self.handle_popup_key(key);
            return Ok(());
        }

        match self.view {
            View::LoginForm => self.handle_form_key(key),
            View::SuccessPanel => self.handle_panel_key(key),
        }
        Ok(())
    }

    fn handle_popup_key(&mut self, key: KeyEvent) {
        match self.popup {
            Popup::Help => {
                if matches!(
                    key.code,
                    KeyCode::Esc | KeyCode::F(1) | KeyCode::Enter | KeyCode::Char('q')
                ) {
                    self.popup = Popup::None;
                }
            }
            Popup::ConfirmLogout => match key.code {
                KeyCode::Char('y') | KeyCode::Enter => self.logout(),
                KeyCode::Char('n') | KeyCode::Esc => self.popup = Popup::None,
                _ => {}
            },
            Popup::None => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        if key.code == KeyCode::F(1) {
            self.popup = Popup::Help;
            return;
        }

        // Inputs and the submit control are inert while a request runs
        if self.login_pending {
            return;
        }

        match key.code {
            KeyCode::Tab | KeyCode::Down | KeyCode::BackTab | KeyCode::Up => {
                // Two fields, so forward and backward land the same way
                self.field = match self.field {
                    Field::Username => Field::Password,
                    Field::Password => Field::Username,
                };
            }
            KeyCode::Enter => match self.field {
                Field::Username => self.field = Field::Password,
                Field::Password => self.submit(),
            },
            KeyCode::Backspace => {
                match self.field {
                    Field::Username => self.username.pop(),
                    Field::Password => self.password.pop(),
                };
            }
            KeyCode::Esc => {
                self.notice = None;
            }
            KeyCode::Char(c) => {
                if !c.is_control() {
                    match self.field {
                        Field::Username => self.username.push(c),
                        Field::Password => self.password.push(c),
                    }
                }
            }
            _ => {}
        }
    }

    fn handle_panel_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('l') | KeyCode::Esc => {
                self.popup = Popup::ConfirmLogout;
            }
            KeyCode::F(1) => self.popup = Popup::Help,
            _ => {}
        }
    }

    pub async fn tick(&mut self) -> Result<()> {
        // Run the deferred login request; at most one in flight
        if self.login_pending {
            let username = self.username.trim().to_string();
            let password = self.password.trim().to_string();
            let outcome = self.api.login(&username, &password).await;
            self.apply_login_outcome(username, outcome);
        }

        self.expire_notice();
        Ok(())
    }

    /// Auto-clear the notice once its per-kind timeout elapses
    fn expire_notice(&mut self) {
        if let Some(notice) = &self.notice {
            let timeout = match notice.kind {
                NoticeKind::Success => SUCCESS_CLEAR,
                NoticeKind::Error => ERROR_CLEAR,
                NoticeKind::Info => INFO_CLEAR,
            };
            if notice.shown_at.elapsed() >= timeout {
                self.notice = None;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::MemoryStore;

    fn test_app() -> App {
        // Port 1 is never dialed in these tests; transitions are applied
        // directly through submit/apply_login_outcome
        App {
            view: View::LoginForm,
            popup: Popup::None,
            field: Field::Username,
            username: String::new(),
            password: String::new(),
            session: None,
            notice: None,
            login_pending: false,
            config: AppConfig {
                notifications: false,
                ..AppConfig::default()
            },
            api: AuthApi::new("http://127.0.0.1:1"),
            store: Box::new(MemoryStore::default()),
        }
    }

    fn success_outcome() -> Result<LoginSuccess, AuthError> {
        Ok(LoginSuccess {
            role: "admin".to_string(),
            token: "abc123".to_string(),
            message: Some("Login successful!".to_string()),
        })
    }

    fn stored(app: &mut App) -> Option<Session> {
        app.store.load()
    }

    #[test]
    fn test_empty_fields_never_submit() {
        let mut app = test_app();
        app.submit();
        assert!(!app.login_pending);
        let notice = app.notice.as_ref().expect("validation notice");
        assert_eq!(notice.kind, NoticeKind::Error);

        // Whitespace-only counts as empty too
        app.username = "demo".to_string();
        app.password = "   ".to_string();
        app.submit();
        assert!(!app.login_pending);
    }

    #[test]
    fn test_submit_sets_pending_once() {
        let mut app = test_app();
        app.username = "demo".to_string();
        app.password = "demo".to_string();

        app.submit();
        assert!(app.login_pending);
        let first = app.notice.clone().unwrap();

        // Duplicate submit while pending is ignored
        app.submit();
        assert!(app.login_pending);
        assert_eq!(app.notice.as_ref().unwrap().text, first.text);
    }

    #[test]
    fn test_success_stores_session_and_switches_view() {
        let mut app = test_app();
        app.username = "demo".to_string();
        app.password = "demo".to_string();
        app.submit();

        app.apply_login_outcome("demo".to_string(), success_outcome());

        assert!(!app.login_pending);
        assert_eq!(app.view, View::SuccessPanel);
        assert!(app.password.is_empty(), "password buffer is wiped");

        let session = stored(&mut app).expect("exactly one session stored");
        assert_eq!(session.username, "demo");
        assert_eq!(session.role, "admin");
        assert_eq!(session.token, "abc123");

        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.kind, NoticeKind::Success);
        assert_eq!(notice.text, "Login successful!");
    }

    #[test]
    fn test_rejection_keeps_form_and_stores_nothing() {
        let mut app = test_app();
        app.username = "demo".to_string();
        app.password = "wrong".to_string();
        app.submit();

        app.apply_login_outcome(
            "demo".to_string(),
            Err(AuthError::Rejected {
                message: Some("Invalid credentials".to_string()),
            }),
        );

        assert!(!app.login_pending);
        assert_eq!(app.view, View::LoginForm);
        assert!(stored(&mut app).is_none());
        let notice = app.notice.as_ref().unwrap();
        assert_eq!(notice.kind, NoticeKind::Error);
        assert_eq!(notice.text, "Invalid credentials");
    }

    #[test]
    fn test_rejection_without_message_gets_fallback() {
        let mut app = test_app();
        app.apply_login_outcome(
            "demo".to_string(),
            Err(AuthError::Rejected { message: None }),
        );
        assert_eq!(app.notice.as_ref().unwrap().text, "Login failed");
    }

    #[test]
    fn test_malformed_response_keeps_form() {
        let mut app = test_app();
        app.apply_login_outcome("demo".to_string(), Err(AuthError::MalformedResponse));
        assert_eq!(app.view, View::LoginForm);
        assert!(stored(&mut app).is_none());
        assert_eq!(app.notice.as_ref().unwrap().kind, NoticeKind::Error);
    }

    #[test]
    fn test_restore_session_is_idempotent() {
        let mut app = test_app();
        app.store
            .save(&Session::new("demo", "admin", "abc123"))
            .unwrap();

        app.restore_session();
        assert_eq!(app.view, View::SuccessPanel);
        assert_eq!(app.session.as_ref().unwrap().username, "demo");

        app.restore_session();
        assert_eq!(app.view, View::SuccessPanel);
        assert_eq!(stored(&mut app).unwrap().username, "demo");
    }

    #[test]
    fn test_restore_without_session_stays_on_form() {
        let mut app = test_app();
        app.restore_session();
        assert_eq!(app.view, View::LoginForm);
        assert!(app.session.is_none());
    }

    #[test]
    fn test_logout_then_restore_yields_login_form() {
        let mut app = test_app();
        app.apply_login_outcome("demo".to_string(), success_outcome());
        assert_eq!(app.view, View::SuccessPanel);

        app.logout();
        assert_eq!(app.view, View::LoginForm);
        assert!(app.session.is_none());
        assert!(app.notice.is_none());

        app.restore_session();
        assert_eq!(app.view, View::LoginForm);
    }

    #[test]
    fn test_logout_without_session_is_noop_beyond_ui() {
        let mut app = test_app();
        app.notify("leftover", NoticeKind::Info);
        app.logout();
        assert_eq!(app.view, View::LoginForm);
        assert!(app.notice.is_none());
        assert!(stored(&mut app).is_none());
    }

    #[test]
    fn test_notice_expires_after_timeout() {
        let mut app = test_app();
        app.notify("done", NoticeKind::Success);
        app.notice.as_mut().unwrap().shown_at = Instant::now() - Duration::from_secs(10);
        app.expire_notice();
        assert!(app.notice.is_none());
    }

    #[test]
    fn test_fresh_notice_survives_expiry_pass() {
        let mut app = test_app();
        app.notify("still here", NoticeKind::Error);
        app.expire_notice();
        assert!(app.notice.is_some());
    }
}
