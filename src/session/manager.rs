use crate::scrape::Requester;
use crate::session::jar::SessionJar;
use crate::url::encode_form;
use crate::ScoutError;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use url::Url;

/// Authentication state of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No usable session cookie yet
    Anonymous,
    /// A session cookie is present
    Authenticated,
    /// The tracker refused the credentials; further attempts fail immediately
    Rejected,
}

/// Account credentials submitted by the login form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// How a tracker's login exchange looks
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginSpec {
    /// Form action the credentials are posted to
    pub url: String,
    /// Cookie that proves a successful login
    pub session_cookie: &'static str,
    pub username_field: &'static str,
    pub password_field: &'static str,
    /// Additional constant form fields
    pub extra_fields: Vec<(&'static str, &'static str)>,
    /// Cookies the tracker expects before the form is posted
    pub preset_cookies: Vec<(&'static str, &'static str)>,
}

/// Owns the login state of one tracker
///
/// The manager shares its jar with the HTTP client, so cookies set by the
/// login response are visible to every later request.
#[derive(Debug)]
pub struct SessionManager {
    jar: Arc<SessionJar>,
    cookie_file: PathBuf,
    credentials: Credentials,
    spec: LoginSpec,
    state: SessionState,
    login_attempts: u32,
}

impl SessionManager {
    pub fn new(
        jar: Arc<SessionJar>,
        cookie_file: PathBuf,
        credentials: Credentials,
        spec: LoginSpec,
    ) -> Self {
        Self {
            jar,
            cookie_file,
            credentials,
            spec,
            state: SessionState::Anonymous,
            login_attempts: 0,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Number of login forms posted so far
    pub fn login_attempts(&self) -> u32 {
        self.login_attempts
    }

    /// Makes sure the session is authenticated before the first search
    ///
    /// Stored cookies are reused when they still hold the session cookie;
    /// otherwise the credentials are posted.
    ///
    /// # Returns
    ///
    /// * `Ok(())` - The session is authenticated
    /// * `Err(ScoutError::AuthenticationFailed)` - The credentials were rejected, now or earlier
    /// * `Err(ScoutError)` - The login request itself failed
    pub async fn ensure(&mut self, requester: &Requester) -> Result<(), ScoutError> {
        match self.state {
            SessionState::Authenticated => return Ok(()),
            SessionState::Rejected => return Err(ScoutError::AuthenticationFailed),
            SessionState::Anonymous => {}
        }

        match self.jar.load(&self.cookie_file) {
            Ok(_) if self.jar.contains(self.spec.session_cookie) => {
                tracing::info!("Local cookies are loaded");
                self.state = SessionState::Authenticated;
                return Ok(());
            }
            Ok(_) => {
                tracing::info!("Local cookies expired or bad, logging in");
                self.jar.clear();
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::debug!("No cookie file at {}", self.cookie_file.display());
            }
            Err(e) => {
                tracing::warn!(
                    "Failed to read cookies from {}: {}",
                    self.cookie_file.display(),
                    e
                );
            }
        }

        self.login(requester).await
    }

    /// Discards the current session and logs in again
    ///
    /// Used when a page shows the login form although the session was
    /// considered authenticated. A rejected session stays rejected.
    pub async fn relogin(&mut self, requester: &Requester) -> Result<(), ScoutError> {
        if self.state == SessionState::Rejected {
            return Err(ScoutError::AuthenticationFailed);
        }
        self.state = SessionState::Anonymous;
        self.login(requester).await
    }

    async fn login(&mut self, requester: &Requester) -> Result<(), ScoutError> {
        self.login_attempts += 1;
        self.jar.clear();

        let login_url = Url::parse(&self.spec.url)?;
        for (name, value) in &self.spec.preset_cookies {
            self.jar.set(&login_url, name, value);
        }

        let mut fields = vec![
            (self.spec.username_field, self.credentials.username.as_str()),
            (self.spec.password_field, self.credentials.password.as_str()),
        ];
        fields.extend(self.spec.extra_fields.iter().copied());
        let body = encode_form(&fields);

        tracing::debug!("Posting login form to {}", self.spec.url);
        requester.post_form(&self.spec.url, &body).await?;

        if !self.jar.contains(self.spec.session_cookie) {
            self.state = SessionState::Rejected;
            tracing::error!("Login as {} was rejected", self.credentials.username);
            return Err(ScoutError::AuthenticationFailed);
        }

        self.state = SessionState::Authenticated;
        tracing::info!("We successfully authorized");
        if let Err(e) = self.jar.save(&self.cookie_file) {
            tracing::warn!(
                "Failed to save cookies to {}: {}",
                self.cookie_file.display(),
                e
            );
        }
        Ok(())
    }
}
