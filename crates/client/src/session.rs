/// Login page for clients without a token
pub const LOGIN_ROUTE: &str = "/";
pub const USER_DASHBOARD_ROUTE: &str = "/dashboard";
pub const ADMIN_DASHBOARD_ROUTE: &str = "/admindash";

/// Which login issued the held token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionKind {
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Credentials {
    token: String,
    user_id: i32,
    kind: SessionKind,
}

/// Token issued by the last successful login, if any.
///
/// Logging out only forgets the token; the server keeps no sessions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    credentials: Option<Credentials>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sign_in(&mut self, token: String, user_id: i32, kind: SessionKind) {
        self.credentials = Some(Credentials { token, user_id, kind });
    }

    pub fn logout(&mut self) {
        self.credentials = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.credentials.is_some()
    }

    pub fn token(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.token.as_str())
    }

    pub fn user_id(&self) -> Option<i32> {
        self.credentials.as_ref().map(|c| c.user_id)
    }

    pub fn kind(&self) -> Option<SessionKind> {
        self.credentials.as_ref().map(|c| c.kind)
    }

    /// Where the client should land given the held token
    pub fn landing_route(&self) -> &'static str {
        match self.kind() {
            None => LOGIN_ROUTE,
            Some(SessionKind::User) => USER_DASHBOARD_ROUTE,
            Some(SessionKind::Admin) => ADMIN_DASHBOARD_ROUTE,
        }
    }
}
