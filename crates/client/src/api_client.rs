use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{ClientError, Result};
use crate::session::{Session, SessionKind};

/// A user row as the admin API returns it
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub rating: f64,
}

#[derive(Serialize)]
struct Credentials<'a> {
    name: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct RegisterResponse {
    userid: i32,
}

#[derive(Deserialize)]
struct LoginResponse {
    userid: i32,
    token: String,
}

#[derive(Deserialize)]
struct RatingResponse {
    user: User,
}

#[derive(Deserialize)]
struct MessageResponse {
    message: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: String,
}

/// Typed client for the ProxLib HTTP API.
///
/// Successful logins replace the held session; admin calls send its token
/// as a bearer credential.
pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: Session::new(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn logout(&mut self) {
        self.session.logout();
    }

    /// Register a user account; does not log in
    pub async fn register(&self, name: &str, password: &str) -> Result<i32> {
        let request = self
            .http
            .post(self.url("/auth/register"))
            .json(&Credentials { name, password });

        let response: RegisterResponse = send(request).await?;
        Ok(response.userid)
    }

    pub async fn login(&mut self, name: &str, password: &str) -> Result<i32> {
        self.sign_in("/auth/login", name, password, SessionKind::User).await
    }

    pub async fn admin_login(&mut self, name: &str, password: &str) -> Result<i32> {
        self.sign_in("/admin/login", name, password, SessionKind::Admin).await
    }

    pub async fn list_users(&self) -> Result<Vec<User>> {
        let request = self.authorized(self.http.get(self.url("/admin/users")))?;
        send(request).await
    }

    pub async fn update_rating(&self, user_id: i32, rating: f64) -> Result<User> {
        let request = self
            .authorized(self.http.put(self.url(&format!("/admin/users/{user_id}/rating"))))?
            .json(&json!({ "newRating": rating }));

        let response: RatingResponse = send(request).await?;
        Ok(response.user)
    }

    /// Delete a user and return the server's confirmation message
    pub async fn delete_user(&self, user_id: i32) -> Result<String> {
        let request = self.authorized(self.http.delete(self.url(&format!("/admin/users/{user_id}"))))?;

        let response: MessageResponse = send(request).await?;
        Ok(response.message)
    }

    async fn sign_in(&mut self, path: &str, name: &str, password: &str, kind: SessionKind) -> Result<i32> {
        let request = self.http.post(self.url(path)).json(&Credentials { name, password });

        let response: LoginResponse = send(request).await?;
        self.session.sign_in(response.token, response.userid, kind);
        debug!(user_id = response.userid, ?kind, "signed in");

        Ok(response.userid)
    }

    fn authorized(&self, request: RequestBuilder) -> Result<RequestBuilder> {
        let token = self.session.token().ok_or(ClientError::NotAuthenticated)?;
        Ok(request.bearer_auth(token))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T> {
    let response = request.send().await?;
    if response.status().is_success() {
        return Ok(response.json().await?);
    }
    Err(api_error(response).await)
}

async fn api_error(response: Response) -> ClientError {
    let status = response.status();
    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.canonical_reason().unwrap_or("Unknown error").to_string(),
    };

    warn!(status = status.as_u16(), %message, "API request failed");
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}
