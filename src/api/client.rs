//! HTTP client for the cliMate backend
//!
//! Every authenticated call goes through [`ApiClient::authorize`], which
//! refreshes an expired access token before the request is sent.

use chrono::Utc;
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

use super::ApiError;
use crate::admin::Submission;
use crate::game::driver::GameBackend;
use crate::models::{Chance, NewChance, NewTask, Task, User, UserGameStats, UserUpdate};
use crate::session::{is_expired, Session};

#[derive(Deserialize)]
struct TokenPair {
    access: String,
    refresh: String,
}

#[derive(Deserialize)]
struct AccessToken {
    access: String,
}

#[derive(Serialize)]
struct Registration<'a> {
    username: &'a str,
    email: &'a str,
    password: &'a str,
}

/// cliMate API client
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Session,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>, session: Session) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Obtain a token pair and keep it in the session
    pub async fn login(&self, username: &str, password: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("accounts/token/"))
            .json(&json!({ "username": username, "password": password }));
        let pair: TokenPair = Self::parse(request).await?;
        self.session.store_pair(&pair.access, &pair.refresh)?;
        info!("Logged in as {}", username);
        Ok(())
    }

    /// Exchange the refresh token for a new access token
    pub async fn refresh_access(&self) -> Result<String, ApiError> {
        let refresh = self.session.refresh_token().ok_or(ApiError::Unauthorized)?;
        let request = self
            .client
            .post(self.url("accounts/token/refresh/"))
            .json(&json!({ "refresh": refresh }));
        let token: AccessToken = Self::parse(request).await?;
        self.session.store_access(&token.access)?;
        debug!("Access token refreshed");
        Ok(token.access)
    }

    /// Current access token, refreshed when expired
    ///
    /// A failed refresh logs the session out.
    pub async fn authorize(&self) -> Result<String, ApiError> {
        let access = self.session.access_token().ok_or(ApiError::Unauthorized)?;
        if !is_expired(&access, Utc::now()) {
            return Ok(access);
        }

        match self.refresh_access().await {
            Ok(access) => Ok(access),
            Err(e) => {
                warn!("Token refresh failed: {}", e);
                self.session.logout()?;
                Err(ApiError::Unauthorized)
            }
        }
    }

    async fn authed(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.authorize().await?;
        Ok(self
            .client
            .request(method, self.url(path))
            .bearer_auth(token))
    }

    async fn check(response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Unauthorized);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Backend error: {} - {}", status, body);
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ApiError> {
        let response = Self::check(request.send().await?).await?;
        Ok(response.json().await?)
    }

    async fn discard(request: RequestBuilder) -> Result<(), ApiError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    // ---- Accounts ----

    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, ApiError> {
        let request = self
            .client
            .post(self.url("accounts/user/register/"))
            .json(&Registration {
                username,
                email,
                password,
            });
        Self::parse(request).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        Self::parse(self.authed(Method::GET, "accounts/me/").await?).await
    }

    pub async fn update_stats(&self, stats: &UserGameStats) -> Result<User, ApiError> {
        let request = self
            .authed(Method::PATCH, "accounts/me/")
            .await?
            .json(&json!({ "usergamestats": stats }));
        Self::parse(request).await
    }

    pub async fn update_profile(&self, update: &UserUpdate) -> Result<User, ApiError> {
        let request = self.authed(Method::PUT, "accounts/me/").await?.json(update);
        Self::parse(request).await
    }

    /// All users, highest score first
    pub async fn ranked_users(&self) -> Result<Vec<User>, ApiError> {
        Self::parse(self.authed(Method::GET, "accounts/ranked-users/").await?).await
    }

    pub async fn change_password(&self, old: &str, new: &str) -> Result<(), ApiError> {
        let request = self
            .authed(Method::POST, "accounts/change-password/")
            .await?
            .json(&json!({ "old_password": old, "new_password": new }));
        Self::discard(request).await
    }

    /// Ask for a reset link by email; succeeds whether or not the user exists
    pub async fn request_password_reset(&self, username: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("accounts/forgot-password-request/"))
            .json(&json!({ "username": username }));
        Self::discard(request).await
    }

    pub async fn reset_password(
        &self,
        user_id: u64,
        token: &str,
        new_password: &str,
    ) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.url("accounts/reset-password/"))
            .json(&json!({ "user_id": user_id, "token": token, "new_password": new_password }));
        Self::discard(request).await
    }

    /// Delete the logged-in account and drop its tokens
    pub async fn delete_account(&self) -> Result<(), ApiError> {
        Self::discard(self.authed(Method::DELETE, "accounts/delete-account/").await?).await?;
        self.session.logout()?;
        Ok(())
    }

    // ---- Tasks ----

    pub async fn tasks(&self) -> Result<Vec<Task>, ApiError> {
        Self::parse(self.authed(Method::GET, "tasks/").await?).await
    }

    pub async fn task(&self, id: u64) -> Result<Task, ApiError> {
        Self::parse(self.authed(Method::GET, &format!("tasks/{}/", id)).await?).await
    }

    pub async fn delete_task(&self, id: u64) -> Result<(), ApiError> {
        Self::discard(self.authed(Method::DELETE, &format!("tasks/{}/", id)).await?).await
    }

    /// POST a new task or PUT an edited one
    pub async fn save_task(&self, submission: &Submission<NewTask>) -> Result<Task, ApiError> {
        self.save("tasks", submission).await
    }

    // ---- Chances ----

    pub async fn chances(&self) -> Result<Vec<Chance>, ApiError> {
        Self::parse(self.authed(Method::GET, "chances/").await?).await
    }

    pub async fn chance(&self, id: u64) -> Result<Chance, ApiError> {
        Self::parse(self.authed(Method::GET, &format!("chances/{}/", id)).await?).await
    }

    pub async fn delete_chance(&self, id: u64) -> Result<(), ApiError> {
        Self::discard(self.authed(Method::DELETE, &format!("chances/{}/", id)).await?).await
    }

    pub async fn save_chance(
        &self,
        submission: &Submission<NewChance>,
    ) -> Result<Chance, ApiError> {
        self.save("chances", submission).await
    }

    // ---- Admin users ----

    pub async fn users(&self) -> Result<Vec<User>, ApiError> {
        Self::parse(self.authed(Method::GET, "admin/users/").await?).await
    }

    pub async fn delete_user(&self, id: u64) -> Result<(), ApiError> {
        Self::discard(self.authed(Method::DELETE, &format!("admin/users/{}/", id)).await?).await
    }

    pub async fn save_user(&self, submission: &Submission<UserUpdate>) -> Result<User, ApiError> {
        self.save("admin/users", submission).await
    }

    async fn save<B, T>(&self, collection: &str, submission: &Submission<B>) -> Result<T, ApiError>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        let request = match submission {
            Submission::Create(body) => self
                .authed(Method::POST, &format!("{}/", collection))
                .await?
                .json(body),
            Submission::Update(id, body) => self
                .authed(Method::PUT, &format!("{}/{}/", collection, id))
                .await?
                .json(body),
        };
        Self::parse(request).await
    }
}

impl GameBackend for ApiClient {
    type Error = ApiError;

    async fn save_stats(&self, stats: &UserGameStats) -> Result<(), ApiError> {
        self.update_stats(stats).await.map(|_| ())
    }
}
