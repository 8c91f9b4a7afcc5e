use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Claims;
use crate::error::AuthServiceError;
use crate::models::{AuthAccount, Session};

// 1. AuthService Contract
/// AuthService
///
/// Defines the abstract contract for all interactions with the external auth provider
/// (the Session Store's auth facet). This trait allows us to swap the concrete
/// implementation from the real GoTrue client (SupabaseAuthClient) in production to
/// the in-memory Mock (MockAuthService) during testing, without affecting the calling
/// session context or handlers.
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Creates a new auth account. Depending on the provider's confirmation settings
    /// the outcome may or may not include a ready-to-use session.
    async fn sign_up(&self, email: &str, password: &str)
    -> Result<SignUpOutcome, AuthServiceError>;

    /// Exchanges email + password for a session via the password grant.
    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, AuthAccount), AuthServiceError>;

    /// Revokes the session behind the given access token.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthServiceError>;

    /// Trades a refresh token for a fresh session via the refresh-token grant.
    async fn refresh(&self, refresh_token: &str)
    -> Result<(Session, AuthAccount), AuthServiceError>;

    /// Pings the provider's health endpoint. Advisory only; callers log and move on.
    async fn health(&self) -> Result<(), AuthServiceError>;
}

/// SignUpOutcome
///
/// Result of a successful sign-up. `session` is `None` when the provider requires
/// email confirmation before issuing tokens.
#[derive(Debug, Clone)]
pub struct SignUpOutcome {
    pub account: AuthAccount,
    pub session: Option<Session>,
}

/// AuthState
///
/// The concrete type used to share the auth service access across the application state.
pub type AuthState = Arc<dyn AuthService>;

// 2. The Real Implementation (Supabase GoTrue)
/// SupabaseAuthClient
///
/// The concrete implementation speaking the GoTrue REST API over HTTP. Every request
/// carries the project's public `apikey` header; the logout call additionally carries
/// the session's bearer token. Endpoint and key come from AppConfig, so the same
/// client works against the hosted project and the local Supabase CLI stack.
#[derive(Clone)]
pub struct SupabaseAuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
}

/// TokenResponse
///
/// Minimal struct to deserialize the provider's token-bearing responses (password
/// grant, refresh grant, auto-confirmed sign-up).
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    token_type: String,
    expires_in: i64,
    refresh_token: String,
    user: AuthAccount,
}

/// AuthErrorBody
///
/// The provider's error responses are not uniform across endpoints; the human-readable
/// message lives in whichever of these fields is present.
#[derive(Deserialize, Default)]
struct AuthErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    error: Option<String>,
}

impl SupabaseAuthClient {
    /// new
    ///
    /// Constructs the GoTrue client from the project URL and anon key in AppConfig.
    pub fn new(base_url: &str, anon_key: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    /// Turns a non-success provider response into `Rejected` carrying the provider's
    /// own message, so clients see the same text the provider produced.
    async fn rejection(response: reqwest::Response) -> AuthServiceError {
        let status = response.status();
        let body: AuthErrorBody = response.json().await.unwrap_or_default();
        let message = body
            .error_description
            .or(body.msg)
            .or(body.error)
            .unwrap_or_else(|| format!("auth request failed with status {}", status));
        AuthServiceError::Rejected(message)
    }

    async fn token_request(
        &self,
        grant_type: &str,
        payload: serde_json::Value,
    ) -> Result<(Session, AuthAccount), AuthServiceError> {
        let response = self
            .http
            .post(self.endpoint(&format!("/token?grant_type={}", grant_type)))
            .header("apikey", &self.anon_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| AuthServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthServiceError::Malformed(e.to_string()))?;

        Ok(token.into_parts())
    }
}

impl TokenResponse {
    fn into_parts(self) -> (Session, AuthAccount) {
        let session = Session {
            access_token: self.access_token,
            token_type: self.token_type,
            expires_in: self.expires_in,
            refresh_token: self.refresh_token,
        };
        (session, self.user)
    }
}

#[async_trait]
impl AuthService for SupabaseAuthClient {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, AuthServiceError> {
        let response = self
            .http
            .post(self.endpoint("/signup"))
            .header("apikey", &self.anon_key)
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| AuthServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        // With confirmations disabled the provider answers with a full token bundle;
        // otherwise the body is the bare account record.
        let body = response
            .text()
            .await
            .map_err(|e| AuthServiceError::Transport(e.to_string()))?;

        if let Ok(token) = serde_json::from_str::<TokenResponse>(&body) {
            let (session, account) = token.into_parts();
            return Ok(SignUpOutcome {
                account,
                session: Some(session),
            });
        }

        let account: AuthAccount = serde_json::from_str(&body)
            .map_err(|e| AuthServiceError::Malformed(e.to_string()))?;

        Ok(SignUpOutcome {
            account,
            session: None,
        })
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, AuthAccount), AuthServiceError> {
        self.token_request(
            "password",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthServiceError> {
        let response = self
            .http
            .post(self.endpoint("/logout"))
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", access_token))
            .send()
            .await
            .map_err(|e| AuthServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }

    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(Session, AuthAccount), AuthServiceError> {
        self.token_request(
            "refresh_token",
            serde_json::json!({ "refresh_token": refresh_token }),
        )
        .await
    }

    async fn health(&self) -> Result<(), AuthServiceError> {
        let response = self
            .http
            .get(self.endpoint("/health"))
            .header("apikey", &self.anon_key)
            .send()
            .await
            .map_err(|e| AuthServiceError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(Self::rejection(response).await);
        }

        Ok(())
    }
}

// 3. The Mock Implementation (For Unit Tests)
/// MockAuthService
///
/// A mock implementation of `AuthService` used exclusively for unit and integration
/// testing. Accounts live in memory, and issued access tokens are real JWTs signed
/// with the test secret, so session resolution and the route guards behave exactly
/// as they do against the real provider, without any network connection.
#[derive(Clone)]
pub struct MockAuthService {
    accounts: Arc<Mutex<HashMap<String, MockAccount>>>,
    refresh_tokens: Arc<Mutex<HashMap<String, Uuid>>>,
    jwt_secret: String,
    /// When true, all operations return a simulated transport failure.
    pub should_fail: bool,
}

#[derive(Clone)]
struct MockAccount {
    id: Uuid,
    password: String,
}

impl MockAuthService {
    pub fn new(jwt_secret: &str) -> Self {
        Self {
            accounts: Arc::new(Mutex::new(HashMap::new())),
            refresh_tokens: Arc::new(Mutex::new(HashMap::new())),
            jwt_secret: jwt_secret.to_string(),
            should_fail: false,
        }
    }

    pub fn new_failing(jwt_secret: &str) -> Self {
        let mut mock = Self::new(jwt_secret);
        mock.should_fail = true;
        mock
    }

    /// Pre-seeds an account, as if it had signed up earlier. Returns its id.
    pub fn seed_account(&self, email: &str, password: &str) -> Uuid {
        let id = Uuid::new_v4();
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            MockAccount {
                id,
                password: password.to_string(),
            },
        );
        id
    }

    fn issue_session(&self, id: Uuid) -> Session {
        let now = chrono::Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: id,
            exp: now + 3600,
            iat: now,
        };
        let access_token = jsonwebtoken::encode(
            &jsonwebtoken::Header::default(),
            &claims,
            &jsonwebtoken::EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .unwrap();

        let refresh_token = format!("refresh-{}", Uuid::new_v4());
        self.refresh_tokens
            .lock()
            .unwrap()
            .insert(refresh_token.clone(), id);

        Session {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: 3600,
            refresh_token,
        }
    }

    fn simulated_failure(&self) -> Result<(), AuthServiceError> {
        if self.should_fail {
            return Err(AuthServiceError::Transport(
                "Mock Auth Error: Simulation requested".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl AuthService for MockAuthService {
    async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SignUpOutcome, AuthServiceError> {
        self.simulated_failure()?;

        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            // The provider's own wording for a duplicate registration.
            return Err(AuthServiceError::Rejected(
                "User already registered".to_string(),
            ));
        }

        let id = Uuid::new_v4();
        accounts.insert(
            email.to_string(),
            MockAccount {
                id,
                password: password.to_string(),
            },
        );
        drop(accounts);

        Ok(SignUpOutcome {
            account: AuthAccount {
                id,
                email: email.to_string(),
            },
            session: Some(self.issue_session(id)),
        })
    }

    async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, AuthAccount), AuthServiceError> {
        self.simulated_failure()?;

        let account = {
            let accounts = self.accounts.lock().unwrap();
            accounts.get(email).cloned()
        };

        match account {
            Some(account) if account.password == password => Ok((
                self.issue_session(account.id),
                AuthAccount {
                    id: account.id,
                    email: email.to_string(),
                },
            )),
            // Same message for unknown email and wrong password, matching the provider.
            _ => Err(AuthServiceError::Rejected(
                "Invalid login credentials".to_string(),
            )),
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthServiceError> {
        self.simulated_failure()?;
        Ok(())
    }

    async fn refresh(
        &self,
        refresh_token: &str,
    ) -> Result<(Session, AuthAccount), AuthServiceError> {
        self.simulated_failure()?;

        let id = {
            let tokens = self.refresh_tokens.lock().unwrap();
            tokens.get(refresh_token).copied()
        };

        let Some(id) = id else {
            return Err(AuthServiceError::Rejected(
                "Invalid Refresh Token: Refresh Token Not Found".to_string(),
            ));
        };

        let email = {
            let accounts = self.accounts.lock().unwrap();
            accounts
                .iter()
                .find(|(_, account)| account.id == id)
                .map(|(email, _)| email.clone())
        }
        .unwrap_or_default();

        Ok((self.issue_session(id), AuthAccount { id, email }))
    }

    async fn health(&self) -> Result<(), AuthServiceError> {
        self.simulated_failure()?;
        Ok(())
    }
}
