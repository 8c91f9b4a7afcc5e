use axum::http::{HeaderMap, header};
use jsonwebtoken::{DecodingKey, Validation, decode};
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::{
    auth::{Claims, CurrentUser},
    config::{AppConfig, Env},
    error::{ResolveError, SessionError},
    models::{AuthPayload, Profile, Session},
    repository::RepositoryState,
    session_store::AuthState,
};

/// AuthEvent
///
/// Broadcast on every auth-state transition. Any part of the application can
/// subscribe; at minimum a process-lifetime task logs the stream.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    SignedIn { user_id: Uuid },
    Registered { user_id: Uuid },
    SignedOut,
}

/// SessionContext
///
/// The single source of truth for "am I signed in, and as whom". Owns the auth
/// provider handle, the repository handle and the configuration it needs, and is
/// constructed once at startup and carried in the application state. Guards and
/// handlers consult it on every request to a gated route; auth-state transitions
/// are announced on its broadcast channel.
#[derive(Clone)]
pub struct SessionContext {
    auth: AuthState,
    repo: RepositoryState,
    config: AppConfig,
    events: broadcast::Sender<AuthEvent>,
}

/// bearer_token
///
/// Pulls the token out of an `Authorization: Bearer <token>` header, if present.
/// Shared by session resolution and the logout handler.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
}

impl SessionContext {
    pub fn new(auth: AuthState, repo: RepositoryState, config: AppConfig) -> Self {
        let (events, _) = broadcast::channel(16);
        Self {
            auth,
            repo,
            config,
            events,
        }
    }

    /// initialize
    ///
    /// Startup ping against the provider's health endpoint. Advisory only: an
    /// unreachable store is logged, never fatal, because every later call carries
    /// its own error handling.
    pub async fn initialize(&self) {
        match self.auth.health().await {
            Ok(()) => tracing::info!("session store reachable"),
            Err(e) => tracing::warn!("session store health check failed: {}", e),
        }
    }

    /// subscribe
    ///
    /// Opens a receiver on the auth-event stream. Receivers only see events sent
    /// after they subscribe.
    pub fn subscribe(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// spawn_event_logger
    ///
    /// Spawns the process-lifetime subscriber that writes every auth event to the
    /// log. Called once from main after the context is built.
    pub fn spawn_event_logger(&self) {
        let mut events = self.subscribe();
        tokio::spawn(async move {
            loop {
                match events.recv().await {
                    Ok(event) => tracing::info!(?event, "auth state changed"),
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!("auth event logger lagged, {} events skipped", missed);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });
    }

    fn notify(&self, event: AuthEvent) {
        // A send error only means nobody is subscribed right now.
        let _ = self.events.send(event);
    }

    /// sign_in
    ///
    /// The password grant, with two application-level twists on top of the provider
    /// call: the configured admin alias is translated to the administrator's email
    /// before delegation (the password always travels verbatim and is verified by
    /// the provider), and a missing profile row is repaired on the spot, which
    /// makes a half-finished registration heal itself on the next login.
    pub async fn sign_in(
        &self,
        identifier: &str,
        password: &str,
    ) -> Result<AuthPayload, SessionError> {
        let email = if identifier == self.config.admin_alias {
            self.config.admin_email.as_str()
        } else {
            identifier
        };

        let (session, account) = self.auth.sign_in(email, password).await?;
        let profile = self.profile_or_repair(account.id, &account.email).await?;
        let is_admin = profile.role == "admin";

        self.notify(AuthEvent::SignedIn {
            user_id: account.id,
        });

        Ok(AuthPayload {
            session: Some(session),
            user: account,
            profile,
            is_admin,
        })
    }

    /// register
    ///
    /// Two-step account creation: the provider mints the auth account, then the
    /// profile row is upserted under the same id. The upsert is idempotent by
    /// primary key, so retrying a registration that died between the two steps
    /// converges instead of failing; full recovery also happens via the sign-in
    /// repair path. New registrations always carry the student role.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<AuthPayload, SessionError> {
        let outcome = self.auth.sign_up(email, password).await?;

        let profile = self
            .repo
            .upsert_profile(Profile {
                id: outcome.account.id,
                email: email.to_string(),
                full_name: Some(full_name.to_string()),
                role: "student".to_string(),
            })
            .await?;

        self.notify(AuthEvent::Registered {
            user_id: outcome.account.id,
        });

        Ok(AuthPayload {
            session: outcome.session,
            user: outcome.account,
            profile,
            is_admin: false,
        })
    }

    /// sign_out
    ///
    /// Ends the session unconditionally. A provider failure is logged and
    /// swallowed: the client is discarding its tokens either way, so callers never
    /// see an error and the signed-out event fires regardless.
    pub async fn sign_out(&self, access_token: &str) {
        if let Err(e) = self.auth.sign_out(access_token).await {
            tracing::warn!("session store sign-out failed, ending session anyway: {}", e);
        }
        self.notify(AuthEvent::SignedOut);
    }

    /// refresh
    ///
    /// Trades a refresh token for a fresh session via the provider's refresh grant.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Session, SessionError> {
        let (session, _account) = self.auth.refresh(refresh_token).await?;
        Ok(session)
    }

    /// resolve
    ///
    /// The "who is asking" read, run by the guards and the CurrentUser extractor on
    /// every request to a gated route. Validates the bearer token locally against
    /// the shared secret (expiry included), then loads the profile row so a deleted
    /// account stops resolving the moment its row is gone.
    ///
    /// In the Local environment only, a verified `x-user-id` header is honored
    /// first, which lets a developer poke gated routes without minting tokens.
    pub async fn resolve(&self, headers: &HeaderMap) -> Result<CurrentUser, ResolveError> {
        // Local Development Bypass Check
        if self.config.env == Env::Local {
            if let Some(user_id_header) = headers.get("x-user-id") {
                if let Ok(id_str) = user_id_header.to_str() {
                    if let Ok(user_id) = Uuid::parse_str(id_str) {
                        // The id must still map to a real profile row, so roles load
                        // exactly as they would for a token-bearing request.
                        if let Some(profile) = self.repo.get_profile(user_id).await? {
                            return Ok(Self::current_user(profile));
                        }
                    }
                }
            }
        }
        // In Production, or when the bypass did not match, the standard token flow runs.

        let token = bearer_token(headers).ok_or(ResolveError::MissingToken)?;

        let decoding_key = DecodingKey::from_secret(self.config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = decode::<Claims>(token, &decoding_key, &validation)
            .map_err(|e| ResolveError::InvalidToken(e.to_string()))?;

        // Final verification against the database: a valid token for a vanished
        // profile does not resolve.
        let profile = self
            .repo
            .get_profile(token_data.claims.sub)
            .await?
            .ok_or(ResolveError::UnknownUser)?;

        Ok(Self::current_user(profile))
    }

    fn current_user(profile: Profile) -> CurrentUser {
        let is_admin = profile.role == "admin";
        CurrentUser {
            id: profile.id,
            email: profile.email,
            full_name: profile.full_name,
            role: profile.role,
            is_admin,
        }
    }

    /// profile_or_repair
    ///
    /// Loads the profile for a freshly authenticated account, creating the row when
    /// it is missing. The repaired row gets the admin role only when the account is
    /// the configured administrator; everyone else comes back as a student.
    async fn profile_or_repair(
        &self,
        user_id: Uuid,
        email: &str,
    ) -> Result<Profile, SessionError> {
        if let Some(profile) = self.repo.get_profile(user_id).await? {
            return Ok(profile);
        }

        tracing::warn!("profile row missing for {}, repairing", user_id);
        let role = if email == self.config.admin_email {
            "admin"
        } else {
            "student"
        };

        let profile = self
            .repo
            .upsert_profile(Profile {
                id: user_id,
                email: email.to_string(),
                full_name: None,
                role: role.to_string(),
            })
            .await?;

        Ok(profile)
    }
}
