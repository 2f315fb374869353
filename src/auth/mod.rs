//! Login flow on top of the transport and the session store.
//!
//! The session store never writes the token itself; `login` does, then hands
//! the user record to the store and flips the login flag.

use serde_json::Value;
use thiserror::Error;

use crate::session::{SessionStore, UserRecord};
use crate::storage::{DurableStorage, StorageError, TOKEN_KEY};
use crate::transport::{ApiRequest, Transport, TransportError};

#[derive(Error, Debug)]
pub enum AuthError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("Failed to store session token: {0}")]
    Storage(#[from] StorageError),

    #[error("Login response did not include a token")]
    MissingToken,

    #[error("Unexpected user payload: {0}")]
    UnexpectedPayload(String),
}

#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    fn form(&self) -> [(&'static str, String); 2] {
        [("username", self.username.clone()), ("password", self.password.clone())]
    }
}

/// Authenticate, persist the token and record the user in the session.
pub async fn login<T, S>(
    transport: &T,
    store: &mut SessionStore<S>,
    credentials: &Credentials,
) -> Result<UserRecord, AuthError>
where
    T: Transport + ?Sized,
    S: DurableStorage,
{
    let envelope = transport
        .send(ApiRequest::post("/auth/login").form(credentials.form()))
        .await?
        .into_envelope()?;

    let mut user = match envelope.data {
        Value::Object(map) => map,
        other => return Err(AuthError::UnexpectedPayload(other.to_string())),
    };

    let token = match user.remove("token") {
        Some(Value::String(token)) if !token.is_empty() => token,
        _ => return Err(AuthError::MissingToken),
    };

    store.storage().set(TOKEN_KEY, &token)?;
    store.set_user(user.clone());
    store.set_login_state(true);

    tracing::info!("Logged in as {}", credentials.username);
    Ok(user)
}

pub async fn register<T>(transport: &T, credentials: &Credentials) -> Result<String, AuthError>
where
    T: Transport + ?Sized,
{
    let envelope = transport
        .send(ApiRequest::post("/auth/register").form(credentials.form()))
        .await?
        .into_envelope()?;
    Ok(envelope.message)
}

/// Fetch the current user from the backend and refresh the session copy.
pub async fn whoami<T, S>(transport: &T, store: &mut SessionStore<S>) -> Result<UserRecord, AuthError>
where
    T: Transport + ?Sized,
    S: DurableStorage,
{
    let envelope = transport.send(ApiRequest::get("/auth/user")).await?.into_envelope()?;
    match envelope.data {
        Value::Object(user) => {
            store.set_user(user.clone());
            Ok(user)
        }
        other => Err(AuthError::UnexpectedPayload(other.to_string())),
    }
}

pub fn logout<S: DurableStorage>(store: &mut SessionStore<S>) {
    store.set_login_state(false);
}
