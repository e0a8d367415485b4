use std::sync::{PoisonError, RwLock};

use comanda_common::Secret;
use log::*;

/// The customer's bearer token, shared by every clone of the REST client.
///
/// The token is obtained elsewhere (login is not part of this client) and injected here. It is dropped as soon as the
/// server answers 401.
#[derive(Debug, Default)]
pub struct Session {
    token: RwLock<Option<Secret<String>>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token<S: Into<Secret<String>>>(token: S) -> Self {
        let session = Self::new();
        session.set_token(token);
        session
    }

    pub fn token(&self) -> Option<Secret<String>> {
        self.token.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn set_token<S: Into<Secret<String>>>(&self, token: S) {
        let token = token.into();
        if token.is_empty() {
            warn!("🌐️ Ignoring an empty session token");
            return;
        }
        debug!("🌐️ Session token set ({})", token.hint());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }
}
