use std::sync::{Arc, Mutex};

use log::*;

#[derive(Debug)]
struct Session {
    username: String,
}

/// The authenticated console user. Cheap to clone.
#[derive(Debug, Clone)]
pub struct CurrentUser(Arc<Session>);

impl CurrentUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self(Arc::new(Session {
            username: username.into(),
        }))
    }

    pub fn username(&self) -> &str {
        &self.0.username
    }
}

impl PartialEq for CurrentUser {
    fn eq(&self, other: &Self) -> bool {
        self.username() == other.username()
    }
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Option<CurrentUser>;
}

#[derive(Default)]
pub struct SessionStore {
    current: Mutex<Option<CurrentUser>>,
}

impl SessionStore {
    pub fn logged_in(username: &str) -> Self {
        let store = Self::default();
        store.login(username);
        store
    }

    pub fn login(&self, username: &str) -> CurrentUser {
        let user = CurrentUser::new(username);
        *self.lock() = Some(user.clone());

        debug!("Console session now belongs to {username}");

        user
    }

    pub fn logout(&self) {
        if let Some(user) = self.lock().take() {
            debug!("User {} logged out", user.username());
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<CurrentUser>> {
        // a poisoned lock still holds a perfectly usable Option
        self.current.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl IdentityProvider for SessionStore {
    fn current_user(&self) -> Option<CurrentUser> {
        self.lock().clone()
    }
}
