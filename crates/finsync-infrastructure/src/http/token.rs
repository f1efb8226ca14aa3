use std::fmt;
use std::sync::{Arc, RwLock};

/// Shared bearer-token cell.
///
/// The session store is the only writer; the API client reads it on every
/// request, so a token change is picked up by the next call without
/// touching requests already in flight.
#[derive(Clone, Default)]
pub struct AccessToken {
    inner: Arc<RwLock<Option<String>>>,
}

impl AccessToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<String> {
        match self.inner.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        let value = if token.is_empty() { None } else { Some(token) };
        match self.inner.write() {
            Ok(mut guard) => *guard = value,
            Err(poisoned) => *poisoned.into_inner() = value,
        }
    }

    pub fn clear(&self) {
        match self.inner.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn is_present(&self) -> bool {
        self.get().is_some()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = if self.is_present() { "<redacted>" } else { "<none>" };
        f.debug_tuple("AccessToken").field(&state).finish()
    }
}
