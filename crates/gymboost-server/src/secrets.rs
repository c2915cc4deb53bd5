use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Looks up provider API keys at request time.
///
/// The process environment is read on every call, so a key exported after
/// startup (or rotated in place) is picked up without a restart. Empty values
/// are treated as unset.
#[derive(Clone, Default)]
pub struct Secrets {
    fixed: Option<Arc<HashMap<String, String>>>,
}

impl Secrets {
    pub fn from_env() -> Self {
        Self { fixed: None }
    }

    /// A fixed set of values that ignores the process environment.
    pub fn fixed<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            fixed: Some(Arc::new(map)),
        }
    }

    pub fn get(&self, name: &str) -> Option<String> {
        let value = match &self.fixed {
            Some(map) => map.get(name).cloned(),
            None => std::env::var(name).ok(),
        };
        value.filter(|v| !v.trim().is_empty())
    }
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.fixed {
            Some(map) => f
                .debug_struct("Secrets")
                .field("fixed", &map.keys().collect::<Vec<_>>())
                .finish(),
            None => f.debug_struct("Secrets").field("source", &"env").finish(),
        }
    }
}
