use std::collections::BTreeMap;

use posts_core::config::{D1BindingConfig, PostsConfig};

/// Bindings the hosting runtime supplies to one invocation.
///
/// The gateway builds a fresh context per request, so a binding may change
/// between invocations and handles derived from it must not be cached.
#[derive(Debug, Clone, Default)]
pub struct ExecutionContext {
    bindings: BTreeMap<String, D1BindingConfig>,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context carrying every binding declared in `[bindings]`.
    pub fn from_config(config: &PostsConfig) -> Self {
        Self {
            bindings: config.bindings.clone(),
        }
    }

    pub fn with_binding(mut self, name: impl Into<String>, binding: D1BindingConfig) -> Self {
        self.bindings.insert(name.into(), binding);
        self
    }

    /// Look up a binding by name, ignoring ASCII case (env-sourced keys are lowercased).
    pub fn binding(&self, name: &str) -> Option<&D1BindingConfig> {
        self.bindings
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use posts_core::config::{DB_BINDING, DEFAULT_D1_API_BASE};

    fn binding(database_id: &str) -> D1BindingConfig {
        D1BindingConfig {
            account_id: "acc".into(),
            database_id: database_id.into(),
            api_token: "tok".into(),
            api_base: DEFAULT_D1_API_BASE.into(),
        }
    }

    #[test]
    fn env_lowercased_binding_is_found() {
        let mut config = PostsConfig::default();
        config.bindings.insert("db".into(), binding("d-1"));

        let ctx = ExecutionContext::from_config(&config);
        assert_eq!(ctx.binding(DB_BINDING).map(|b| b.database_id.as_str()), Some("d-1"));
        assert!(ctx.binding("CACHE").is_none());
    }

    #[test]
    fn empty_context_has_no_bindings() {
        assert!(ExecutionContext::new().binding(DB_BINDING).is_none());
        let ctx = ExecutionContext::new().with_binding(DB_BINDING, binding("d-2"));
        assert!(ctx.binding("db").is_some());
    }
}
