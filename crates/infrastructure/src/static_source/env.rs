use keycache_application::ports::StaticKeySource;

/// Reads keys from the process environment.
///
/// With a prefix, key `GROQ_URL` is read from `<prefix>GROQ_URL`.
#[derive(Debug, Clone, Default)]
pub struct EnvKeySource {
    prefix: Option<String>,
}

impl EnvKeySource {
    pub fn new() -> Self {
        Self { prefix: None }
    }

    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn variable_name(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}{key}"),
            None => key.to_string(),
        }
    }
}

impl StaticKeySource for EnvKeySource {
    fn lookup(&self, key: &str) -> Option<String> {
        std::env::var(self.variable_name(key)).ok()
    }
}
