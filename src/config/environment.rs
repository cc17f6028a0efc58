//! Application environment detection.

/// Deployment environment, selected via `ORCHESTRIX_APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Test,
    Staging,
    Production,
}

impl Environment {
    /// Reads `ORCHESTRIX_APP_ENV`, defaulting to development when unset or
    /// unrecognized.
    pub fn from_env() -> Self {
        match std::env::var("ORCHESTRIX_APP_ENV").as_deref() {
            Ok("test") => Environment::Test,
            Ok("staging") => Environment::Staging,
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Test => "test",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
