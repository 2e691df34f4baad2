//! Model providers understood by the Codex CLI.

/// A provider the CLI knows about, with the environment variable that holds
/// its credentials.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnownProvider {
    pub name: &'static str,
    pub api_key_var: Option<&'static str>,
}

pub const KNOWN_PROVIDERS: &[KnownProvider] = &[
    KnownProvider {
        name: "openai",
        api_key_var: Some("OPENAI_API_KEY"),
    },
    KnownProvider {
        name: "azure",
        api_key_var: Some("AZURE_OPENAI_API_KEY"),
    },
    KnownProvider {
        name: "openrouter",
        api_key_var: Some("OPENROUTER_API_KEY"),
    },
    KnownProvider {
        name: "gemini",
        api_key_var: Some("GEMINI_API_KEY"),
    },
    KnownProvider {
        name: "ollama",
        api_key_var: None,
    },
    KnownProvider {
        name: "mistral",
        api_key_var: Some("MISTRAL_API_KEY"),
    },
    KnownProvider {
        name: "deepseek",
        api_key_var: Some("DEEPSEEK_API_KEY"),
    },
    KnownProvider {
        name: "xai",
        api_key_var: Some("XAI_API_KEY"),
    },
    KnownProvider {
        name: "groq",
        api_key_var: Some("GROQ_API_KEY"),
    },
    KnownProvider {
        name: "arceeai",
        api_key_var: Some("ARCEEAI_API_KEY"),
    },
];

/// Look up a provider by name (case-insensitive).
pub fn lookup(name: &str) -> Option<&'static KnownProvider> {
    KNOWN_PROVIDERS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}

/// Warn about provider settings that will likely make the CLI fail.
///
/// Unknown providers are passed through untouched since the CLI accepts
/// custom providers from its own config file.
pub fn check_provider(name: &str) {
    match lookup(name) {
        Some(KnownProvider {
            api_key_var: Some(var),
            ..
        }) => {
            if std::env::var_os(var).is_none() {
                tracing::warn!(provider = name, "{} is not set in the environment", var);
            }
        }
        Some(_) => {}
        None => tracing::warn!(provider = name, "unknown provider, passing through"),
    }
}
