use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },

    #[error("GITHUB_WEBHOOK_SECRET must be set while the webhook endpoint is enabled")]
    UnsignedWebhook,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceConfig {
    GitHub {
        api_url: String,
        owner: String,
        repo: String,
        branch: String,
        token: Option<String>,
    },
    Local {
        root: PathBuf,
    },
}

/// Which webhook payloads count as blog changes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelevanceMode {
    /// Every push invalidates, whatever files it touched.
    Always,
    /// Only pushes touching the posts folder invalidate.
    ContentChanges,
}

#[derive(Clone, Debug)]
pub struct PosthookConfig {
    pub source: SourceConfig,
    pub posts_folder: String,
    pub revalidate_secret: String,
    pub webhook_enabled: bool,
    pub webhook_secret: Option<String>,
    pub require_signature: bool,
    pub relevance: RelevanceMode,
    pub cache_ttl: Duration,
    pub forward_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub json_logs: bool,
}

impl PosthookConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    // every variable goes through `lookup` so tests never touch the process env
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|val| !val.trim().is_empty());

        let source = match var("CONTENT_SOURCE").as_deref().unwrap_or("github") {
            "github" => SourceConfig::GitHub {
                api_url: var("GITHUB_API_URL")
                    .unwrap_or_else(|| "https://api.github.com".to_string())
                    .trim_end_matches('/')
                    .to_string(),
                owner: var("GITHUB_OWNER").ok_or(ConfigError::Missing("GITHUB_OWNER"))?,
                repo: var("GITHUB_REPO").ok_or(ConfigError::Missing("GITHUB_REPO"))?,
                branch: var("GITHUB_BRANCH").unwrap_or_else(|| "main".to_string()),
                token: var("GITHUB_TOKEN"),
            },
            "local" => SourceConfig::Local {
                root: PathBuf::from(
                    var("LOCAL_CONTENT_DIR").unwrap_or_else(|| "./content".to_string()),
                ),
            },
            other => {
                return Err(ConfigError::Invalid {
                    name: "CONTENT_SOURCE",
                    value: other.to_string(),
                })
            }
        };

        let posts_folder = var("POSTS_FOLDER")
            .unwrap_or_else(|| "posts".to_string())
            .trim_matches('/')
            .to_string();

        let revalidate_secret =
            var("REVALIDATE_SECRET").ok_or(ConfigError::Missing("REVALIDATE_SECRET"))?;

        let webhook_enabled = parse_bool(&var, "WEBHOOK_ENABLED", true)?;
        let webhook_secret = var("GITHUB_WEBHOOK_SECRET");
        if webhook_enabled && webhook_secret.is_none() {
            return Err(ConfigError::UnsignedWebhook);
        }

        let require_signature = parse_bool(&var, "WEBHOOK_REQUIRE_SIGNATURE", false)?;

        let relevance = match var("WEBHOOK_RELEVANCE").as_deref().unwrap_or("always") {
            "always" => RelevanceMode::Always,
            "content" => RelevanceMode::ContentChanges,
            other => {
                return Err(ConfigError::Invalid {
                    name: "WEBHOOK_RELEVANCE",
                    value: other.to_string(),
                })
            }
        };

        let cache_ttl = match var("CACHE_TTL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid {
                    name: "CACHE_TTL_SECS",
                    value: raw,
                })?,
            None => Duration::from_secs(300),
        };

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string());
        let bind_addr = bind_addr
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                name: "BIND_ADDR",
                value: bind_addr.clone(),
            })?;

        let json_logs = match var("LOG_FORMAT").as_deref().unwrap_or("compact") {
            "compact" => false,
            "json" => true,
            other => {
                return Err(ConfigError::Invalid {
                    name: "LOG_FORMAT",
                    value: other.to_string(),
                })
            }
        };

        Ok(Self {
            source,
            posts_folder,
            revalidate_secret,
            webhook_enabled,
            webhook_secret,
            require_signature,
            relevance,
            cache_ttl,
            forward_url: var("REVALIDATE_FORWARD_URL"),
            bind_addr,
            json_logs,
        })
    }
}

fn parse_bool<F>(var: &F, name: &'static str, default: bool) -> Result<bool, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        None => Ok(default),
        Some(raw) => match raw.to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid { name, value: raw }),
        },
    }
}
