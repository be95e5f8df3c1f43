use crate::config::{ConfigError, PosthookConfig, RelevanceMode, SourceConfig};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

fn load(vars: &[(&str, &str)]) -> Result<PosthookConfig, ConfigError> {
    let env: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    PosthookConfig::from_lookup(|key| env.get(key).cloned())
}

const MINIMAL: &[(&str, &str)] = &[
    ("GITHUB_OWNER", "someone"),
    ("GITHUB_REPO", "blog"),
    ("REVALIDATE_SECRET", "reval"),
    ("GITHUB_WEBHOOK_SECRET", "hook"),
];

#[test]
fn test_defaults() {
    let config = load(MINIMAL).unwrap();

    assert_eq!(
        config.source,
        SourceConfig::GitHub {
            api_url: "https://api.github.com".into(),
            owner: "someone".into(),
            repo: "blog".into(),
            branch: "main".into(),
            token: None,
        }
    );
    assert_eq!(config.posts_folder, "posts");
    assert!(config.webhook_enabled);
    assert!(!config.require_signature);
    assert_eq!(config.relevance, RelevanceMode::Always);
    assert_eq!(config.cache_ttl, Duration::from_secs(300));
    assert_eq!(config.bind_addr.port(), 3000);
    assert!(config.forward_url.is_none());
    assert!(!config.json_logs);
}

#[test]
fn test_overrides() {
    let mut vars = MINIMAL.to_vec();
    vars.extend_from_slice(&[
        ("GITHUB_TOKEN", "ghp_x"),
        ("GITHUB_API_URL", "http://localhost:9000/"),
        ("POSTS_FOLDER", "/content/posts/"),
        ("WEBHOOK_RELEVANCE", "content"),
        ("WEBHOOK_REQUIRE_SIGNATURE", "true"),
        ("CACHE_TTL_SECS", "5"),
        ("LOG_FORMAT", "json"),
    ]);
    let config = load(&vars).unwrap();

    match config.source {
        SourceConfig::GitHub { api_url, token, .. } => {
            assert_eq!(api_url, "http://localhost:9000");
            assert_eq!(token.as_deref(), Some("ghp_x"));
        }
        other => panic!("unexpected source {other:?}"),
    }
    assert_eq!(config.posts_folder, "content/posts");
    assert_eq!(config.relevance, RelevanceMode::ContentChanges);
    assert!(config.require_signature);
    assert_eq!(config.cache_ttl, Duration::from_secs(5));
    assert!(config.json_logs);
}

#[test]
fn test_local_source() {
    let config = load(&[
        ("CONTENT_SOURCE", "local"),
        ("LOCAL_CONTENT_DIR", "/srv/blog"),
        ("REVALIDATE_SECRET", "reval"),
        ("GITHUB_WEBHOOK_SECRET", "hook"),
    ])
    .unwrap();

    assert_eq!(
        config.source,
        SourceConfig::Local {
            root: PathBuf::from("/srv/blog")
        }
    );
}

// an enabled webhook without a secret must stop startup instead of accepting anything
#[test]
fn test_webhook_secret_required_while_enabled() {
    let vars: Vec<_> = MINIMAL
        .iter()
        .copied()
        .filter(|(k, _)| *k != "GITHUB_WEBHOOK_SECRET")
        .collect();
    assert_eq!(load(&vars).unwrap_err(), ConfigError::UnsignedWebhook);

    // blank counts as unset
    let mut blank = vars.clone();
    blank.push(("GITHUB_WEBHOOK_SECRET", "  "));
    assert_eq!(load(&blank).unwrap_err(), ConfigError::UnsignedWebhook);

    let mut disabled = vars;
    disabled.push(("WEBHOOK_ENABLED", "false"));
    let config = load(&disabled).unwrap();
    assert!(!config.webhook_enabled);
    assert!(config.webhook_secret.is_none());
}

#[test]
fn test_missing_required_values() {
    assert_eq!(
        load(&[("REVALIDATE_SECRET", "r"), ("GITHUB_WEBHOOK_SECRET", "h")]).unwrap_err(),
        ConfigError::Missing("GITHUB_OWNER")
    );
    assert_eq!(
        load(&[("GITHUB_OWNER", "o"), ("GITHUB_REPO", "r")]).unwrap_err(),
        ConfigError::Missing("REVALIDATE_SECRET")
    );
}

#[test]
fn test_invalid_values() {
    for (name, value) in [
        ("CONTENT_SOURCE", "s3"),
        ("WEBHOOK_RELEVANCE", "sometimes"),
        ("CACHE_TTL_SECS", "-1"),
        ("WEBHOOK_REQUIRE_SIGNATURE", "maybe"),
        ("BIND_ADDR", "nowhere"),
        ("LOG_FORMAT", "xml"),
    ] {
        let mut vars = MINIMAL.to_vec();
        vars.push((name, value));
        assert_eq!(
            load(&vars).unwrap_err(),
            ConfigError::Invalid {
                name,
                value: value.to_string()
            }
        );
    }
}
