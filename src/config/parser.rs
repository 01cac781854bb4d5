use crate::config::types::{ActorInput, Config};
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// Keys missing from the file take their defaults.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use shelf_scout::config::load_config;
///
/// let config = load_config(Path::new("scout.toml")).unwrap();
/// println!("Max products: {}", config.crawl.max_products);
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    validate(&config)?;
    Ok(config)
}

/// Reads an actor input document (flat camelCase JSON)
pub fn load_input(path: &Path) -> Result<ActorInput, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let input: ActorInput = serde_json::from_str(&content)?;
    Ok(input)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Stored with each run so datasets can be traced back to the settings that
/// produced them.
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    Ok(hash_content(&content))
}

/// Hex-encoded SHA-256 of an arbitrary configuration text
pub fn hash_content(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    hex::encode(hasher.finalize())
}

/// Loads a configuration and returns both the config and its hash
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let config = load_config(path)?;
    let hash = compute_config_hash(path)?;
    Ok((config, hash))
}

/// Resolves the effective configuration from an optional file and an
/// optional actor input overlay, then validates the result
///
/// Without a file the defaults are used and the hash is taken over the
/// empty document.
pub fn resolve_config(
    config_path: Option<&Path>,
    input_path: Option<&Path>,
) -> Result<(Config, String), ConfigError> {
    let (mut config, mut hash) = match config_path {
        Some(path) => load_config_with_hash(path)?,
        None => (Config::default(), hash_content("")),
    };

    if let Some(path) = input_path {
        let raw = std::fs::read_to_string(path)?;
        let input: ActorInput = serde_json::from_str(&raw)?;
        input.apply(&mut config);
        hash = hash_content(&format!("{}\n{}", hash, raw));
    }

    validate(&config)?;
    Ok((config, hash))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::OverCeilingPolicy;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_file(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[crawl]
start-url = "https://www.example.com/s?k=keyboards"
max-products = 50
over-ceiling = "flag"

[pacing]
min-delay = 0.5
max-delay = 1.5
max-retries = 5

[session]
rotation-enabled = true
min-requests = 10
max-requests = 20

[output]
dataset-path = "./out.jsonl"
"#;

        let file = create_temp_file(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.crawl.start_url, "https://www.example.com/s?k=keyboards");
        assert_eq!(config.crawl.max_products, 50);
        assert_eq!(config.crawl.over_ceiling, OverCeilingPolicy::Flag);
        assert_eq!(config.pacing.max_retries, 5);
        assert!(config.session.rotation_enabled);
        assert_eq!(config.session.max_requests, 20);
        assert_eq!(config.output.dataset_path, "./out.jsonl");
        // Untouched sections keep their defaults
        assert!(!config.proxy.enabled);
        assert_eq!(config.pacing.request_timeout, 30.0);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let file = create_temp_file("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.crawl.max_products, 20_000);
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/scout.toml"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let file = create_temp_file("this is not valid TOML {{{");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let file = create_temp_file("[session]\nmin-requests = 60\nmax-requests = 50\n");
        let result = load_config(file.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_resolve_config_applies_input_overlay() {
        let config_file = create_temp_file("[crawl]\nmax-products = 10\n");
        let input_file = create_temp_file(r#"{"maxProducts": 3, "sessionRotationEnabled": true}"#);

        let (config, hash) =
            resolve_config(Some(config_file.path()), Some(input_file.path())).unwrap();

        assert_eq!(config.crawl.max_products, 3);
        assert!(config.session.rotation_enabled);
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_resolve_config_validates_overlay() {
        let input_file = create_temp_file(r#"{"minDelay": 5.0, "maxDelay": 1.0}"#);
        let result = resolve_config(None, Some(input_file.path()));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_load_input_rejects_malformed_json() {
        let input_file = create_temp_file("{ not json");
        assert!(matches!(
            load_input(input_file.path()),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn test_compute_config_hash() {
        let file = create_temp_file("test content");

        let hash1 = compute_config_hash(file.path()).unwrap();
        let hash2 = compute_config_hash(file.path()).unwrap();

        assert_eq!(hash1, hash2);
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn test_different_content_different_hash() {
        assert_ne!(hash_content("content 1"), hash_content("content 2"));
    }
}
