//! Configuration file loading and error types.

use std::{fs, path::Path};

use crate::Config;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("toml: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("unsupported config format")]
    UnsupportedFormat,
    #[error("validation: {0}")]
    Validation(String),
}

/// Load a config file, picking the parser from the file extension.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let data = fs::read_to_string(path)?;
    match path.extension().and_then(|s| s.to_str()).unwrap_or("") {
        "json" | "jsonc" => {
            let stripped = json_comments::StripComments::new(data.as_bytes());
            Ok(serde_json::from_reader(stripped)?)
        }
        "yaml" | "yml" => Ok(serde_yaml::from_str(&data)?),
        "toml" => Ok(toml::from_str(&data)?),
        _ => Err(ConfigError::UnsupportedFormat),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, name: &str, body: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn loads_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "agent.toml",
            r#"
[panel]
api_host = "https://panel.example.com"
key = "secret"
node_id = 3
node_type = "Trojan"
"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.panel.node_id, 3);
        assert_eq!(cfg.panel.node_type, "Trojan");
        assert_eq!(cfg.panel.timeout_secs, 5);
    }

    #[test]
    fn loads_jsonc_with_comments() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "agent.jsonc",
            r#"{
  // panel connection
  "panel": {"api_host": "http://127.0.0.1:8080", "key": "k", "node_id": 1}
}"#,
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.panel.api_host, "http://127.0.0.1:8080");
        assert_eq!(cfg.panel.node_type, "V2ray");
    }

    #[test]
    fn loads_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "agent.yaml",
            "panel:\n  api_host: http://panel\n  key: k\n  node_id: 9\n  node_type: ss\nsync:\n  update_interval_secs: 30\n",
        );
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.panel.node_type, "ss");
        assert_eq!(cfg.sync.update_interval_secs, 30);
        assert_eq!(cfg.sync.report_interval_secs, 60);
    }

    #[test]
    fn rejects_unknown_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "agent.ini", "panel = 1");
        assert!(matches!(
            load_config(&path),
            Err(ConfigError::UnsupportedFormat)
        ));
    }
}
