use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-4o-mini";

/// Contents of `tracelens.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TraceLensConfig {
    pub database: Option<String>,
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub llm: Option<LlmConfig>,
}

/// `[llm]` table. The API key is read from the environment only.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_url: Option<String>,
    pub model: Option<String>,
}

impl TraceLensConfig {
    /// What `tracelens init` writes
    pub fn starter() -> Self {
        Self {
            database: Some(default_database_path().to_string_lossy().into_owned()),
            port: Some(DEFAULT_PORT),
            llm: Some(LlmConfig {
                api_url: Some(DEFAULT_LLM_API_URL.to_string()),
                model: Some(DEFAULT_LLM_MODEL.to_string()),
            }),
        }
    }
}

/// Values given on the command line
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

/// Effective settings: CLI > environment > config file > defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub port: u16,
    pub llm: LlmSettings,
}

impl Settings {
    pub fn resolve(config: Option<&TraceLensConfig>, overrides: &Overrides) -> anyhow::Result<Self> {
        Self::resolve_with(config, overrides, |key| std::env::var(key).ok())
    }

    /// Same as [`Settings::resolve`] with an explicit environment lookup
    pub fn resolve_with(
        config: Option<&TraceLensConfig>,
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let env = |key: &str| env(key).filter(|v| !v.trim().is_empty());
        let file = config.cloned().unwrap_or_default();
        let file_llm = file.llm.unwrap_or_default();

        let database = overrides
            .database
            .clone()
            .or_else(|| env("TRACELENS_DATABASE").map(PathBuf::from))
            .or_else(|| file.database.map(PathBuf::from))
            .unwrap_or_else(default_database_path);

        let port = match (overrides.port, env("PORT")) {
            (Some(port), _) => port,
            (None, Some(raw)) => raw
                .trim()
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid PORT {:?}: {}", raw, e))?,
            (None, None) => file.port.unwrap_or(DEFAULT_PORT),
        };

        let llm = LlmSettings {
            api_url: env("LLM_API_URL")
                .or(file_llm.api_url)
                .unwrap_or_else(|| DEFAULT_LLM_API_URL.to_string()),
            api_key: env("LLM_API_KEY"),
            model: env("LLM_MODEL")
                .or(file_llm.model)
                .unwrap_or_else(|| DEFAULT_LLM_MODEL.to_string()),
        };

        Ok(Self { database, port, llm })
    }
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("tracelens.toml")
}

pub fn default_database_path() -> PathBuf {
    PathBuf::from(".tracelens").join("tracelens.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<TraceLensConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: TraceLensConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &TraceLensConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let settings = Settings::resolve_with(None, &Overrides::default(), env_of(&[])).unwrap();
        assert_eq!(settings.database, default_database_path());
        assert_eq!(settings.port, DEFAULT_PORT);
        assert_eq!(settings.llm.api_url, DEFAULT_LLM_API_URL);
        assert_eq!(settings.llm.model, DEFAULT_LLM_MODEL);
        assert_eq!(settings.llm.api_key, None);
    }

    #[test]
    fn test_precedence() {
        let file = TraceLensConfig {
            database: Some("file.db".into()),
            port: Some(9000),
            llm: Some(LlmConfig {
                api_url: Some("http://file/v1".into()),
                model: Some("file-model".into()),
            }),
        };
        let env = env_of(&[("TRACELENS_DATABASE", "env.db"), ("PORT", "9100"), ("LLM_MODEL", "env-model")]);

        let from_env = Settings::resolve_with(Some(&file), &Overrides::default(), &env).unwrap();
        assert_eq!(from_env.database, PathBuf::from("env.db"));
        assert_eq!(from_env.port, 9100);
        assert_eq!(from_env.llm.model, "env-model");
        assert_eq!(from_env.llm.api_url, "http://file/v1");

        let overrides = Overrides {
            database: Some(PathBuf::from("cli.db")),
            port: Some(9200),
        };
        let from_cli = Settings::resolve_with(Some(&file), &overrides, &env).unwrap();
        assert_eq!(from_cli.database, PathBuf::from("cli.db"));
        assert_eq!(from_cli.port, 9200);
    }

    #[test]
    fn test_invalid_port() {
        let result = Settings::resolve_with(None, &Overrides::default(), env_of(&[("PORT", "eighty")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_write_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tracelens.toml");

        write_config(&path, &TraceLensConfig::starter(), false).unwrap();
        assert!(write_config(&path, &TraceLensConfig::starter(), false).is_err());

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(!contents.contains("api_key"));
        assert_eq!(load_config(Some(&path)).unwrap(), Some(TraceLensConfig::starter()));
        assert_eq!(load_config(Some(&dir.path().join("missing.toml"))).unwrap(), None);
    }

    #[test]
    fn test_ensure_db_dir() {
        let dir = tempfile::tempdir().unwrap();
        let db = dir.path().join(".tracelens").join("tracelens.db");
        ensure_db_dir(&db).unwrap();
        assert!(db.parent().unwrap().is_dir());
    }
}
