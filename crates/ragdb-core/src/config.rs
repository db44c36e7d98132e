//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (nested keys separated by `__`, e.g. `APP_CHUNKING__OVERLAP=64`).
//! [`Settings`] is the typed view used by the pipeline; every section has
//! defaults so an empty figment yields a working configuration.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        match env {
            "prod" | "production" => {
                // the offline hash embedder is a development aid only
                let provider: String = self.get("embedding.provider").unwrap_or_default();
                if provider == "hash" {
                    anyhow::bail!("embedding.provider = \"hash\" is not allowed in production");
                }
            }
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data: DataSettings,
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub retry: RetrySettings,
    pub ingest: IngestSettings,
    pub query: QuerySettings,
    pub generation: GenerationSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSettings {
    pub raw_txt_dir: String,
    pub qa_json: Option<String>,
    pub index_path: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self { raw_txt_dir: "./data/txt".into(), qa_json: None, index_path: "./data/index.jsonl".into() }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_length: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { max_length: 500, overlap: 50 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    /// `hash` (offline) or `ollama`.
    pub provider: String,
    pub model: String,
    pub base_url: String,
    pub dim: usize,
    pub concurrency: usize,
    pub timeout_ms: u64,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: "hash".into(),
            model: "nomic-embed-text".into(),
            base_url: "http://127.0.0.1:11434".into(),
            dim: 384,
            concurrency: 8,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_retries: 2, base_delay_ms: 200, max_delay_ms: 2_000 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexKind {
    Flat,
    Ivf,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    pub batch_size: usize,
    pub index_kind: IndexKind,
    /// Upper bound on IVF partitions; the actual count scales with corpus size.
    pub nlist: usize,
    pub nprobe: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self { batch_size: 1000, index_kind: IndexKind::Flat, nlist: 1024, nprobe: 8 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuerySettings {
    pub top_k: usize,
    pub context_chunks: usize,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self { top_k: 1, context_chunks: 1 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub command: String,
    pub model: String,
    pub timeout_ms: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self { command: "ollama".into(), model: "mistral".into(), timeout_ms: 120_000 }
    }
}

impl Settings {
    pub fn validate(&self) -> crate::error::Result<()> {
        let c = &self.chunking;
        if c.max_length == 0 || c.overlap >= c.max_length {
            return Err(Error::Config(format!(
                "chunking: need 0 <= overlap < max_length, got overlap={} max_length={}",
                c.overlap, c.max_length
            )));
        }
        if self.embedding.dim == 0 {
            return Err(Error::Config("embedding.dim must be positive".into()));
        }
        if self.embedding.concurrency == 0 {
            return Err(Error::Config("embedding.concurrency must be positive".into()));
        }
        if self.ingest.batch_size == 0 {
            return Err(Error::Config("ingest.batch_size must be positive".into()));
        }
        if self.ingest.nlist == 0 || self.ingest.nprobe == 0 {
            return Err(Error::Config("ingest.nlist and ingest.nprobe must be positive".into()));
        }
        if self.query.top_k == 0 || self.query.context_chunks == 0 {
            return Err(Error::Config("query.top_k and query.context_chunks must be positive".into()));
        }
        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::Config("retry.base_delay_ms exceeds retry.max_delay_ms".into()));
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from_toml(toml: &str) -> Config {
        Config::from_figment(Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml)))
    }

    #[test]
    fn defaults_are_valid() {
        let settings = Settings::default();
        settings.validate().expect("default settings validate");
        assert_eq!(settings.chunking, ChunkingSettings { max_length: 500, overlap: 50 });
        assert_eq!(settings.ingest.index_kind, IndexKind::Flat);
    }

    #[test]
    fn toml_overrides_single_keys() {
        let config = config_from_toml("[chunking]\noverlap = 10\n[ingest]\nindex_kind = \"ivf\"\n");
        let settings = config.settings().expect("settings");
        assert_eq!(settings.chunking.overlap, 10);
        assert_eq!(settings.chunking.max_length, 500);
        assert_eq!(settings.ingest.index_kind, IndexKind::Ivf);
        let overlap: usize = config.get("chunking.overlap").expect("get");
        assert_eq!(overlap, 10);
    }

    #[test]
    fn invalid_chunking_is_config_error() {
        let config = config_from_toml("[chunking]\nmax_length = 10\noverlap = 10\n");
        assert!(config.settings().is_err());
        let mut s = Settings::default();
        s.chunking.max_length = 0;
        assert!(matches!(s.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn resolve_relative_and_absolute() {
        let base = Path::new("/srv/ragdb");
        assert_eq!(resolve_with_base(base, "index.jsonl"), PathBuf::from("/srv/ragdb/index.jsonl"));
        assert_eq!(resolve_with_base(base, "/tmp/x.jsonl"), PathBuf::from("/tmp/x.jsonl"));
    }
}
