//! Loader for task configuration with YAML + environment overlays.
//!
//! Sources are merged in order: YAML files and inline snippets first, then
//! `LOOKALIKE__SECTION__KEY` environment variables, which always win. String
//! values may reference other environment variables as `${VAR}`; expansion is
//! applied recursively (bounded) before the merged tree is deserialized into
//! [`TaskConfig`].
//!
//! ```yaml
//! embedding:
//!   provider: azure
//!   api_key: "${OPENAI_API_KEY}"
//!   endpoint: "https://example.openai.azure.com"
//! html:
//!   fetch_method: http
//!   filter_tags: "script,noscript"
//! similarity_model:
//!   method: html_structure
//! ```
use config::{Config, ConfigError, Environment, File};
use lookalike_common::observability::LogFormat;
use lookalike_common::FeatureMethod;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// File name looked up by [`default_config_path`].
pub const CONFIG_FILE_NAME: &str = "lookalike.yaml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TaskConfig {
    /// Required only by the embedding-based feature methods.
    #[serde(default, alias = "openai")]
    pub embedding: Option<EmbeddingConfig>,
    #[serde(default)]
    pub html: HtmlConfig,
    #[serde(default)]
    pub similarity_model: SimilarityConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    #[default]
    Azure,
    Openai,
}

/// Embedding service connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default)]
    pub provider: EmbeddingProvider,
    pub api_key: String,
    #[serde(default = "default_embedding_endpoint")]
    pub endpoint: String,
    /// `api-version` query parameter; Azure only.
    #[serde(default, alias = "version")]
    pub api_version: Option<String>,
    #[serde(default = "default_embedding_model", alias = "embed_model_name")]
    pub model: String,
    /// Inputs are cut to this many characters before submission.
    #[serde(default = "default_max_text_len")]
    pub max_text_len: usize,
    #[serde(default = "default_max_batch")]
    pub max_batch: usize,
    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMethod {
    #[default]
    #[serde(alias = "base")]
    Http,
    Webdriver,
}

/// Page acquisition and DOM preprocessing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HtmlConfig {
    #[serde(default)]
    pub fetch_method: FetchMethod,
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,
    #[serde(default = "default_page_timeout")]
    pub page_timeout_secs: u64,
    /// Run the WebDriver browser without a window.
    #[serde(default = "default_true")]
    pub headless: bool,
    #[serde(default = "default_filter_tags", deserialize_with = "string_list")]
    pub filter_tags: Vec<String>,
    #[serde(default = "default_css_tags", deserialize_with = "string_list")]
    pub css_tags: Vec<String>,
    #[serde(default, alias = "remote_css")]
    pub get_remote_css: bool,
    /// Project parsed CSS onto matched elements instead of fingerprinting it separately.
    #[serde(default = "default_true", alias = "include_css")]
    pub include_css_in_html: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            fetch_method: FetchMethod::default(),
            webdriver_url: default_webdriver_url(),
            page_timeout_secs: default_page_timeout(),
            headless: true,
            filter_tags: default_filter_tags(),
            css_tags: default_css_tags(),
            get_remote_css: false,
            include_css_in_html: true,
        }
    }
}

/// Feature extraction and thresholding settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityConfig {
    #[serde(default = "default_method")]
    pub method: FeatureMethod,
    #[serde(default = "default_feature_dim")]
    pub feature_dim_bow: usize,
    #[serde(default = "default_depth_decay")]
    pub depth_decay: f32,
    #[serde(default = "default_warmup_depth")]
    pub warmup_depth: usize,
    #[serde(default = "default_min_height")]
    pub min_height: usize,
    #[serde(default = "default_max_height")]
    pub max_height: usize,
    #[serde(default = "default_min_code_len")]
    pub min_code_len: usize,
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Attribute names left out of rendered markup.
    #[serde(default = "default_ignore_tags", deserialize_with = "string_list")]
    pub embed_ignore_tags: Vec<String>,
    #[serde(default = "default_bow_threshold", alias = "bow_thre")]
    pub bow_threshold: f32,
    #[serde(default = "default_embedding_threshold", alias = "embed_thre")]
    pub embedding_threshold: f32,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            method: default_method(),
            feature_dim_bow: default_feature_dim(),
            depth_decay: default_depth_decay(),
            warmup_depth: default_warmup_depth(),
            min_height: default_min_height(),
            max_height: default_max_height(),
            min_code_len: default_min_code_len(),
            max_depth: default_max_depth(),
            embed_ignore_tags: default_ignore_tags(),
            bow_threshold: default_bow_threshold(),
            embedding_threshold: default_embedding_threshold(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
    #[serde(default)]
    pub dir: Option<PathBuf>,
    #[serde(default)]
    pub stderr: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            dir: None,
            stderr: false,
        }
    }
}

fn default_embedding_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_embedding_model() -> String {
    "text-embedding-ada-002".into()
}
fn default_max_text_len() -> usize {
    8000
}
fn default_max_batch() -> usize {
    256
}
fn default_embedding_timeout() -> u64 {
    30
}
fn default_webdriver_url() -> String {
    "http://localhost:9515".into()
}
fn default_page_timeout() -> u64 {
    20
}
fn default_filter_tags() -> Vec<String> {
    ["script", "noscript", "iframe", "svg"].map(String::from).to_vec()
}
fn default_css_tags() -> Vec<String> {
    vec!["style".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_method() -> FeatureMethod {
    FeatureMethod::Bow
}
fn default_feature_dim() -> usize {
    1024
}
fn default_depth_decay() -> f32 {
    0.9
}
fn default_warmup_depth() -> usize {
    3
}
fn default_min_height() -> usize {
    2
}
fn default_max_height() -> usize {
    6
}
fn default_min_code_len() -> usize {
    800
}
fn default_max_depth() -> usize {
    100
}
fn default_ignore_tags() -> Vec<String> {
    ["style", "href", "src"].map(String::from).to_vec()
}
fn default_bow_threshold() -> f32 {
    0.8
}
fn default_embedding_threshold() -> f32 {
    0.95
}
fn default_log_level() -> String {
    "info".into()
}

/// Accept either a YAML sequence or a comma-separated string.
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Joined(String),
        List(Vec<String>),
    }

    let items = match Raw::deserialize(deserializer)? {
        Raw::Joined(s) => s.split(',').map(str::to_string).collect(),
        Raw::List(v) => v,
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

impl TaskConfig {
    /// Reject settings that would make extraction or scoring meaningless.
    pub fn validate(&self) -> lookalike_common::Result<()> {
        use lookalike_common::LookalikeError::Config as Invalid;

        let sim = &self.similarity_model;
        if sim.feature_dim_bow == 0 {
            return Err(Invalid("feature_dim_bow must be positive".into()));
        }
        if !(sim.depth_decay > 0.0 && sim.depth_decay <= 1.0) {
            return Err(Invalid(format!(
                "depth_decay must be in (0, 1], got {}",
                sim.depth_decay
            )));
        }
        for (name, value) in [
            ("bow_threshold", sim.bow_threshold),
            ("embedding_threshold", sim.embedding_threshold),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Invalid(format!("{name} must be in [0, 1], got {value}")));
            }
        }
        if sim.min_height > sim.max_height {
            return Err(Invalid(format!(
                "min_height ({}) exceeds max_height ({})",
                sim.min_height, sim.max_height
            )));
        }
        if sim.method.needs_embeddings() {
            let Some(embedding) = &self.embedding else {
                return Err(Invalid(format!(
                    "method {} requires an `embedding` section",
                    sim.method
                )));
            };
            if embedding.api_key.trim().is_empty() {
                return Err(Invalid("embedding.api_key is empty".into()));
            }
            if embedding.max_batch == 0 || embedding.max_text_len == 0 {
                return Err(Invalid(
                    "embedding.max_batch and embedding.max_text_len must be positive".into(),
                ));
            }
        }
        Ok(())
    }

    /// Copy of the configuration safe to print.
    pub fn redacted(&self) -> TaskConfig {
        let mut copy = self.clone();
        if let Some(embedding) = copy.embedding.as_mut() {
            embedding.api_key = "<redacted>".into();
        }
        copy
    }

    /// Render the redacted configuration as YAML.
    pub fn to_redacted_yaml(&self) -> lookalike_common::Result<String> {
        serde_yaml::to_string(&self.redacted())
            .map_err(|e| lookalike_common::LookalikeError::Config(e.to_string()))
    }
}

/// `./lookalike.yaml` if present, otherwise `<config_dir>/lookalike/lookalike.yaml` if present.
pub fn default_config_path() -> Option<PathBuf> {
    let local = PathBuf::from(CONFIG_FILE_NAME);
    if local.is_file() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join("lookalike").join(CONFIG_FILE_NAME))
        .filter(|p| p.is_file())
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct LookalikeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    env_prefix: String,
}

impl Default for LookalikeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl LookalikeConfigLoader {
    /// Start with no file sources and `LOOKALIKE__` env overrides.
    ///
    /// ```
    /// use lookalike_config::LookalikeConfigLoader;
    ///
    /// let config = LookalikeConfigLoader::new()
    ///     .with_yaml_str("similarity_model:\n  method: bow\n  feature_dim_bow: 64")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.similarity_model.feature_dim_bow, 64);
    /// assert!(config.embedding.is_none());
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            env_prefix: "LOOKALIKE".into(),
        }
    }

    /// Override the environment prefix (tests use this to avoid collisions).
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that may be absent, so deployments can rely on the environment alone.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    ///
    /// ```
    /// use lookalike_common::FeatureMethod;
    /// use lookalike_config::{FetchMethod, LookalikeConfigLoader};
    ///
    /// let cfg = LookalikeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// embedding:
    ///   api_key: "example"
    ///   endpoint: "https://example.openai.azure.com"
    /// html:
    ///   fetch_method: webdriver
    ///   filter_tags: "script, noscript"
    /// similarity_model:
    ///   method: plain_text
    /// "#,
    ///     )
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(cfg.similarity_model.method, FeatureMethod::PlainText);
    /// assert_eq!(cfg.html.fetch_method, FetchMethod::Webdriver);
    /// assert_eq!(cfg.html.filter_tags, vec!["script", "noscript"]);
    /// ```
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly typed config.
    ///
    /// Environment variables are layered last, `${VAR}` placeholders are
    /// expanded, and the result is validated before it is returned.
    pub fn load(self) -> Result<TaskConfig, ConfigError> {
        let cfg = self
            .builder
            .add_source(
                Environment::with_prefix(&self.env_prefix)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: TaskConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;
        typed
            .validate()
            .map_err(|e| ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!({ "key": ["X=${FOO}"] });
                expand_env_in_value(&mut v);
                assert_eq!(v, json!({ "key": ["X=start-mid-qux-end"] }));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn defaults_are_valid() {
        let cfg = TaskConfig::default();
        assert_eq!(cfg.similarity_model.method, FeatureMethod::Bow);
        assert_eq!(cfg.html.css_tags, vec!["style"]);
        cfg.validate().unwrap();
    }

    #[test]
    fn embedding_methods_require_embedding_section() {
        let mut cfg = TaskConfig::default();
        cfg.similarity_model.method = FeatureMethod::HtmlStructure;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_inverted_heights() {
        let mut cfg = TaskConfig::default();
        cfg.similarity_model.min_height = 9;
        cfg.similarity_model.max_height = 3;
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("min_height"));
    }

    #[test]
    fn redaction_hides_api_key() {
        let cfg: TaskConfig = serde_json::from_value(json!({
            "embedding": { "api_key": "sk-secret" }
        }))
        .unwrap();
        let yaml = cfg.to_redacted_yaml().unwrap();
        assert!(!yaml.contains("sk-secret"));
        assert!(yaml.contains("<redacted>"));
        assert_eq!(cfg.embedding.unwrap().api_key, "sk-secret");
    }

    #[test]
    fn string_list_accepts_sequences() {
        let cfg: HtmlConfig = serde_json::from_value(json!({
            "filter_tags": ["script", " ", "svg "]
        }))
        .unwrap();
        assert_eq!(cfg.filter_tags, vec!["script", "svg"]);
        assert!(cfg.include_css_in_html);
        assert!(cfg.headless);
    }

    #[test]
    fn headless_can_be_switched_off() {
        let cfg: HtmlConfig = serde_json::from_value(json!({
            "fetch_method": "webdriver",
            "headless": false
        }))
        .unwrap();
        assert_eq!(cfg.fetch_method, FetchMethod::Webdriver);
        assert!(!cfg.headless);
    }
}
