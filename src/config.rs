use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf, time::Duration};
use url::Url;

pub const DEFAULT_PROPERTY_URL: &str = "http://localhost:8000/get_properties";
pub const DEFAULT_CHART_URL: &str = "http://localhost:8000/get_charts";
pub const DEFAULT_PROPERTY_API_BASE: &str = "http://localhost:8000/api/properties";
pub const DEFAULT_TRELLO_API_BASE: &str = "https://api.trello.com/1";
pub const DEFAULT_PLANNER_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Process-wide collaborator configuration, read once at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_property_url")]
    pub property_url: String,
    #[serde(default = "default_chart_url")]
    pub chart_url: String,
    #[serde(default = "default_property_api_base")]
    pub update_property_api_base: String,
    #[serde(default = "default_property_api_base")]
    pub create_property_api_base: String,
    #[serde(default)]
    pub trello: TrelloConfig,
    #[serde(default)]
    pub planner: Option<PlannerConfig>,
    /// Per-call budget for every collaborator request.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrelloConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "listId")]
    pub list_id: Option<String>,
    #[serde(default = "default_trello_api_base", rename = "apiBase")]
    pub api_base: String,
}

/// OpenAI-compatible chat-completions endpoint used for planning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    pub url: String,
    #[serde(default = "default_planner_model")]
    pub model: String,
    #[serde(default, rename = "apiKey")]
    pub api_key: Option<String>,
}

fn default_property_url() -> String {
    DEFAULT_PROPERTY_URL.to_string()
}

fn default_chart_url() -> String {
    DEFAULT_CHART_URL.to_string()
}

fn default_property_api_base() -> String {
    DEFAULT_PROPERTY_API_BASE.to_string()
}

fn default_trello_api_base() -> String {
    DEFAULT_TRELLO_API_BASE.to_string()
}

fn default_planner_model() -> String {
    DEFAULT_PLANNER_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            property_url: default_property_url(),
            chart_url: default_chart_url(),
            update_property_api_base: default_property_api_base(),
            create_property_api_base: default_property_api_base(),
            trello: TrelloConfig::default(),
            planner: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Default for TrelloConfig {
    fn default() -> Self {
        Self {
            key: None,
            token: None,
            list_id: None,
            api_base: default_trello_api_base(),
        }
    }
}

impl TrelloConfig {
    /// Credentials and target list, when all three are present.
    pub fn credentials(&self) -> Option<(&str, &str, &str)> {
        match (&self.key, &self.token, &self.list_id) {
            (Some(key), Some(token), Some(list)) => Some((key.as_str(), token.as_str(), list.as_str())),
            _ => None,
        }
    }
}

impl PlannerConfig {
    pub fn is_enabled(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl AgentConfig {
    /// Load configuration: optional JSON file, then environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let lookup = |name: &str| env::var(name).ok();
        let mut cfg = match resolve_config_path() {
            Some(path) => {
                tracing::info!("Loading agent configuration from {}", path.display());
                let raw = fs::read_to_string(&path)?;
                Self::from_json(&raw, &lookup)?
            }
            None => {
                tracing::info!("No configuration file found, using defaults");
                Self::default()
            }
        };
        cfg.apply_overrides(&lookup)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse a JSON document, expanding `${VAR}` references in string values.
    pub fn from_json(raw: &str, lookup: &dyn Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let mut cfg: AgentConfig = serde_json::from_str(raw)?;
        cfg.expand(lookup);
        Ok(cfg)
    }

    fn expand(&mut self, lookup: &dyn Fn(&str) -> Option<String>) {
        for val in [
            &mut self.property_url,
            &mut self.chart_url,
            &mut self.update_property_api_base,
            &mut self.create_property_api_base,
            &mut self.trello.api_base,
        ] {
            *val = expand_env_vars(val, lookup);
        }
        for val in [
            &mut self.trello.key,
            &mut self.trello.token,
            &mut self.trello.list_id,
        ]
        .into_iter()
        .flatten()
        {
            *val = expand_env_vars(val, lookup);
        }
        if let Some(planner) = self.planner.as_mut() {
            planner.url = expand_env_vars(&planner.url, lookup);
            if let Some(key) = planner.api_key.as_mut() {
                *key = expand_env_vars(key, lookup);
            }
        }
    }

    /// Apply environment-variable overrides on top of the file/defaults.
    pub fn apply_overrides(&mut self, lookup: &dyn Fn(&str) -> Option<String>) -> anyhow::Result<()> {
        if let Some(v) = lookup("PROPERTY_URL") {
            self.property_url = v;
        }
        if let Some(v) = lookup("CHART_URL") {
            self.chart_url = v;
        }
        if let Some(v) = lookup("UPDATE_PROPERTY_API_BASE") {
            self.update_property_api_base = v;
        }
        if let Some(v) = lookup("PROPERTY_API_BASE") {
            self.create_property_api_base = v;
        }
        if let Some(v) = lookup("TRELLO_KEY") {
            self.trello.key = Some(v);
        }
        if let Some(v) = lookup("TRELLO_TOKEN") {
            self.trello.token = Some(v);
        }
        if let Some(v) = lookup("TRELLO_LIST_ID") {
            self.trello.list_id = Some(v);
        }
        if let Some(v) = lookup("AGENT_TIMEOUT_SECS") {
            self.timeout_secs = v
                .parse()
                .map_err(|e| anyhow::anyhow!("AGENT_TIMEOUT_SECS `{}` is not a number: {}", v, e))?;
        }
        if let Some(url) = lookup("PLANNER_URL") {
            let planner = self.planner.get_or_insert_with(|| PlannerConfig {
                url: String::new(),
                model: default_planner_model(),
                api_key: None,
            });
            planner.url = url;
        }
        if let Some(planner) = self.planner.as_mut() {
            if let Some(model) = lookup("PLANNER_MODEL") {
                planner.model = model;
            }
            if let Some(key) = lookup("OPENAI_API_KEY") {
                planner.api_key = Some(key);
            }
        }
        Ok(())
    }

    /// Reject malformed endpoints before any request is served.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut urls = vec![
            ("property_url", self.property_url.as_str()),
            ("chart_url", self.chart_url.as_str()),
            ("update_property_api_base", self.update_property_api_base.as_str()),
            ("create_property_api_base", self.create_property_api_base.as_str()),
            ("trello.apiBase", self.trello.api_base.as_str()),
        ];
        if let Some(planner) = &self.planner {
            urls.push(("planner.url", planner.url.as_str()));
        }
        for (field, raw) in urls {
            Url::parse(raw).map_err(|e| anyhow::anyhow!("`{}` is not a valid URL ({}): {}", field, raw, e))?;
        }
        if self.timeout_secs == 0 {
            anyhow::bail!("timeout_secs must be greater than zero");
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Locate the configuration file, if any.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Ok(p) = env::var("PROPERTY_AGENT_CONFIG") {
        return Some(PathBuf::from(p));
    }

    if let Ok(xdg) = env::var("XDG_CONFIG_HOME") {
        let candidate = PathBuf::from(xdg).join("property-agent").join("config.json");
        if candidate.exists() {
            return Some(candidate);
        }
    }

    let candidate = PathBuf::from("agent.json");
    if candidate.exists() {
        return Some(candidate);
    }

    None
}

fn expand_env_vars(input: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next(); // consume '{'
            let mut name = String::new();
            let mut closed = false;
            for c in chars.by_ref() {
                if c == '}' {
                    closed = true;
                    break;
                }
                name.push(c);
            }
            match lookup(&name).filter(|_| closed) {
                Some(val) => out.push_str(&val),
                None => {
                    out.push_str("${");
                    out.push_str(&name);
                    if closed {
                        out.push('}');
                    }
                }
            }
        } else {
            out.push(ch);
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_expand_env_vars() {
        let lookup = vars(&[("HOST", "records.internal")]);
        assert_eq!(
            expand_env_vars("http://${HOST}:8000/${MISSING}", &lookup),
            "http://records.internal:8000/${MISSING}"
        );
        assert_eq!(expand_env_vars("no vars here", &lookup), "no vars here");
    }

    #[test]
    fn test_expand_env_vars_unterminated() {
        let lookup = vars(&[("HOST", "records.internal")]);
        assert_eq!(expand_env_vars("http://${HOST", &lookup), "http://${HOST");
        assert_eq!(expand_env_vars("a${", &lookup), "a${");
    }

    #[test]
    fn test_defaults_are_valid() {
        let cfg = AgentConfig::default();
        cfg.validate().unwrap();
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert!(cfg.trello.credentials().is_none());
        assert!(cfg.planner.is_none());
    }

    #[test]
    fn test_from_json_with_expansion() {
        let raw = r#"{
            "property_url": "http://${RECORDS}/get_properties",
            "timeout_secs": 5,
            "trello": {"key": "${TRELLO}", "token": "t", "listId": "l"}
        }"#;
        let lookup = vars(&[("RECORDS", "records:9000"), ("TRELLO", "k123")]);
        let cfg = AgentConfig::from_json(raw, &lookup).unwrap();

        assert_eq!(cfg.property_url, "http://records:9000/get_properties");
        assert_eq!(cfg.chart_url, DEFAULT_CHART_URL);
        assert_eq!(cfg.timeout_secs, 5);
        assert_eq!(cfg.trello.credentials(), Some(("k123", "t", "l")));
        assert_eq!(cfg.trello.api_base, DEFAULT_TRELLO_API_BASE);
    }

    #[test]
    fn test_env_overrides() {
        let mut cfg = AgentConfig::default();
        let lookup = vars(&[
            ("CHART_URL", "http://charts:1/viz"),
            ("AGENT_TIMEOUT_SECS", "7"),
            ("PLANNER_URL", "http://llm:8080/v1"),
            ("OPENAI_API_KEY", "sk-test"),
        ]);
        cfg.apply_overrides(&lookup).unwrap();

        assert_eq!(cfg.chart_url, "http://charts:1/viz");
        assert_eq!(cfg.timeout_secs, 7);
        let planner = cfg.planner.as_ref().unwrap();
        assert_eq!(planner.url, "http://llm:8080/v1");
        assert_eq!(planner.model, DEFAULT_PLANNER_MODEL);
        assert!(planner.is_enabled());
        cfg.validate().unwrap();
    }

    #[test]
    fn test_api_key_without_planner_url_does_not_enable_planner() {
        let mut cfg = AgentConfig::default();
        cfg.apply_overrides(&vars(&[("OPENAI_API_KEY", "sk-test")]))
            .unwrap();
        assert!(cfg.planner.is_none());
    }

    #[test]
    fn test_bad_timeout_override() {
        let mut cfg = AgentConfig::default();
        let err = cfg
            .apply_overrides(&vars(&[("AGENT_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(err.to_string().contains("AGENT_TIMEOUT_SECS"));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        let cfg = AgentConfig {
            property_url: "not a url".to_string(),
            ..Default::default()
        };
        let err = cfg.validate().unwrap_err();
        assert!(err.to_string().contains("property_url"));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"chart_url": "http://viz.local/get_charts"}}"#).unwrap();

        let raw = fs::read_to_string(file.path()).unwrap();
        let cfg = AgentConfig::from_json(&raw, &|_: &str| None).unwrap();
        assert_eq!(cfg.chart_url, "http://viz.local/get_charts");
        assert_eq!(cfg.property_url, DEFAULT_PROPERTY_URL);
    }
}
