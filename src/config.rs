use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::prompt::PosterStyle;
use crate::provider::ProviderKind;

pub const DEFAULT_POSTER_PROMPT: &str = "Generate a high-contrast Soviet propaganda style poster that celebrates the collaboration in this pull request. Include bold geometric shapes, expressive characters, and heroic lighting.";
pub const DEFAULT_OPENAI_MODEL: &str = "gpt-image-1";
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_GITHUB_API_URL: &str = "https://api.github.com";
pub const DEFAULT_MAX_FILES: usize = 10;
pub const DEFAULT_IMAGE_WIDTH: u32 = 1024;
pub const DEFAULT_IMAGE_HEIGHT: u32 = 1536;

const CONFIG_FILE: &str = ".pr-poster.toml";

/// Canvas orientation. Only sets the default size; explicit dimensions win.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PosterFormat {
    #[default]
    Poster,
    Mural,
}

impl PosterFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "poster" => Some(PosterFormat::Poster),
            "mural" => Some(PosterFormat::Mural),
            _ => None,
        }
    }

    /// (width, height) in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            PosterFormat::Poster => (DEFAULT_IMAGE_WIDTH, DEFAULT_IMAGE_HEIGHT),
            PosterFormat::Mural => (DEFAULT_IMAGE_HEIGHT, DEFAULT_IMAGE_WIDTH),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Optional file layer read from .pr-poster.toml.
///
/// Every field is optional; the environment overrides whatever is set here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub allowed_repos: Option<Vec<String>>,
    pub image_provider: Option<String>,
    pub poster_prompt: Option<String>,
    pub poster_style: Option<String>,
    pub poster_format: Option<String>,
    pub poster_guidance: Option<String>,
    pub max_files: Option<usize>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,

    #[serde(default)]
    pub openai: OpenAiFileConfig,

    #[serde(default)]
    pub github: GitHubFileConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenAiFileConfig {
    pub api_key: Option<String>,
    pub model: Option<String>,
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GitHubFileConfig {
    pub token: Option<String>,
    pub api_url: Option<String>,
}

/// Resolved process configuration. Built once at startup, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Repository full names allowed to receive posters. Empty means no restriction.
    pub allowed_repos: HashSet<String>,
    pub image_provider: ProviderKind,
    pub openai: OpenAiConfig,
    pub github: GitHubConfig,
    /// Base prompt: POSTER_PROMPT if set, otherwise the style's prompt.
    pub poster_prompt: String,
    pub poster_guidance: Option<String>,
    pub max_files: usize,
    pub image_width: u32,
    pub image_height: u32,
}

#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

#[derive(Debug, Clone)]
pub struct GitHubConfig {
    /// GitHub API token, needed for listing files and posting comments.
    pub token: Option<String>,
    pub api_url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self::resolve(FileConfig::default(), |_| None)
    }
}

impl Config {
    /// Load configuration from .pr-poster.toml (if present) overlaid with
    /// the process environment.
    pub fn load() -> Result<Config, ConfigError> {
        let path = Path::new(CONFIG_FILE);
        let file = if path.exists() {
            Self::load_file(path)?
        } else {
            FileConfig::default()
        };

        Ok(Self::resolve(file, |key| std::env::var(key).ok()))
    }

    pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let file = toml::from_str(&contents)?;
        Ok(file)
    }

    /// Merge the file layer with an environment-style lookup. Never fails:
    /// malformed numbers fall back to their defaults, and blank string values
    /// count as unset.
    pub fn resolve<F>(file: FileConfig, lookup: F) -> Config
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let non_blank = |v: Option<String>| v.filter(|v| !v.trim().is_empty());

        let allowed_repos = match lookup("ALLOWED_REPOS") {
            Some(raw) => parse_repo_list(&raw),
            None => file
                .allowed_repos
                .unwrap_or_default()
                .iter()
                .map(|repo| repo.trim().to_string())
                .filter(|repo| !repo.is_empty())
                .collect(),
        };

        let image_provider = lookup("IMAGE_PROVIDER")
            .or(file.image_provider)
            .map(|name| ProviderKind::from_name(&name))
            .unwrap_or_default();

        let max_files = match lookup("MAX_FILES") {
            Some(raw) => parse_or(&raw, DEFAULT_MAX_FILES),
            None => file.max_files.unwrap_or(DEFAULT_MAX_FILES),
        };

        let (default_width, default_height) = value("POSTER_FORMAT")
            .or(file.poster_format)
            .and_then(|name| PosterFormat::from_name(&name))
            .unwrap_or_default()
            .dimensions();

        let image_width = match lookup("IMAGE_WIDTH").or_else(|| lookup("IMAGE_SIZE")) {
            Some(raw) => parse_or(&raw, default_width),
            None => file.image_width.unwrap_or(default_width),
        };
        let image_height = match lookup("IMAGE_HEIGHT").or_else(|| lookup("IMAGE_SIZE")) {
            Some(raw) => parse_or(&raw, default_height),
            None => file.image_height.unwrap_or(default_height),
        };

        let style = value("POSTER_STYLE")
            .or(file.poster_style)
            .and_then(|name| PosterStyle::from_name(&name))
            .unwrap_or_default();

        Config {
            allowed_repos,
            image_provider,
            openai: OpenAiConfig {
                api_key: value("OPENAI_API_KEY").or(non_blank(file.openai.api_key)),
                model: value("OPENAI_IMAGE_MODEL")
                    .or(non_blank(file.openai.model))
                    .unwrap_or_else(|| DEFAULT_OPENAI_MODEL.to_string()),
                base_url: value("OPENAI_BASE_URL")
                    .or(non_blank(file.openai.base_url))
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
            },
            github: GitHubConfig {
                token: value("GITHUB_TOKEN").or(non_blank(file.github.token)),
                api_url: value("GITHUB_API_URL")
                    .or(non_blank(file.github.api_url))
                    .unwrap_or_else(|| DEFAULT_GITHUB_API_URL.to_string()),
            },
            poster_prompt: lookup("POSTER_PROMPT")
                .or(file.poster_prompt)
                .unwrap_or_else(|| style.base_prompt().to_string()),
            poster_guidance: value("POSTER_GUIDANCE").or(non_blank(file.poster_guidance)),
            max_files,
            image_width,
            image_height,
        }
    }

    /// Whether events from this repository should get a poster.
    pub fn is_repo_allowed(&self, repo_full_name: &str) -> bool {
        self.allowed_repos.is_empty() || self.allowed_repos.contains(repo_full_name)
    }
}

fn parse_repo_list(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn parse_or<T: std::str::FromStr>(raw: &str, default: T) -> T {
    raw.trim().parse().unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn resolve_env(vars: &[(&str, &str)]) -> Config {
        let env: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::resolve(FileConfig::default(), |key| env.get(key).cloned())
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.allowed_repos.is_empty());
        assert_eq!(config.image_provider, ProviderKind::ChatGpt);
        assert_eq!(config.openai.model, "gpt-image-1");
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.poster_prompt, DEFAULT_POSTER_PROMPT);
        assert_eq!(config.max_files, 10);
        assert_eq!((config.image_width, config.image_height), (1024, 1536));
    }

    #[test]
    fn test_allowed_repos_trimmed_and_filtered() {
        let config = resolve_env(&[("ALLOWED_REPOS", " org/a, ,org/b,, ")]);
        assert_eq!(config.allowed_repos.len(), 2);
        assert!(config.is_repo_allowed("org/a"));
        assert!(config.is_repo_allowed("org/b"));
        assert!(!config.is_repo_allowed("org/c"));
    }

    #[test]
    fn test_empty_allow_list_allows_everything() {
        let config = resolve_env(&[("ALLOWED_REPOS", " , ")]);
        assert!(config.allowed_repos.is_empty());
        assert!(config.is_repo_allowed("anyone/anything"));
    }

    #[test]
    fn test_max_files_parsing() {
        assert_eq!(resolve_env(&[("MAX_FILES", "abc")]).max_files, 10);
        assert_eq!(resolve_env(&[("MAX_FILES", "5")]).max_files, 5);
    }

    #[test]
    fn test_image_size_fallbacks() {
        let config = resolve_env(&[("IMAGE_SIZE", "768")]);
        assert_eq!((config.image_width, config.image_height), (768, 768));

        let config = resolve_env(&[("IMAGE_SIZE", "768"), ("IMAGE_WIDTH", "640")]);
        assert_eq!((config.image_width, config.image_height), (640, 768));

        let config = resolve_env(&[("IMAGE_WIDTH", "wide"), ("IMAGE_HEIGHT", "tall")]);
        assert_eq!((config.image_width, config.image_height), (1024, 1536));
    }

    #[test]
    fn test_provider_selection() {
        assert_eq!(
            resolve_env(&[("IMAGE_PROVIDER", "dummy")]).image_provider,
            ProviderKind::Dummy
        );
        assert_eq!(
            resolve_env(&[("IMAGE_PROVIDER", "something-else")]).image_provider,
            ProviderKind::ChatGpt
        );
    }

    #[test]
    fn test_blank_endpoints_fall_back_to_defaults() {
        let config = resolve_env(&[
            ("OPENAI_BASE_URL", ""),
            ("OPENAI_IMAGE_MODEL", "  "),
            ("OPENAI_API_KEY", ""),
            ("GITHUB_API_URL", ""),
            ("GITHUB_TOKEN", " "),
        ]);
        assert_eq!(config.openai.base_url, DEFAULT_OPENAI_BASE_URL);
        assert_eq!(config.openai.model, DEFAULT_OPENAI_MODEL);
        assert!(config.openai.api_key.is_none());
        assert_eq!(config.github.api_url, DEFAULT_GITHUB_API_URL);
        assert!(config.github.token.is_none());
    }

    #[test]
    fn test_blank_env_does_not_mask_file_value() {
        let file = FileConfig {
            openai: OpenAiFileConfig {
                base_url: Some("https://proxy.internal/v1".to_string()),
                ..OpenAiFileConfig::default()
            },
            ..FileConfig::default()
        };
        let config = Config::resolve(file, |key| match key {
            "OPENAI_BASE_URL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.openai.base_url, "https://proxy.internal/v1");
    }

    #[test]
    fn test_style_selects_base_prompt() {
        assert_eq!(
            resolve_env(&[("POSTER_STYLE", "cuban")]).poster_prompt,
            PosterStyle::Cuban.base_prompt()
        );
        assert_eq!(
            resolve_env(&[("POSTER_STYLE", "impressionist")]).poster_prompt,
            DEFAULT_POSTER_PROMPT
        );
        let config = resolve_env(&[("POSTER_STYLE", "dprk"), ("POSTER_PROMPT", "Custom.")]);
        assert_eq!(config.poster_prompt, "Custom.");
    }

    #[test]
    fn test_format_sets_default_dimensions() {
        let config = resolve_env(&[("POSTER_FORMAT", "mural")]);
        assert_eq!((config.image_width, config.image_height), (1536, 1024));

        let config = resolve_env(&[("POSTER_FORMAT", "mural"), ("IMAGE_HEIGHT", "900")]);
        assert_eq!((config.image_width, config.image_height), (1536, 900));

        let config = resolve_env(&[("POSTER_FORMAT", "billboard")]);
        assert_eq!((config.image_width, config.image_height), (1024, 1536));
    }

    #[test]
    fn test_guidance_optional() {
        assert!(Config::default().poster_guidance.is_none());
        assert!(resolve_env(&[("POSTER_GUIDANCE", "  ")]).poster_guidance.is_none());
        assert_eq!(
            resolve_env(&[("POSTER_GUIDANCE", "Include a tractor.")])
                .poster_guidance
                .as_deref(),
            Some("Include a tractor.")
        );
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
allowed_repos = ["org/repo"]
image_provider = "dummy"
max_files = 3

[openai]
model = "dall-e-3"

[github]
api_url = "https://github.example.com/api/v3"
"#;
        let file: FileConfig = toml::from_str(toml_str).unwrap();
        let config = Config::resolve(file, |_| None);
        assert!(config.is_repo_allowed("org/repo"));
        assert!(!config.is_repo_allowed("org/other"));
        assert_eq!(config.image_provider, ProviderKind::Dummy);
        assert_eq!(config.max_files, 3);
        assert_eq!(config.openai.model, "dall-e-3");
        assert_eq!(config.github.api_url, "https://github.example.com/api/v3");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = FileConfig {
            max_files: Some(3),
            poster_prompt: Some("from file".to_string()),
            ..FileConfig::default()
        };
        let config = Config::resolve(file, |key| match key {
            "MAX_FILES" => Some("7".to_string()),
            _ => None,
        });
        assert_eq!(config.max_files, 7);
        assert_eq!(config.poster_prompt, "from file");
    }
}
