use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Openrouter,
    Ollama,
    Openai,
}

impl Backend {
    pub fn base_url(&self) -> &'static str {
        match self {
            Backend::Openrouter => "https://openrouter.ai/api/v1/",
            Backend::Ollama => "http://localhost:11434/v1/",
            Backend::Openai => "https://api.openai.com/v1/",
        }
    }

    pub fn api_key_env_var(&self) -> Option<&'static str> {
        match self {
            Backend::Openrouter => Some("OPENROUTER_API_KEY"),
            Backend::Ollama => None,
            Backend::Openai => Some("OPENAI_API_KEY"),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub model: String,
    pub timeout_seconds: u64,
    /// Context above this total switches assembly into truncation mode.
    pub soft_token_limit: usize,
    /// Whole-file inclusion budget applied during truncation.
    pub hard_token_limit: usize,
    /// Delay between consecutive agent calls, a rate-limiting courtesy.
    pub call_delay_seconds: u64,
    pub repo_url: String,
    pub example_path: String,
    pub target_dir: String,
    pub output_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: Backend::Openrouter,
            model: "anthropic/claude-sonnet-4".to_string(),
            timeout_seconds: 300,
            soft_token_limit: 80_000,
            hard_token_limit: 70_000,
            call_delay_seconds: 30,
            repo_url: "https://github.com/terraform-aws-modules/terraform-aws-vpc.git".to_string(),
            example_path: "examples/complete".to_string(),
            target_dir: "terraform-aws-vpc".to_string(),
            output_dir: "modified_code".to_string(),
        }
    }
}

impl Config {
    /// Command-line flags win over the config file.
    pub fn apply_cli(&mut self, cli: &crate::cli::Cli) {
        if let Some(repo_url) = &cli.repo_url {
            self.repo_url = repo_url.clone();
        }
        if let Some(example_path) = &cli.example_path {
            self.example_path = example_path.clone();
        }
        if let Some(target_dir) = &cli.target_dir {
            self.target_dir = target_dir.clone();
        }
        if let Some(output_dir) = &cli.output_dir {
            self.output_dir = output_dir.clone();
        }
        if let Some(model) = &cli.model {
            self.model = model.clone();
        }
        if let Some(backend) = cli.backend {
            self.backend = backend;
        }
    }
}

pub fn load_or_create() -> Result<Config> {
    let xdg_dirs = xdg::BaseDirectories::new();
    let config_path = xdg_dirs.place_config_file("tfarmor/config.toml")?;

    if !config_path.exists() {
        let default_config = Config::default();
        let toml_string = toml::to_string_pretty(&default_config)?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&config_path, toml_string)?;

        println!("Created default config at: {}", config_path.display());
        return Ok(default_config);
    }

    let config_string = fs::read_to_string(&config_path)?;
    // `serde(default)` back-fills fields missing from older files.
    let config: Config = toml::from_str(&config_string)?;

    // Write the completed config back so users can see all options.
    let final_toml_string = toml::to_string_pretty(&config)?;
    if final_toml_string != config_string {
        fs::write(&config_path, final_toml_string)?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_keep_hard_limit_under_soft_limit() {
        let config = Config::default();
        assert!(config.hard_token_limit < config.soft_token_limit);
    }

    #[test]
    fn test_partial_file_backfills_defaults() {
        let config: Config = toml::from_str("model = \"some/other-model\"\n").unwrap();
        assert_eq!(config.model, "some/other-model");
        assert_eq!(config.soft_token_limit, Config::default().soft_token_limit);
        assert_eq!(config.backend, Backend::Openrouter);
    }

    #[test]
    fn test_backend_profiles() {
        assert_eq!(
            Backend::Openrouter.api_key_env_var(),
            Some("OPENROUTER_API_KEY")
        );
        assert_eq!(Backend::Ollama.api_key_env_var(), None);
        assert!(Backend::Openai.base_url().contains("openai.com"));
    }
}
