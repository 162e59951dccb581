use anyhow::{Context, Result};
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about = "Claude Code agent activity and token usage monitor")]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Listening port
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory containing the dashboard HTML pages
    #[arg(long)]
    pub serve_dir: Option<PathBuf>,

    /// Path to the usage history database
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Claude config directory (todo files and session metadata)
    #[arg(long)]
    pub claude_dir: Option<PathBuf>,

    /// Do not open the dashboard in a browser at startup
    #[arg(long)]
    pub no_browser: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

/// Application settings (from config file)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    /// Web server settings
    #[serde(default)]
    pub web: WebSettings,

    /// Usage history store settings
    #[serde(default)]
    pub store: StoreSettings,

    /// File-change scan settings
    #[serde(default)]
    pub files: FileWatchSettings,

    /// Claude config directory; defaults to `~/.claude`
    #[serde(default)]
    pub claude_dir: Option<PathBuf>,
}

/// Web server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebSettings {
    /// Listening port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Directory the dashboard HTML pages are served from
    #[serde(default = "default_serve_dir")]
    pub serve_dir: PathBuf,

    /// Open the dashboard in a browser once at startup
    #[serde(default = "default_open_browser")]
    pub open_browser: bool,
}

fn default_port() -> u16 {
    7778
}

fn default_serve_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_open_browser() -> bool {
    true
}

impl Default for WebSettings {
    fn default() -> Self {
        Self {
            port: default_port(),
            serve_dir: default_serve_dir(),
            open_browser: default_open_browser(),
        }
    }
}

/// Usage history store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSettings {
    /// Path to the SQLite database file
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("usage_history.db")
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
        }
    }
}

/// File-change scan settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileWatchSettings {
    /// Project directory the scan runs in
    #[serde(default = "default_project_dir")]
    pub project_dir: PathBuf,

    /// Glob patterns checked for recent modifications
    #[serde(default = "default_patterns")]
    pub patterns: Vec<String>,
}

fn default_project_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_patterns() -> Vec<String> {
    vec![
        "src/**/*.tsx".to_string(),
        "src/**/*.ts".to_string(),
        "src/**/*.rs".to_string(),
        ".claude/**/*.md".to_string(),
    ]
}

impl Default for FileWatchSettings {
    fn default() -> Self {
        Self {
            project_dir: default_project_dir(),
            patterns: default_patterns(),
        }
    }
}

impl Settings {
    /// Load settings from config file or use defaults
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        // Try custom path first
        if let Some(p) = path {
            if p.exists() {
                let content = std::fs::read_to_string(p)
                    .with_context(|| format!("Failed to read config file: {:?}", p))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", p));
            }
        }

        // Try default config locations
        let default_paths = [
            dirs::config_dir().map(|p| p.join("ccmon/config.toml")),
            dirs::home_dir().map(|p| p.join(".config/ccmon/config.toml")),
            dirs::home_dir().map(|p| p.join(".ccmon.toml")),
        ];

        for path in default_paths.iter().flatten() {
            if path.exists() {
                let content = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file: {:?}", path))?;
                return toml::from_str(&content)
                    .with_context(|| format!("Failed to parse config file: {:?}", path));
            }
        }

        // Return defaults if no config file found
        Ok(Self::default())
    }

    /// Merge CLI flags into settings (CLI takes precedence)
    pub fn merge_cli(&mut self, cli: &Cli) {
        if let Some(port) = cli.port {
            self.web.port = port;
        }
        if let Some(serve_dir) = &cli.serve_dir {
            self.web.serve_dir = serve_dir.clone();
        }
        if let Some(db) = &cli.db {
            self.store.db_path = db.clone();
        }
        if let Some(claude_dir) = &cli.claude_dir {
            self.claude_dir = Some(claude_dir.clone());
        }
        if cli.no_browser {
            self.web.open_browser = false;
        }
    }

    /// Resolved Claude config directory
    pub fn claude_dir(&self) -> PathBuf {
        self.claude_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".claude")
        })
    }

    /// Directory the agent todo files live in
    pub fn todos_dir(&self) -> PathBuf {
        self.claude_dir().join("todos")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.web.port, 7778);
        assert_eq!(settings.web.serve_dir, PathBuf::from("."));
        assert!(settings.web.open_browser);
        assert_eq!(settings.store.db_path, PathBuf::from("usage_history.db"));
        assert!(settings.claude_dir.is_none());
    }

    #[test]
    fn test_parse_toml() {
        let toml = r#"
            claude_dir = "/tmp/claude"

            [web]
            port = 9000
            open_browser = false

            [store]
            db_path = "/tmp/history.db"
        "#;

        let settings: Settings = toml::from_str(toml).expect("Should parse TOML");
        assert_eq!(settings.web.port, 9000);
        assert!(!settings.web.open_browser);
        assert_eq!(settings.store.db_path, PathBuf::from("/tmp/history.db"));
        assert_eq!(settings.todos_dir(), PathBuf::from("/tmp/claude/todos"));
    }

    #[test]
    fn test_merge_cli_overrides() {
        let mut settings = Settings::default();
        let cli = Cli {
            debug: false,
            config: None,
            port: Some(8123),
            serve_dir: None,
            db: Some(PathBuf::from("x.db")),
            claude_dir: None,
            no_browser: true,
        };
        settings.merge_cli(&cli);
        assert_eq!(settings.web.port, 8123);
        assert_eq!(settings.store.db_path, PathBuf::from("x.db"));
        assert!(!settings.web.open_browser);
    }
}
