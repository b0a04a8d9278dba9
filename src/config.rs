use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub library: LibraryConfig,

    #[serde(default)]
    pub render: RenderConfig,

    /// Root chosen for this run only; never written to disk.
    #[serde(skip)]
    session_root: Option<PathBuf>,
}

/// Where notes live.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LibraryConfig {
    /// Directories registered with `add-path`
    #[serde(default)]
    pub search_paths: Vec<PathBuf>,

    /// Document root used when none is given on the command line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_root: Option<PathBuf>,
}

/// Output options for rendered notes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Upper bound on the render width, in columns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_width: Option<u16>,

    /// Emit ANSI colors when printing (default: true)
    #[serde(default = "default_color")]
    pub color: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            max_width: None,
            color: default_color(),
        }
    }
}

fn default_color() -> bool {
    true
}

impl Config {
    /// Get the XDG-style config file path (~/.config/notegrid/config.toml)
    /// This is preferred on macOS for CLI tools and cross-platform dotfiles
    #[cfg(target_os = "macos")]
    fn xdg_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("notegrid").join("config.toml"))
    }

    /// Get the platform-specific config file path
    /// - macOS: ~/Library/Application Support/notegrid/config.toml
    /// - Linux: ~/.config/notegrid/config.toml
    /// - Windows: %APPDATA%/notegrid/config.toml
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("notegrid").join("config.toml"))
    }

    /// Load config from file, or return default if file doesn't exist
    /// On macOS, checks ~/.config/notegrid first, then falls back to ~/Library/Application Support
    pub fn load() -> Self {
        #[cfg(target_os = "macos")]
        {
            if let Some(xdg_path) = Self::xdg_config_path() {
                if xdg_path.exists() {
                    return Self::load_from(&xdg_path);
                }
            }
        }

        Self::config_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load from `path`; a missing or invalid file gives the defaults.
    pub fn load_from(path: &Path) -> Self {
        match Self::read(path) {
            Ok(config) => config,
            Err(Error::Io { source, .. }) if source.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                Self::default()
            }
            Err(err) => {
                warn!(%err, "ignoring unreadable config");
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(toml::from_str(&contents)?)
    }

    /// Save config to the platform config path
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path().ok_or(Error::NoConfigDir)?;
        self.save_to(&path)
    }

    /// Write to `path` atomically, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;

        let contents = toml::to_string_pretty(self)?;

        // write to a temp file, then rename over the old config
        let mut temp_file = tempfile::NamedTempFile::new_in(parent).map_err(|e| Error::io(parent, e))?;
        temp_file
            .write_all(contents.as_bytes())
            .map_err(|e| Error::io(temp_file.path(), e))?;
        temp_file
            .persist(path)
            .map_err(|e| Error::io(path, e.error))?;
        Ok(())
    }

    /// Register a search path. Returns `false` if it was already present.
    pub fn add_search_path(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.library.search_paths.contains(&path) {
            return false;
        }
        self.library.search_paths.push(path);
        true
    }

    /// Unregister a search path. Returns `false` if it wasn't present.
    pub fn remove_search_path(&mut self, path: &Path) -> bool {
        let before = self.library.search_paths.len();
        self.library.search_paths.retain(|p| p != path);
        self.library.search_paths.len() != before
    }

    pub fn set_default_root(&mut self, path: impl Into<PathBuf>) {
        self.library.default_root = Some(path.into());
    }

    /// Use `path` as the document root for this run without persisting it.
    pub fn set_session_root(&mut self, path: impl Into<PathBuf>) {
        self.session_root = Some(path.into());
    }

    /// The session root if one was set, otherwise the configured default.
    pub fn document_root(&self) -> Option<&Path> {
        self.session_root
            .as_deref()
            .or(self.library.default_root.as_deref())
    }

    /// Render width for a terminal of `available` columns.
    pub fn render_width(&self, available: u16) -> u16 {
        match self.render.max_width {
            Some(max) => available.min(max),
            None => available,
        }
    }
}
