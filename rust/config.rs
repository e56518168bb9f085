use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::debug;

use crate::error::ConfigError;
use crate::{API_KEY_ENV, API_KEY_PATH, CHARACTER_ID_ENV, DEFAULT_CHARACTER_ID, DEFAULT_ENDPOINT};

/// Secret sent in the `CONVAI-API-KEY` header. Formatting never shows more
/// than the last four characters.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    /// Trims `raw`; `None` if nothing is left.
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.into()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        let shown = if chars.len() > 8 { 4 } else { 0 };
        let tail: String = chars[chars.len() - shown..].iter().collect();
        format!("****{tail}")
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "ApiKey({})", self.masked())
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}

#[test]
fn test_api_key_masking() {
    let key = ApiKey::new("  0123456789abcdef\n").unwrap();
    assert_eq!(key.expose(), "0123456789abcdef");
    assert_eq!(key.to_string(), "****cdef");
    assert_eq!(format!("{key:?}"), "ApiKey(****cdef)");

    // too short to reveal anything
    assert_eq!(ApiKey::new("abcd").unwrap().to_string(), "****");
    assert!(ApiKey::new(" \t ").is_none());
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Environment,
    ConfigFile,
    KeyFile,
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KeySource::Environment => write!(f, "${API_KEY_ENV}"),
            KeySource::ConfigFile => write!(f, "config file"),
            KeySource::KeyFile => write!(f, "./{API_KEY_PATH}"),
        }
    }
}

/// Optional `config.toml`. Every entry may be left out.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub character_id: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, path)
    }

    pub fn parse(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// `~/.config/convai/config.toml` (XDG), if such a file exists.
pub fn default_config_path() -> Option<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("convai").ok()?;
    xdg_dirs.find_config_file("config.toml")
}

/// Values given on the command line. These win over everything else.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub character_id: Option<String>,
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_key: ApiKey,
    pub key_source: KeySource,
    pub character_id: String,
    pub endpoint: String,
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(String::from)
}

impl Settings {
    /// Resolve settings from explicit inputs.
    ///
    /// Character id: override, then `$CONVAI_CHARACTER_ID`, then the config
    /// file, then the built-in default. Endpoint: override, then the config
    /// file, then the default. API key: `$CONVAI_API_KEY`, then the config
    /// file, then `read_key_file`. There is no default key.
    pub fn resolve<E, K>(
        overrides: &Overrides,
        env: E,
        file: Option<&FileConfig>,
        read_key_file: K,
    ) -> Result<Self, ConfigError>
    where
        E: Fn(&str) -> Option<String>,
        K: FnOnce() -> Option<String>,
    {
        let file = file.cloned().unwrap_or_default();

        let (api_key, key_source) = if let Some(k) = env(API_KEY_ENV).and_then(|v| ApiKey::new(&v)) {
            (k, KeySource::Environment)
        } else if let Some(k) = file.api_key.as_deref().and_then(ApiKey::new) {
            (k, KeySource::ConfigFile)
        } else if let Some(k) = read_key_file().and_then(|v| ApiKey::new(&v)) {
            (k, KeySource::KeyFile)
        } else {
            return Err(ConfigError::MissingApiKey);
        };

        let character_id = non_empty(overrides.character_id.as_deref())
            .or_else(|| non_empty(env(CHARACTER_ID_ENV).as_deref()))
            .or_else(|| non_empty(file.character_id.as_deref()))
            .unwrap_or_else(|| DEFAULT_CHARACTER_ID.into());

        let endpoint = non_empty(overrides.endpoint.as_deref())
            .or_else(|| non_empty(file.endpoint.as_deref()))
            .unwrap_or_else(|| DEFAULT_ENDPOINT.into());

        debug!(%key_source, %character_id, %endpoint, "resolved settings");

        Ok(Self {
            api_key,
            key_source,
            character_id,
            endpoint,
        })
    }

    /// Resolve against the real process: environment variables, the config
    /// file (`config_path` must exist if given; the XDG default is optional)
    /// and `./CONVAI_API_KEY`.
    pub fn from_process(overrides: &Overrides, config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match config_path {
            Some(path) => Some(FileConfig::load(path)?),
            None => match default_config_path() {
                Some(path) => {
                    debug!(path = %path.display(), "using config file");
                    Some(FileConfig::load(&path)?)
                }
                None => None,
            },
        };
        Self::resolve(
            overrides,
            |name| std::env::var(name).ok(),
            file.as_ref(),
            || fs::read_to_string(API_KEY_PATH).ok(),
        )
    }
}

#[cfg(test)]
fn env_of(pairs: &'static [(&'static str, &'static str)]) -> impl Fn(&str) -> Option<String> {
    move |name| {
        pairs
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.to_string())
    }
}

#[test]
fn test_defaults_with_env_key() {
    let s = Settings::resolve(
        &Overrides::default(),
        env_of(&[("CONVAI_API_KEY", "env-key-123456")]),
        None,
        || None,
    )
    .unwrap();
    assert_eq!(s.api_key.expose(), "env-key-123456");
    assert_eq!(s.key_source, KeySource::Environment);
    assert_eq!(s.character_id, DEFAULT_CHARACTER_ID);
    assert_eq!(s.endpoint, DEFAULT_ENDPOINT);
}

#[test]
fn test_missing_key_is_an_error() {
    let err = Settings::resolve(&Overrides::default(), env_of(&[]), None, || None).unwrap_err();
    assert!(matches!(err, ConfigError::MissingApiKey));

    // blank values do not count
    let file = FileConfig {
        api_key: Some("   ".into()),
        ..Default::default()
    };
    let err = Settings::resolve(
        &Overrides::default(),
        env_of(&[("CONVAI_API_KEY", "")]),
        Some(&file),
        || Some("\n".into()),
    )
    .unwrap_err();
    assert!(matches!(err, ConfigError::MissingApiKey));
}

#[test]
fn test_key_precedence() {
    let file = FileConfig {
        api_key: Some("file-key".into()),
        ..Default::default()
    };

    let s = Settings::resolve(
        &Overrides::default(),
        env_of(&[("CONVAI_API_KEY", "env-key")]),
        Some(&file),
        || Some("keyfile-key".into()),
    )
    .unwrap();
    assert_eq!(s.api_key.expose(), "env-key");

    let s = Settings::resolve(&Overrides::default(), env_of(&[]), Some(&file), || {
        Some("keyfile-key".into())
    })
    .unwrap();
    assert_eq!(s.api_key.expose(), "file-key");
    assert_eq!(s.key_source, KeySource::ConfigFile);

    let s = Settings::resolve(&Overrides::default(), env_of(&[]), None, || {
        Some("keyfile-key\n".into())
    })
    .unwrap();
    assert_eq!(s.api_key.expose(), "keyfile-key");
    assert_eq!(s.key_source, KeySource::KeyFile);
}

#[test]
fn test_character_and_endpoint_precedence() {
    let file = FileConfig {
        api_key: Some("k".into()),
        character_id: Some("from-file".into()),
        endpoint: Some("http://file.example/get".into()),
    };

    let s = Settings::resolve(
        &Overrides::default(),
        env_of(&[("CONVAI_CHARACTER_ID", "from-env")]),
        Some(&file),
        || None,
    )
    .unwrap();
    assert_eq!(s.character_id, "from-env");
    assert_eq!(s.endpoint, "http://file.example/get");

    let overrides = Overrides {
        character_id: Some(" from-cli ".into()),
        endpoint: Some("http://cli.example/get".into()),
    };
    let s = Settings::resolve(
        &overrides,
        env_of(&[("CONVAI_CHARACTER_ID", "from-env")]),
        Some(&file),
        || None,
    )
    .unwrap();
    assert_eq!(s.character_id, "from-cli");
    assert_eq!(s.endpoint, "http://cli.example/get");

    let s = Settings::resolve(&Overrides::default(), env_of(&[]), Some(&file), || None).unwrap();
    assert_eq!(s.character_id, "from-file");
}

#[test]
fn test_parse_file_config() {
    let path = Path::new("config.toml");
    let cfg = FileConfig::parse("character_id = \"abc\"\n", path).unwrap();
    assert_eq!(cfg.character_id.as_deref(), Some("abc"));
    assert_eq!(cfg.api_key, None);

    let err = FileConfig::parse("character_id = ", path).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_load_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let err = FileConfig::load(&dir.path().join("nope.toml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));

    let path = dir.path().join("config.toml");
    fs::write(&path, "api_key = \"secret-from-disk\"\n").unwrap();
    let cfg = FileConfig::load(&path).unwrap();
    assert_eq!(cfg.api_key.as_deref(), Some("secret-from-disk"));
}
