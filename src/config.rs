use std::fmt::{self, Debug, Formatter};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use failure::{Error, ResultExt};
use toml;

/// The tool's configuration, usually loaded from `~/.repo-cite.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubConfig>,
}

impl Config {
    /// Load the config from disk, falling back to the defaults when the file
    /// doesn't exist.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config, Error> {
        let path = path.as_ref();

        if !path.exists() {
            debug!("No config file at {}, using the defaults", path.display());
            return Ok(Config::default());
        }

        let mut raw = String::new();
        File::open(path)
            .and_then(|mut f| f.read_to_string(&mut raw))
            .context("Couldn't read the config file")?;

        let cfg = toml::from_str(&raw).context("The config file isn't valid TOML")?;
        Ok(cfg)
    }

    /// An example config, for `--example-config`.
    pub fn example() -> Config {
        Config {
            github: Some(GithubConfig {
                token: Some(String::from("your API token")),
                ..Default::default()
            }),
        }
    }

    pub fn as_toml(&self) -> Result<String, Error> {
        let raw = toml::to_string(self).context("Couldn't serialize the config")?;
        Ok(raw)
    }
}

#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GithubConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Point this at your GitHub Enterprise instance, if you have one.
    pub api_root: String,
}

impl GithubConfig {
    pub const DEFAULT_API_ROOT: &'static str = "https://api.github.com";
}

impl Default for GithubConfig {
    fn default() -> GithubConfig {
        GithubConfig {
            token: None,
            api_root: GithubConfig::DEFAULT_API_ROOT.to_string(),
        }
    }
}

impl Debug for GithubConfig {
    // Keep tokens out of the logs.
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("GithubConfig")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("api_root", &self.api_root)
            .finish()
    }
}
