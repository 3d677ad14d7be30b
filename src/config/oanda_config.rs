use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::ffi::OsString;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const API_KEY_VAR: &str = "OANDA_API_KEY";
pub const ACCOUNT_ID_VAR: &str = "OANDA_ACCOUNT_ID";
pub const ENVIRONMENT_VAR: &str = "OANDA_ENVIRONMENT";
pub const BASE_URL_VAR: &str = "OANDA_BASE_URL";

//which oanda deployment the credentials belong to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OandaEnvironment {
    #[default]
    Practice,
    Live,
}

impl OandaEnvironment {
    pub fn rest_url(&self) -> &'static str {
        match self {
            OandaEnvironment::Practice => "https://api-fxpractice.oanda.com",
            OandaEnvironment::Live => "https://api-fxtrade.oanda.com",
        }
    }
}

impl FromStr for OandaEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "practice" | "demo" => Ok(OandaEnvironment::Practice),
            "live" | "trade" => Ok(OandaEnvironment::Live),
            _ => Err(ConfigError::InvalidEnvironment(s.to_string())),
        }
    }
}

//credentials and endpoint for the oanda rest api
//built once and handed to the client; nothing here touches process-wide state
#[derive(Clone, PartialEq)]
pub struct OandaConfig {
    pub account_id: String,
    pub api_key: String,
    pub environment: OandaEnvironment,

    //overrides the environment's url (tests, proxies)
    pub base_url: Option<String>,
}

impl OandaConfig {
    pub fn new(
        account_id: impl Into<String>,
        api_key: impl Into<String>,
        environment: OandaEnvironment,
    ) -> Result<Self, ConfigError> {
        let account_id = account_id.into();
        let api_key = api_key.into();

        if api_key.trim().is_empty() {
            return Err(ConfigError::MissingCredential(API_KEY_VAR));
        }
        if account_id.trim().is_empty() {
            return Err(ConfigError::MissingCredential(ACCOUNT_ID_VAR));
        }

        Ok(OandaConfig {
            account_id,
            api_key,
            environment,
            base_url: None,
        })
    }

    //builder style override of the rest url
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    //builds the config from a set of key/value pairs
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let vars: HashMap<String, String> = vars.into_iter().collect();

        let api_key = vars
            .get(API_KEY_VAR)
            .ok_or(ConfigError::MissingCredential(API_KEY_VAR))?;
        let account_id = vars
            .get(ACCOUNT_ID_VAR)
            .ok_or(ConfigError::MissingCredential(ACCOUNT_ID_VAR))?;
        let environment = match vars.get(ENVIRONMENT_VAR) {
            Some(value) => value.parse()?,
            None => OandaEnvironment::default(),
        };

        let mut config = OandaConfig::new(account_id.clone(), api_key.clone(), environment)?;
        if let Some(url) = vars.get(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config = config.with_base_url(url.clone());
        }
        Ok(config)
    }

    //reads an env file (default `.env`, optional) and the current environment
    //variables, the latter taking precedence, like dotenv does
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        let mut vars = read_env_file(env_file.unwrap_or(Path::new(".env")), env_file.is_some())?;
        vars.extend(unicode_vars(std::env::vars_os()));
        Self::from_vars(vars)
    }

    //rest url requests are sent to
    pub fn api_url(&self) -> &str {
        self.base_url
            .as_deref()
            .unwrap_or_else(|| self.environment.rest_url())
    }
}

//api key stays out of logs
impl fmt::Debug for OandaConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OandaConfig")
            .field("account_id", &self.account_id)
            .field("api_key", &"<redacted>")
            .field("environment", &self.environment)
            .field("base_url", &self.base_url)
            .finish()
    }
}

//non-unicode variables cannot be credentials, they are skipped
fn unicode_vars<I>(vars: I) -> impl Iterator<Item = (String, String)>
where
    I: IntoIterator<Item = (OsString, OsString)>,
{
    vars.into_iter()
        .filter_map(|(key, value)| Some((key.into_string().ok()?, value.into_string().ok()?)))
}

fn read_env_file(path: &Path, required: bool) -> Result<HashMap<String, String>, ConfigError> {
    let to_error = |e: dotenvy::Error| ConfigError::EnvFile {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() && !required => return Ok(HashMap::new()),
        Err(e) => return Err(to_error(e)),
    };

    let mut vars = HashMap::new();
    for item in iter {
        let (key, value) = item.map_err(to_error)?;
        vars.insert(key, value);
    }
    Ok(vars)
}
