//! Configuration file
//!
//! Plain `Key=Value` lines. `#` starts a comment line, blank lines are
//! ignored, keys are case-insensitive and values may be wrapped in double
//! quotes. Every key is required.
//!
//! ```text
//! IPService=http://me.gandi.net
//! API=https://dns.api.gandi.net/api/v5/
//! SuccessMsg="DNS Record Created"
//! TTL=18000
//! UpdatePeriodS=120
//! CurlTimeoutS=60
//! EnableIPv6=true
//! Logging=false
//! ```

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use recupdater_core::config::{
    DEFAULT_API_BASE, DEFAULT_IP_SERVICE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_SUCCESS_MARKER,
    DEFAULT_TTL_SECS, DEFAULT_UPDATE_PERIOD_SECS,
};
use recupdater_core::{ConfigError, UpdaterConfig};
use serde_json::{Map, Value};

/// Config file used when `RECUPDATER_CONFIG` is not set
pub const DEFAULT_CONFIG_PATH: &str = "/etc/recUpdater/recUpdater.conf";

/// Environment variable overriding the config file location
pub const CONFIG_PATH_ENV: &str = "RECUPDATER_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Key {
    IpService,
    Api,
    SuccessMsg,
    Ttl,
    UpdatePeriodS,
    CurlTimeoutS,
    EnableIpv6,
    Logging,
}

impl Key {
    const ALL: [Key; 8] = [
        Key::IpService,
        Key::Api,
        Key::SuccessMsg,
        Key::Ttl,
        Key::UpdatePeriodS,
        Key::CurlTimeoutS,
        Key::EnableIpv6,
        Key::Logging,
    ];

    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "ipservice" => Some(Key::IpService),
            "api" => Some(Key::Api),
            "successmsg" => Some(Key::SuccessMsg),
            "ttl" => Some(Key::Ttl),
            "updateperiods" => Some(Key::UpdatePeriodS),
            "curltimeouts" | "requesttimeouts" => Some(Key::CurlTimeoutS),
            "enableipv6" => Some(Key::EnableIpv6),
            "logging" => Some(Key::Logging),
            _ => None,
        }
    }

    /// Canonical attribute name, also the field name `UpdaterConfig` deserializes
    fn name(self) -> &'static str {
        match self {
            Key::IpService => "IPService",
            Key::Api => "API",
            Key::SuccessMsg => "SuccessMsg",
            Key::Ttl => "TTL",
            Key::UpdatePeriodS => "UpdatePeriodS",
            Key::CurlTimeoutS => "CurlTimeoutS",
            Key::EnableIpv6 => "EnableIPv6",
            Key::Logging => "Logging",
        }
    }
}

/// Location of the config file
pub fn config_path() -> PathBuf {
    std::env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Read and parse the config file
///
/// # Errors
///
/// - [`ConfigError::Missing`]: the file cannot be opened
/// - [`ConfigError::Syntax`]: a line is malformed or a value is invalid
/// - [`ConfigError::IncompleteAttributes`]: a required key is absent
pub fn load(path: &Path) -> Result<UpdaterConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|_| ConfigError::Missing {
        path: path.display().to_string(),
    })?;
    parse(&contents)
}

/// Parse config file contents
///
/// Lines are checked one at a time, then the typed attribute map is handed
/// to serde.
pub fn parse(contents: &str) -> Result<UpdaterConfig, ConfigError> {
    let mut attributes = Map::new();
    let mut seen = HashSet::new();
    let mut last_line = 0;

    for (index, raw) in contents.lines().enumerate() {
        let line_no = index + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        last_line = line_no;

        let Some((name, value)) = line.split_once('=') else {
            return Err(ConfigError::syntax(line_no, format!("expected Key=Value, got '{}'", line)));
        };
        let name = name.trim();
        let value = unquote(value.trim());

        let key = Key::from_name(name)
            .ok_or_else(|| ConfigError::syntax(line_no, format!("unknown attribute '{}'", name)))?;
        if !seen.insert(key) {
            return Err(ConfigError::syntax(
                line_no,
                format!("duplicate attribute '{}'", key.name()),
            ));
        }

        let value = typed(key, value).map_err(|message| ConfigError::syntax(line_no, message))?;
        attributes.insert(key.name().to_string(), value);
    }

    let missing: Vec<String> = Key::ALL
        .iter()
        .filter(|key| !seen.contains(*key))
        .map(|key| key.name().to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ConfigError::IncompleteAttributes { missing });
    }

    serde_json::from_value(Value::Object(attributes))
        .map_err(|e| ConfigError::syntax(last_line, e.to_string()))
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|rest| rest.strip_suffix('"'))
        .unwrap_or(value)
}

fn typed(key: Key, value: &str) -> Result<Value, String> {
    Ok(match key {
        Key::IpService | Key::Api | Key::SuccessMsg => Value::from(non_empty(key, value)?),
        Key::Ttl => Value::from(number::<u32>(key, value)?),
        Key::UpdatePeriodS | Key::CurlTimeoutS => Value::from(number::<u64>(key, value)?),
        Key::EnableIpv6 | Key::Logging => Value::from(flag(key, value)?),
    })
}

fn non_empty(key: Key, value: &str) -> Result<String, String> {
    if value.is_empty() {
        return Err(format!("{} must not be empty", key.name()));
    }
    Ok(value.to_string())
}

fn number<T: std::str::FromStr>(key: Key, value: &str) -> Result<T, String> {
    value
        .parse()
        .map_err(|_| format!("{} must be a non-negative number, got '{}'", key.name(), value))
}

fn flag(key: Key, value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(format!("{} must be true or false, got '{}'", key.name(), value)),
    }
}

/// Contents of a freshly generated config file
pub fn default_contents() -> String {
    format!(
        "\
###########################################################
# recupdaterd configuration, record updates for gandi.net #
###########################################################

# Service answering with your public IP address as plain text
IPService={ip_service}

# Base address of the LiveDNS API
API={api}

# Text a response must contain for an update to count as successful
SuccessMsg=\"{success}\"

# Time to live of the updated record/s, in seconds
TTL={ttl}

# Seconds between two checks of the public IP address
UpdatePeriodS={period}

# Timeout of every HTTP request in seconds, 0 disables it
CurlTimeoutS={timeout}

# Whether IPv6 addresses are looked up and published (true/false)
EnableIPv6=true

# Whether output is also appended to the log file (true/false)
Logging=false
",
        ip_service = DEFAULT_IP_SERVICE,
        api = DEFAULT_API_BASE,
        success = DEFAULT_SUCCESS_MARKER,
        ttl = DEFAULT_TTL_SECS,
        period = DEFAULT_UPDATE_PERIOD_SECS,
        timeout = DEFAULT_REQUEST_TIMEOUT_SECS,
    )
}

/// Write the default config file, creating its directory if needed
///
/// Never overwrites an existing file.
pub fn generate_default(path: &Path) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(default_contents().as_bytes())?;
    file.sync_all()
}
