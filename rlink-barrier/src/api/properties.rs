use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::num::ParseIntError;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

pub const BARRIER_IDLE: &str = "barrier.idle.ms";
pub const BARRIER_PERIOD: &str = "barrier.period.ms";

pub trait BarrierProperties {
    fn set_barrier_idle(&mut self, idle: Duration);
    fn get_barrier_idle(&self) -> Result<Duration, PropertiesError>;

    fn set_barrier_period(&mut self, period: Duration);
    fn get_barrier_period(&self) -> Result<Duration, PropertiesError>;
}

#[derive(Clone, Serialize, Deserialize, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    properties: HashMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Properties {
            properties: HashMap::new(),
        }
    }

    /// Load a flat yaml mapping, scalar values of any type are kept as their string form.
    pub fn load_yaml<P: AsRef<Path>>(path: P) -> Result<Self, PropertiesError> {
        let mut file = File::open(path)?;
        let mut buffer = String::new();
        file.read_to_string(&mut buffer)?;
        Properties::from_yaml_str(buffer.as_str())
    }

    pub fn from_yaml_str(context: &str) -> Result<Self, PropertiesError> {
        let values: HashMap<String, serde_yaml::Value> = serde_yaml::from_str(context)?;

        let mut properties = Properties::new();
        for (key, value) in values {
            let value = match value {
                serde_yaml::Value::String(s) => s,
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Null => continue,
                _ => return Err(PropertiesError::NotScalar(key)),
            };
            properties.set_string(key, value);
        }

        Ok(properties)
    }

    pub fn set_str(&mut self, key: &str, value: &str) {
        self.properties.insert(key.to_string(), value.to_string());
    }

    pub fn set_string(&mut self, key: String, value: String) {
        self.properties.insert(key, value);
    }

    pub fn get_string(&self, key: &str) -> Result<String, PropertiesError> {
        match self.properties.get(key) {
            Some(v) => Ok(v.clone()),
            None => Err(PropertiesError::None),
        }
    }

    pub fn set_u64(&mut self, key: &str, value: u64) {
        self.set_string(key.to_string(), value.to_string());
    }

    pub fn get_u64(&self, key: &str) -> Result<u64, PropertiesError> {
        match self.properties.get(key) {
            Some(v) => u64::from_str(v.trim()).map_err(PropertiesError::from),
            None => Err(PropertiesError::None),
        }
    }

    fn get_duration_or_zero(&self, key: &str) -> Result<Duration, PropertiesError> {
        match self.get_u64(key) {
            Ok(millis) => Ok(Duration::from_millis(millis)),
            Err(PropertiesError::None) => Ok(Duration::ZERO),
            Err(e) => Err(e),
        }
    }
}

/// Millis of `duration`, a non zero duration never rounds down to the "not set" zero
fn non_zero_millis(duration: Duration) -> u64 {
    let millis = duration.as_millis() as u64;
    if millis == 0 && !duration.is_zero() {
        1
    } else {
        millis
    }
}

/// Durations are kept in millis. An absent key reads as a zero duration, meaning "not set".
impl BarrierProperties for Properties {
    fn set_barrier_idle(&mut self, idle: Duration) {
        self.set_u64(BARRIER_IDLE, non_zero_millis(idle));
    }

    fn get_barrier_idle(&self) -> Result<Duration, PropertiesError> {
        self.get_duration_or_zero(BARRIER_IDLE)
    }

    fn set_barrier_period(&mut self, period: Duration) {
        self.set_u64(BARRIER_PERIOD, non_zero_millis(period));
    }

    fn get_barrier_period(&self) -> Result<Duration, PropertiesError> {
        self.get_duration_or_zero(BARRIER_PERIOD)
    }
}

#[derive(Debug)]
pub enum PropertiesError {
    None,
    NotScalar(String),
    Io(std::io::Error),
    ParseIntError(ParseIntError),
    YamlParseError(serde_yaml::Error),
}

impl std::fmt::Display for PropertiesError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match *self {
            PropertiesError::None => write!(f, "None error"),
            PropertiesError::NotScalar(ref key) => write!(f, "`{}` is not a scalar value", key),
            PropertiesError::Io(ref err) => write!(f, "IO error: {}", err),
            PropertiesError::ParseIntError(ref err) => write!(f, "ParseIntError error: {}", err),
            PropertiesError::YamlParseError(ref err) => write!(f, "YamlParseError error: {}", err),
        }
    }
}

impl std::error::Error for PropertiesError {}

impl From<std::io::Error> for PropertiesError {
    fn from(e: std::io::Error) -> Self {
        PropertiesError::Io(e)
    }
}

impl From<ParseIntError> for PropertiesError {
    fn from(e: ParseIntError) -> Self {
        PropertiesError::ParseIntError(e)
    }
}

impl From<serde_yaml::Error> for PropertiesError {
    fn from(e: serde_yaml::Error) -> Self {
        PropertiesError::YamlParseError(e)
    }
}
