use std::fmt;

/// Rejected controller configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// A field holds a value outside its valid domain.
    Invalid {
        field: &'static str,
        reason: &'static str,
    },
    /// The TOML source could not be parsed.
    Parse(toml::de::Error),
    /// The configuration file could not be read.
    Io(std::io::Error),
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: &'static str) -> Self {
        ConfigError::Invalid { field, reason }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Invalid { field, reason } => write!(f, "invalid `{}`: {}", field, reason),
            ConfigError::Parse(e) => write!(f, "failed to parse config: {}", e),
            ConfigError::Io(e) => write!(f, "failed to read config: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Invalid { .. } => None,
            ConfigError::Parse(e) => Some(e),
            ConfigError::Io(e) => Some(e),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self {
        ConfigError::Parse(e)
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

/// Failure of a quaternion construction that has no unique answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GeometryError {
    /// The two vectors are anti-parallel (or zero), so the shortest rotation
    /// between them has no defined axis.
    DegenerateRotation,
}

impl fmt::Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::DegenerateRotation => {
                write!(f, "vectors are anti-parallel, rotation axis is undefined")
            }
        }
    }
}

impl std::error::Error for GeometryError {}
