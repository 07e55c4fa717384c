use crate::error::CoreError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// An Open Banking API schema version, e.g. `v3.1.10`.
///
/// Versions are totally ordered; the derived ordering compares
/// major, then minor, then patch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

impl ApiVersion {
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ApiVersion {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let stripped = s.strip_prefix('v').unwrap_or(s);
        let mut parts = stripped.split('.');
        let mut component = |name: &str| -> Result<u16, CoreError> {
            parts
                .next()
                .ok_or_else(|| CoreError::invalid_api_version(format!("{s}: missing {name}")))?
                .parse::<u16>()
                .map_err(|_| CoreError::invalid_api_version(s))
        };
        let major = component("major")?;
        let minor = component("minor")?;
        let patch = component("patch")?;
        if parts.next().is_some() {
            return Err(CoreError::invalid_api_version(s));
        }
        Ok(ApiVersion::new(major, minor, patch))
    }
}

impl Serialize for ApiVersion {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ApiVersion {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ApiVersion::from_str(&s).map_err(serde::de::Error::custom)
    }
}

/// Compatibility policy between the schema version a consent was created under
/// and the version the current caller speaks.
///
/// A consent created under an older version stays readable by callers on
/// newer versions, never the reverse. An optional floor version globally
/// disallows versions below it on either side.
#[derive(Debug, Clone, Default)]
pub struct ApiVersionValidator {
    floor: Option<ApiVersion>,
}

impl ApiVersionValidator {
    pub fn new() -> Self {
        Self { floor: None }
    }

    /// Disallow any version below `floor`, on both the consent and the caller side.
    pub fn with_floor(floor: ApiVersion) -> Self {
        Self { floor: Some(floor) }
    }

    pub fn floor(&self) -> Option<ApiVersion> {
        self.floor
    }

    /// Whether a caller bound to `requested` may access a consent created
    /// under `created`.
    pub fn can_access_resource_using_api_version(
        &self,
        created: ApiVersion,
        requested: ApiVersion,
    ) -> bool {
        if let Some(floor) = self.floor
            && (created < floor || requested < floor)
        {
            return false;
        }
        requested >= created
    }
}
