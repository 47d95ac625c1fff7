// ## 📂 File: `src/headers/version.rs`

//! headers/version.rs
//! Two-byte version prefix and the per-major validation table.
//!
//! Design notes:
//! - Basic rules run before any table lookup: `0.0` is never valid and a major
//!   newer than the current one is rejected outright.
//! - Each supported major owns a strategy that knows the newest minor it can read.
//! - Every rejection, including unexpected strategy failures, surfaces as
//!   `HeaderError::VersionValidation` so callers see one failure kind.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use serde::Serialize;

use crate::constants::{CURRENT_MAJOR_VERSION, CURRENT_MINOR_VERSION, LEGACY_MAJOR_ZERO_MAX_MINOR};
use crate::headers::types::HeaderError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FormatVersion {
    pub major: u8,
    pub minor: u8,
}

impl FormatVersion {
    pub const CURRENT: FormatVersion = FormatVersion::new(CURRENT_MAJOR_VERSION, CURRENT_MINOR_VERSION);

    pub const fn new(major: u8, minor: u8) -> Self {
        Self { major, minor }
    }

    pub const fn to_bytes(self) -> [u8; 2] {
        [self.major, self.minor]
    }

    pub const fn from_bytes(bytes: [u8; 2]) -> Self {
        Self::new(bytes[0], bytes[1])
    }
}

impl fmt::Display for FormatVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

/// Why a strategy refused a version.
#[derive(Debug)]
pub enum VersionCheckError {
    Rejected(String),
    Internal(String),
}

/// Validation rules for one major version.
pub trait VersionStrategy: Send + Sync {
    /// Newest version this strategy can read.
    fn supported(&self) -> FormatVersion;

    fn check(&self, version: FormatVersion) -> Result<(), VersionCheckError>;
}

/// Pre-release layout. Byte-identical to 1.x; only `0.1` was ever written.
#[derive(Debug, Default, Clone, Copy)]
pub struct MajorZeroStrategy;

impl VersionStrategy for MajorZeroStrategy {
    fn supported(&self) -> FormatVersion {
        FormatVersion::new(0, LEGACY_MAJOR_ZERO_MAX_MINOR)
    }

    fn check(&self, version: FormatVersion) -> Result<(), VersionCheckError> {
        if version.major != 0 {
            return Err(VersionCheckError::Internal(format!(
                "major-0 strategy dispatched for major {}",
                version.major
            )));
        }
        if version.minor > LEGACY_MAJOR_ZERO_MAX_MINOR {
            return Err(VersionCheckError::Rejected(format!(
                "minor version {} is newer than the last pre-release minor {}",
                version.minor, LEGACY_MAJOR_ZERO_MAX_MINOR
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct MajorOneStrategy;

impl VersionStrategy for MajorOneStrategy {
    fn supported(&self) -> FormatVersion {
        FormatVersion::new(1, CURRENT_MINOR_VERSION)
    }

    fn check(&self, version: FormatVersion) -> Result<(), VersionCheckError> {
        if version.major != 1 {
            return Err(VersionCheckError::Internal(format!(
                "major-1 strategy dispatched for major {}",
                version.major
            )));
        }
        Ok(())
    }
}

pub struct VersionValidator {
    current: FormatVersion,
    strategies: BTreeMap<u8, Box<dyn VersionStrategy>>,
}

impl fmt::Debug for VersionValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VersionValidator")
            .field("current", &self.current)
            .field("majors", &self.strategies.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for VersionValidator {
    fn default() -> Self {
        let mut strategies: BTreeMap<u8, Box<dyn VersionStrategy>> = BTreeMap::new();
        strategies.insert(0, Box::new(MajorZeroStrategy));
        strategies.insert(1, Box::new(MajorOneStrategy));
        Self { current: FormatVersion::CURRENT, strategies }
    }
}

impl VersionValidator {
    /// Process-wide validator with the built-in table.
    pub fn shared() -> &'static VersionValidator {
        static VALIDATOR: OnceLock<VersionValidator> = OnceLock::new();
        VALIDATOR.get_or_init(VersionValidator::default)
    }

    pub fn current(&self) -> FormatVersion {
        self.current
    }

    pub fn validate(&self, version: FormatVersion) -> Result<(), HeaderError> {
        let reject = |supported: FormatVersion, reason: String| HeaderError::VersionValidation {
            found: version,
            supported,
            reason,
        };

        if version.major == 0 && version.minor == 0 {
            return Err(reject(self.current, "version 0.0 is never valid".into()));
        }
        if version.major > self.current.major {
            return Err(reject(
                self.current,
                format!("major version {} is newer than {}", version.major, self.current.major),
            ));
        }

        let strategy = self.strategies.get(&version.major).ok_or_else(|| {
            reject(self.current, format!("no validation strategy for major {}", version.major))
        })?;

        let supported = strategy.supported();
        if version.minor > supported.minor {
            return Err(reject(
                supported,
                format!("minor version {} is newer than {}", version.minor, supported.minor),
            ));
        }

        strategy.check(version).map_err(|e| match e {
            VersionCheckError::Rejected(reason) => reject(supported, reason),
            VersionCheckError::Internal(msg) => reject(supported, format!("internal validation error: {}", msg)),
        })
    }
}

/// Validate a version prefix against the built-in table.
#[inline]
pub fn validate_version(version: FormatVersion) -> Result<(), HeaderError> {
    VersionValidator::shared().validate(version)
}
