use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage backend types
///
/// Exactly one backend is selected at startup via the `DEFAULT_STORAGE`
/// configuration flag. There is no failover between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StorageBackend {
    /// Aliyun OSS (default)
    Oss,
    /// Cloudflare R2
    R2,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "OSS" => Ok(StorageBackend::Oss),
            "R2" => Ok(StorageBackend::R2),
            _ => Err(anyhow::anyhow!("Invalid storage backend: {}", s)),
        }
    }
}

impl Display for StorageBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StorageBackend::Oss => write!(f, "OSS"),
            StorageBackend::R2 => write!(f, "R2"),
        }
    }
}
