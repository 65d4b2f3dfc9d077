use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Storage provider kinds
///
/// This enum defines the closed set of backing stores a photo can live in.
/// It's defined in core because it's used in configuration and in the
/// storage records attached to photos.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Local,
    S3,
    GoogleDrive,
}

impl ProviderKind {
    /// All provider kinds, in registry order.
    pub const ALL: [ProviderKind; 3] =
        [ProviderKind::Local, ProviderKind::S3, ProviderKind::GoogleDrive];
}

impl FromStr for ProviderKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "local" => Ok(ProviderKind::Local),
            "s3" => Ok(ProviderKind::S3),
            "google-drive" | "googledrive" => Ok(ProviderKind::GoogleDrive),
            _ => Err(anyhow::anyhow!("Invalid storage provider: {}", s)),
        }
    }
}

impl Display for ProviderKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            ProviderKind::Local => write!(f, "local"),
            ProviderKind::S3 => write!(f, "s3"),
            ProviderKind::GoogleDrive => write!(f, "google-drive"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_kind_round_trip() {
        for kind in ProviderKind::ALL {
            let parsed: ProviderKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn test_provider_kind_rejects_unknown() {
        assert!("dropbox".parse::<ProviderKind>().is_err());
        assert!("".parse::<ProviderKind>().is_err());
    }

    #[test]
    fn test_provider_kind_serde_names() {
        assert_eq!(
            serde_json::to_string(&ProviderKind::GoogleDrive).unwrap(),
            "\"google-drive\""
        );
        assert_eq!(serde_json::to_string(&ProviderKind::S3).unwrap(), "\"s3\"");
    }
}
