//! Configuration types for the Mimic stub.

mod listen;
mod matching;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use listen::ListenConfig;
pub use matching::MatchingConfig;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct StubConfig {
    #[serde(default)]
    pub listen: ListenConfig,

    /// Contract files, or directories whose `*.contract` files are loaded.
    #[serde(default)]
    pub contracts: Vec<PathBuf>,

    /// Mock directories. When empty, each contract's sibling
    /// `<stem>_data/` directory is used if present.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_dirs: Vec<PathBuf>,

    #[serde(default)]
    pub matching: MatchingConfig,
}

impl StubConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, anyhow::Error> {
        let contents = std::fs::read_to_string(path)?;
        let config: StubConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.contracts.is_empty() {
            anyhow::bail!("No contracts configured. Provide at least one contract file or directory");
        }

        if self.listen.port == 0 {
            anyhow::bail!("listen.port must be a fixed port for the stub, got 0");
        }

        if self.listen.host.trim().is_empty() {
            anyhow::bail!("listen.host must not be empty");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stub::UnmatchedMockPolicy;

    #[test]
    fn test_parse_config() {
        let yaml = r#"
listen:
  host: 0.0.0.0
  port: 8090
contracts:
  - contracts/orders.contract
  - contracts/payments
data_dirs:
  - mocks
matching:
  strict_keys: true
  unmatched_mocks: reject
"#;

        let config: StubConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.listen.host, "0.0.0.0");
        assert_eq!(config.listen.port, 8090);
        assert_eq!(config.contracts.len(), 2);
        assert_eq!(config.data_dirs, vec![PathBuf::from("mocks")]);
        assert!(config.matching.strict_keys);
        assert_eq!(config.matching.unmatched_mocks, UnmatchedMockPolicy::Reject);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let config: StubConfig = serde_yaml::from_str("contracts: [api.contract]").unwrap();
        assert_eq!(config.listen.host, "localhost");
        assert_eq!(config.listen.port, 9000);
        assert!(config.data_dirs.is_empty());
        assert!(!config.matching.strict_keys);
        assert_eq!(config.matching.unmatched_mocks, UnmatchedMockPolicy::Warn);
    }

    #[test]
    fn test_validate_requires_contracts() {
        let err = StubConfig::default().validate().unwrap_err();
        assert!(err.to_string().contains("No contracts configured"));
    }

    #[test]
    fn test_validate_rejects_port_zero() {
        let config: StubConfig =
            serde_yaml::from_str("contracts: [api.contract]\nlisten:\n  port: 0\n").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_policy_is_rejected() {
        let yaml = "contracts: [a.contract]\nmatching:\n  unmatched_mocks: ignore\n";
        assert!(serde_yaml::from_str::<StubConfig>(yaml).is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mimic.yaml");
        std::fs::write(&path, "contracts:\n  - api.contract\n").unwrap();
        let config = StubConfig::from_file(&path).unwrap();
        assert_eq!(config.contracts, vec![PathBuf::from("api.contract")]);

        std::fs::write(&path, "listen:\n  port: 9100\n").unwrap();
        assert!(StubConfig::from_file(&path).is_err());
    }
}
