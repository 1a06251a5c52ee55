//! Loading contracts and mock files from disk.
//!
//! Contracts are `*.contract` files holding Gherkin text. Mocks are `*.json`
//! documents, read from explicitly configured directories or, by default,
//! from the `<stem>_data/` directory beside each contract.

use crate::config::StubConfig;
use crate::feature::Feature;
use crate::stub::{Contract, ContractStub, Mock, MockSource, RegistrationError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const CONTRACT_EXTENSION: &str = "contract";
pub const MOCK_EXTENSION: &str = "json";
pub const DATA_DIR_SUFFIX: &str = "_data";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("data directory {0} does not exist")]
    MissingDataDir(PathBuf),
    #[error("no loadable contracts among {0} configured")]
    NoContracts(usize),
    #[error(transparent)]
    Rejected(#[from] RegistrationError),
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> LoadError + '_ {
    move |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Files in `dir` with the given extension, sorted by name.
fn files_with_extension(dir: &Path, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let path = entry.map_err(io_error(dir))?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == extension) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Expand directories to the contract files they contain.
pub fn contract_paths(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, LoadError> {
    let mut paths = Vec::new();
    for input in inputs {
        if input.is_dir() {
            paths.extend(files_with_extension(input, CONTRACT_EXTENSION)?);
        } else {
            paths.push(input.clone());
        }
    }
    Ok(paths)
}

pub fn load_contract(path: &Path, strict_keys: bool) -> Result<Feature, anyhow::Error> {
    let text = fs::read_to_string(path).map_err(io_error(path))?;
    let feature = Feature::from_gherkin(&text)?.with_strict_keys(strict_keys);
    Ok(feature)
}

/// `<dir>/<stem>_data` for `<dir>/<stem>.contract`.
pub fn sibling_data_dir(contract: &Path) -> Option<PathBuf> {
    let stem = contract.file_stem()?.to_string_lossy();
    Some(contract.with_file_name(format!("{stem}{DATA_DIR_SUFFIX}")))
}

/// Read every mock document in `dir`.
///
/// A file that cannot be parsed is reported and skipped; an unreadable
/// directory fails the load.
pub fn load_mocks(dir: &Path) -> Result<Vec<MockSource>, LoadError> {
    let mut mocks = Vec::new();
    for path in files_with_extension(dir, MOCK_EXTENSION)? {
        let text = fs::read_to_string(&path).map_err(io_error(&path))?;
        match Mock::parse(&text) {
            Ok(mock) => mocks.push(MockSource::new(path.display().to_string(), mock)),
            Err(e) => warn!(mock = %path.display(), "Skipping mock: {}", e),
        }
    }
    debug!("Read {} mock(s) from {}", mocks.len(), dir.display());
    Ok(mocks)
}

/// Build a stub from configuration.
///
/// Contracts that fail to compile are logged and skipped so the others
/// still load.
pub fn load_stub(config: &StubConfig) -> Result<ContractStub, LoadError> {
    let paths = contract_paths(&config.contracts)?;

    let mut contracts = Vec::with_capacity(paths.len());
    for path in &paths {
        match load_contract(path, config.matching.strict_keys) {
            Ok(feature) => {
                info!(
                    contract = %path.display(),
                    "Loaded contract with {} scenario(s)",
                    feature.scenarios.len()
                );
                contracts.push((path.clone(), feature));
            }
            Err(e) => error!(contract = %path.display(), "Skipping contract: {:#}", e),
        }
    }
    if contracts.is_empty() {
        return Err(LoadError::NoContracts(paths.len()));
    }

    let mut mocks = Vec::new();
    if config.data_dirs.is_empty() {
        for (path, _) in &contracts {
            match sibling_data_dir(path) {
                Some(dir) if dir.is_dir() => mocks.extend(load_mocks(&dir)?),
                _ => debug!(contract = %path.display(), "No data directory"),
            }
        }
    } else {
        for dir in &config.data_dirs {
            if !dir.is_dir() {
                return Err(LoadError::MissingDataDir(dir.clone()));
            }
            mocks.extend(load_mocks(dir)?);
        }
    }

    let contracts = contracts
        .into_iter()
        .map(|(path, feature)| Contract::new(path.display().to_string(), feature))
        .collect();
    Ok(ContractStub::new(
        contracts,
        mocks,
        config.matching.unmatched_mocks,
    )?)
}
