use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use alloy::json_abi::JsonAbi;
use async_trait::async_trait;
use dashmap::DashMap;
use semver::Version;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::process::Command;

pub type BuildResult<T> = Result<T, BuildError>;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("Compiler unavailable: {0}")]
    CompilerUnavailable(String),

    #[error("Compilation failed: {0}")]
    CompilationError(String),
}

/// compiled artifact for the registry contract. immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompiledContract {
    pub abi: JsonAbi,
    /// creation bytecode, hex without the 0x prefix (solc convention)
    pub bytecode: String,
}

impl CompiledContract {
    pub fn bytecode_bytes(&self) -> BuildResult<Vec<u8>> {
        hex::decode(self.bytecode.trim_start_matches("0x"))
            .map_err(|e| BuildError::CompilationError(format!("bad bytecode hex: {e}")))
    }
}

/// seam to the external solidity toolchain. installation must be idempotent;
/// the build cache guarantees at most one install attempt per process per
/// version under normal operation.
#[async_trait]
pub trait SolcToolchain: Send + Sync {
    async fn ensure_installed(&self, version: &Version) -> BuildResult<()>;

    async fn compile(&self, source: &Path, version: &Version) -> BuildResult<CompiledContract>;
}

/// production toolchain: svm-managed solc binaries driven through
/// `--combined-json abi,bin`
pub struct SvmToolchain;

#[async_trait]
impl SolcToolchain for SvmToolchain {
    async fn ensure_installed(&self, version: &Version) -> BuildResult<()> {
        let binary = svm::version_binary(&version.to_string());
        if binary.exists() {
            return Ok(());
        }

        log::info!("installing solc {version}");
        svm::install(version)
            .await
            .map(|_| ())
            .map_err(|e| BuildError::CompilerUnavailable(e.to_string()))
    }

    async fn compile(&self, source: &Path, version: &Version) -> BuildResult<CompiledContract> {
        let binary = svm::version_binary(&version.to_string());

        let output = Command::new(binary)
            .arg("--combined-json")
            .arg("abi,bin")
            .arg(source)
            .output()
            .await
            .map_err(|e| BuildError::CompilerUnavailable(format!("failed to run solc: {e}")))?;

        if !output.status.success() {
            return Err(BuildError::CompilationError(
                String::from_utf8_lossy(&output.stderr).into_owned(),
            ));
        }

        parse_combined_json(&output.stdout)
    }
}

#[derive(Deserialize)]
struct CombinedJson {
    contracts: BTreeMap<String, CombinedContract>,
}

#[derive(Deserialize)]
struct CombinedContract {
    abi: serde_json::Value,
    bin: String,
}

fn parse_combined_json(raw: &[u8]) -> BuildResult<CompiledContract> {
    let parsed: CombinedJson = serde_json::from_slice(raw)
        .map_err(|e| BuildError::CompilationError(format!("unreadable solc output: {e}")))?;

    // the registry source defines a single contract
    let (_, contract) = parsed
        .contracts
        .into_iter()
        .next()
        .ok_or_else(|| BuildError::CompilationError("solc produced no contracts".to_string()))?;

    // pre-0.8.10 solc emitted the abi as an embedded json string
    let abi_value = match contract.abi {
        serde_json::Value::String(inner) => serde_json::from_str(&inner)
            .map_err(|e| BuildError::CompilationError(format!("unreadable abi: {e}")))?,
        value => value,
    };
    let abi: JsonAbi = serde_json::from_value(abi_value)
        .map_err(|e| BuildError::CompilationError(format!("unreadable abi: {e}")))?;

    Ok(CompiledContract {
        abi,
        bytecode: contract.bin,
    })
}

/// compiles the fixed registry source and memoizes the artifact per
/// compiler version. compiler installation happens lazily on the first
/// compile, never at process load.
pub struct ContractBuildCache {
    source: PathBuf,
    toolchain: Box<dyn SolcToolchain>,
    artifacts: DashMap<Version, CompiledContract>,
    installed: DashMap<Version, ()>,
}

impl ContractBuildCache {
    pub fn new(source: impl Into<PathBuf>, toolchain: Box<dyn SolcToolchain>) -> Self {
        Self {
            source: source.into(),
            toolchain,
            artifacts: DashMap::new(),
            installed: DashMap::new(),
        }
    }

    pub fn with_svm(source: impl Into<PathBuf>) -> Self {
        Self::new(source, Box::new(SvmToolchain))
    }

    pub async fn compile(&self, version: &Version) -> BuildResult<CompiledContract> {
        if let Some(hit) = self.artifacts.get(version) {
            return Ok(hit.clone());
        }

        if !self.installed.contains_key(version) {
            self.toolchain.ensure_installed(version).await?;
            self.installed.insert(version.clone(), ());
        }

        let artifact = self.toolchain.compile(&self.source, version).await?;
        self.artifacts.insert(version.clone(), artifact.clone());

        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use super::*;

    const COMBINED_JSON: &str = r#"{
        "contracts": {
            "contracts/UserDataRegistry.sol:UserDataRegistry": {
                "abi": [
                    {
                        "inputs": [{"internalType": "address", "name": "user", "type": "address"}],
                        "name": "getUserData",
                        "outputs": [
                            {"internalType": "string", "name": "imageReference", "type": "string"},
                            {"internalType": "uint256", "name": "updatedAt", "type": "uint256"},
                            {"internalType": "bool", "name": "exists", "type": "bool"}
                        ],
                        "stateMutability": "view",
                        "type": "function"
                    }
                ],
                "bin": "60806040deadbeef"
            }
        },
        "version": "0.8.15+commit.e14f2714"
    }"#;

    #[derive(Default)]
    struct MockToolchain {
        installs: Arc<AtomicUsize>,
        compiles: Arc<AtomicUsize>,
        fail_compile: bool,
    }

    #[async_trait]
    impl SolcToolchain for MockToolchain {
        async fn ensure_installed(&self, _version: &Version) -> BuildResult<()> {
            self.installs.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn compile(&self, _source: &Path, _version: &Version) -> BuildResult<CompiledContract> {
            self.compiles.fetch_add(1, Ordering::SeqCst);
            if self.fail_compile {
                return Err(BuildError::CompilationError("boom".to_string()));
            }
            parse_combined_json(COMBINED_JSON.as_bytes())
        }
    }

    fn version() -> Version {
        Version::parse("0.8.15").unwrap()
    }

    #[test]
    fn parses_combined_json_output() {
        let artifact = parse_combined_json(COMBINED_JSON.as_bytes()).unwrap();

        assert_eq!(artifact.bytecode, "60806040deadbeef");
        assert!(artifact.abi.function("getUserData").is_some());
        assert_eq!(
            artifact.bytecode_bytes().unwrap(),
            hex::decode("60806040deadbeef").unwrap()
        );
    }

    #[test]
    fn parses_legacy_string_abi() {
        let legacy = r#"{
            "contracts": {
                "UserDataRegistry.sol:UserDataRegistry": {
                    "abi": "[{\"inputs\": [], \"name\": \"owner\", \"outputs\": [{\"internalType\": \"address\", \"name\": \"\", \"type\": \"address\"}], \"stateMutability\": \"view\", \"type\": \"function\"}]",
                    "bin": "6080"
                }
            }
        }"#;

        let artifact = parse_combined_json(legacy.as_bytes()).unwrap();
        assert!(artifact.abi.function("owner").is_some());
    }

    #[test]
    fn empty_output_is_a_compilation_error() {
        let result = parse_combined_json(br#"{"contracts": {}}"#);
        assert!(matches!(result, Err(BuildError::CompilationError(_))));
    }

    #[tokio::test]
    async fn compiles_once_per_version() {
        let compiles = Arc::new(AtomicUsize::new(0));
        let installs = Arc::new(AtomicUsize::new(0));
        let cache = ContractBuildCache::new(
            "UserDataRegistry.sol",
            Box::new(MockToolchain {
                installs: installs.clone(),
                compiles: compiles.clone(),
                fail_compile: false,
            }),
        );

        for _ in 0..3 {
            cache.compile(&version()).await.unwrap();
        }

        assert_eq!(compiles.load(Ordering::SeqCst), 1);
        assert_eq!(installs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_compiles_are_not_cached() {
        let compiles = Arc::new(AtomicUsize::new(0));
        let cache = ContractBuildCache::new(
            "UserDataRegistry.sol",
            Box::new(MockToolchain {
                installs: Arc::new(AtomicUsize::new(0)),
                compiles: compiles.clone(),
                fail_compile: true,
            }),
        );

        for _ in 0..2 {
            let result = cache.compile(&version()).await;
            assert!(matches!(result, Err(BuildError::CompilationError(_))));
        }

        // every attempt reaches the toolchain again
        assert_eq!(compiles.load(Ordering::SeqCst), 2);
    }
}
