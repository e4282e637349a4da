/*
 * Copyright (c) 2026 Mohamad Al-Zawahreh (dba Sovereign Systems).
 *
 * This file is part of the Ark Sovereign Compiler.
 *
 * LICENSE: DUAL-LICENSED (AGPLv3 or COMMERCIAL).
 *
 * 1. OPEN SOURCE: You may use this file under the terms of the GNU Affero
 * General Public License v3.0. If you link to this code, your ENTIRE
 * application must be open-sourced under AGPLv3.
 *
 * 2. COMMERCIAL: For proprietary use, you must obtain a Commercial License
 * from Sovereign Systems.
 *
 * PATENT NOTICE: Protected by US Patent App #63/935,467.
 * NO IMPLIED LICENSE to rights of Mohamad Al-Zawahreh or Sovereign Systems.
 */

//! Native toolchain bridge: C source in, callable entry point out.

use crate::codegen::ENTRY_SYMBOL;
use crate::config::ToolchainConfig;
use crate::error::{AsmError, Result};
use crate::ffi::{EntryFn, EntryPoint};
use crate::types::NativeType;
use libloading::Library;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::ffi::c_void;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use tracing::{debug, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Compiles synthesized source and binds its entry point.
pub trait NativeBridge {
    fn compile(&self, source: &str) -> Result<Artifact>;

    /// Open the artifact and resolve the entry point. The returned entry
    /// point owns the artifact.
    fn load(&self, artifact: Artifact, signature: &[NativeType]) -> Result<Box<dyn EntryPoint>>;
}

/// A built shared object and the directory that holds it. Dropping the
/// artifact removes the directory.
#[derive(Debug)]
pub struct Artifact {
    path: PathBuf,
    source_path: Option<PathBuf>,
    _workdir: Option<TempDir>,
}

impl Artifact {
    /// An artifact not managed by this crate (nothing is deleted on drop).
    pub fn external(path: impl Into<PathBuf>) -> Artifact {
        Artifact {
            path: path.into(),
            source_path: None,
            _workdir: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The generated `.c` file, when it was kept.
    pub fn source_path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// Entry point resolved from a loaded library. Field order makes the library
/// close before its directory is removed.
struct LoadedEntry {
    func: EntryFn,
    _library: Library,
    _artifact: Artifact,
}

impl EntryPoint for LoadedEntry {
    unsafe fn invoke(&self, args: *mut *mut c_void) {
        (self.func)(args)
    }
}

/// Artifact file name: hash of the source and a random nonce, so two
/// compiles of identical source never share a file.
pub fn artifact_name(source: &str) -> String {
    let nonce: u64 = rand::thread_rng().gen();
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher.update(nonce.to_le_bytes());
    let digest = hex::encode(hasher.finalize());
    format!("xasm_{}.so", &digest[..16])
}

/// Drives an external GCC-compatible compiler.
#[derive(Debug, Clone, Default)]
pub struct ToolchainBridge {
    config: ToolchainConfig,
}

impl ToolchainBridge {
    pub fn new(config: ToolchainConfig) -> Self {
        ToolchainBridge { config }
    }

    pub fn from_env() -> Result<Self> {
        Ok(ToolchainBridge::new(ToolchainConfig::from_env()?))
    }

    pub fn config(&self) -> &ToolchainConfig {
        &self.config
    }

    fn workdir(&self) -> Result<TempDir> {
        let builder = {
            let mut b = tempfile::Builder::new();
            b.prefix("xasm-");
            b
        };
        Ok(match &self.config.build_dir {
            Some(dir) => {
                fs::create_dir_all(dir)?;
                builder.tempdir_in(dir)?
            }
            None => builder.tempdir()?,
        })
    }

    /// Run the compiler, killing it once the timeout elapses. Returns the
    /// exit code, or `None` when the process did not exit normally.
    fn run(&self, args: &[String], log_path: &Path) -> Result<Option<i32>> {
        let log = File::create(log_path)?;
        let mut child = Command::new(&self.config.compiler)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::from(log))
            .spawn()
            .map_err(|e| AsmError::Compilation {
                status: None,
                message: format!("Can not run '{}': {}", self.config.compiler, e),
            })?;

        let deadline = Instant::now() + self.config.timeout();
        loop {
            if let Some(status) = child.try_wait()? {
                return Ok(status.code());
            }
            if Instant::now() >= deadline {
                warn!(
                    compiler = %self.config.compiler,
                    timeout_secs = self.config.timeout_secs,
                    "compiler timed out, killing it"
                );
                let _ = child.kill();
                let _ = child.wait();
                return Err(AsmError::Compilation {
                    status: None,
                    message: format!(
                        "'{}' did not finish within {}s",
                        self.config.compiler, self.config.timeout_secs
                    ),
                });
            }
            thread::sleep(POLL_INTERVAL);
        }
    }
}

impl NativeBridge for ToolchainBridge {
    fn compile(&self, source: &str) -> Result<Artifact> {
        let workdir = self.workdir()?;
        let name = artifact_name(source);
        let artifact_path = workdir.path().join(&name);
        let source_path = artifact_path.with_extension("c");
        let log_path = artifact_path.with_extension("log");
        fs::write(&source_path, source)?;

        let args = self.config.command_args(&source_path, &artifact_path);
        debug!(compiler = %self.config.compiler, ?args, "compiling");
        let status = self.run(&args, &log_path)?;
        let diagnostics = fs::read_to_string(&log_path).unwrap_or_default();

        if status != Some(0) || !artifact_path.exists() {
            warn!(?status, %diagnostics, "compilation failed");
            let message = if diagnostics.trim().is_empty() {
                format!("'{}' produced no artifact", self.config.compiler)
            } else {
                diagnostics.trim().to_string()
            };
            return Err(AsmError::Compilation { status, message });
        }
        if !diagnostics.trim().is_empty() {
            debug!(%diagnostics, "compiler diagnostics");
        }

        let kept_source = if self.config.keep_source {
            Some(source_path)
        } else {
            fs::remove_file(&source_path)?;
            None
        };
        info!(artifact = %artifact_path.display(), "compiled");

        Ok(Artifact {
            path: artifact_path,
            source_path: kept_source,
            _workdir: Some(workdir),
        })
    }

    fn load(&self, artifact: Artifact, signature: &[NativeType]) -> Result<Box<dyn EntryPoint>> {
        // SAFETY: the library was just built from synthesized source with no
        // initialisers; loading runs no foreign code beyond the loader itself.
        let library = unsafe { Library::new(artifact.path())? };
        // SAFETY: the entry shim is emitted with exactly this signature.
        let func: EntryFn = unsafe { *library.get::<EntryFn>(ENTRY_SYMBOL.as_bytes())? };
        debug!(
            artifact = %artifact.path().display(),
            params = signature.len(),
            "entry point loaded"
        );
        Ok(Box::new(LoadedEntry {
            func,
            _library: library,
            _artifact: artifact,
        }))
    }
}
