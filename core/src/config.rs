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

use crate::error::{AsmError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

pub const ENV_COMPILER: &str = "XASM_CC";
pub const ENV_CFLAGS: &str = "XASM_CFLAGS";
pub const ENV_TARGET_WIDTH: &str = "XASM_TARGET_WIDTH";
pub const ENV_BUILD_DIR: &str = "XASM_BUILD_DIR";
pub const ENV_KEEP_SOURCE: &str = "XASM_KEEP_SOURCE";
pub const ENV_TIMEOUT_SECS: &str = "XASM_TIMEOUT_SECS";

/// Word size of the generated artifact. It has to match the host process,
/// otherwise the artifact can not be loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetWidth {
    #[serde(rename = "32")]
    W32,
    #[serde(rename = "64")]
    W64,
}

impl TargetWidth {
    pub fn host() -> TargetWidth {
        if cfg!(target_pointer_width = "32") {
            TargetWidth::W32
        } else {
            TargetWidth::W64
        }
    }

    pub fn flag(&self) -> &'static str {
        match self {
            TargetWidth::W32 => "-m32",
            TargetWidth::W64 => "-m64",
        }
    }
}

impl Default for TargetWidth {
    fn default() -> Self {
        TargetWidth::host()
    }
}

impl FromStr for TargetWidth {
    type Err = AsmError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "32" => Ok(TargetWidth::W32),
            "64" => Ok(TargetWidth::W64),
            other => Err(AsmError::Config(format!(
                "Invalid target width '{}' (expected 32 or 64)",
                other
            ))),
        }
    }
}

/// How the native toolchain is invoked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolchainConfig {
    /// GCC-compatible driver (`gcc`, `clang`, a cross compiler...).
    pub compiler: String,
    /// Appended after the fixed flags.
    pub extra_flags: Vec<String>,
    pub target_width: TargetWidth,
    /// Parent directory for per-compile build directories. System temp dir
    /// when unset.
    pub build_dir: Option<PathBuf>,
    /// Keep the generated `.c` file next to the artifact.
    pub keep_source: bool,
    pub timeout_secs: u64,
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        ToolchainConfig {
            compiler: "gcc".to_string(),
            extra_flags: Vec::new(),
            target_width: TargetWidth::host(),
            build_dir: None,
            keep_source: false,
            timeout_secs: 60,
        }
    }
}

impl ToolchainConfig {
    /// Defaults overridden by `XASM_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ToolchainConfig::default();

        if let Some(cc) = lookup(ENV_COMPILER) {
            if !cc.trim().is_empty() {
                config.compiler = cc.trim().to_string();
            }
        }
        if let Some(flags) = lookup(ENV_CFLAGS) {
            config.extra_flags = shell_words::split(&flags).map_err(|e| {
                AsmError::Config(format!("Can not split {}='{}': {}", ENV_CFLAGS, flags, e))
            })?;
        }
        if let Some(width) = lookup(ENV_TARGET_WIDTH) {
            config.target_width = width.parse()?;
        }
        if let Some(dir) = lookup(ENV_BUILD_DIR) {
            if !dir.is_empty() {
                config.build_dir = Some(PathBuf::from(dir));
            }
        }
        if let Some(keep) = lookup(ENV_KEEP_SOURCE) {
            config.keep_source = matches!(keep.trim(), "1" | "true" | "yes");
        }
        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            config.timeout_secs = secs.trim().parse().map_err(|e| {
                AsmError::Config(format!("Invalid {}='{}': {}", ENV_TIMEOUT_SECS, secs, e))
            })?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: ToolchainConfig = serde_json::from_str(text)
            .map_err(|e| AsmError::Config(format!("Invalid toolchain config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.compiler.trim().is_empty() {
            return Err(AsmError::Config("Compiler must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(AsmError::Config("Timeout must be at least one second".to_string()));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Full argument list: position independent shared object, fixed width,
    /// Intel operand syntax, extra flags, output and input paths.
    pub fn command_args(&self, source: &Path, artifact: &Path) -> Vec<String> {
        let mut args = vec![
            "-fPIC".to_string(),
            "-shared".to_string(),
            self.target_width.flag().to_string(),
            "-masm=intel".to_string(),
        ];
        args.extend(self.extra_flags.iter().cloned());
        args.push("-o".to_string());
        args.push(artifact.display().to_string());
        args.push(source.display().to_string());
        args
    }
}
