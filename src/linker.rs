//! Native link step.
//!
//! Generated blocks are plain `int NAME(void)` functions. The linker writes
//! a tiny C `main` that calls the chosen entry block and hands it, together
//! with the object files, to a C compiler driver.

use crate::error::LinkError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Command;

pub const DEFAULT_LINKER: &str = "clang";
pub const DEFAULT_ENTRY: &str = "entrance";
pub const WRAPPER_FILE: &str = "main_wrapper.c";

#[derive(Debug, Clone)]
pub struct Linker {
    tool: String,
    entry: String,
}

impl Linker {
    pub fn new(tool: impl Into<String>, entry: impl Into<String>) -> Self {
        Self {
            tool: tool.into(),
            entry: entry.into(),
        }
    }

    pub fn tool(&self) -> &str {
        &self.tool
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// C source of the `main` wrapper
    pub fn wrapper_source(&self) -> String {
        format!(
            "extern int {entry}(void);\nint main(void) {{ return {entry}(); }}\n",
            entry = self.entry
        )
    }

    /// The entry must be a C identifier other than `main`.
    pub fn validate_entry(&self) -> Result<(), LinkError> {
        let invalid = |reason: &str| LinkError::InvalidEntry {
            name: self.entry.clone(),
            reason: reason.to_string(),
        };
        let mut chars = self.entry.chars();
        match chars.next() {
            None => return Err(invalid("entry name is empty")),
            Some(c) if !(c.is_ascii_alphabetic() || c == '_') => {
                return Err(invalid("entry name must start with a letter or `_`"))
            }
            _ => {}
        }
        if !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(invalid("entry name is not a C identifier"));
        }
        if self.entry == "main" {
            return Err(invalid("`main` is provided by the wrapper"));
        }
        Ok(())
    }

    /// Write the wrapper into `scratch` and return its path.
    pub fn write_wrapper(&self, scratch: &Path) -> Result<PathBuf, LinkError> {
        let path = scratch.join(WRAPPER_FILE);
        fs::write(&path, self.wrapper_source()).map_err(|e| LinkError::Scratch {
            path: path.clone(),
            message: e.to_string(),
        })?;
        Ok(path)
    }

    /// Link `objects` and the wrapper into `output`.
    pub fn link(&self, objects: &[PathBuf], output: &Path, scratch: &Path) -> Result<(), LinkError> {
        self.validate_entry()?;
        let wrapper = self.write_wrapper(scratch)?;

        let mut cmd = Command::new(&self.tool);
        cmd.args(objects).arg(&wrapper).arg("-o").arg(output);
        log::debug!("running {:?}", cmd);

        let result = cmd.output().map_err(|e| LinkError::ToolUnavailable {
            tool: self.tool.clone(),
            message: match e.kind() {
                io::ErrorKind::NotFound => "not found in PATH".to_string(),
                _ => e.to_string(),
            },
        })?;

        let stderr = String::from_utf8_lossy(&result.stderr).into_owned();
        if !result.status.success() {
            return Err(LinkError::ToolFailed {
                tool: self.tool.clone(),
                status: result.status.to_string(),
                stderr,
            });
        }
        if !stderr.trim().is_empty() {
            log::debug!("{}: {}", self.tool, stderr.trim());
        }
        Ok(())
    }
}

impl Default for Linker {
    fn default() -> Self {
        Self::new(DEFAULT_LINKER, DEFAULT_ENTRY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_wrapper_calls_entry() {
        let linker = Linker::new("cc", "entrance");
        assert_eq!(
            linker.wrapper_source(),
            "extern int entrance(void);\nint main(void) { return entrance(); }\n"
        );
    }

    #[test]
    fn test_entry_validation() {
        assert!(Linker::new("cc", "entrance").validate_entry().is_ok());
        assert!(Linker::new("cc", "_start2").validate_entry().is_ok());
        for bad in ["", "main", "2fast", "a-b"] {
            assert!(
                matches!(
                    Linker::new("cc", bad).validate_entry(),
                    Err(LinkError::InvalidEntry { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_unwritable_scratch_is_not_blamed_on_the_tool() {
        let scratch = TempDir::new().unwrap();
        let missing = scratch.path().join("gone");
        let err = Linker::default()
            .link(&[], &scratch.path().join("out"), &missing)
            .unwrap_err();
        match err {
            LinkError::Scratch { path, .. } => assert_eq!(path, missing.join(WRAPPER_FILE)),
            other => panic!("expected Scratch, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_tool_is_unavailable() {
        let scratch = TempDir::new().unwrap();
        let linker = Linker::new("octa-no-such-linker", "entrance");
        let err = linker
            .link(&[], &scratch.path().join("out"), scratch.path())
            .unwrap_err();
        assert!(matches!(err, LinkError::ToolUnavailable { ref tool, .. } if tool == "octa-no-such-linker"));
        assert!(scratch.path().join(WRAPPER_FILE).exists());
    }
}
