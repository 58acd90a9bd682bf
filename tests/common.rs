//! Test utilities for helm-cel integration tests

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Result type alias for tests
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error>>;

/// Extract Ok value or panic with context
#[macro_export]
macro_rules! assert_ok {
    ($expr:expr) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("assertion failed: expected Ok, got Err({:?})", e),
        }
    };
    ($expr:expr, $msg:literal) => {
        match $expr {
            Ok(v) => v,
            Err(e) => panic!("{}: {:?}", $msg, e),
        }
    };
}

/// A throwaway chart directory
pub struct Chart {
    dir: TempDir,
}

impl Chart {
    pub fn new() -> Self {
        Chart {
            dir: TempDir::new().expect("failed to create chart directory"),
        }
    }

    /// Writes `values.yaml`
    pub fn values(self, content: &str) -> Self {
        self.file("values.yaml", content)
    }

    /// Writes `values.cel.yaml`
    pub fn rules(self, content: &str) -> Self {
        self.file("values.cel.yaml", content)
    }

    /// Writes any file relative to the chart directory
    pub fn file(self, name: &str, content: &str) -> Self {
        fs::write(self.dir.path().join(name), content).expect("failed to write chart file");
        self
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn join(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.join(name)).expect("failed to read chart file")
    }
}
