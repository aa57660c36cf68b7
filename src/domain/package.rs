use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, LanguageCode};

/// Contents of a package's `metadata.json`.
///
/// Only the fields needed for registration are read; the rest are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    pub from_code: String,
    pub to_code: String,
    #[serde(default)]
    pub from_name: Option<String>,
    #[serde(default)]
    pub to_name: Option<String>,
    #[serde(default = "default_package_version")]
    pub package_version: String,
}

fn default_package_version() -> String {
    "1.0".to_string()
}

impl PackageMetadata {
    /// Check that the fields can form a package id.
    ///
    /// Codes are limited to `[A-Za-z0-9_-]` and versions to `[A-Za-z0-9._-]`,
    /// so the id is always a single directory name.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.from_code.is_empty() || self.to_code.is_empty() {
            return Err(DomainError::Package("metadata is missing a language code".to_string()));
        }
        for code in [&self.from_code, &self.to_code] {
            if !code.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-') {
                return Err(DomainError::Package(format!("invalid language code '{}'", code)));
            }
        }
        let version_ok = !self.package_version.is_empty()
            && self
                .package_version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'));
        if !version_ok {
            return Err(DomainError::Package(format!(
                "invalid package version '{}'",
                self.package_version
            )));
        }
        if self.from_code == self.to_code {
            return Err(DomainError::Package(format!(
                "package translates {} into itself",
                self.from_code
            )));
        }
        Ok(())
    }

    /// Directory-safe identifier, e.g. `translate-en_de-1_0`.
    pub fn package_id(&self) -> String {
        format!(
            "translate-{}_{}-{}",
            self.from_code,
            self.to_code,
            self.package_version.replace('.', "_")
        )
    }
}

/// A package extracted into the install directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledPackage {
    pub id: String,
    pub from: LanguageCode,
    pub to: LanguageCode,
    pub version: String,
    /// Root of the extracted package (contains `metadata.json`).
    pub path: PathBuf,
}

impl InstalledPackage {
    pub fn new(metadata: &PackageMetadata, path: PathBuf) -> Self {
        Self {
            id: metadata.package_id(),
            from: LanguageCode::new(metadata.from_code.clone()),
            to: LanguageCode::new(metadata.to_code.clone()),
            version: metadata.package_version.clone(),
            path,
        }
    }

    pub fn translates(&self, from: &LanguageCode, to: &LanguageCode) -> bool {
        &self.from == from && &self.to == to
    }
}

/// A language exposed by at least one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledLanguage {
    pub code: LanguageCode,
    pub name: String,
    /// Languages reachable with a single package.
    pub translates_to: Vec<LanguageCode>,
}

/// Outcome of an install pass over package files.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstallReport {
    /// Package ids newly registered by this pass.
    pub installed: Vec<String>,
    /// Files that could not be installed, with the reason.
    pub skipped: Vec<(PathBuf, String)>,
}
