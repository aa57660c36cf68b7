use std::fs::{self, File};
use std::io::Read;
use std::path::{Component, Path, PathBuf};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use zip::ZipArchive;

use crate::domain::{
    DomainError, InstallReport, InstalledLanguage, InstalledPackage, LanguageCode,
    PackageMetadata,
};

const METADATA_FILE: &str = "metadata.json";
const WEIGHTS_FILE: &str = "model.safetensors";
/// Weights file of CTranslate2 models, which cannot be loaded here.
const CT2_WEIGHTS_FILES: &[&str] = &["model.bin", "model/model.bin"];
const STAGING_PREFIX: &str = ".staging-";

/// Registry of installed translation packages.
///
/// Packages are zip archives carrying a `metadata.json` and a Marian model
/// in safetensors form, either at the archive root or under one top-level
/// directory. Installing one extracts it into `<install_dir>/<package-id>/`. The registry
/// only ever grows: packages are added at startup and on rescans, never
/// removed while the process runs.
pub struct PackageRegistry {
    source_dir: PathBuf,
    install_dir: PathBuf,
    extension: String,
    packages: RwLock<Vec<InstalledPackage>>,
}

impl PackageRegistry {
    pub fn new(source_dir: PathBuf, install_dir: PathBuf, extension: &str) -> Self {
        Self {
            source_dir,
            install_dir,
            extension: extension.trim_start_matches('.').to_string(),
            packages: RwLock::new(Vec::new()),
        }
    }

    /// Register previously extracted packages, then install every package
    /// file found in the source directory.
    ///
    /// A package that fails to install is logged and skipped; it never
    /// prevents the others from installing.
    pub fn initialize(&self) -> Result<InstallReport, DomainError> {
        fs::create_dir_all(&self.install_dir)?;

        let mut report = self.register_extracted();
        let discovered = self.install_discovered();
        report.installed.extend(discovered.installed);
        report.skipped.extend(discovered.skipped);

        info!(
            source_dir = ?self.source_dir,
            install_dir = ?self.install_dir,
            packages = self.packages.read().len(),
            skipped = report.skipped.len(),
            "PackageRegistry initialized"
        );

        Ok(report)
    }

    /// Install package files that appeared since the last scan.
    pub fn rescan(&self) -> InstallReport {
        let report = self.install_discovered();
        if !report.installed.is_empty() {
            info!(installed = ?report.installed, "New packages installed");
        }
        report
    }

    fn register_extracted(&self) -> InstallReport {
        let mut report = InstallReport::default();

        for dir in sorted_entries(&self.install_dir) {
            let hidden = dir
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with('.'));
            if !dir.is_dir() || hidden {
                continue;
            }

            match read_metadata_file(&dir.join(METADATA_FILE)) {
                Ok(metadata) => {
                    let package = InstalledPackage::new(&metadata, dir.clone());
                    let mut packages = self.packages.write();
                    if !packages.iter().any(|p| p.translates(&package.from, &package.to)) {
                        debug!(package = %package.id, "Found installed package");
                        report.installed.push(package.id.clone());
                        packages.push(package);
                    }
                }
                Err(e) => {
                    warn!(dir = ?dir, error = %e, "Ignoring unreadable installed package");
                    report.skipped.push((dir, e.to_string()));
                }
            }
        }

        report
    }

    fn install_discovered(&self) -> InstallReport {
        let mut report = InstallReport::default();

        for path in sorted_entries(&self.source_dir) {
            let matches_extension = path
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e == self.extension);
            if !path.is_file() || !matches_extension {
                continue;
            }

            match self.install_from_path(&path) {
                Ok(Some(package)) => report.installed.push(package.id),
                Ok(None) => {}
                Err(e) => {
                    warn!(path = ?path, error = %e, "Package install failed");
                    report.skipped.push((path, e.to_string()));
                }
            }
        }

        report
    }

    /// Install one package file.
    ///
    /// Returns `Ok(None)` when a package for the same language pair is
    /// already installed.
    pub fn install_from_path(&self, path: &Path) -> Result<Option<InstalledPackage>, DomainError> {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let metadata_entry = find_metadata_entry(&archive).ok_or_else(|| {
            DomainError::Package(format!("{} has no {}", path.display(), METADATA_FILE))
        })?;

        let metadata = {
            let mut entry = archive.by_name(&metadata_entry)?;
            let mut content = String::new();
            entry.read_to_string(&mut content)?;
            parse_metadata(&content)?
        };

        // Held across extraction so concurrent installs of one pair cannot race.
        let mut packages = self.packages.write();
        let from = LanguageCode::new(metadata.from_code.clone());
        let to = LanguageCode::new(metadata.to_code.clone());
        if packages.iter().any(|p| p.translates(&from, &to)) {
            debug!(path = ?path, from = %from, to = %to, "Package already installed");
            return Ok(None);
        }

        let prefix = metadata_entry
            .rsplit_once('/')
            .map(|(prefix, _)| format!("{}/", prefix))
            .unwrap_or_default();
        reject_ctranslate2(&archive, &prefix)?;

        let id = metadata.package_id();
        let staging = child_dir(&self.install_dir, &format!("{}{}", STAGING_PREFIX, id))?;
        let target = child_dir(&self.install_dir, &id)?;
        remove_dir_if_exists(&staging)?;
        remove_dir_if_exists(&target)?;

        let extracted = archive.extract(&staging).map_err(DomainError::from).and_then(|_| {
            let root = match prefix.strip_suffix('/') {
                Some(prefix) => staging.join(prefix),
                None => staging.clone(),
            };
            fs::rename(&root, &target).map_err(DomainError::from)
        });
        let _ = remove_dir_if_exists(&staging);
        extracted?;

        let package = InstalledPackage::new(&metadata, target);
        info!(package = %package.id, path = ?path, "Package installed");
        packages.push(package.clone());
        Ok(Some(package))
    }

    /// Snapshot of installed packages in registration order.
    pub fn packages(&self) -> Vec<InstalledPackage> {
        self.packages.read().clone()
    }

    /// Languages exposed by installed packages, in first-seen order.
    pub fn installed_languages(&self) -> Vec<InstalledLanguage> {
        let packages = self.packages.read();
        let mut languages: Vec<InstalledLanguage> = Vec::new();

        for package in packages.iter() {
            for code in [&package.from, &package.to] {
                if !languages.iter().any(|l| &l.code == code) {
                    languages.push(InstalledLanguage {
                        code: code.clone(),
                        name: code.display_name().unwrap_or(code.as_str()).to_string(),
                        translates_to: Vec::new(),
                    });
                }
            }
            if let Some(language) = languages.iter_mut().find(|l| l.code == package.from) {
                language.translates_to.push(package.to.clone());
            }
        }

        languages
    }

    /// Installed language entry with an exact code match.
    pub fn language(&self, code: &LanguageCode) -> Option<InstalledLanguage> {
        self.installed_languages().into_iter().find(|l| &l.code == code)
    }

    /// Packages to apply, in order, to translate `from` into `to`.
    ///
    /// A direct package wins; otherwise one intermediate language is tried.
    pub fn translation_path(
        &self,
        from: &LanguageCode,
        to: &LanguageCode,
    ) -> Result<Vec<InstalledPackage>, DomainError> {
        let packages = self.packages.read();
        let installed = |code: &LanguageCode| {
            packages.iter().any(|p| &p.from == code || &p.to == code)
        };

        if !installed(from) {
            return Err(DomainError::LanguageNotInstalled(from.to_string()));
        }
        if !installed(to) {
            return Err(DomainError::LanguageNotInstalled(to.to_string()));
        }

        if let Some(direct) = packages.iter().find(|p| p.translates(from, to)) {
            return Ok(vec![direct.clone()]);
        }

        for first in packages.iter().filter(|p| &p.from == from) {
            if let Some(second) = packages.iter().find(|p| p.translates(&first.to, to)) {
                debug!(from = %from, via = %first.to, to = %to, "Using pivot translation");
                return Ok(vec![first.clone(), second.clone()]);
            }
        }

        Err(DomainError::NoTranslationPath {
            from: from.to_string(),
            to: to.to_string(),
        })
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }
}

fn sorted_entries(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(e) => {
            debug!(dir = ?dir, error = %e, "Cannot list directory");
            Vec::new()
        }
    };
    entries.sort();
    entries
}

/// `metadata.json` at the archive root or one directory deep.
fn find_metadata_entry<R: Read + std::io::Seek>(archive: &ZipArchive<R>) -> Option<String> {
    let suffix = format!("/{}", METADATA_FILE);
    archive
        .file_names()
        .filter(|name| {
            *name == METADATA_FILE
                || name
                    .strip_suffix(suffix.as_str())
                    .is_some_and(|prefix| !prefix.contains('/') && is_single_component(prefix))
        })
        .min_by_key(|name| name.len())
        .map(str::to_string)
}

fn read_metadata_file(path: &Path) -> Result<PackageMetadata, DomainError> {
    parse_metadata(&fs::read_to_string(path)?)
}

fn parse_metadata(content: &str) -> Result<PackageMetadata, DomainError> {
    let metadata: PackageMetadata = serde_json::from_str(content)?;
    metadata.validate()?;
    Ok(metadata)
}

fn is_single_component(name: &str) -> bool {
    let mut components = Path::new(name).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// `parent/name`, refusing any `name` that would leave `parent`.
fn child_dir(parent: &Path, name: &str) -> Result<PathBuf, DomainError> {
    if !is_single_component(name) {
        return Err(DomainError::Package(format!(
            "'{}' is not a valid package directory name",
            name
        )));
    }
    Ok(parent.join(name))
}

/// Fail early on packages whose payload is a CTranslate2 model.
fn reject_ctranslate2<R: Read + std::io::Seek>(
    archive: &ZipArchive<R>,
    prefix: &str,
) -> Result<(), DomainError> {
    let has = |file: &str| archive.file_names().any(|name| name == format!("{}{}", prefix, file));
    if !has(WEIGHTS_FILE) && CT2_WEIGHTS_FILES.iter().any(|file| has(file)) {
        return Err(DomainError::Package(format!(
            "package carries a CTranslate2 model; expected {}",
            WEIGHTS_FILE
        )));
    }
    Ok(())
}

fn remove_dir_if_exists(dir: &Path) -> Result<(), DomainError> {
    if dir.exists() {
        fs::remove_dir_all(dir)?;
    }
    Ok(())
}
