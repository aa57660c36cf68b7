//! CLI subcommands and their handlers.
//!
//! Handlers write results to `out` and diagnostics through `tracing`, so
//! stdout carries only translated text (or JSON with `--json`).

use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Subcommand;
use serde::Serialize;

use crate::app::AppController;
use crate::domain::language::LANGUAGE_TABLE;
use crate::domain::{InstallReport, InstalledPackage, LanguageCode, TranslationOutcome};

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Translate text offline
    Translate {
        /// Source language (name or code)
        #[arg(short, long)]
        from: String,

        /// Target language (name or code)
        #[arg(short, long)]
        to: String,

        /// Text to translate (read from stdin when neither TEXT nor --file is given)
        #[arg(conflicts_with = "file")]
        text: Option<String>,

        /// Read the text from a UTF-8 file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Capture speech from the microphone, optionally translating it
    Listen {
        /// Spoken language (name or code)
        #[arg(short, long)]
        from: String,

        /// Capture window in seconds (defaults to the configured value)
        #[arg(short, long)]
        seconds: Option<u64>,

        /// Translate the recognized text into this language
        #[arg(short, long)]
        to: Option<String>,
    },

    /// List selectable languages and what installed packages provide
    Languages,

    /// List installed translation packages
    Packages {
        /// Install package files added since startup first
        #[arg(long)]
        rescan: bool,
    },
}

/// One row of `languages` output.
#[derive(Debug, Serialize)]
pub struct LanguageRow {
    pub name: &'static str,
    pub code: &'static str,
    pub speech: bool,
    /// Targets reachable through a single installed package.
    pub package_targets: Vec<LanguageCode>,
}

/// Result of `listen`.
#[derive(Debug, Serialize)]
pub struct ListenResult {
    pub recognized: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translation: Option<TranslationOutcome>,
}

/// Result of `packages`.
#[derive(Debug, Serialize)]
pub struct PackagesResult {
    pub install_dir: PathBuf,
    pub packages: Vec<InstalledPackage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rescan: Option<InstallReport>,
}

/// Run a parsed subcommand.
pub fn run(
    controller: &AppController,
    command: Commands,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    match command {
        Commands::Translate {
            from,
            to,
            text,
            file,
        } => handle_translate(controller, &from, &to, text, file, json, out),
        Commands::Listen { from, seconds, to } => {
            handle_listen(controller, &from, seconds, to.as_deref(), json, out)
        }
        Commands::Languages => handle_languages(controller, json, out),
        Commands::Packages { rescan } => handle_packages(controller, rescan, json, out),
    }
}

/// Translate text given inline, from a file, or on stdin.
pub fn handle_translate(
    controller: &AppController,
    from: &str,
    to: &str,
    text: Option<String>,
    file: Option<PathBuf>,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text,
        (None, Some(path)) => fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        (None, None) => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let outcome = controller.translate(from, to, &text)?;
    print_outcome(&outcome, json, out)
}

/// Capture speech, print it, then translate it when `to` is given.
pub fn handle_listen(
    controller: &AppController,
    from: &str,
    seconds: Option<u64>,
    to: Option<&str>,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let recognized = controller.listen(from, seconds)?;
    if recognized.trim().is_empty() {
        bail!("Could not recognize any speech.");
    }

    let translation = match to {
        Some(to) => Some(controller.translate(from, to, &recognized)?),
        None => None,
    };

    if json {
        let result = ListenResult {
            recognized,
            translation,
        };
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(());
    }

    writeln!(out, "Recognized: {}", recognized)?;
    match translation {
        Some(outcome) => print_outcome(&outcome, false, out),
        None => Ok(()),
    }
}

pub fn handle_languages(
    controller: &AppController,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let rows = language_rows(controller);

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        return Ok(());
    }

    for row in rows {
        let targets: Vec<&str> = row.package_targets.iter().map(|c| c.as_str()).collect();
        writeln!(
            out,
            "{:<4} {:<12} speech:{:<3} packages:{}",
            row.code,
            row.name,
            if row.speech { "yes" } else { "no" },
            if targets.is_empty() {
                "-".to_string()
            } else {
                targets.join(",")
            }
        )?;
    }
    Ok(())
}

pub fn handle_packages(
    controller: &AppController,
    rescan: bool,
    json: bool,
    out: &mut impl Write,
) -> anyhow::Result<()> {
    let report = rescan.then(|| controller.rescan());
    let result = PackagesResult {
        install_dir: controller.package_install_dir(),
        packages: controller.packages(),
        rescan: report,
    };

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&result)?)?;
        return Ok(());
    }

    if let Some(report) = &result.rescan {
        for id in &report.installed {
            writeln!(out, "installed {}", id)?;
        }
        for (path, reason) in &report.skipped {
            writeln!(out, "skipped {} ({})", path.display(), reason)?;
        }
    }
    if result.packages.is_empty() {
        writeln!(out, "No packages installed in {}", result.install_dir.display())?;
    }
    for package in &result.packages {
        writeln!(
            out,
            "{} {}->{} v{} {}",
            package.id,
            package.from,
            package.to,
            package.version,
            package.path.display()
        )?;
    }
    Ok(())
}

fn language_rows(controller: &AppController) -> Vec<LanguageRow> {
    let installed = controller.installed_languages();
    LANGUAGE_TABLE
        .iter()
        .map(|&(name, code)| {
            let language = LanguageCode::new(code);
            LanguageRow {
                name,
                code,
                speech: language.speech_model().is_some(),
                package_targets: installed
                    .iter()
                    .find(|l| l.code == language)
                    .map(|l| l.translates_to.clone())
                    .unwrap_or_default(),
            }
        })
        .collect()
}

fn print_outcome(outcome: &TranslationOutcome, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(outcome)?)?;
    } else if outcome.is_success() {
        writeln!(out, "{}", outcome.user_message())?;
    }

    if !outcome.is_success() {
        bail!("{}", outcome.user_message());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{controller, write_model_dir, write_package, FakeLoader, PACKAGE_EXT};

    fn output(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_translate_prints_only_the_translation() {
        let dir = tempfile::tempdir().unwrap();
        write_model_dir(&dir.path().join("models/marian"), "en-hi", &[("Hello", "नमस्ते")]);
        let controller = controller(dir.path(), FakeLoader::new());

        let mut out = Vec::new();
        handle_translate(&controller, "en", "hi", Some("Hello".into()), None, false, &mut out)
            .unwrap();
        assert_eq!(output(out), "नमस्ते\n");
    }

    #[test]
    fn test_translate_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path(), "fr", "ko", PACKAGE_EXT, false, &[("Bonjour", "안녕하세요")]);
        let input = dir.path().join("input.txt");
        fs::write(&input, "Bonjour\n").unwrap();
        let controller = controller(dir.path(), FakeLoader::new());

        let mut out = Vec::new();
        handle_translate(&controller, "French", "Korean", None, Some(input), false, &mut out)
            .unwrap();
        assert_eq!(output(out), "안녕하세요\n");
    }

    #[test]
    fn test_failed_translation_is_an_error_with_user_message() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), FakeLoader::new());

        let mut out = Vec::new();
        let err = handle_translate(&controller, "eo", "tl", Some("Saluton".into()), None, false, &mut out)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Offline translation model not found. Please check your models."
        );
        assert!(out.is_empty());
    }

    #[test]
    fn test_failed_translation_json_still_reports_attempts() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), FakeLoader::new());

        let mut out = Vec::new();
        assert!(handle_translate(&controller, "eo", "tl", Some("Saluton".into()), None, true, &mut out).is_err());
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["Failed"]["attempts"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_languages_lists_table_with_package_targets() {
        let dir = tempfile::tempdir().unwrap();
        write_package(dir.path(), "fr", "ko", PACKAGE_EXT, false, &[]);
        let controller = controller(dir.path(), FakeLoader::new());

        let rows = language_rows(&controller);
        assert_eq!(rows.len(), LANGUAGE_TABLE.len());
        let french = rows.iter().find(|r| r.code == "fr").unwrap();
        assert_eq!(french.package_targets, vec![LanguageCode::new("ko")]);
        assert!(french.speech);
        let polish = rows.iter().find(|r| r.code == "pl").unwrap();
        assert!(!polish.speech);

        let mut out = Vec::new();
        handle_languages(&controller, false, &mut out).unwrap();
        assert!(output(out).lines().any(|l| l.starts_with("fr") && l.ends_with("packages:ko")));
    }

    #[test]
    fn test_packages_rescan_reports_new_install() {
        let dir = tempfile::tempdir().unwrap();
        let controller = controller(dir.path(), FakeLoader::new());
        write_package(dir.path(), "de", "en", PACKAGE_EXT, false, &[]);

        let mut out = Vec::new();
        handle_packages(&controller, true, false, &mut out).unwrap();
        let text = output(out);
        assert!(text.contains("installed translate-de_en-1_0"));
        assert!(text.contains("de->en"));
    }
}
