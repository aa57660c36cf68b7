//! Offline translation with a fixed-priority chain of local backends.
//!
//! A request is tried against neural Marian models first, then against
//! installed translation packages. Models are loaded lazily and cached per
//! language pair.

#![forbid(unsafe_code)]

pub mod adapters;
pub mod app;
pub mod commands;
pub mod domain;
pub mod infrastructure;
pub mod ports;

#[cfg(test)]
mod testing;

pub use app::{AppController, TranslationRouter};
pub use domain::{DomainError, FailureKind, LanguageCode, TranslationOutcome, TranslationRequest};
