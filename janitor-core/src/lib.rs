//! Core of the media janitor.
//!
//! Pulls the file lists of Radarr and Sonarr instances into a
//! [`catalog::CatalogCache`], validates each file with ffprobe/ffmpeg
//! through the [`validation::Validator`], and lets the
//! [`orchestration::Janitor`] decide whether a bad file is flagged or
//! deleted and searched for again. Progress lives in a JSON
//! [`state::StateStore`] so restarts pick up where they left off.

#![allow(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod notify;
pub mod orchestration;
pub mod reports;
pub mod sources;
pub mod state;
pub mod validation;
pub mod watch;

pub use error::{JanitorError, Result};
