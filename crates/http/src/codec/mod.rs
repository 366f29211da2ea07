//! Wire formats of the two remote dialects.
//!
//! Both dialects share the nested shapes for data items, dependencies,
//! executables and platforms with the canonical model; they differ in how the
//! record is framed and in the repository and launch-mode keys.

pub mod envelope;
pub mod rest;

use provstore_core::{LaunchMode, ParameterSet, Repository};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected document shape: {0}")]
    Shape(String),
}

impl CodecError {
    pub(crate) fn shape(message: impl Into<String>) -> Self {
        CodecError::Shape(message.into())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct WireRepository {
    #[serde(rename = "type")]
    pub kind: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
}

impl From<&Repository> for WireRepository {
    fn from(repo: &Repository) -> Self {
        WireRepository {
            kind: repo.kind.clone(),
            url: repo.url.clone(),
            upstream: repo.upstream.clone(),
        }
    }
}

impl From<WireRepository> for Repository {
    fn from(repo: WireRepository) -> Self {
        Repository {
            kind: repo.kind,
            url: repo.url,
            upstream: repo.upstream,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub(crate) struct WireLaunchMode {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub parameters: ParameterSet,
}

impl From<&LaunchMode> for WireLaunchMode {
    fn from(mode: &LaunchMode) -> Self {
        WireLaunchMode {
            kind: mode.kind.clone(),
            parameters: mode.parameters.clone(),
        }
    }
}

impl From<WireLaunchMode> for LaunchMode {
    fn from(mode: WireLaunchMode) -> Self {
        LaunchMode {
            kind: mode.kind,
            parameters: mode.parameters,
        }
    }
}
