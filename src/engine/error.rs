//! Error types for registry construction, configuration and query planning.
//!
//! The scene runtime distinguishes two tiers of failure:
//!
//! * **Contract violations** (treating a storage as the wrong kind, writing an
//!   unsupported output kind, handing a value of the wrong type to a storage)
//!   indicate a misconfigured program and panic at the point of detection.
//! * **Reportable failures** are modelled here. They are produced before any
//!   state is touched, so callers can surface them without worrying about
//!   partially applied work.
//!
//! Each low-level error models a single failure mode and converts into the
//! aggregate [`SceneError`] through `From`, so orchestration code can bubble
//! failures with `?`.
//!
//! ## Example
//! ```ignore
//! match scene.iterate(&[position, velocity], &[position], |_, _| true) {
//!     Ok(true) => { /* every match committed */ }
//!     Ok(false) => { /* callback aborted */ }
//!     Err(SceneError::Query(QueryError::MultipleEventInputs { first, second })) => {
//!         log::error!("events {first} and {second} cannot be joined");
//!     }
//!     Err(e) => log::error!("{e}"),
//! }
//! ```

use thiserror::Error;

use crate::engine::types::{ResourceID, ResourceKind};


/// Returned by the registry builder.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A resource with this name is already registered.
    #[error("resource name `{name}` is already registered as resource {existing}")]
    DuplicateName {
        /// Offending name.
        name: &'static str,
        /// Id of the resource that owns the name.
        existing: ResourceID,
    },

    /// The registry is full.
    #[error("resource limit reached (capacity {capacity})")]
    CapacityExceeded {
        /// Configured capacity.
        capacity: usize,
    },
}

/// Returned when a job's resource lists cannot be joined.
///
/// All variants are detected while classifying the lists, before the first
/// callback invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueryError {
    /// The id is not present in the scene's registry.
    #[error("resource {0} is not registered")]
    UnknownResource(ResourceID),

    /// The resource kind cannot be used as a job input.
    #[error("resource {resource} ({kind}) cannot be used as a job input")]
    InvalidInput {
        /// Offending resource.
        resource: ResourceID,
        /// Its kind.
        kind: ResourceKind,
    },

    /// Only one event resource may drive an iteration.
    #[error("only one event input is supported (got {first} and {second})")]
    MultipleEventInputs {
        /// First event input.
        first: ResourceID,
        /// Second event input.
        second: ResourceID,
    },
}

/// Returned when a [`SceneConfig`](crate::engine::config::SceneConfig) cannot be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse scene config: {0}")]
    Parse(#[from] toml::de::Error),

    /// `game_time_scale` must be finite and strictly positive.
    #[error("game_time_scale must be finite and > 0 (got {0})")]
    InvalidTimeScale(f32),
}

/// Aggregate error for scene construction and iteration.
#[derive(Debug, Error)]
pub enum SceneError {
    /// Registry construction failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A query could not be planned.
    #[error(transparent)]
    Query(#[from] QueryError),

    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A registered job declares resources that cannot be joined.
    #[error("job `{job}` has an invalid declaration: {source}")]
    InvalidJob {
        /// Job name.
        job: &'static str,
        /// Planning failure.
        source: QueryError,
    },
}

/// Result alias used throughout the crate.
pub type SceneResult<T> = Result<T, SceneError>;
