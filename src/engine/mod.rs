//! # Engine Module
//!
//! Internal scene runtime implementation.
//!
//! This module contains the core building blocks:
//! - Type descriptors and the resource registry
//! - Identity pools for entities and viewports
//! - Per-kind resource storage
//! - Join planning and execution
//! - Jobs, scheduling and the scene tick
//!
//! Public API exposure is controlled by `lib.rs`.

pub mod types;
pub mod error;
pub mod type_info;
pub mod resource;
pub mod storage;
pub mod entity;
pub mod commands;
pub mod scratch;
pub mod query;
pub mod job;
pub mod scheduler;
pub mod config;
pub mod scene;
