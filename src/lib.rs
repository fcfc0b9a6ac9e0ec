//! rsync-daemon: resolves a declarative backup configuration into an rsync plan.
//!
//! The pipeline is one-directional: a [`config::RawConfig`] is resolved by
//! [`resolver::ConfigResolver`] (path checks in [`validate`], volume lookup in
//! [`volume`]) into a [`resolver::ResolvedConfig`], which [`plan::build_plan`]
//! turns into transfer instructions for [`sync`].

pub mod config;
pub mod error;
pub mod mounts;
pub mod path_util;
pub mod permissions;
pub mod plan;
pub mod resolver;
pub mod sync;
pub mod validate;
pub mod volume;
