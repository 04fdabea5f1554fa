//! Typed, scriptable control of ephemeral containers.
//!
//! `harbor` drives an installed container runtime CLI (`docker`, `podman`, or
//! anything argument-compatible) and exposes its verbs as typed operations
//! over immutable [`model::Image`] and [`model::Container`] values. It is
//! intended for test harnesses and automation that need to start a service,
//! wait until it is ready, use it, and reliably tear it down.
//!
//! # Architecture
//!
//! Every operation builds an argument list and hands it to a
//! [`process::ProcessRunner`]. The real runner spawns the runtime binary under
//! a per-call timeout; tests substitute a scripted runner. Runtime output is
//! decoded by [`decode`] into domain values, and failures are classified into
//! the error kinds of [`error`].
//!
//! # Modules
//!
//! - [`config`]: Layered configuration (overrides > env > file > defaults)
//! - [`decode`]: Parsing of runtime output into records and identifiers
//! - [`engine`]: The runtime verbs and their typed options
//! - [`error`]: Semantic error types
//! - [`lifecycle`]: Scoped containers that always stop and remove
//! - [`model`]: Image, container, and status values
//! - [`process`]: The process-execution boundary
//! - [`wait`]: Readiness polling with deadlines and cancellation

pub mod config;
pub mod decode;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod model;
pub mod process;
pub mod wait;
