//! # emulation-compose
//!
//! Service-assembly engine turning an emulated robot fleet definition into
//! a docker-compose document.
//!
//! Handles:
//! - **Input**: Loading and validating the fleet definition.
//! - **Source**: Resolving source references into build arguments.
//! - **Mount**: Per-service bind mounts and build-cache volumes.
//! - **Image**: Image selection per hardware kind.
//! - **Builder**: One service builder per service kind.
//! - **Assembler**: Companion injection, uniqueness and dependency checks.
//! - **Compose**: Rendering the assembled fleet.

pub mod assembler;
pub mod builder;
pub mod compose;
pub mod graph;
pub mod image;
pub mod input;
pub mod mount;
pub mod service;
pub mod source;

pub use assembler::{FleetAssembly, assemble};
pub use compose::to_compose_yaml;
pub use input::load_system_configuration;
