//! Resource registry subsystem.
//!
//! # Data Flow
//! ```text
//! Registry Compilation (at startup / reload):
//!     RegistryConfig + SensitivityConfig
//!     → duplicate check
//!     → exact index + namespace roots
//!     → Freeze as immutable ResourceRegistry
//!
//! Lookup:
//!     name → exact entry | longest namespace prefix | NotFound
//! ```

pub mod resolver;

pub use resolver::{NotFound, RegistryError, ResourceDescriptor, ResourceRegistry};
