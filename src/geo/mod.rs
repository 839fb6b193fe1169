//! Network origin subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (headers, socket address)
//!     → client_ip.rs (pick the client address)
//!     → classifier.rs (dev → blocked → allow-list → unknown)
//!         → cidr.rs (range containment)
//!     → Classification handed to the gateway pipeline
//! ```

pub mod cidr;
pub mod classifier;
pub mod client_ip;

pub use cidr::{Cidr, CidrError};
pub use classifier::{Classification, ClientClassifier, GeoClassifier};
pub use client_ip::{extract_client_ip, FALLBACK_IP};
