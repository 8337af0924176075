//! Olivine: typed kernel staging and the native call boundary
//!
//! Olivine is the host side of a kernel-compiler embedding: a family of
//! fixed-width numeric types whose arithmetic stages into typed IR, and the
//! marshalling machinery that carries host values into compiled artifacts
//! and results back out.
//!
//! # Architecture
//!
//! ```text
//! Staging:  host literals → typed values (types) → typed IR (ir)
//! Calling:  host values ⇄ ABI trees (abi) → planned native calls (target)
//! ```
//!
//! # Example
//!
//! ```
//! use olivine::target::{KernelModule, Signature, TargetConfig};
//! use olivine::types::{IntType, KernelType, Sign};
//!
//! let i64_ty = KernelType::Int(IntType::new(64, Sign::Signed));
//! let mut module = KernelModule::new("demo", TargetConfig::default());
//! module.declare("scale", Signature::new().param("x", i64_ty).returns(i64_ty));
//! assert!(!module.is_compiled());
//! ```

pub mod abi;
pub mod diagnostics;
pub mod ir;
pub mod target;
pub mod types;

// Re-export diagnostics for convenience
pub use diagnostics::{CoreError, Result};

// Re-exports for convenience
pub use abi::{TypeTree, ValueTree};
pub use target::{KernelModule, Signature, TargetConfig};
pub use types::{HostValue, KernelType};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
