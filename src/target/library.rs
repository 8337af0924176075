//! Entry-point resolution for compiled artifacts
//!
//! [`CallPlan`](crate::target::CallPlan) only needs one thing from a build:
//! symbol names mapped to entry addresses. [`EntryResolver`] is that seam;
//! [`SharedLibrary`] implements it over a dynamic library on disk. Tests
//! implement it over tables of local function pointers.

use std::path::Path;

use crate::diagnostics::{CoreError, Result};

/// Maps a mangled symbol name to a native entry address.
pub trait EntryResolver {
    fn resolve(&self, symbol: &str) -> Result<*const ()>;
}

/// A loaded dynamic library. Entries resolved from it stay valid for as
/// long as the library value lives, so the owning module must keep it
/// alongside any call plans built against it.
pub struct SharedLibrary {
    path: String,
    library: libloading::Library,
}

impl SharedLibrary {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let library = unsafe { libloading::Library::new(path) }.map_err(|e| {
            CoreError::LibraryLoad {
                path: path.display().to_string(),
                detail: e.to_string(),
            }
        })?;
        tracing::debug!(path = %path.display(), "loaded kernel library");
        Ok(Self {
            path: path.display().to_string(),
            library,
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl EntryResolver for SharedLibrary {
    fn resolve(&self, symbol: &str) -> Result<*const ()> {
        let sym: libloading::Symbol<'_, unsafe extern "C" fn()> =
            unsafe { self.library.get(symbol.as_bytes()) }.map_err(|e| {
                CoreError::MissingSymbol {
                    symbol: symbol.to_string(),
                    detail: e.to_string(),
                }
            })?;
        Ok(*sym as *const ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_library() {
        let Err(err) = SharedLibrary::open("/nonexistent/libkernels.so") else {
            panic!("expected a load error");
        };
        assert!(matches!(err, CoreError::LibraryLoad { .. }));
    }
}
