//! Loading a native library and resolving its exports
//!
//! A [`LoadStrategy`] wraps one operating system's loader (`dlopen` or
//! `LoadLibrary`). [`LibraryHandle`] drives a strategy through the
//! Unopened -> Opened -> Closed lifecycle and applies the search-directory
//! fallback when a bare library name does not resolve.

use std::ffi::{CStr, CString};
use std::fmt;
use std::mem::size_of;
use std::os::raw::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::Arc;

use vkbind_sys::RawSymbol;

use crate::platform::PlatformKind;
use crate::{Error, Result};

#[cfg(unix)]
mod posix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use posix::PosixLoader;
#[cfg(windows)]
pub use windows::WindowsLoader;

/// Address of an export inside a loaded library.
///
/// Only meaningful while the library it came from stays loaded.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct SymbolAddress(NonNull<c_void>);

// An address is plain data; what it points at is governed by the library lifetime.
unsafe impl Send for SymbolAddress {}
unsafe impl Sync for SymbolAddress {}

impl SymbolAddress {
    /// Returns `None` for a null pointer.
    pub fn new(ptr: RawSymbol) -> Option<Self> {
        NonNull::new(ptr).map(SymbolAddress)
    }

    pub fn as_ptr(self) -> RawSymbol {
        self.0.as_ptr()
    }

    /// Reinterprets the address as a function pointer (or any other pointer-sized type).
    ///
    /// # Safety
    /// `F` must match the export's real signature, and the returned value must not
    /// be used after the originating library is unloaded.
    pub unsafe fn cast<F: Copy>(self) -> F {
        const { assert!(size_of::<F>() == size_of::<RawSymbol>()) };
        std::mem::transmute_copy::<NonNull<c_void>, F>(&self.0)
    }
}

impl fmt::Debug for SymbolAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SymbolAddress({:p})", self.0)
    }
}

/// One operating system's way of loading shared libraries.
pub trait LoadStrategy: Send + Sync {
    /// Short name used in log output.
    fn name(&self) -> &'static str;

    /// Whether a bare name that fails to load is retried in the search directory.
    fn retries_in_search_directory(&self) -> bool;

    /// Loads the library at `path`, or returns the loader's error message.
    fn load(&self, path: &Path) -> std::result::Result<Box<dyn NativeLibrary>, String>;
}

/// A library loaded by a [`LoadStrategy`].
pub trait NativeLibrary: Send + Sync {
    fn symbol(&self, name: &CStr) -> Option<SymbolAddress>;

    /// Unloads the library, returning the loader's error message on failure.
    fn unload(self: Box<Self>) -> std::result::Result<(), String>;
}

/// Picks the loading strategy for `kind`.
pub fn strategy_for(kind: PlatformKind) -> Result<Arc<dyn LoadStrategy>> {
    match kind {
        #[cfg(unix)]
        PlatformKind::Unix => Ok(Arc::new(PosixLoader)),
        #[cfg(windows)]
        PlatformKind::Windows => Ok(Arc::new(WindowsLoader)),
        _ => Err(Error::UnsupportedPlatform {
            family: std::env::consts::FAMILY,
        }),
    }
}

/// When to retry a bare library name in the search directory.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Defer to the strategy: POSIX retries, Windows does not.
    #[default]
    Default,
    Always,
    Never,
}

enum State {
    Unopened,
    Opened {
        name: String,
        path: PathBuf,
        library: Box<dyn NativeLibrary>,
    },
    Closed,
}

impl State {
    fn describe(&self) -> &'static str {
        match self {
            State::Unopened => "unopened",
            State::Opened { .. } => "opened",
            State::Closed => "closed",
        }
    }
}

/// Exclusive owner of one loaded native library.
pub struct LibraryHandle {
    strategy: Arc<dyn LoadStrategy>,
    search_directory: Option<PathBuf>,
    fallback: FallbackPolicy,
    state: State,
}

impl LibraryHandle {
    pub fn new(strategy: Arc<dyn LoadStrategy>) -> Self {
        Self {
            strategy,
            search_directory: None,
            fallback: FallbackPolicy::Default,
            state: State::Unopened,
        }
    }

    pub fn with_search_directory(mut self, directory: Option<PathBuf>) -> Self {
        self.search_directory = directory;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn is_open(&self) -> bool {
        matches!(self.state, State::Opened { .. })
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.state, State::Closed)
    }

    /// Path the library was actually loaded from.
    pub fn path(&self) -> Option<&Path> {
        match &self.state {
            State::Opened { path, .. } => Some(path),
            _ => None,
        }
    }

    /// Loads `name`, first through the system search path, then (if the policy
    /// allows and the name is relative) from the search directory.
    pub fn open(&mut self, name: &str) -> Result<()> {
        if !matches!(self.state, State::Unopened) {
            return Err(Error::InvalidState {
                operation: "open",
                state: self.state.describe(),
            });
        }
        if name.is_empty() {
            return Err(Error::LibraryNotFound {
                name: String::new(),
                attempts: Vec::new(),
                reason: "empty library name".into(),
            });
        }

        let bare = PathBuf::from(name);
        let mut attempts = vec![bare.clone()];
        log::debug!("{}: opening {}", self.strategy.name(), bare.display());
        let mut reason = match self.strategy.load(&bare) {
            Ok(library) => {
                self.opened(name, bare, library);
                return Ok(());
            }
            Err(reason) => reason,
        };

        if let Some(candidate) = self.fallback_candidate(&bare) {
            log::debug!(
                "{}: {} not on the search path, retrying {}",
                self.strategy.name(),
                name,
                candidate.display()
            );
            attempts.push(candidate.clone());
            match self.strategy.load(&candidate) {
                Ok(library) => {
                    self.opened(name, candidate, library);
                    return Ok(());
                }
                Err(retry_reason) => reason = retry_reason,
            }
        }

        Err(Error::LibraryNotFound {
            name: name.to_string(),
            attempts,
            reason,
        })
    }

    fn fallback_candidate(&self, bare: &Path) -> Option<PathBuf> {
        let enabled = match self.fallback {
            FallbackPolicy::Default => self.strategy.retries_in_search_directory(),
            FallbackPolicy::Always => true,
            FallbackPolicy::Never => false,
        };
        if !enabled || bare.is_absolute() {
            return None;
        }
        self.search_directory.as_ref().map(|dir| dir.join(bare))
    }

    fn opened(&mut self, name: &str, path: PathBuf, library: Box<dyn NativeLibrary>) {
        log::info!("loaded native library {} from {}", name, path.display());
        self.state = State::Opened {
            name: name.to_string(),
            path,
            library,
        };
    }

    /// Looks up an export. Only valid while the handle is open.
    pub fn resolve(&self, symbol: &str) -> Result<SymbolAddress> {
        let State::Opened { name, library, .. } = &self.state else {
            return Err(Error::InvalidState {
                operation: "resolve",
                state: self.state.describe(),
            });
        };
        let c_symbol = CString::new(symbol).map_err(|_| Error::InvalidName(symbol.to_string()))?;
        match library.symbol(&c_symbol) {
            Some(address) => {
                log::trace!("resolved {symbol} at {:p}", address.as_ptr());
                Ok(address)
            }
            None => Err(Error::SymbolNotFound {
                symbol: symbol.to_string(),
                library: name.clone(),
            }),
        }
    }

    /// Unloads the library. Idempotent; unload failures are logged and ignored.
    pub fn close(&mut self) {
        if let State::Opened { name, library, .. } = std::mem::replace(&mut self.state, State::Closed) {
            match library.unload() {
                Ok(()) => log::debug!("unloaded native library {name}"),
                Err(err) => log::warn!("failed to unload native library {name}: {err}"),
            }
        }
    }

    /// Consumes the handle without unloading the library.
    pub(crate) fn keep_resident(mut self) {
        if let State::Opened { name, library, .. } = std::mem::replace(&mut self.state, State::Closed) {
            log::debug!("leaving native library {name} resident");
            std::mem::forget(library);
        }
    }
}

impl Drop for LibraryHandle {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("strategy", &self.strategy.name())
            .field("state", &self.state.describe())
            .field("path", &self.path())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{stub_address, StubLoader};

    fn handle(loader: &Arc<StubLoader>, search_directory: &str) -> LibraryHandle {
        LibraryHandle::new(loader.clone()).with_search_directory(Some(search_directory.into()))
    }

    #[test]
    fn open_resolves_on_the_system_search_path() {
        let loader = Arc::new(StubLoader::new().with_library("libfoo.so", [("foo", stub_address(1))]));
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        assert!(lib.is_open());
        assert_eq!(lib.path(), Some(Path::new("libfoo.so")));
        assert_eq!(lib.resolve("foo").unwrap(), stub_address(1));
        assert_eq!(loader.attempts(), vec![PathBuf::from("libfoo.so")]);
    }

    #[test]
    fn missing_symbol_is_an_error_not_a_null() {
        let loader = Arc::new(StubLoader::new().with_library("libfoo.so", [("foo", stub_address(1))]));
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        match lib.resolve("bogusSymbol") {
            Err(Error::SymbolNotFound { symbol, library }) => {
                assert_eq!(symbol, "bogusSymbol");
                assert_eq!(library, "libfoo.so");
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(lib.resolve("fo\0o"), Err(Error::InvalidName(_))));
    }

    #[test]
    fn falls_back_to_the_search_directory_once() {
        let loader = Arc::new(
            StubLoader::new().with_library("/opt/app/libfoo.so", [("foo", stub_address(1))]),
        );
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        assert_eq!(lib.path(), Some(Path::new("/opt/app/libfoo.so")));
        assert_eq!(loader.load_count(), 2);
    }

    #[test]
    fn reports_every_attempt_when_not_found() {
        let loader = Arc::new(StubLoader::new());
        let mut lib = handle(&loader, "/opt/app");
        match lib.open("libmissing.so") {
            Err(Error::LibraryNotFound { name, attempts, .. }) => {
                assert_eq!(name, "libmissing.so");
                assert_eq!(
                    attempts,
                    vec![
                        PathBuf::from("libmissing.so"),
                        PathBuf::from("/opt/app/libmissing.so")
                    ]
                );
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(!lib.is_open());
    }

    #[test]
    fn absolute_names_are_not_retried() {
        let loader = Arc::new(StubLoader::new());
        let mut lib = handle(&loader, "/opt/app");
        let absolute = if cfg!(windows) { r"C:\lib\libfoo.so" } else { "/usr/lib/libfoo.so" };
        assert!(matches!(lib.open(absolute), Err(Error::LibraryNotFound { .. })));
        assert_eq!(loader.load_count(), 1);
    }

    #[test]
    fn windows_like_strategy_does_not_retry_by_default() {
        let loader = Arc::new(
            StubLoader::windows_like().with_library("/opt/app/foo.dll", [("foo", stub_address(1))]),
        );
        let mut lib = handle(&loader, "/opt/app");
        assert!(matches!(lib.open("foo.dll"), Err(Error::LibraryNotFound { .. })));
        assert_eq!(loader.load_count(), 1);

        let mut forced = handle(&loader, "/opt/app").with_fallback(FallbackPolicy::Always);
        forced.open("foo.dll").unwrap();
    }

    #[test]
    fn never_policy_disables_the_retry() {
        let loader = Arc::new(
            StubLoader::new().with_library("/opt/app/libfoo.so", [("foo", stub_address(1))]),
        );
        let mut lib = handle(&loader, "/opt/app").with_fallback(FallbackPolicy::Never);
        assert!(lib.open("libfoo.so").is_err());
        assert_eq!(loader.load_count(), 1);
    }

    #[test]
    fn resolve_outside_the_opened_state_is_invalid() {
        let loader = Arc::new(StubLoader::new().with_library("libfoo.so", [("foo", stub_address(1))]));
        let mut lib = handle(&loader, "/opt/app");
        assert!(matches!(
            lib.resolve("foo"),
            Err(Error::InvalidState { operation: "resolve", state: "unopened" })
        ));

        lib.open("libfoo.so").unwrap();
        lib.close();
        assert!(lib.is_closed());
        assert!(matches!(
            lib.resolve("foo"),
            Err(Error::InvalidState { operation: "resolve", state: "closed" })
        ));
    }

    #[test]
    fn open_is_single_use() {
        let loader = Arc::new(StubLoader::new().with_library("libfoo.so", [("foo", stub_address(1))]));
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        assert!(matches!(lib.open("libfoo.so"), Err(Error::InvalidState { operation: "open", .. })));
        lib.close();
        assert!(matches!(lib.open("libfoo.so"), Err(Error::InvalidState { operation: "open", .. })));
        assert_eq!(loader.load_count(), 1);
    }

    #[test]
    fn close_is_idempotent_and_swallows_unload_failures() {
        let loader = Arc::new(
            StubLoader::new()
                .with_library("libfoo.so", [("foo", stub_address(1))])
                .failing_unload(),
        );
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        lib.close();
        lib.close();
        drop(lib);
        assert_eq!(loader.failed_unload_count(), 1);
        assert_eq!(loader.unload_count(), 0);

        let mut never_opened = handle(&loader, "/opt/app");
        never_opened.close();
        never_opened.close();
        assert!(never_opened.is_closed());
    }

    #[test]
    fn drop_unloads_an_open_library() {
        let loader = Arc::new(StubLoader::new().with_library("libfoo.so", [("foo", stub_address(1))]));
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        drop(lib);
        assert_eq!(loader.unload_count(), 1);
    }

    #[test]
    fn keep_resident_skips_the_unload() {
        let loader = Arc::new(StubLoader::new().with_library("libfoo.so", [("foo", stub_address(1))]));
        let mut lib = handle(&loader, "/opt/app");
        lib.open("libfoo.so").unwrap();
        lib.keep_resident();
        assert_eq!(loader.unload_count(), 0);
    }

    #[test]
    fn symbol_address_casts_to_a_function_pointer() {
        extern "C" fn answer() -> i32 {
            42
        }
        let address = SymbolAddress::new(answer as RawSymbol).unwrap();
        let f: extern "C" fn() -> i32 = unsafe { address.cast() };
        assert_eq!(f(), 42);
        assert!(SymbolAddress::new(std::ptr::null_mut()).is_none());
    }
}
