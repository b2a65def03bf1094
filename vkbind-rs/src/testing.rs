//! In-memory loader for exercising the binding without real shared libraries

use std::collections::HashMap;
use std::ffi::CStr;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::library::{LoadStrategy, NativeLibrary, SymbolAddress};

/// A fake, non-null address for tables whose entries are never called.
pub fn stub_address(n: usize) -> SymbolAddress {
    SymbolAddress::new((0x1000 + n * 0x10) as *mut _).expect("non-null stub address")
}

/// Serves fake libraries registered at exact paths.
///
/// Behaves like the POSIX loader unless built with [`StubLoader::windows_like`].
#[derive(Default)]
pub struct StubLoader {
    libraries: HashMap<PathBuf, HashMap<String, SymbolAddress>>,
    windows_like: bool,
    load_delay: Option<Duration>,
    stats: Arc<Stats>,
}

#[derive(Default)]
struct Stats {
    fail_unload: bool,
    attempts: Mutex<Vec<PathBuf>>,
    loads: AtomicUsize,
    unloads: AtomicUsize,
    failed_unloads: AtomicUsize,
}

impl StubLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn windows_like() -> Self {
        Self {
            windows_like: true,
            ..Self::default()
        }
    }

    pub fn with_library<'a>(
        mut self,
        path: impl Into<PathBuf>,
        symbols: impl IntoIterator<Item = (&'a str, SymbolAddress)>,
    ) -> Self {
        let symbols = symbols
            .into_iter()
            .map(|(name, address)| (name.to_string(), address))
            .collect();
        self.libraries.insert(path.into(), symbols);
        self
    }

    /// Every unload reports an error.
    pub fn failing_unload(mut self) -> Self {
        self.stats = Arc::new(Stats {
            fail_unload: true,
            ..Stats::default()
        });
        self
    }

    /// Sleeps inside each load, widening race windows.
    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay = Some(delay);
        self
    }

    /// Paths passed to `load`, in order, including failed ones.
    pub fn attempts(&self) -> Vec<PathBuf> {
        self.stats.attempts.lock().clone()
    }

    pub fn load_count(&self) -> usize {
        self.stats.loads.load(Ordering::SeqCst)
    }

    pub fn unload_count(&self) -> usize {
        self.stats.unloads.load(Ordering::SeqCst)
    }

    pub fn failed_unload_count(&self) -> usize {
        self.stats.failed_unloads.load(Ordering::SeqCst)
    }
}

impl LoadStrategy for StubLoader {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn retries_in_search_directory(&self) -> bool {
        !self.windows_like
    }

    fn load(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        self.stats.loads.fetch_add(1, Ordering::SeqCst);
        self.stats.attempts.lock().push(path.to_path_buf());
        if let Some(delay) = self.load_delay {
            std::thread::sleep(delay);
        }
        match self.libraries.get(path) {
            Some(symbols) => Ok(Box::new(StubLibrary {
                stats: self.stats.clone(),
                symbols: symbols.clone(),
            })),
            None => Err(format!("{}: cannot open shared object file", path.display())),
        }
    }
}

struct StubLibrary {
    stats: Arc<Stats>,
    symbols: HashMap<String, SymbolAddress>,
}

impl NativeLibrary for StubLibrary {
    fn symbol(&self, name: &CStr) -> Option<SymbolAddress> {
        let name = name.to_str().ok()?;
        self.symbols.get(name).copied()
    }

    fn unload(self: Box<Self>) -> Result<(), String> {
        if self.stats.fail_unload {
            self.stats.failed_unloads.fetch_add(1, Ordering::SeqCst);
            Err("stub unload failure".into())
        } else {
            self.stats.unloads.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }
}
