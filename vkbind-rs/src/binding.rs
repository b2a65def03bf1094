//! Process-wide binding to the native loader library

use std::path::PathBuf;
use std::sync::{Arc, LazyLock};

use parking_lot::RwLock;

use crate::entry::Entry;
use crate::library::{strategy_for, FallbackPolicy, LibraryHandle, LoadStrategy, SymbolAddress};
use crate::platform::{self, PlatformKind};
use crate::table::{build, FunctionTable, Resolve};
use crate::{Error, Result};

/// Where and how a [`Binding`] looks for its library.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindingConfig {
    /// `None` selects the platform's well-known name.
    pub library_name: Option<String>,
    pub search_directory: Option<PathBuf>,
    pub fallback: FallbackPolicy,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            library_name: None,
            search_directory: platform::default_search_directory().map(PathBuf::from),
            fallback: FallbackPolicy::Default,
        }
    }
}

impl BindingConfig {
    pub fn with_library_name(mut self, name: impl Into<String>) -> Self {
        self.library_name = Some(name.into());
        self
    }

    pub fn with_search_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.search_directory = Some(directory.into());
        self
    }

    pub fn without_search_directory(mut self) -> Self {
        self.search_directory = None;
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// The configured name, or the well-known name for `kind`.
    pub fn resolved_library_name(&self, kind: PlatformKind) -> Result<String> {
        match (&self.library_name, kind.default_library_name()) {
            (Some(name), _) => Ok(name.clone()),
            (None, Some(name)) => Ok(name.to_string()),
            (None, None) => Err(Error::UnsupportedPlatform {
                family: std::env::consts::FAMILY,
            }),
        }
    }
}

struct Loaded {
    handle: LibraryHandle,
    entry: Option<Arc<Entry>>,
}

/// Loads the native library once and hands out its entry points.
///
/// The library stays loaded until [`Binding::shutdown`]; dropping a `Binding`
/// leaves it resident, so function pointers obtained from it stay callable.
pub struct Binding {
    config: BindingConfig,
    strategy: Option<Arc<dyn LoadStrategy>>,
    state: RwLock<Option<Loaded>>,
}

impl Binding {
    /// A binding that uses the host platform's loader.
    pub fn new(config: BindingConfig) -> Self {
        Self {
            config,
            strategy: None,
            state: RwLock::new(None),
        }
    }

    /// A binding that uses `strategy` instead of the host platform's loader.
    pub fn with_strategy(config: BindingConfig, strategy: Arc<dyn LoadStrategy>) -> Self {
        Self {
            config,
            strategy: Some(strategy),
            state: RwLock::new(None),
        }
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().is_some()
    }

    /// Path the library was loaded from, once initialized.
    pub fn library_path(&self) -> Option<PathBuf> {
        self.state
            .read()
            .as_ref()
            .and_then(|loaded| loaded.handle.path().map(PathBuf::from))
    }

    /// Loads the library. Calling it again once loaded does nothing; concurrent
    /// first calls load it exactly once.
    pub fn initialize(&self) -> Result<()> {
        if self.state.read().is_some() {
            return Ok(());
        }
        let mut state = self.state.write();
        if state.is_some() {
            return Ok(());
        }

        let kind = platform::detect();
        let strategy = match &self.strategy {
            Some(strategy) => strategy.clone(),
            None => strategy_for(kind)?,
        };
        let name = self.config.resolved_library_name(kind)?;
        let mut handle = LibraryHandle::new(strategy)
            .with_search_directory(self.config.search_directory.clone())
            .with_fallback(self.config.fallback);
        handle.open(&name)?;

        *state = Some(Loaded {
            handle,
            entry: None,
        });
        Ok(())
    }

    /// Looks up an export of the loaded library.
    pub fn get_proc_address(&self, name: &str) -> Result<SymbolAddress> {
        match self.state.read().as_ref() {
            Some(loaded) => loaded.handle.resolve(name),
            None => Err(Error::NotInitialized),
        }
    }

    /// Resolves a typed table against the loaded library.
    pub fn load_table<T: FunctionTable>(&self) -> Result<T> {
        if !self.is_initialized() {
            return Err(Error::NotInitialized);
        }
        build(self)
    }

    /// The global commands, initializing the binding on first use.
    pub fn entry(&self) -> Result<Arc<Entry>> {
        self.initialize()?;
        if let Some(entry) = self.state.read().as_ref().and_then(|loaded| loaded.entry.clone()) {
            return Ok(entry);
        }

        let mut state = self.state.write();
        let loaded = state.as_mut().ok_or(Error::NotInitialized)?;
        if let Some(entry) = &loaded.entry {
            return Ok(entry.clone());
        }
        // The library only unloads through `shutdown`, whose contract covers this entry.
        let entry = Arc::new(unsafe { Entry::load(&loaded.handle)? });
        loaded.entry = Some(entry.clone());
        Ok(entry)
    }

    /// Unloads the library and returns to the uninitialized state. Does nothing
    /// if the binding was never initialized.
    ///
    /// # Safety
    /// No function pointer, [`SymbolAddress`] or [`Entry`] obtained from this
    /// binding may be used afterwards.
    pub unsafe fn shutdown(&self) {
        if let Some(mut loaded) = self.state.write().take() {
            loaded.entry = None;
            loaded.handle.close();
            log::info!("native binding shut down");
        }
    }
}

impl Resolve for Binding {
    fn resolve(&self, symbol: &str) -> Result<SymbolAddress> {
        self.get_proc_address(symbol)
    }
}

impl Drop for Binding {
    fn drop(&mut self) {
        if let Some(loaded) = self.state.get_mut().take() {
            loaded.handle.keep_resident();
        }
    }
}

static GLOBAL: LazyLock<Binding> = LazyLock::new(|| Binding::new(BindingConfig::default()));

/// The process-wide binding, configured with platform defaults.
pub fn global() -> &'static Binding {
    &GLOBAL
}

/// The process-wide binding's global commands, loading the library on first use.
pub fn entry() -> Result<Arc<Entry>> {
    global().entry()
}
