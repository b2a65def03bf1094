use std::ffi::CStr;
use std::os::raw::c_void;
use std::path::Path;

use libloading::os::unix::{Library, RTLD_LOCAL, RTLD_NOW};

use super::{LoadStrategy, NativeLibrary, SymbolAddress};

/// `dlopen`-based loader. Binds every symbol at load time.
#[derive(Debug, Default, Copy, Clone)]
pub struct PosixLoader;

impl LoadStrategy for PosixLoader {
    fn name(&self) -> &'static str {
        "dlopen"
    }

    fn retries_in_search_directory(&self) -> bool {
        true
    }

    fn load(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        // Running the library's initializers is inherent to loading it.
        let library = unsafe { Library::open(Some(path), RTLD_NOW | RTLD_LOCAL) }
            .map_err(|err| err.to_string())?;
        Ok(Box::new(PosixLibrary(library)))
    }
}

struct PosixLibrary(Library);

impl NativeLibrary for PosixLibrary {
    fn symbol(&self, name: &CStr) -> Option<SymbolAddress> {
        let symbol = unsafe { self.0.get::<*mut c_void>(name.to_bytes_with_nul()) }.ok()?;
        SymbolAddress::new(*symbol)
    }

    fn unload(self: Box<Self>) -> Result<(), String> {
        self.0.close().map_err(|err| err.to_string())
    }
}
