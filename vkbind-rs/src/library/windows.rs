use std::ffi::CStr;
use std::os::raw::c_void;
use std::path::Path;

use libloading::os::windows::Library;

use super::{LoadStrategy, NativeLibrary, SymbolAddress};

/// `LoadLibraryExW`-based loader.
///
/// The Windows search order already includes the application directory, so no
/// second attempt is made from the search directory by default.
#[derive(Debug, Default, Copy, Clone)]
pub struct WindowsLoader;

impl LoadStrategy for WindowsLoader {
    fn name(&self) -> &'static str {
        "LoadLibrary"
    }

    fn retries_in_search_directory(&self) -> bool {
        false
    }

    fn load(&self, path: &Path) -> Result<Box<dyn NativeLibrary>, String> {
        let library = unsafe { Library::new(path) }.map_err(|err| err.to_string())?;
        Ok(Box::new(WindowsLibrary(library)))
    }
}

struct WindowsLibrary(Library);

impl NativeLibrary for WindowsLibrary {
    fn symbol(&self, name: &CStr) -> Option<SymbolAddress> {
        let symbol = unsafe { self.0.get::<*mut c_void>(name.to_bytes_with_nul()) }.ok()?;
        SymbolAddress::new(*symbol)
    }

    fn unload(self: Box<Self>) -> Result<(), String> {
        self.0.close().map_err(|err| err.to_string())
    }
}
