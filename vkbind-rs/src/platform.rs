//! Host platform detection and the default search locations

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Operating system family, as far as dynamic loading is concerned.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PlatformKind {
    Windows,
    Unix,
    Unsupported,
}

impl PlatformKind {
    /// Classifies a target family string such as `std::env::consts::FAMILY`.
    pub fn from_family(family: &str) -> Self {
        match family {
            "windows" => PlatformKind::Windows,
            "unix" => PlatformKind::Unix,
            _ => PlatformKind::Unsupported,
        }
    }

    /// Well-known file name of the Vulkan loader on this platform.
    pub fn default_library_name(self) -> Option<&'static str> {
        match self {
            PlatformKind::Windows => Some("vulkan-1.dll"),
            PlatformKind::Unix if cfg!(target_vendor = "apple") => Some("libvulkan.1.dylib"),
            PlatformKind::Unix => Some("libvulkan.so.1"),
            PlatformKind::Unsupported => None,
        }
    }
}

/// Returns the platform the process is running on. Computed once.
pub fn detect() -> PlatformKind {
    static KIND: OnceLock<PlatformKind> = OnceLock::new();
    *KIND.get_or_init(|| PlatformKind::from_family(std::env::consts::FAMILY))
}

/// Directory containing the running executable, if it can be determined.
///
/// Used as the fallback location for bundled native libraries. Computed once.
pub fn default_search_directory() -> Option<&'static Path> {
    static DIR: OnceLock<Option<PathBuf>> = OnceLock::new();
    DIR.get_or_init(|| {
        let exe = match std::env::current_exe() {
            Ok(exe) => exe,
            Err(err) => {
                log::debug!("cannot locate the running executable: {err}");
                return None;
            }
        };
        exe.parent().map(Path::to_path_buf)
    })
    .as_deref()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_matches_the_compilation_target() {
        let expected = if cfg!(windows) {
            PlatformKind::Windows
        } else if cfg!(unix) {
            PlatformKind::Unix
        } else {
            PlatformKind::Unsupported
        };
        assert_eq!(detect(), expected);
        assert_eq!(detect(), detect());
    }

    #[test]
    fn unknown_families_are_unsupported() {
        assert_eq!(PlatformKind::from_family("windows"), PlatformKind::Windows);
        assert_eq!(PlatformKind::from_family("unix"), PlatformKind::Unix);
        assert_eq!(PlatformKind::from_family(""), PlatformKind::Unsupported);
        assert_eq!(PlatformKind::from_family("wasm"), PlatformKind::Unsupported);
        assert_eq!(PlatformKind::Unsupported.default_library_name(), None);
    }

    #[test]
    fn library_names_are_platform_specific() {
        assert_eq!(
            PlatformKind::Windows.default_library_name(),
            Some("vulkan-1.dll")
        );
        let unix = PlatformKind::Unix.default_library_name().unwrap();
        assert!(unix.starts_with("libvulkan"));
    }

    #[test]
    fn search_directory_holds_the_test_binary() {
        let dir = default_search_directory().expect("test binary has a parent directory");
        let exe = std::env::current_exe().unwrap();
        assert_eq!(exe.parent(), Some(dir));
        assert!(std::ptr::eq(dir, default_search_directory().unwrap()));
    }
}
