use std::path::PathBuf;

use thiserror::Error;
use vkbind_sys::VkResult;

/// Error type for loader and binding operations
#[derive(Debug, Error)]
pub enum Error {
    #[error("no dynamic loading strategy is available for this platform ({family})")]
    UnsupportedPlatform { family: &'static str },

    #[error("native library `{name}` not found (tried {}): {reason}", display_attempts(.attempts))]
    LibraryNotFound {
        name: String,
        attempts: Vec<PathBuf>,
        reason: String,
    },

    #[error("symbol `{symbol}` not found in native library `{library}`")]
    SymbolNotFound { symbol: String, library: String },

    #[error("`{operation}` is not valid on a library handle that is {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    #[error("binding has not been initialized")]
    NotInitialized,

    #[error("`{0}` contains an interior NUL byte")]
    InvalidName(String),

    #[error("{call} failed with {} ({})", .code.name(), .code.0)]
    Vulkan { call: &'static str, code: VkResult },
}

fn display_attempts(attempts: &[PathBuf]) -> String {
    attempts
        .iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn library_not_found_lists_every_attempt() {
        let err = Error::LibraryNotFound {
            name: "libexample.so.1".into(),
            attempts: vec![
                PathBuf::from("libexample.so.1"),
                PathBuf::from("/opt/app/libexample.so.1"),
            ],
            reason: "no such file".into(),
        };
        assert_eq!(
            err.to_string(),
            "native library `libexample.so.1` not found \
             (tried libexample.so.1, /opt/app/libexample.so.1): no such file"
        );
    }

    #[test]
    fn vulkan_errors_name_the_result_code() {
        let err = Error::Vulkan {
            call: "vkEnumerateInstanceLayerProperties",
            code: VkResult::ERROR_OUT_OF_HOST_MEMORY,
        };
        assert_eq!(
            err.to_string(),
            "vkEnumerateInstanceLayerProperties failed with VK_ERROR_OUT_OF_HOST_MEMORY (-1)"
        );
    }
}
