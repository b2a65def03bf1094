//! Runtime binding to the Vulkan loader library
//!
//! This crate finds and loads the platform's Vulkan loader (`libvulkan.so.1`,
//! `libvulkan.1.dylib` or `vulkan-1.dll`), resolves its exports into typed
//! function tables, and wraps the global commands in safe calls. Raw layouts and
//! function-pointer types live in `vkbind-sys`.
//!
//! # Example
//! ```no_run
//! let entry = vkbind_rs::entry().expect("Failed to load the Vulkan loader");
//! println!("instance version {}", entry.instance_version().expect("Failed to query version"));
//!
//! for layer in entry.enumerate_instance_layer_properties().expect("Failed to list layers") {
//!     println!("{}: {}", layer.name, layer.description);
//! }
//! ```
//!
//! Applications that need explicit control over the lifecycle, or an alternate
//! library, construct their own [`Binding`] instead of using [`global`].

pub mod binding;
pub mod entry;
mod error;
pub mod library;
pub mod platform;
pub mod table;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use binding::{entry, global, Binding, BindingConfig};
pub use entry::{ApiVersion, Entry, EntryTable, ExtensionProperties, LayerProperties};
pub use error::{Error, Result};
pub use library::{FallbackPolicy, LibraryHandle, LoadStrategy, NativeLibrary, SymbolAddress};
pub use platform::PlatformKind;
pub use table::{build, FunctionTable, Resolve, SymbolTable};
