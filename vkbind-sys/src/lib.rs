//! Low-level raw types for the Vulkan loader library
//!
//! This crate mirrors the ABI of the global (pre-instance) Vulkan commands:
//! opaque handles, result codes, structure layouts and function-pointer types.
//! Nothing here links against the native library; the pointers are resolved at
//! runtime by `vkbind-rs`. Use that crate for safe, idiomatic Rust APIs.

#![allow(non_camel_case_types)]
#![allow(non_snake_case)]

use std::os::raw::{c_char, c_void};

pub mod commands;
pub use commands::*;

// Opaque types
#[repr(C)]
pub struct VkInstance_T {
    _private: [u8; 0],
}

pub type VkInstance = *mut VkInstance_T;

#[repr(C)]
pub struct VkAllocationCallbacks {
    _private: [u8; 0],
}

pub type VkFlags = u32;
pub type VkInstanceCreateFlags = VkFlags;
pub type VkStructureType = i32;

pub const VK_STRUCTURE_TYPE_APPLICATION_INFO: VkStructureType = 0;
pub const VK_STRUCTURE_TYPE_INSTANCE_CREATE_INFO: VkStructureType = 1;

pub const VK_MAX_EXTENSION_NAME_SIZE: usize = 256;
pub const VK_MAX_DESCRIPTION_SIZE: usize = 256;

/// Result codes returned by Vulkan commands.
///
/// Kept as a transparent integer: drivers may return codes newer than this list.
#[repr(transparent)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct VkResult(pub i32);

impl VkResult {
    pub const SUCCESS: VkResult = VkResult(0);
    pub const NOT_READY: VkResult = VkResult(1);
    pub const TIMEOUT: VkResult = VkResult(2);
    pub const INCOMPLETE: VkResult = VkResult(5);
    pub const ERROR_OUT_OF_HOST_MEMORY: VkResult = VkResult(-1);
    pub const ERROR_OUT_OF_DEVICE_MEMORY: VkResult = VkResult(-2);
    pub const ERROR_INITIALIZATION_FAILED: VkResult = VkResult(-3);
    pub const ERROR_LAYER_NOT_PRESENT: VkResult = VkResult(-6);
    pub const ERROR_EXTENSION_NOT_PRESENT: VkResult = VkResult(-7);
    pub const ERROR_INCOMPATIBLE_DRIVER: VkResult = VkResult(-9);

    pub fn is_success(self) -> bool {
        self.0 >= 0
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::SUCCESS => "VK_SUCCESS",
            Self::NOT_READY => "VK_NOT_READY",
            Self::TIMEOUT => "VK_TIMEOUT",
            Self::INCOMPLETE => "VK_INCOMPLETE",
            Self::ERROR_OUT_OF_HOST_MEMORY => "VK_ERROR_OUT_OF_HOST_MEMORY",
            Self::ERROR_OUT_OF_DEVICE_MEMORY => "VK_ERROR_OUT_OF_DEVICE_MEMORY",
            Self::ERROR_INITIALIZATION_FAILED => "VK_ERROR_INITIALIZATION_FAILED",
            Self::ERROR_LAYER_NOT_PRESENT => "VK_ERROR_LAYER_NOT_PRESENT",
            Self::ERROR_EXTENSION_NOT_PRESENT => "VK_ERROR_EXTENSION_NOT_PRESENT",
            Self::ERROR_INCOMPATIBLE_DRIVER => "VK_ERROR_INCOMPATIBLE_DRIVER",
            _ => "VK_RESULT_UNKNOWN",
        }
    }
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct VkApplicationInfo {
    pub sType: VkStructureType,
    pub pNext: *const c_void,
    pub pApplicationName: *const c_char,
    pub applicationVersion: u32,
    pub pEngineName: *const c_char,
    pub engineVersion: u32,
    pub apiVersion: u32,
}

#[repr(C)]
#[derive(Debug, Copy, Clone)]
pub struct VkInstanceCreateInfo {
    pub sType: VkStructureType,
    pub pNext: *const c_void,
    pub flags: VkInstanceCreateFlags,
    pub pApplicationInfo: *const VkApplicationInfo,
    pub enabledLayerCount: u32,
    pub ppEnabledLayerNames: *const *const c_char,
    pub enabledExtensionCount: u32,
    pub ppEnabledExtensionNames: *const *const c_char,
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkExtensionProperties {
    pub extensionName: [c_char; VK_MAX_EXTENSION_NAME_SIZE],
    pub specVersion: u32,
}

impl Default for VkExtensionProperties {
    fn default() -> Self {
        Self {
            extensionName: [0; VK_MAX_EXTENSION_NAME_SIZE],
            specVersion: 0,
        }
    }
}

#[repr(C)]
#[derive(Copy, Clone)]
pub struct VkLayerProperties {
    pub layerName: [c_char; VK_MAX_EXTENSION_NAME_SIZE],
    pub specVersion: u32,
    pub implementationVersion: u32,
    pub description: [c_char; VK_MAX_DESCRIPTION_SIZE],
}

impl Default for VkLayerProperties {
    fn default() -> Self {
        Self {
            layerName: [0; VK_MAX_EXTENSION_NAME_SIZE],
            specVersion: 0,
            implementationVersion: 0,
            description: [0; VK_MAX_DESCRIPTION_SIZE],
        }
    }
}

// Packed version helpers (VK_MAKE_API_VERSION and friends)
pub const fn vk_make_api_version(variant: u32, major: u32, minor: u32, patch: u32) -> u32 {
    (variant << 29) | (major << 22) | (minor << 12) | patch
}

pub const fn vk_api_version_variant(version: u32) -> u32 {
    version >> 29
}

pub const fn vk_api_version_major(version: u32) -> u32 {
    (version >> 22) & 0x7f
}

pub const fn vk_api_version_minor(version: u32) -> u32 {
    (version >> 12) & 0x3ff
}

pub const fn vk_api_version_patch(version: u32) -> u32 {
    version & 0xfff
}

pub const VK_API_VERSION_1_0: u32 = vk_make_api_version(0, 1, 0, 0);

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem::size_of;

    #[test]
    fn property_layouts_match_the_c_headers() {
        assert_eq!(size_of::<VkExtensionProperties>(), 260);
        assert_eq!(size_of::<VkLayerProperties>(), 520);
        assert_eq!(size_of::<VkResult>(), 4);
    }

    #[test]
    fn api_version_fields() {
        let v = vk_make_api_version(0, 1, 3, 250);
        assert_eq!(vk_api_version_variant(v), 0);
        assert_eq!(vk_api_version_major(v), 1);
        assert_eq!(vk_api_version_minor(v), 3);
        assert_eq!(vk_api_version_patch(v), 250);
        assert_eq!(VK_API_VERSION_1_0, 1 << 22);
    }

    #[test]
    fn incomplete_counts_as_success() {
        assert!(VkResult::INCOMPLETE.is_success());
        assert!(!VkResult::ERROR_LAYER_NOT_PRESENT.is_success());
        assert_eq!(VkResult(-1000).name(), "VK_RESULT_UNKNOWN");
    }
}
