//! Function-pointer types and export names for the global commands

use std::os::raw::{c_char, c_void};

use crate::{
    VkAllocationCallbacks, VkExtensionProperties, VkInstance, VkInstanceCreateInfo,
    VkLayerProperties, VkResult,
};

pub type PFN_vkVoidFunction = unsafe extern "system" fn();

pub type PFN_vkGetInstanceProcAddr =
    unsafe extern "system" fn(instance: VkInstance, pName: *const c_char) -> Option<PFN_vkVoidFunction>;

pub type PFN_vkCreateInstance = unsafe extern "system" fn(
    pCreateInfo: *const VkInstanceCreateInfo,
    pAllocator: *const VkAllocationCallbacks,
    pInstance: *mut VkInstance,
) -> VkResult;

pub type PFN_vkDestroyInstance =
    unsafe extern "system" fn(instance: VkInstance, pAllocator: *const VkAllocationCallbacks);

pub type PFN_vkEnumerateInstanceVersion =
    unsafe extern "system" fn(pApiVersion: *mut u32) -> VkResult;

pub type PFN_vkEnumerateInstanceExtensionProperties = unsafe extern "system" fn(
    pLayerName: *const c_char,
    pPropertyCount: *mut u32,
    pProperties: *mut VkExtensionProperties,
) -> VkResult;

pub type PFN_vkEnumerateInstanceLayerProperties = unsafe extern "system" fn(
    pPropertyCount: *mut u32,
    pProperties: *mut VkLayerProperties,
) -> VkResult;

// Export names as they appear in the loader's symbol table
pub const VK_GET_INSTANCE_PROC_ADDR: &str = "vkGetInstanceProcAddr";
pub const VK_CREATE_INSTANCE: &str = "vkCreateInstance";
pub const VK_DESTROY_INSTANCE: &str = "vkDestroyInstance";
pub const VK_ENUMERATE_INSTANCE_VERSION: &str = "vkEnumerateInstanceVersion";
pub const VK_ENUMERATE_INSTANCE_EXTENSION_PROPERTIES: &str = "vkEnumerateInstanceExtensionProperties";
pub const VK_ENUMERATE_INSTANCE_LAYER_PROPERTIES: &str = "vkEnumerateInstanceLayerProperties";

/// Type-erased pointer as handed out by the platform loader.
pub type RawSymbol = *mut c_void;
