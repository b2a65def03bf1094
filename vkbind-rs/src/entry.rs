//! Safe wrappers around the global Vulkan commands

use std::ffi::{CStr, CString};
use std::fmt;
use std::os::raw::c_char;
use std::ptr;

use vkbind_sys::*;

use crate::table::{build, Resolve};
use crate::{Error, Result};

crate::function_table! {
    /// Entry points every Vulkan loader exports
    pub struct EntryTable {
        get_instance_proc_addr: PFN_vkGetInstanceProcAddr = VK_GET_INSTANCE_PROC_ADDR,
        create_instance: PFN_vkCreateInstance = VK_CREATE_INSTANCE,
        enumerate_instance_extension_properties: PFN_vkEnumerateInstanceExtensionProperties =
            VK_ENUMERATE_INSTANCE_EXTENSION_PROPERTIES,
        enumerate_instance_layer_properties: PFN_vkEnumerateInstanceLayerProperties =
            VK_ENUMERATE_INSTANCE_LAYER_PROPERTIES,
    }
}

/// Packed `major.minor.patch` API version.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ApiVersion(pub u32);

impl ApiVersion {
    pub const V1_0: ApiVersion = ApiVersion(VK_API_VERSION_1_0);

    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        ApiVersion(vk_make_api_version(0, major, minor, patch))
    }

    pub const fn major(self) -> u32 {
        vk_api_version_major(self.0)
    }

    pub const fn minor(self) -> u32 {
        vk_api_version_minor(self.0)
    }

    pub const fn patch(self) -> u32 {
        vk_api_version_patch(self.0)
    }
}

impl fmt::Display for ApiVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major(), self.minor(), self.patch())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionProperties {
    pub name: String,
    pub spec_version: u32,
}

impl From<&VkExtensionProperties> for ExtensionProperties {
    fn from(raw: &VkExtensionProperties) -> Self {
        ExtensionProperties {
            name: string_from_chars(&raw.extensionName),
            spec_version: raw.specVersion,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerProperties {
    pub name: String,
    pub spec_version: ApiVersion,
    pub implementation_version: u32,
    pub description: String,
}

impl From<&VkLayerProperties> for LayerProperties {
    fn from(raw: &VkLayerProperties) -> Self {
        LayerProperties {
            name: string_from_chars(&raw.layerName),
            spec_version: ApiVersion(raw.specVersion),
            implementation_version: raw.implementationVersion,
            description: string_from_chars(&raw.description),
        }
    }
}

fn string_from_chars(chars: &[c_char]) -> String {
    let bytes: Vec<u8> = chars
        .iter()
        .take_while(|&&c| c != 0)
        .map(|&c| c as u8)
        .collect();
    String::from_utf8_lossy(&bytes).into_owned()
}

fn check(call: &'static str, code: VkResult) -> Result<()> {
    if code.is_success() {
        Ok(())
    } else {
        Err(Error::Vulkan { call, code })
    }
}

/// Runs a two-call enumeration, starting over while the driver reports
/// `VK_INCOMPLETE` (the list grew between the calls).
fn enumerate<T: Default + Clone>(
    call: &'static str,
    mut f: impl FnMut(*mut u32, *mut T) -> VkResult,
) -> Result<Vec<T>> {
    loop {
        let mut count = 0u32;
        check(call, f(&mut count, ptr::null_mut()))?;
        let mut items = vec![T::default(); count as usize];
        let code = f(&mut count, items.as_mut_ptr());
        if code == VkResult::INCOMPLETE {
            log::debug!("{call} returned VK_INCOMPLETE, enumerating again");
            continue;
        }
        check(call, code)?;
        items.truncate(count as usize);
        return Ok(items);
    }
}

/// The loader's global commands, resolved and ready to call.
pub struct Entry {
    table: EntryTable,
    enumerate_instance_version: Option<PFN_vkEnumerateInstanceVersion>,
}

impl Entry {
    /// Resolves the entry table through `resolver`.
    ///
    /// # Safety
    /// The library behind `resolver` must stay loaded for as long as the returned
    /// value (or any function pointer copied out of it) is in use.
    pub unsafe fn load(resolver: &dyn Resolve) -> Result<Self> {
        let table: EntryTable = build(resolver)?;
        // Absent from 1.0 loaders, so looked up rather than required.
        let enumerate_instance_version = (table.get_instance_proc_addr)(
            ptr::null_mut(),
            c"vkEnumerateInstanceVersion".as_ptr(),
        )
        .map(|f| std::mem::transmute::<PFN_vkVoidFunction, PFN_vkEnumerateInstanceVersion>(f));
        Ok(Entry {
            table,
            enumerate_instance_version,
        })
    }

    /// Raw table, for commands without a safe wrapper.
    pub fn table(&self) -> &EntryTable {
        &self.table
    }

    /// Highest instance-level API version the loader supports.
    pub fn instance_version(&self) -> Result<ApiVersion> {
        let Some(query) = self.enumerate_instance_version else {
            return Ok(ApiVersion::V1_0);
        };
        let mut version = 0u32;
        check(VK_ENUMERATE_INSTANCE_VERSION, unsafe { query(&mut version) })?;
        Ok(ApiVersion(version))
    }

    pub fn enumerate_instance_layer_properties(&self) -> Result<Vec<LayerProperties>> {
        let raw = enumerate(VK_ENUMERATE_INSTANCE_LAYER_PROPERTIES, |count, props| unsafe {
            (self.table.enumerate_instance_layer_properties)(count, props)
        })?;
        Ok(raw.iter().map(LayerProperties::from).collect())
    }

    /// Extensions provided by the implementation, or by `layer` when given.
    pub fn enumerate_instance_extension_properties(
        &self,
        layer: Option<&str>,
    ) -> Result<Vec<ExtensionProperties>> {
        let layer = layer
            .map(|name| CString::new(name).map_err(|_| Error::InvalidName(name.to_string())))
            .transpose()?;
        let layer_ptr = layer.as_ref().map_or(ptr::null(), |name| name.as_ptr());
        let raw = enumerate(VK_ENUMERATE_INSTANCE_EXTENSION_PROPERTIES, |count, props| unsafe {
            (self.table.enumerate_instance_extension_properties)(layer_ptr, count, props)
        })?;
        Ok(raw.iter().map(ExtensionProperties::from).collect())
    }

    /// Looks up a command through `vkGetInstanceProcAddr`.
    ///
    /// # Safety
    /// `instance` must be null or a live instance created from this entry.
    pub unsafe fn get_instance_proc_addr(
        &self,
        instance: VkInstance,
        name: &CStr,
    ) -> Option<PFN_vkVoidFunction> {
        (self.table.get_instance_proc_addr)(instance, name.as_ptr())
    }

    /// # Safety
    /// `create_info` and everything it points to must be valid per the Vulkan
    /// valid-usage rules for `vkCreateInstance`.
    pub unsafe fn create_instance(&self, create_info: &VkInstanceCreateInfo) -> Result<VkInstance> {
        let mut instance = ptr::null_mut();
        check(
            VK_CREATE_INSTANCE,
            (self.table.create_instance)(create_info, ptr::null(), &mut instance),
        )?;
        Ok(instance)
    }
}

impl fmt::Debug for Entry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entry")
            .field("table", &self.table)
            .field(
                "enumerate_instance_version",
                &self.enumerate_instance_version.is_some(),
            )
            .finish()
    }
}
