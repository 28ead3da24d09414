// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Instance, surface and device creation.

use super::debug;
use anyhow::{Context, Result};
use ash::vk;
use prism_core::renderer::RenderError;
use raw_window_handle::{RawDisplayHandle, RawWindowHandle};
use std::ffi::{c_char, CStr};

const VALIDATION_LAYER: &CStr = c"VK_LAYER_KHRONOS_validation";

/// The Vulkan loader, the instance and its optional debug messenger.
pub struct VulkanInstance {
    debug: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    instance: ash::Instance,
    entry: ash::Entry,
}

impl VulkanInstance {
    /// Loads the Vulkan library and creates an instance able to present to
    /// windows of `display`.
    ///
    /// The Khronos validation layer and a debug messenger are enabled
    /// whenever the layer is installed.
    pub fn new(display: RawDisplayHandle) -> Result<Self> {
        let entry = unsafe { ash::Entry::load() }.context("Failed to load the Vulkan library")?;

        let validation = validation_layer_available(&entry);
        if validation {
            log::info!("VulkanRenderer: Enabling {}", VALIDATION_LAYER.to_string_lossy());
        } else {
            log::debug!("VulkanRenderer: Validation layer not installed");
        }

        let mut extensions = ash_window::enumerate_required_extensions(display)
            .context("The display server has no Vulkan surface support")?
            .to_vec();
        if validation {
            extensions.push(ash::ext::debug_utils::NAME.as_ptr());
        }
        let layers: Vec<*const c_char> = if validation {
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            Vec::new()
        };

        let app_info = vk::ApplicationInfo::default()
            .application_name(c"Prism")
            .application_version(vk::make_api_version(0, 0, 1, 0))
            .engine_name(c"Prism")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_1);
        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layers)
            .enabled_extension_names(&extensions);

        let instance = unsafe { entry.create_instance(&create_info, None) }
            .context("Failed to create the Vulkan instance")?;

        let mut this = Self {
            debug: None,
            instance,
            entry,
        };
        if validation {
            let loader = ash::ext::debug_utils::Instance::new(&this.entry, &this.instance);
            let messenger_info = debug::messenger_create_info();
            match unsafe { loader.create_debug_utils_messenger(&messenger_info, None) } {
                Ok(messenger) => this.debug = Some((loader, messenger)),
                Err(e) => log::warn!("VulkanRenderer: Debug messenger unavailable: {e}"),
            }
        }
        Ok(this)
    }

    pub fn entry(&self) -> &ash::Entry {
        &self.entry
    }

    pub fn instance(&self) -> &ash::Instance {
        &self.instance
    }
}

impl Drop for VulkanInstance {
    fn drop(&mut self) {
        unsafe {
            if let Some((loader, messenger)) = self.debug.take() {
                loader.destroy_debug_utils_messenger(messenger, None);
            }
            self.instance.destroy_instance(None);
        }
    }
}

fn validation_layer_available(entry: &ash::Entry) -> bool {
    match unsafe { entry.enumerate_instance_layer_properties() } {
        Ok(layers) => layers
            .iter()
            .any(|layer| layer.layer_name_as_c_str() == Ok(VALIDATION_LAYER)),
        Err(e) => {
            log::warn!("VulkanRenderer: Could not enumerate instance layers: {e}");
            false
        }
    }
}

/// A presentable surface for one window.
pub struct VulkanSurface {
    loader: ash::khr::surface::Instance,
    surface: vk::SurfaceKHR,
}

impl VulkanSurface {
    pub fn new(
        instance: &VulkanInstance,
        display: RawDisplayHandle,
        window: RawWindowHandle,
    ) -> Result<Self> {
        let surface = unsafe {
            ash_window::create_surface(instance.entry(), instance.instance(), display, window, None)
        }
        .context("Failed to create the window surface")?;
        let loader = ash::khr::surface::Instance::new(instance.entry(), instance.instance());
        Ok(Self { loader, surface })
    }

    pub fn handle(&self) -> vk::SurfaceKHR {
        self.surface
    }

    pub fn loader(&self) -> &ash::khr::surface::Instance {
        &self.loader
    }

    fn supports_present(&self, physical_device: vk::PhysicalDevice, family: u32) -> bool {
        unsafe {
            self.loader
                .get_physical_device_surface_support(physical_device, family, self.surface)
        }
        .unwrap_or(false)
    }
}

impl Drop for VulkanSurface {
    fn drop(&mut self) {
        unsafe { self.loader.destroy_surface(self.surface, None) };
    }
}

/// The queue family chosen for each role. Roles may share a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueFamilies {
    pub graphics: u32,
    pub present: u32,
    pub transfer: u32,
}

impl QueueFamilies {
    /// The distinct families, in role order.
    pub fn unique(&self) -> Vec<u32> {
        let mut families = vec![self.graphics];
        for family in [self.present, self.transfer] {
            if !families.contains(&family) {
                families.push(family);
            }
        }
        families
    }
}

/// Picks the families for each queue role.
///
/// Graphics is the first family with graphics support. Present prefers the
/// graphics family. Transfer prefers a family with neither graphics nor
/// compute, then one without graphics, then falls back to graphics.
pub fn choose_queue_families(
    families: &[vk::QueueFamilyProperties],
    supports_present: impl Fn(u32) -> bool,
) -> Option<QueueFamilies> {
    let indexed = || {
        families
            .iter()
            .enumerate()
            .filter(|(_, f)| f.queue_count > 0)
            .map(|(i, f)| (i as u32, f.queue_flags))
    };

    let graphics = indexed()
        .find(|(_, flags)| flags.contains(vk::QueueFlags::GRAPHICS))
        .map(|(i, _)| i)?;

    let present = if supports_present(graphics) {
        graphics
    } else {
        indexed().map(|(i, _)| i).find(|&i| supports_present(i))?
    };

    let dedicated = indexed().find(|(_, flags)| {
        flags.contains(vk::QueueFlags::TRANSFER)
            && !flags.intersects(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE)
    });
    let separate = || {
        indexed().find(|(_, flags)| {
            flags.contains(vk::QueueFlags::TRANSFER) && !flags.contains(vk::QueueFlags::GRAPHICS)
        })
    };
    let transfer = dedicated.or_else(separate).map_or(graphics, |(i, _)| i);

    Some(QueueFamilies {
        graphics,
        present,
        transfer,
    })
}

/// Lower ranks are preferred.
fn device_rank(device_type: vk::PhysicalDeviceType) -> u8 {
    match device_type {
        vk::PhysicalDeviceType::DISCRETE_GPU => 0,
        vk::PhysicalDeviceType::INTEGRATED_GPU => 1,
        vk::PhysicalDeviceType::VIRTUAL_GPU => 2,
        vk::PhysicalDeviceType::CPU => 3,
        _ => 4,
    }
}

/// Finds a memory type allowed by `type_bits` that has every flag in `required`.
pub fn find_memory_type(
    properties: &vk::PhysicalDeviceMemoryProperties,
    type_bits: u32,
    required: vk::MemoryPropertyFlags,
) -> Option<u32> {
    let count = properties.memory_type_count as usize;
    properties.memory_types[..count]
        .iter()
        .enumerate()
        .find(|(i, memory_type)| {
            type_bits & (1 << i) != 0 && memory_type.property_flags.contains(required)
        })
        .map(|(i, _)| i as u32)
}

fn supports_swapchain(instance: &ash::Instance, physical_device: vk::PhysicalDevice) -> bool {
    unsafe { instance.enumerate_device_extension_properties(physical_device) }
        .map(|extensions| {
            extensions
                .iter()
                .any(|ext| ext.extension_name_as_c_str() == Ok(ash::khr::swapchain::NAME))
        })
        .unwrap_or(false)
}

/// The logical device handle, destroyed on drop.
struct LogicalDevice(ash::Device);

impl Drop for LogicalDevice {
    fn drop(&mut self) {
        unsafe { self.0.destroy_device(None) };
    }
}

/// A logical device bound to one window surface, with the queues it needs.
///
/// Fields drop top to bottom: device, then surface, then instance.
pub struct VulkanDevice {
    logical: LogicalDevice,
    surface: VulkanSurface,
    instance: VulkanInstance,
    pub physical_device: vk::PhysicalDevice,
    pub families: QueueFamilies,
    pub memory_properties: vk::PhysicalDeviceMemoryProperties,
    pub device_name: String,
}

impl VulkanDevice {
    /// Creates the instance, the surface for `window` and a logical device
    /// on the best physical device that can present to it.
    pub fn new(window: RawWindowHandle, display: RawDisplayHandle) -> Result<Self> {
        // --- 1. Instance and Surface ---
        let instance = VulkanInstance::new(display)?;
        let surface = VulkanSurface::new(&instance, display, window)?;

        // --- 2. Physical Device ---
        let physical_devices = unsafe { instance.instance().enumerate_physical_devices() }
            .context("Failed to enumerate physical devices")?;
        if physical_devices.is_empty() {
            return Err(RenderError::InitializationFailed(
                "no Vulkan physical device found".to_string(),
            )
            .into());
        }

        let vk_instance = instance.instance();
        let (physical_device, families) = physical_devices
            .iter()
            .copied()
            .filter(|&pd| supports_swapchain(vk_instance, pd))
            .filter_map(|pd| {
                let properties =
                    unsafe { vk_instance.get_physical_device_queue_family_properties(pd) };
                choose_queue_families(&properties, |family| surface.supports_present(pd, family))
                    .map(|families| (pd, families))
            })
            .min_by_key(|(pd, _)| {
                let properties = unsafe { vk_instance.get_physical_device_properties(*pd) };
                device_rank(properties.device_type)
            })
            .ok_or_else(|| {
                RenderError::InitializationFailed(
                    "no physical device supports graphics, presentation and swapchains".to_string(),
                )
            })?;

        let properties = unsafe { vk_instance.get_physical_device_properties(physical_device) };
        let device_name = properties
            .device_name_as_c_str()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|_| "<unnamed>".to_string());
        log::info!(
            "VulkanRenderer: Using \"{}\" ({:?}), families {:?}",
            device_name,
            properties.device_type,
            families
        );

        // --- 3. Logical Device ---
        let priorities = [1.0_f32];
        let queue_infos: Vec<_> = families
            .unique()
            .into_iter()
            .map(|family| {
                vk::DeviceQueueCreateInfo::default()
                    .queue_family_index(family)
                    .queue_priorities(&priorities)
            })
            .collect();
        let extensions = [ash::khr::swapchain::NAME.as_ptr()];
        let device_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_infos)
            .enabled_extension_names(&extensions);
        let device = unsafe { vk_instance.create_device(physical_device, &device_info, None) }
            .context("Failed to create the logical device")?;

        let memory_properties =
            unsafe { vk_instance.get_physical_device_memory_properties(physical_device) };

        Ok(Self {
            logical: LogicalDevice(device),
            surface,
            instance,
            physical_device,
            families,
            memory_properties,
            device_name,
        })
    }

    pub fn device(&self) -> &ash::Device {
        &self.logical.0
    }

    pub fn instance(&self) -> &ash::Instance {
        self.instance.instance()
    }

    pub fn surface(&self) -> &VulkanSurface {
        &self.surface
    }

    /// Blocks until the device has finished all submitted work.
    pub fn wait_idle(&self) -> Result<()> {
        unsafe { self.device().device_wait_idle() }.context("vkDeviceWaitIdle failed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn family(flags: vk::QueueFlags) -> vk::QueueFamilyProperties {
        vk::QueueFamilyProperties {
            queue_flags: flags,
            queue_count: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_family_serves_every_role() {
        let families = [family(
            vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER,
        )];
        let chosen = choose_queue_families(&families, |_| true).unwrap();
        assert_eq!(
            chosen,
            QueueFamilies {
                graphics: 0,
                present: 0,
                transfer: 0
            }
        );
        assert_eq!(chosen.unique(), vec![0]);
    }

    #[test]
    fn test_dedicated_transfer_family_is_preferred() {
        let families = [
            family(vk::QueueFlags::GRAPHICS | vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::COMPUTE | vk::QueueFlags::TRANSFER),
            family(vk::QueueFlags::TRANSFER),
        ];
        let chosen = choose_queue_families(&families, |_| true).unwrap();
        assert_eq!(chosen.transfer, 2);
        assert_eq!(chosen.unique(), vec![0, 2]);
    }

    #[test]
    fn test_present_falls_back_to_another_family() {
        let families = [
            family(vk::QueueFlags::GRAPHICS),
            family(vk::QueueFlags::COMPUTE),
        ];
        let chosen = choose_queue_families(&families, |i| i == 1).unwrap();
        assert_eq!(chosen.graphics, 0);
        assert_eq!(chosen.present, 1);
        assert_eq!(chosen.transfer, 0);
    }

    #[test]
    fn test_no_graphics_or_present_family() {
        let compute_only = [family(vk::QueueFlags::COMPUTE)];
        assert!(choose_queue_families(&compute_only, |_| true).is_none());

        let graphics = [family(vk::QueueFlags::GRAPHICS)];
        assert!(choose_queue_families(&graphics, |_| false).is_none());
    }

    #[test]
    fn test_empty_families_are_skipped() {
        let families = [
            vk::QueueFamilyProperties {
                queue_flags: vk::QueueFlags::GRAPHICS,
                queue_count: 0,
                ..Default::default()
            },
            family(vk::QueueFlags::GRAPHICS),
        ];
        assert_eq!(choose_queue_families(&families, |_| true).unwrap().graphics, 1);
    }

    #[test]
    fn test_discrete_gpus_rank_first() {
        assert!(
            device_rank(vk::PhysicalDeviceType::DISCRETE_GPU)
                < device_rank(vk::PhysicalDeviceType::INTEGRATED_GPU)
        );
        assert!(
            device_rank(vk::PhysicalDeviceType::INTEGRATED_GPU)
                < device_rank(vk::PhysicalDeviceType::CPU)
        );
    }

    #[test]
    fn test_find_memory_type() {
        let mut properties = vk::PhysicalDeviceMemoryProperties {
            memory_type_count: 3,
            ..Default::default()
        };
        properties.memory_types[0].property_flags = vk::MemoryPropertyFlags::DEVICE_LOCAL;
        properties.memory_types[1].property_flags = vk::MemoryPropertyFlags::HOST_VISIBLE;
        properties.memory_types[2].property_flags =
            vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;

        let host = vk::MemoryPropertyFlags::HOST_VISIBLE | vk::MemoryPropertyFlags::HOST_COHERENT;
        assert_eq!(find_memory_type(&properties, 0b111, host), Some(2));
        assert_eq!(find_memory_type(&properties, 0b011, host), None);
        assert_eq!(
            find_memory_type(&properties, 0b111, vk::MemoryPropertyFlags::DEVICE_LOCAL),
            Some(0)
        );
    }
}
