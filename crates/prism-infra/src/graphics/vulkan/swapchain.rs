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

//! Swapchain, image views and framebuffers.

use super::bootstrap::VulkanDevice;
use super::pipeline::RenderPass;
use anyhow::{anyhow, Context, Result};
use ash::vk;
use prism_core::renderer::RenderError;

/// Images requested when the surface allows it.
const PREFERRED_IMAGE_COUNT: u32 = 3;

/// Picks `B8G8R8A8_UNORM` with the sRGB non-linear color space, else the
/// first format the surface reports.
pub fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<vk::SurfaceFormatKHR> {
    formats
        .iter()
        .copied()
        .find(|f| {
            f.format == vk::Format::B8G8R8A8_UNORM
                && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
        })
        .or_else(|| formats.first().copied())
}

/// The surface's current extent, or `requested` clamped to the supported
/// range when the surface lets the swapchain decide.
pub fn choose_extent(caps: &vk::SurfaceCapabilitiesKHR, requested: (u32, u32)) -> vk::Extent2D {
    if caps.current_extent.width != u32::MAX {
        return caps.current_extent;
    }
    vk::Extent2D {
        width: requested
            .0
            .clamp(caps.min_image_extent.width, caps.max_image_extent.width),
        height: requested
            .1
            .clamp(caps.min_image_extent.height, caps.max_image_extent.height),
    }
}

/// One more image than the minimum, at least three, within the maximum
/// (zero means unbounded).
pub fn choose_image_count(caps: &vk::SurfaceCapabilitiesKHR) -> u32 {
    let desired = (caps.min_image_count + 1).max(PREFERRED_IMAGE_COUNT);
    if caps.max_image_count > 0 {
        desired.min(caps.max_image_count)
    } else {
        desired
    }
}

fn choose_composite_alpha(caps: &vk::SurfaceCapabilitiesKHR) -> vk::CompositeAlphaFlagsKHR {
    [
        vk::CompositeAlphaFlagsKHR::OPAQUE,
        vk::CompositeAlphaFlagsKHR::INHERIT,
        vk::CompositeAlphaFlagsKHR::PRE_MULTIPLIED,
        vk::CompositeAlphaFlagsKHR::POST_MULTIPLIED,
    ]
    .into_iter()
    .find(|&mode| caps.supported_composite_alpha.contains(mode))
    .unwrap_or(vk::CompositeAlphaFlagsKHR::OPAQUE)
}

/// Queries the extent a swapchain would get for a window of size `requested`.
///
/// A zero width or height means the window is minimized and no swapchain can
/// be created yet.
pub fn surface_extent(device: &VulkanDevice, requested: (u32, u32)) -> Result<vk::Extent2D> {
    let surface = device.surface();
    let caps = unsafe {
        surface
            .loader()
            .get_physical_device_surface_capabilities(device.physical_device, surface.handle())
    }
    .map_err(surface_error)
    .context("Failed to query surface capabilities")?;
    Ok(choose_extent(&caps, requested))
}

/// Wraps a failed surface or swapchain call, reporting a lost surface as
/// [`RenderError::SurfaceLost`].
pub fn surface_error(result: vk::Result) -> anyhow::Error {
    match result {
        vk::Result::ERROR_SURFACE_LOST_KHR => RenderError::SurfaceLost.into(),
        other => other.into(),
    }
}

/// True when `error` comes from a lost surface, which happens while a
/// window is being torn down.
pub fn is_surface_lost(error: &anyhow::Error) -> bool {
    matches!(error.downcast_ref::<RenderError>(), Some(RenderError::SurfaceLost))
        || error.downcast_ref::<vk::Result>() == Some(&vk::Result::ERROR_SURFACE_LOST_KHR)
}

/// A swapchain and one view per image.
pub struct VulkanSwapchain {
    device: ash::Device,
    loader: ash::khr::swapchain::Device,
    handle: vk::SwapchainKHR,
    views: Vec<vk::ImageView>,
    pub format: vk::SurfaceFormatKHR,
    pub extent: vk::Extent2D,
    /// Set once this swapchain has been passed as `old_swapchain`. A retired
    /// swapchain can not be passed again.
    retired: bool,
}

impl VulkanSwapchain {
    /// Creates a FIFO swapchain of `extent`.
    ///
    /// ## Arguments
    /// * `old` - The swapchain being replaced, if any. It is retired by this
    ///   call even when creation fails.
    pub fn new(
        device: &VulkanDevice,
        loader: &ash::khr::swapchain::Device,
        extent: vk::Extent2D,
        old: Option<&mut VulkanSwapchain>,
    ) -> Result<Self> {
        let surface = device.surface();
        let (caps, formats) = unsafe {
            let caps = surface
                .loader()
                .get_physical_device_surface_capabilities(device.physical_device, surface.handle())
                .map_err(surface_error)?;
            let formats = surface
                .loader()
                .get_physical_device_surface_formats(device.physical_device, surface.handle())
                .map_err(surface_error)?;
            (caps, formats)
        };
        let format = choose_surface_format(&formats)
            .ok_or_else(|| anyhow!("The surface reports no supported format"))?;

        let old_handle = match old {
            Some(old) if !old.retired => {
                old.retired = true;
                old.handle
            }
            _ => vk::SwapchainKHR::null(),
        };

        let families = [device.families.graphics, device.families.present];
        let mut info = vk::SwapchainCreateInfoKHR::default()
            .surface(surface.handle())
            .min_image_count(choose_image_count(&caps))
            .image_format(format.format)
            .image_color_space(format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .pre_transform(caps.current_transform)
            .composite_alpha(choose_composite_alpha(&caps))
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true)
            .old_swapchain(old_handle);
        info = if families[0] != families[1] {
            info.image_sharing_mode(vk::SharingMode::CONCURRENT)
                .queue_family_indices(&families)
        } else {
            info.image_sharing_mode(vk::SharingMode::EXCLUSIVE)
        };

        let handle = unsafe { loader.create_swapchain(&info, None) }
            .map_err(surface_error)
            .context("Failed to create the swapchain")?;

        let mut this = Self {
            device: device.device().clone(),
            loader: loader.clone(),
            handle,
            views: Vec::new(),
            format,
            extent,
            retired: false,
        };

        let images = unsafe { loader.get_swapchain_images(handle) }
            .context("Failed to get swapchain images")?;
        for image in images {
            let view_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            let view = unsafe { this.device.create_image_view(&view_info, None) }
                .context("Failed to create a swapchain image view")?;
            this.views.push(view);
        }

        log::debug!(
            "VulkanSwapchain: {} images of {}x{} ({:?})",
            this.views.len(),
            extent.width,
            extent.height,
            format.format
        );
        Ok(this)
    }

    pub fn handle(&self) -> vk::SwapchainKHR {
        self.handle
    }

    pub fn views(&self) -> &[vk::ImageView] {
        &self.views
    }
}

impl Drop for VulkanSwapchain {
    fn drop(&mut self) {
        unsafe {
            for view in self.views.drain(..) {
                self.device.destroy_image_view(view, None);
            }
            self.loader.destroy_swapchain(self.handle, None);
        }
    }
}

/// One framebuffer per swapchain image. Must be dropped before the swapchain
/// whose views it references.
pub struct Framebuffers {
    device: ash::Device,
    handles: Vec<vk::Framebuffer>,
}

impl Framebuffers {
    pub fn new(
        device: &ash::Device,
        render_pass: &RenderPass,
        swapchain: &VulkanSwapchain,
    ) -> Result<Self> {
        let mut this = Self {
            device: device.clone(),
            handles: Vec::with_capacity(swapchain.views().len()),
        };
        for &view in swapchain.views() {
            let attachments = [view];
            let info = vk::FramebufferCreateInfo::default()
                .render_pass(render_pass.handle())
                .attachments(&attachments)
                .width(swapchain.extent.width)
                .height(swapchain.extent.height)
                .layers(1);
            let framebuffer = unsafe { device.create_framebuffer(&info, None) }
                .context("Failed to create a framebuffer")?;
            this.handles.push(framebuffer);
        }
        Ok(this)
    }

    pub fn get(&self, image_index: u32) -> Option<vk::Framebuffer> {
        self.handles.get(image_index as usize).copied()
    }
}

impl Drop for Framebuffers {
    fn drop(&mut self) {
        unsafe {
            for framebuffer in self.handles.drain(..) {
                self.device.destroy_framebuffer(framebuffer, None);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caps(current: (u32, u32)) -> vk::SurfaceCapabilitiesKHR {
        vk::SurfaceCapabilitiesKHR {
            min_image_count: 2,
            max_image_count: 8,
            current_extent: vk::Extent2D {
                width: current.0,
                height: current.1,
            },
            min_image_extent: vk::Extent2D {
                width: 1,
                height: 1,
            },
            max_image_extent: vk::Extent2D {
                width: 4096,
                height: 4096,
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_current_extent_wins() {
        let extent = choose_extent(&caps((800, 600)), (480, 320));
        assert_eq!((extent.width, extent.height), (800, 600));
    }

    #[test]
    fn test_undefined_extent_uses_window_size() {
        let extent = choose_extent(&caps((u32::MAX, u32::MAX)), (480, 320));
        assert_eq!((extent.width, extent.height), (480, 320));

        let clamped = choose_extent(&caps((u32::MAX, u32::MAX)), (10_000, 0));
        assert_eq!((clamped.width, clamped.height), (4096, 1));
    }

    #[test]
    fn test_minimized_surface_reports_zero() {
        let extent = choose_extent(&caps((0, 0)), (480, 320));
        assert_eq!((extent.width, extent.height), (0, 0));
    }

    #[test]
    fn test_image_count() {
        assert_eq!(choose_image_count(&caps((1, 1))), 3);

        let mut tight = caps((1, 1));
        tight.min_image_count = 1;
        tight.max_image_count = 2;
        assert_eq!(choose_image_count(&tight), 2);

        let mut unbounded = caps((1, 1));
        unbounded.min_image_count = 4;
        unbounded.max_image_count = 0;
        assert_eq!(choose_image_count(&unbounded), 5);
    }

    #[test]
    fn test_surface_format_preference() {
        let srgb = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_SRGB,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        let unorm = vk::SurfaceFormatKHR {
            format: vk::Format::B8G8R8A8_UNORM,
            color_space: vk::ColorSpaceKHR::SRGB_NONLINEAR,
        };
        assert_eq!(choose_surface_format(&[srgb, unorm]), Some(unorm));
        assert_eq!(choose_surface_format(&[srgb]), Some(srgb));
        assert_eq!(choose_surface_format(&[]), None);
    }

    #[test]
    fn test_composite_alpha_prefers_opaque() {
        let mut c = caps((1, 1));
        c.supported_composite_alpha =
            vk::CompositeAlphaFlagsKHR::INHERIT | vk::CompositeAlphaFlagsKHR::OPAQUE;
        assert_eq!(choose_composite_alpha(&c), vk::CompositeAlphaFlagsKHR::OPAQUE);
        c.supported_composite_alpha = vk::CompositeAlphaFlagsKHR::INHERIT;
        assert_eq!(choose_composite_alpha(&c), vk::CompositeAlphaFlagsKHR::INHERIT);
    }

    #[test]
    fn test_surface_lost_detection() {
        let lost = anyhow::Error::new(vk::Result::ERROR_SURFACE_LOST_KHR).context("rebuilding");
        assert!(is_surface_lost(&lost));
        let other = anyhow::Error::new(vk::Result::ERROR_OUT_OF_HOST_MEMORY);
        assert!(!is_surface_lost(&other));
    }

    #[test]
    fn test_lost_surface_maps_to_render_error() {
        let lost = surface_error(vk::Result::ERROR_SURFACE_LOST_KHR).context("acquire");
        assert!(matches!(
            lost.downcast_ref::<RenderError>(),
            Some(RenderError::SurfaceLost)
        ));
        assert!(is_surface_lost(&lost));

        let other = surface_error(vk::Result::ERROR_DEVICE_LOST);
        assert_eq!(
            other.downcast_ref::<vk::Result>(),
            Some(&vk::Result::ERROR_DEVICE_LOST)
        );
        assert!(!is_surface_lost(&other));
    }
}
