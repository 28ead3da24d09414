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

// Opens one window per configured backend and drives each renderer from the
// winit event loop.
// Run with: cargo run -p sandbox -- --backend vulkan

mod host;

use anyhow::{bail, Context, Result};
use clap::Parser;
use prism_core::{HostConfig, RendererType, WindowConfig};
use std::path::PathBuf;
use winit::event_loop::EventLoop;

use crate::host::SandboxHost;

#[derive(Debug, Parser)]
#[command(version, about = "Draws a triangle through the selected graphics backends")]
struct Cli {
    /// TOML file listing the windows to open. Takes precedence over --backend.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend of the single window to open (opengl, vulkan, d3d11, d3d12, generic[:<driver>]).
    #[arg(short, long)]
    backend: Option<RendererType>,

    /// Driver of the generic backend.
    #[arg(short, long)]
    driver: Option<String>,

    /// Initial window width, in pixels.
    #[arg(long)]
    width: Option<u32>,

    /// Initial window height, in pixels.
    #[arg(long)]
    height: Option<u32>,

    /// Exit after every window has rendered this many frames.
    #[arg(long)]
    frames: Option<u64>,
}

impl Cli {
    /// Resolves the windows to open from the command line.
    fn host_config(&self) -> Result<HostConfig> {
        let mut config = match (&self.config, &self.backend) {
            (Some(path), _) => HostConfig::load(path)
                .with_context(|| format!("Cannot use configuration '{}'", path.display()))?,
            (None, Some(backend)) => {
                let backend = match (backend, &self.driver) {
                    (RendererType::Generic2D { .. }, Some(driver)) => RendererType::generic(driver),
                    (other, _) => other.clone(),
                };
                HostConfig {
                    windows: vec![WindowConfig::new(&backend)],
                }
            }
            (None, None) => HostConfig::default(),
        };

        for window in &mut config.windows {
            if let Some(width) = self.width {
                window.width = width;
            }
            if let Some(height) = self.height {
                window.height = height;
            }
        }

        if config.windows.is_empty() {
            bail!("The configuration does not list any window");
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    use env_logger::{Builder, Env};

    Builder::from_env(Env::default().default_filter_or("info"))
        .filter_module("wgpu_hal", log::LevelFilter::Error)
        .filter_module("naga", log::LevelFilter::Warn)
        .init();

    let cli = Cli::parse();
    let config = cli.host_config()?;
    log::info!("Sandbox: opening {} window(s)", config.windows.len());

    let event_loop = EventLoop::new()?;
    let mut host = SandboxHost::new(config, cli.frames);
    event_loop.run_app(&mut host)?;

    log::info!("Sandbox: event loop finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("sandbox").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_no_arguments_opens_default_window() {
        let config = cli(&[]).host_config().unwrap();
        assert_eq!(config, HostConfig::default());
    }

    #[test]
    fn test_backend_and_size_flags() {
        let config = cli(&["--backend", "vulkan", "--width", "800", "--height", "600"])
            .host_config()
            .unwrap();
        assert_eq!(config.windows.len(), 1);
        let window = &config.windows[0];
        assert_eq!(window.renderer_type(), Ok(RendererType::Vulkan));
        assert_eq!((window.width, window.height), (800, 600));
    }

    #[test]
    fn test_driver_flag_selects_generic_driver() {
        let config = cli(&["--backend", "generic", "--driver", "gl"])
            .host_config()
            .unwrap();
        assert_eq!(
            config.windows[0].renderer_type(),
            Ok(RendererType::generic("gl"))
        );

        // Only the generic backend has a driver.
        let config = cli(&["-b", "opengl", "-d", "gl"]).host_config().unwrap();
        assert_eq!(config.windows[0].renderer_type(), Ok(RendererType::OpenGL3_3));
    }

    #[test]
    fn test_unknown_backend_is_rejected_by_the_parser() {
        let parsed = Cli::try_parse_from(["sandbox", "--backend", "glide"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_config_file_is_an_error() {
        let err = cli(&["--config", "/definitely/not/here.toml"])
            .host_config()
            .unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.toml"));
    }

    #[test]
    fn test_frames_flag() {
        assert_eq!(cli(&["--frames", "3"]).frames, Some(3));
        assert_eq!(cli(&[]).frames, None);
    }
}
