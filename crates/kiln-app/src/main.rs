// SPDX-License-Identifier: CEPL-1.0
#![deny(unsafe_op_in_unsafe_fn)]
use anyhow::Result;
use clap::Parser;
use kiln_core::{init_tracing, Version};
use kiln_vk::{Context, ContextConfig, QueuePurpose, Requirements};
use tracing::{error, info};

use kiln_platform::winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    raw_window_handle::{HasDisplayHandle, HasWindowHandle},
    window::{Window, WindowId},
};

use serde::Deserialize;
use std::fs;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Config file with the requested Vulkan capability lists
    #[arg(long, default_value = "kiln.toml")]
    config: String,
}

#[derive(Debug, Deserialize, Default)]
struct AppCfg {
    #[serde(default)]
    app: AppSection,
    #[serde(default)]
    vulkan: VulkanCfg,
}

#[derive(Debug, Deserialize)]
struct AppSection {
    #[serde(default = "default_name")]
    name: String,
    #[serde(default = "default_version")]
    version: [u32; 3],
}

#[derive(Debug, Deserialize, Default)]
struct VulkanCfg {
    #[serde(default)]
    required_extensions: Vec<String>,
    #[serde(default)]
    optional_extensions: Vec<String>,
    #[serde(default)]
    required_layers: Vec<String>,
    #[serde(default)]
    optional_layers: Vec<String>,
    #[serde(default)]
    required_device_extensions: Vec<String>,
    #[serde(default)]
    optional_device_extensions: Vec<String>,
}

impl Default for AppSection {
    fn default() -> Self {
        AppSection {
            name: default_name(),
            version: default_version(),
        }
    }
}

fn default_name() -> String {
    "kiln demo".to_string()
}
fn default_version() -> [u32; 3] {
    [0, 1, 0]
}

fn load_cfg(path: &str) -> AppCfg {
    match fs::read_to_string(path) {
        Ok(s) => toml::from_str::<AppCfg>(&s).unwrap_or_default(),
        Err(_) => AppCfg::default(),
    }
}

fn context_config(cfg: &AppCfg) -> ContextConfig {
    let [major, minor, patch] = cfg.app.version;
    ContextConfig {
        app_name: cfg.app.name.clone(),
        app_version: Version::new(major, minor, patch),
        instance_extensions: Requirements {
            required: cfg.vulkan.required_extensions.clone(),
            optional: cfg.vulkan.optional_extensions.clone(),
        },
        layers: Requirements {
            required: cfg.vulkan.required_layers.clone(),
            optional: cfg.vulkan.optional_layers.clone(),
        },
        device_extensions: Requirements {
            required: cfg.vulkan.required_device_extensions.clone(),
            optional: cfg.vulkan.optional_device_extensions.clone(),
        },
    }
}

struct App {
    cfg: ContextConfig,
    window: Option<Window>,
    context: Option<Context>,
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_none() {
            let window = event_loop
                .create_window(Window::default_attributes().with_title(self.cfg.app_name.clone()))
                .expect("create_window");

            let wh = window.window_handle().expect("window_handle");
            let dh = window.display_handle().expect("display_handle");

            match Context::new(&wh, &dh, &self.cfg) {
                Ok(context) => {
                    for purpose in QueuePurpose::ALL {
                        let slot = context.queue_assignment().slot(purpose);
                        info!("{purpose} queue: family {} index {}", slot.family, slot.index);
                    }
                    self.context = Some(context);
                }
                Err(e) => {
                    error!("vulkan negotiation failed: {e}");
                    event_loop.exit();
                    return;
                }
            }

            self.window = Some(window);
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(window) = &self.window {
            if window_id != window.id() {
                return;
            }
        }

        if let WindowEvent::CloseRequested = event {
            info!("CloseRequested");
            self.context = None;
            self.window = None;
            event_loop.exit();
        }
    }
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let cfg = context_config(&load_cfg(&args.config));

    let event_loop: EventLoop<()> = EventLoop::new()?;
    let mut app = App {
        cfg,
        window: None,
        context: None,
    };

    event_loop.run_app(&mut app)?;
    Ok(())
}
