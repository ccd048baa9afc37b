//! The generic hardware manager (§4.D): provides defaults for every
//! capability, with no vendor-specific tooling. Always ranks
//! `GENERIC`, so any vendor-specific manager (none shipped here) with a
//! higher rank wins election instead.

use super::{rank, DecommissionStep, HardwareManager};
use crate::config::Config;
use crate::error::AgentError;
use crate::image::{self, ImageWriter};
use crate::inventory::Inventory;
use crate::{decommission, erase, verify};
use shared::rpc::{ImageInfo, Node, NodeProperties, Port};
use std::path::Path;
use tokio::sync::Mutex;

const HARDWARE_MANAGER_VERSION: &str = "1";

#[derive(Debug)]
pub struct GenericHardwareManager {
    config: Config,
    cached_image_id: Mutex<Option<String>>,
}

impl Default for GenericHardwareManager {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl GenericHardwareManager {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cached_image_id: Mutex::new(None),
        }
    }

    async fn write_image(&self, image_info: &ImageInfo) -> Result<(), AgentError> {
        let device = self.get_os_install_device().await?.ok_or_else(|| {
            AgentError::InvalidCommandParams("no OS install device available".into())
        })?;

        let guard = image::fetcher::fetch_to_tempfile(image_info, &self.config.image.tmpdir).await?;
        let is_ova = image_info.container_format.as_deref() == Some("ova");
        let writer = self.get_image_manager(image_info.disk_format.as_deref(), is_ova);
        writer.write(&guard.path, Path::new(&device)).await
    }

    async fn write_configdrive(&self, configdrive: &str) -> Result<(), AgentError> {
        let device = self.get_os_install_device().await?.ok_or_else(|| {
            AgentError::InvalidCommandParams("no OS install device available".into())
        })?;
        let guard = image::configdrive::decode_to_tempfile(configdrive, &self.config.image.tmpdir).await?;
        // Config-drive conventionally lives on the install device's second
        // partition.
        let configdrive_device = format!("{device}2");
        image::configdrive::write_to_device(&guard.path, Path::new(&configdrive_device)).await
    }
}

#[async_trait::async_trait]
impl HardwareManager for GenericHardwareManager {
    fn version(&self) -> &'static str {
        HARDWARE_MANAGER_VERSION
    }

    fn evaluate_hardware_support(&self) -> i32 {
        rank::GENERIC
    }

    async fn inventory(&self) -> Result<Inventory, AgentError> {
        Inventory::collect().await
    }

    async fn get_os_install_device(&self) -> Result<Option<String>, AgentError> {
        let inventory = Inventory::collect().await?;
        Ok(inventory.os_install_device().map(|d| d.name.clone()))
    }

    async fn erase_block_device(&self, device: &str) -> Result<(), AgentError> {
        erase::erase_block_device(device).await
    }

    async fn erase_devices(&self) -> Result<(), AgentError> {
        let inventory = Inventory::collect().await?;
        for device in &inventory.block_devices {
            self.erase_block_device(&device.name).await?;
        }
        Ok(())
    }

    async fn update_bios(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
        tracing::debug!("generic manager has no BIOS update action; treating as a no-op");
        Ok(())
    }

    async fn update_firmware(&self, _node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
        tracing::debug!("generic manager has no firmware update action; treating as a no-op");
        Ok(())
    }

    async fn verify_properties(&self, node: &Node, _ports: &[Port]) -> Result<(), AgentError> {
        match &node.properties {
            Some(properties) => self.verify_hardware(properties).await,
            None => Ok(()),
        }
    }

    async fn verify_hardware(&self, properties: &NodeProperties) -> Result<(), AgentError> {
        verify::verify_hardware(properties).await
    }

    fn get_decommission_steps(&self) -> Vec<DecommissionStep> {
        decommission::default_steps()
    }

    fn get_image_manager(&self, disk_format: Option<&str>, is_ova: bool) -> Box<dyn ImageWriter> {
        image::writer::select_writer(disk_format, is_ova)
    }

    async fn cache_image(&self, image_info: &ImageInfo, force: bool) -> Result<(), AgentError> {
        let mut cached = self.cached_image_id.lock().await;
        if !force && cached.as_deref() == Some(image_info.id.as_str()) {
            tracing::debug!(image_id = %image_info.id, "image already cached, skipping write");
            return Ok(());
        }

        self.write_image(image_info).await?;
        *cached = Some(image_info.id.clone());
        Ok(())
    }

    async fn prepare_image(
        &self,
        image_info: &ImageInfo,
        configdrive: Option<&str>,
    ) -> Result<(), AgentError> {
        self.cache_image(image_info, false).await?;
        if let Some(configdrive) = configdrive {
            self.write_configdrive(configdrive).await?;
        }
        Ok(())
    }
}
