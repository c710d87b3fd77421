// Copyright 2025 HEM Sp. z o.o.
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

use std::path::{Path, PathBuf};
use std::sync::Arc;
use log::{info, warn};
use crate::command::PdmStatus;
use crate::device::{Device, DeviceClass, DeviceDescriptor, DeviceDetails, DeviceInfo};
use crate::mount::Mounter;
use crate::uevent::UEvent;

/// Media player speaking MTP, exposed through a mount of its device link.
pub struct MtpDevice {
    device_num: u32,
    info: DeviceInfo,
    mounter: Arc<dyn Mounter>,
    mount_path: PathBuf,
    source: Option<String>,
    mounted: bool,
    powered: bool,
    /// Set when a power transition (not the user) unmounted the device.
    remount_on_resume: bool,
}

impl MtpDevice {
    pub fn new(device_num: u32, event: &UEvent, mount_root: &Path, mounter: Arc<dyn Mounter>) -> Self {
        Self {
            device_num,
            info: DeviceInfo::from_event(event),
            mounter,
            mount_path: Self::mount_path_for(mount_root, device_num),
            source: None,
            mounted: false,
            powered: true,
            remount_on_resume: false,
        }
    }

    /// Mount point of the device numbered `device_num`.
    pub fn mount_path_for(mount_root: &Path, device_num: u32) -> PathBuf {
        mount_root.join(format!("mtp{}", device_num))
    }

    /// Mounts the first device link under the device's mount path.
    pub fn mtp_mount(&mut self, dev_links: &[&str]) -> PdmStatus {
        let Some(source) = dev_links.first() else {
            warn!("MTP device {} has no device link to mount", self.info.dev_path);
            return PdmStatus::MountFailed;
        };
        self.source = Some(source.to_string());
        self.mount_source()
    }

    fn mount_source(&mut self) -> PdmStatus {
        let Some(source) = self.source.as_deref() else {
            return PdmStatus::MountFailed;
        };
        match self.mounter.mount(source, &self.mount_path) {
            Ok(()) => {
                info!("MTP device {} mounted at {}", source, self.mount_path.display());
                self.mounted = true;
                PdmStatus::Success
            }
            Err(e) => {
                warn!("Failed to mount MTP device {} at {}: {}", source, self.mount_path.display(), e);
                PdmStatus::MountFailed
            }
        }
    }

    /// Unmounting a device that is not mounted succeeds without touching the mounter.
    pub fn mtp_umount(&mut self) -> PdmStatus {
        if !self.mounted {
            return PdmStatus::Success;
        }
        match self.mounter.unmount(&self.mount_path) {
            Ok(()) => {
                info!("MTP device unmounted from {}", self.mount_path.display());
                self.mounted = false;
                PdmStatus::Success
            }
            Err(e) => {
                warn!("Failed to unmount {}: {}", self.mount_path.display(), e);
                PdmStatus::UnmountFailed
            }
        }
    }

    /// User-requested unmount; the device stays attached and is not re-mounted on resume.
    pub fn eject(&mut self) -> PdmStatus {
        self.remount_on_resume = false;
        self.mtp_umount()
    }

    /// Unmount on behalf of a power transition, remembering to re-mount on resume.
    pub fn power_umount(&mut self) -> PdmStatus {
        let was_mounted = self.mounted;
        let status = self.mtp_umount();
        if was_mounted && status == PdmStatus::Success {
            self.remount_on_resume = true;
        }
        status
    }

    pub fn set_power_status(&mut self, powered: bool) {
        self.powered = powered;
    }

    /// Marks the device powered again and re-mounts it if a power transition unmounted it.
    pub fn resume_request(&mut self) -> PdmStatus {
        self.powered = true;
        if !self.remount_on_resume || self.mounted {
            return PdmStatus::Success;
        }
        let status = self.mount_source();
        if status == PdmStatus::Success {
            self.remount_on_resume = false;
        }
        status
    }

    /// Teardown before the device leaves the registry. Failure is logged, never propagated.
    pub fn on_device_remove(&mut self) {
        if self.mtp_umount() != PdmStatus::Success {
            warn!("MTP device {} removed while still mounted at {}", self.info.dev_path, self.mount_path.display());
        }
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_powered(&self) -> bool {
        self.powered
    }

    pub fn mount_path(&self) -> &Path {
        &self.mount_path
    }
}

impl Device for MtpDevice {
    fn dev_path(&self) -> &str {
        &self.info.dev_path
    }

    fn device_num(&self) -> u32 {
        self.device_num
    }

    fn device_class(&self) -> DeviceClass {
        DeviceClass::Mtp
    }

    fn set_device_info(&mut self, event: &UEvent) {
        self.info.refresh(event);
    }

    fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            device_num: self.device_num,
            info: self.info.clone(),
            details: DeviceDetails::Mtp {
                mount_path: self.mount_path.display().to_string(),
                is_mounted: self.mounted,
                is_powered: self.powered,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockMounter;

    fn new_device(mounter: Arc<MockMounter>) -> MtpDevice {
        let event = UEvent::builder().action("add").dev_path("/devices/usb1/1-1").dev_type("usb_device").build();
        MtpDevice::new(1, &event, Path::new("/tmp/usb"), mounter)
    }

    #[test]
    fn mtp_mount_should_mount_the_first_link_under_the_numbered_mount_path() {
        let mounter = MockMounter::new();
        let mut device = new_device(mounter.clone());

        let status = device.mtp_mount(&["/dev/libmtp-1-1", "/dev/mtp/phone"]);

        assert_eq!(status, PdmStatus::Success);
        assert!(device.is_mounted());
        assert_eq!(device.mount_path(), Path::new("/tmp/usb/mtp1"));
        assert_eq!(mounter.mounted(), vec![("/dev/libmtp-1-1".to_string(), PathBuf::from("/tmp/usb/mtp1"))]);
    }

    #[test]
    fn mtp_mount_without_links_or_with_failing_mounter_should_report_mount_failed() {
        let mounter = MockMounter::new();
        mounter.fail_mount_of("/dev/broken");
        let mut device = new_device(mounter.clone());

        assert_eq!(device.mtp_mount(&[]), PdmStatus::MountFailed);
        assert_eq!(device.mtp_mount(&["/dev/broken"]), PdmStatus::MountFailed);
        assert!(!device.is_mounted());
    }

    #[test]
    fn mtp_umount_of_an_unmounted_device_should_succeed_without_calling_the_mounter() {
        let mounter = MockMounter::new();
        let mut device = new_device(mounter.clone());

        assert_eq!(device.mtp_umount(), PdmStatus::Success);
        assert!(mounter.unmounted().is_empty());
    }

    #[test]
    fn resume_request_should_remount_only_after_a_power_unmount_not_after_eject() {
        let mounter = MockMounter::new();
        let mut device = new_device(mounter.clone());
        device.mtp_mount(&["/dev/libmtp-1-1"]);

        assert_eq!(device.power_umount(), PdmStatus::Success);
        device.set_power_status(false);
        assert_eq!(device.resume_request(), PdmStatus::Success);
        assert!(device.is_mounted());
        assert!(device.is_powered());
        assert_eq!(mounter.mounted().len(), 2);

        assert_eq!(device.eject(), PdmStatus::Success);
        assert_eq!(device.resume_request(), PdmStatus::Success);
        assert!(!device.is_mounted());
        assert_eq!(mounter.mounted().len(), 2);
    }

    #[test]
    fn failed_unmount_should_keep_the_device_mounted() {
        let mounter = MockMounter::new();
        mounter.fail_unmount_of("/tmp/usb/mtp1");
        let mut device = new_device(mounter.clone());
        device.mtp_mount(&["/dev/libmtp-1-1"]);

        assert_eq!(device.power_umount(), PdmStatus::UnmountFailed);
        assert!(device.is_mounted());
    }
}
