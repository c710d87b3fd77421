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

//! Test doubles for the external collaborators.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use crate::errors::MountError;
use crate::mount::Mounter;
use crate::uevent::UEvent;

#[derive(Default)]
pub struct MockMounter {
    mounted: Mutex<Vec<(String, PathBuf)>>,
    unmounted: Mutex<Vec<PathBuf>>,
    failing_sources: Mutex<HashSet<String>>,
    failing_targets: Mutex<HashSet<PathBuf>>,
}

impl MockMounter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_mount_of(&self, source: &str) {
        self.failing_sources.lock().unwrap().insert(source.to_string());
    }

    pub fn fail_unmount_of(&self, target: &str) {
        self.failing_targets.lock().unwrap().insert(PathBuf::from(target));
    }

    pub fn mounted(&self) -> Vec<(String, PathBuf)> {
        self.mounted.lock().unwrap().clone()
    }

    pub fn unmounted(&self) -> Vec<PathBuf> {
        self.unmounted.lock().unwrap().clone()
    }
}

impl Mounter for MockMounter {
    fn mount(&self, source: &str, target: &Path) -> Result<(), MountError> {
        if self.failing_sources.lock().unwrap().contains(source) {
            return Err(MountError::OtherError(format!("cannot mount {}", source)));
        }
        self.mounted.lock().unwrap().push((source.to_string(), target.to_path_buf()));
        Ok(())
    }

    fn unmount(&self, target: &Path) -> Result<(), MountError> {
        if self.failing_targets.lock().unwrap().contains(target) {
            return Err(MountError::OtherError(format!("{} is busy", target.display())));
        }
        self.unmounted.lock().unwrap().push(target.to_path_buf());
        Ok(())
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn bluetooth_event(action: &str, dev_path: &str) -> UEvent {
    UEvent::builder()
        .action(action)
        .dev_path(dev_path)
        .dev_type("usb_device")
        .subsystem("usb")
        .attribute("ID_BLUETOOTH", "1")
        .attribute("ID_VENDOR_FROM_DATABASE", "Realtek Semiconductor Corp.")
        .build()
}

pub fn mtp_event(action: &str, dev_path: &str, links: &[&str]) -> UEvent {
    UEvent::builder()
        .action(action)
        .dev_path(dev_path)
        .dev_type("usb_device")
        .subsystem("usb")
        .dev_links(links)
        .attribute("ID_MEDIA_PLAYER", "yes")
        .attribute("ID_MODEL", "Pixel_7")
        .build()
}

pub fn sound_usb_event(action: &str, dev_path: &str) -> UEvent {
    UEvent::builder()
        .action(action)
        .dev_path(dev_path)
        .dev_type("usb_device")
        .subsystem("usb")
        .attribute("ID_USB_INTERFACES", ":010100:010200:030000:")
        .attribute("ID_MODEL", "USB_Audio")
        .build()
}

pub fn sound_card_event(action: &str, dev_path: &str) -> UEvent {
    UEvent::builder()
        .action(action)
        .dev_path(dev_path)
        .subsystem("sound")
        .attribute("ID_ID", "usb-C-Media_USB_Audio-00")
        .build()
}
