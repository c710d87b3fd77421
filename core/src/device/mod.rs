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

use std::fmt;
use serde::Serialize;
use crate::uevent::{keys, UEvent};

pub mod bluetooth;
pub mod mtp;
pub mod sound;

pub use bluetooth::BluetoothDevice;
pub use mtp::MtpDevice;
pub use sound::SoundDevice;

/// Device class a handler, notification or descriptor refers to.
///
/// `Unknown` tags notifications about records no handler could turn into a device,
/// `All` tags mount-state notifications addressed to every subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceClass {
    Bluetooth,
    Mtp,
    Sound,
    Unknown,
    All,
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceClass::Bluetooth => write!(f, "bluetooth"),
            DeviceClass::Mtp => write!(f, "mtp"),
            DeviceClass::Sound => write!(f, "sound"),
            DeviceClass::Unknown => write!(f, "unknown"),
            DeviceClass::All => write!(f, "all"),
        }
    }
}

/// Lifecycle contract shared by every device entity kept in a registry.
pub trait Device: Send {
    /// Registry key; stable for the lifetime of the attachment.
    fn dev_path(&self) -> &str;

    /// Ordinal number used to target commands.
    fn device_num(&self) -> u32;

    fn device_class(&self) -> DeviceClass;

    /// Re-describes the device from a later record for the same path.
    fn set_device_info(&mut self, event: &UEvent);

    /// Copies the current state out for notifications and queries.
    fn descriptor(&self) -> DeviceDescriptor;
}

/// Descriptive attributes common to every device class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceInfo {
    pub dev_path: String,
    pub vendor_name: String,
    pub product_name: String,
    pub vendor_id: String,
    pub product_id: String,
    pub serial_number: String,
    pub bus_number: String,
    pub usb_device_number: String,
}

fn first_present<'a>(event: &'a UEvent, candidates: &[&str]) -> &'a str {
    candidates
        .iter()
        .filter_map(|key| event.attribute(key))
        .find(|value| !value.is_empty())
        .unwrap_or("")
}

impl DeviceInfo {
    pub fn from_event(event: &UEvent) -> Self {
        Self {
            dev_path: event.dev_path().to_string(),
            vendor_name: first_present(event, &[keys::ID_VENDOR_FROM_DATABASE, keys::ID_VENDOR]).to_string(),
            product_name: first_present(event, &[keys::ID_MODEL_FROM_DATABASE, keys::ID_MODEL]).to_string(),
            vendor_id: event.attribute_or_empty(keys::ID_VENDOR_ID).to_string(),
            product_id: event.attribute_or_empty(keys::ID_MODEL_ID).to_string(),
            serial_number: event.attribute_or_empty(keys::ID_SERIAL_SHORT).to_string(),
            bus_number: event.attribute_or_empty(keys::BUSNUM).to_string(),
            usb_device_number: event.attribute_or_empty(keys::DEVNUM).to_string(),
        }
    }

    /// Overwrites the attributes present in `event`; the device path never changes.
    pub fn refresh(&mut self, event: &UEvent) {
        let fresh = Self::from_event(event);
        let pairs = [
            (&mut self.vendor_name, fresh.vendor_name),
            (&mut self.product_name, fresh.product_name),
            (&mut self.vendor_id, fresh.vendor_id),
            (&mut self.product_id, fresh.product_id),
            (&mut self.serial_number, fresh.serial_number),
            (&mut self.bus_number, fresh.bus_number),
            (&mut self.usb_device_number, fresh.usb_device_number),
        ];
        for (current, value) in pairs {
            if !value.is_empty() {
                *current = value;
            }
        }
    }
}

/// Class-specific part of a descriptor, serialised under a `deviceType` tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "deviceType", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeviceDetails {
    Bluetooth,
    #[serde(rename_all = "camelCase")]
    Mtp {
        mount_path: String,
        is_mounted: bool,
        is_powered: bool,
    },
    #[serde(rename_all = "camelCase")]
    Sound {
        card_number: Option<u32>,
        card_id: String,
    },
}

impl DeviceDetails {
    pub fn device_class(&self) -> DeviceClass {
        match self {
            DeviceDetails::Bluetooth => DeviceClass::Bluetooth,
            DeviceDetails::Mtp { .. } => DeviceClass::Mtp,
            DeviceDetails::Sound { .. } => DeviceClass::Sound,
        }
    }
}

/// Plain-data copy of a device, safe to hand to subscribers after the device is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceDescriptor {
    pub device_num: u32,
    #[serde(flatten)]
    pub info: DeviceInfo,
    #[serde(flatten)]
    pub details: DeviceDetails,
}

impl DeviceDescriptor {
    pub fn device_class(&self) -> DeviceClass {
        self.details.device_class()
    }

    pub fn dev_path(&self) -> &str {
        &self.info.dev_path
    }
}
