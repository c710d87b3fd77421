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

//! Lookup tables turning raw hotplug attribute strings into closed enumerations.
//!
//! Anything the tables do not know maps to a sentinel (`Unknown` / `Unhandled`) which every
//! handler treats as "take no action".

/// Classified `ACTION` attribute of a hotplug record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceAction {
    Add,
    Remove,
    Change,
    Unknown,
}

const DEVICE_ACTIONS: [(&str, DeviceAction); 3] = [
    ("add", DeviceAction::Add),
    ("remove", DeviceAction::Remove),
    ("change", DeviceAction::Change),
];

impl DeviceAction {
    pub fn classify(raw: &str) -> Self {
        DEVICE_ACTIONS
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, action)| *action)
            .unwrap_or(DeviceAction::Unknown)
    }
}

/// Classified `DEVTYPE` attribute of a hotplug record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsbDeviceType {
    UsbDevice,
    UsbInterface,
    Disk,
    Partition,
    Unhandled,
}

const USB_DEVICE_TYPES: [(&str, UsbDeviceType); 4] = [
    ("usb_device", UsbDeviceType::UsbDevice),
    ("usb_interface", UsbDeviceType::UsbInterface),
    ("disk", UsbDeviceType::Disk),
    ("partition", UsbDeviceType::Partition),
];

impl UsbDeviceType {
    pub fn classify(raw: &str) -> Self {
        USB_DEVICE_TYPES
            .iter()
            .find(|(name, _)| *name == raw)
            .map(|(_, device_type)| *device_type)
            .unwrap_or(UsbDeviceType::Unhandled)
    }
}
