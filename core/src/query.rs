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

//! Read-only projections of the registries into the external response format.

use serde_json::Value;
use crate::device::DeviceDescriptor;

/// Lists the handlers can be asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    /// Every attached device of every class.
    DeviceStatus,
    StorageDeviceList,
    NonStorageDeviceList,
    AudioDeviceList,
}

/// JSON array of descriptors; no attached devices gives `[]`.
pub fn descriptors_to_json(descriptors: &[DeviceDescriptor]) -> Value {
    serde_json::to_value(descriptors).unwrap_or_else(|_| Value::Array(Vec::new()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceDetails, DeviceInfo};

    fn descriptor(device_num: u32, dev_path: &str, details: DeviceDetails) -> DeviceDescriptor {
        DeviceDescriptor {
            device_num,
            info: DeviceInfo { dev_path: dev_path.to_string(), ..Default::default() },
            details,
        }
    }

    #[test]
    fn descriptors_to_json_should_give_an_empty_array_for_no_devices() {
        assert_eq!(descriptors_to_json(&[]), serde_json::json!([]));
    }

    #[test]
    fn descriptors_to_json_should_keep_registry_order_and_tag_each_device_type() {
        let descriptors = [
            descriptor(1, "/devices/usb1/1-4", DeviceDetails::Bluetooth),
            descriptor(2, "/devices/usb1/1-2", DeviceDetails::Sound { card_number: Some(1), card_id: "usb-Audio".to_string() }),
        ];

        let json = descriptors_to_json(&descriptors);

        assert_eq!(json.as_array().map(Vec::len), Some(2));
        assert_eq!(json[0]["deviceNum"], 1);
        assert_eq!(json[0]["deviceType"], "BLUETOOTH");
        assert_eq!(json[0]["devPath"], "/devices/usb1/1-4");
        assert_eq!(json[1]["deviceNum"], 2);
        assert_eq!(json[1]["deviceType"], "SOUND");
        assert_eq!(json[1]["cardNumber"], 1);
    }
}
