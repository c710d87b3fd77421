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

use crate::device::{Device, DeviceClass, DeviceDescriptor, DeviceDetails, DeviceInfo};
use crate::uevent::UEvent;

/// USB Bluetooth adapter. Carries identity and descriptive attributes only.
#[derive(Debug)]
pub struct BluetoothDevice {
    device_num: u32,
    info: DeviceInfo,
}

impl BluetoothDevice {
    pub fn new(device_num: u32, event: &UEvent) -> Self {
        Self {
            device_num,
            info: DeviceInfo::from_event(event),
        }
    }
}

impl Device for BluetoothDevice {
    fn dev_path(&self) -> &str {
        &self.info.dev_path
    }

    fn device_num(&self) -> u32 {
        self.device_num
    }

    fn device_class(&self) -> DeviceClass {
        DeviceClass::Bluetooth
    }

    fn set_device_info(&mut self, event: &UEvent) {
        self.info.refresh(event);
    }

    fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            device_num: self.device_num,
            info: self.info.clone(),
            details: DeviceDetails::Bluetooth,
        }
    }
}
