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

use log::debug;
use crate::device::{Device, DeviceClass, DeviceDescriptor, DeviceDetails, DeviceInfo};
use crate::uevent::{keys, UEvent};

/// USB audio device. Sound-card records below the device path refine it in place.
#[derive(Debug)]
pub struct SoundDevice {
    device_num: u32,
    info: DeviceInfo,
    card_number: Option<u32>,
    card_id: String,
}

/// Extracts `N` from a `cardN` path segment, e.g. `/devices/.../sound/card1/controlC1`.
fn parse_card_number(dev_path: &str) -> Option<u32> {
    dev_path
        .split('/')
        .filter_map(|segment| segment.strip_prefix("card"))
        .find_map(|number| number.parse().ok())
}

/// Whether the record is the `cardN` node itself rather than one of its control/PCM nodes.
pub fn is_card_node(dev_path: &str) -> bool {
    dev_path
        .rsplit('/')
        .next()
        .and_then(|segment| segment.strip_prefix("card"))
        .is_some_and(|number| number.parse::<u32>().is_ok())
}

impl SoundDevice {
    pub fn new(device_num: u32, event: &UEvent) -> Self {
        let mut device = Self {
            device_num,
            info: DeviceInfo::from_event(event),
            card_number: None,
            card_id: String::new(),
        };
        device.update_card(event);
        device
    }

    /// Applies a later record in place: card records update the card, others the attributes.
    pub fn update_device_info(&mut self, event: &UEvent) {
        if event.subsystem() == "sound" {
            self.update_card(event);
        } else {
            self.info.refresh(event);
        }
    }

    /// The card went away while the USB device is still attached.
    pub fn clear_card(&mut self) {
        self.card_number = None;
        self.card_id.clear();
    }

    pub fn card_number(&self) -> Option<u32> {
        self.card_number
    }

    fn update_card(&mut self, event: &UEvent) {
        if let Some(card_number) = parse_card_number(event.dev_path()) {
            debug!("Sound device {} bound to card {}", self.info.dev_path, card_number);
            self.card_number = Some(card_number);
        }
        if let Some(card_id) = event.attribute(keys::ID_ID).filter(|id| !id.is_empty()) {
            self.card_id = card_id.to_string();
        }
    }
}

impl Device for SoundDevice {
    fn dev_path(&self) -> &str {
        &self.info.dev_path
    }

    fn device_num(&self) -> u32 {
        self.device_num
    }

    fn device_class(&self) -> DeviceClass {
        DeviceClass::Sound
    }

    fn set_device_info(&mut self, event: &UEvent) {
        self.update_device_info(event);
    }

    fn descriptor(&self) -> DeviceDescriptor {
        DeviceDescriptor {
            device_num: self.device_num,
            info: self.info.clone(),
            details: DeviceDetails::Sound {
                card_number: self.card_number,
                card_id: self.card_id.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_card_number_should_find_the_card_segment_anywhere_in_the_path() {
        assert_eq!(parse_card_number("/devices/usb1/1-1/1-1:1.0/sound/card2"), Some(2));
        assert_eq!(parse_card_number("/devices/usb1/1-1/1-1:1.0/sound/card10/controlC10"), Some(10));
        assert_eq!(parse_card_number("/devices/usb1/1-1"), None);
        assert_eq!(parse_card_number("/devices/cardreader/1-1"), None);
    }

    #[test]
    fn is_card_node_should_accept_only_the_card_itself() {
        assert!(is_card_node("/devices/usb1/1-1/1-1:1.0/sound/card1"));
        assert!(!is_card_node("/devices/usb1/1-1/1-1:1.0/sound/card1/controlC1"));
        assert!(!is_card_node("/devices/usb1/1-1/1-1:1.0/sound/card1/pcmC1D0p"));
        assert!(!is_card_node("/devices/usb1/1-1/cardreader"));
    }

    #[test]
    fn update_device_info_should_route_card_records_to_the_card_and_keep_the_device_path() {
        let usb = UEvent::builder().action("add").dev_path("/devices/usb1/1-3").dev_type("usb_device").build();
        let mut device = SoundDevice::new(1, &usb);
        assert_eq!(device.card_number(), None);

        let card = UEvent::builder()
            .action("change")
            .dev_path("/devices/usb1/1-3/1-3:1.0/sound/card1")
            .subsystem("sound")
            .attribute(keys::ID_ID, "usb-Generic_USB_Audio-00")
            .build();
        device.update_device_info(&card);

        let descriptor = device.descriptor();
        assert_eq!(descriptor.dev_path(), "/devices/usb1/1-3");
        assert_eq!(
            descriptor.details,
            DeviceDetails::Sound { card_number: Some(1), card_id: "usb-Generic_USB_Audio-00".to_string() }
        );

        device.clear_card();
        assert_eq!(device.card_number(), None);
    }
}
