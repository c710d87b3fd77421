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

//! Hotplug event record: an immutable attribute bag describing one kernel/udev occurrence.

use std::collections::BTreeMap;
use bitflags::bitflags;
use crate::classifier::{DeviceAction, UsbDeviceType};
use crate::errors::UEventError;

/// Attribute keys used by the handlers.
pub mod keys {
    pub const ACTION: &str = "ACTION";
    pub const DEVPATH: &str = "DEVPATH";
    pub const DEVTYPE: &str = "DEVTYPE";
    pub const SUBSYSTEM: &str = "SUBSYSTEM";
    pub const DEVLINKS: &str = "DEVLINKS";
    pub const ID_USB_INTERFACES: &str = "ID_USB_INTERFACES";
    pub const ID_BLUETOOTH: &str = "ID_BLUETOOTH";
    pub const ID_MEDIA_PLAYER: &str = "ID_MEDIA_PLAYER";
    pub const ID_VENDOR: &str = "ID_VENDOR";
    pub const ID_VENDOR_FROM_DATABASE: &str = "ID_VENDOR_FROM_DATABASE";
    pub const ID_MODEL: &str = "ID_MODEL";
    pub const ID_MODEL_FROM_DATABASE: &str = "ID_MODEL_FROM_DATABASE";
    pub const ID_VENDOR_ID: &str = "ID_VENDOR_ID";
    pub const ID_MODEL_ID: &str = "ID_MODEL_ID";
    pub const ID_SERIAL_SHORT: &str = "ID_SERIAL_SHORT";
    pub const ID_ID: &str = "ID_ID";
    pub const BUSNUM: &str = "BUSNUM";
    pub const DEVNUM: &str = "DEVNUM";
}

/// USB interface class code of audio functions.
const USB_CLASS_AUDIO: &str = "01";

bitflags! {
    /// Capability flags derived from udev's identification attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        const BLUETOOTH = 0b0001;
        const MEDIA_PLAYER = 0b0010;
        const AUDIO = 0b0100;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UEvent {
    attributes: BTreeMap<String, String>,
}

impl UEvent {
    pub fn builder() -> UEventBuilder {
        UEventBuilder::default()
    }

    /// Builds a record from `KEY=VALUE` lines, as printed by `udevadm monitor --property`.
    ///
    /// Lines without a `=` (monitor banners, the `UDEV [ts] action path` header) are skipped.
    pub fn from_properties<I, S>(lines: I) -> Result<Self, UEventError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut attributes = BTreeMap::new();
        for line in lines {
            if let Some((key, value)) = line.as_ref().trim().split_once('=') {
                if !key.is_empty() {
                    attributes.insert(key.to_string(), value.to_string());
                }
            }
        }
        Self::validated(attributes)
    }

    /// Decodes a kernel uevent datagram: `action@devpath\0KEY=VALUE\0...`.
    ///
    /// Messages re-broadcast by udev carry a binary `libudev` header and are rejected.
    pub fn from_netlink_bytes(buffer: &[u8]) -> Result<Self, UEventError> {
        let mut segments = buffer.split(|byte| *byte == 0).filter(|segment| !segment.is_empty());

        let header = segments.next().ok_or(UEventError::MissingHeader)?;
        let header = std::str::from_utf8(header).map_err(|_| UEventError::NotUtf8)?;
        if header.starts_with("libudev") {
            return Err(UEventError::Malformed("udev monitor messages are not kernel uevents".to_string()));
        }
        let (header_action, header_path) = header.split_once('@').ok_or(UEventError::MissingHeader)?;

        let mut attributes = BTreeMap::new();
        for segment in segments {
            let segment = std::str::from_utf8(segment).map_err(|_| UEventError::NotUtf8)?;
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| UEventError::Malformed(format!("attribute without value: {}", segment)))?;
            attributes.insert(key.to_string(), value.to_string());
        }
        attributes.entry(keys::ACTION.to_string()).or_insert_with(|| header_action.to_string());
        attributes.entry(keys::DEVPATH.to_string()).or_insert_with(|| header_path.to_string());

        Self::validated(attributes)
    }

    fn validated(attributes: BTreeMap<String, String>) -> Result<Self, UEventError> {
        for key in [keys::ACTION, keys::DEVPATH] {
            if attributes.get(key).map_or(true, |value| value.is_empty()) {
                return Err(UEventError::MissingAttribute(key));
            }
        }
        Ok(Self { attributes })
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Missing attributes read as an empty string.
    pub fn attribute_or_empty(&self, key: &str) -> &str {
        self.attribute(key).unwrap_or("")
    }

    pub fn raw_action(&self) -> &str {
        self.attribute_or_empty(keys::ACTION)
    }

    pub fn action(&self) -> DeviceAction {
        DeviceAction::classify(self.raw_action())
    }

    pub fn dev_type(&self) -> &str {
        self.attribute_or_empty(keys::DEVTYPE)
    }

    pub fn usb_device_type(&self) -> UsbDeviceType {
        UsbDeviceType::classify(self.dev_type())
    }

    pub fn dev_path(&self) -> &str {
        self.attribute_or_empty(keys::DEVPATH)
    }

    pub fn subsystem(&self) -> &str {
        self.attribute_or_empty(keys::SUBSYSTEM)
    }

    pub fn interface_class(&self) -> &str {
        self.attribute_or_empty(keys::ID_USB_INTERFACES)
    }

    /// Filesystem links the device node is exposed under; empty when the attribute is absent.
    pub fn dev_links(&self) -> Vec<&str> {
        self.attribute_or_empty(keys::DEVLINKS).split_whitespace().collect()
    }

    /// Whether any `:ccsspp:` triple of `ID_USB_INTERFACES` has the given class code.
    pub fn has_interface_class(&self, class_code: &str) -> bool {
        self.interface_class()
            .split(':')
            .filter_map(|triple| triple.get(..2))
            .any(|class| class.eq_ignore_ascii_case(class_code))
    }

    pub fn capabilities(&self) -> Capabilities {
        let mut capabilities = Capabilities::empty();
        if self.attribute(keys::ID_BLUETOOTH) == Some("1") {
            capabilities |= Capabilities::BLUETOOTH;
        }
        if self.attribute(keys::ID_MEDIA_PLAYER) == Some("yes") {
            capabilities |= Capabilities::MEDIA_PLAYER;
        }
        if self.has_interface_class(USB_CLASS_AUDIO) {
            capabilities |= Capabilities::AUDIO;
        }
        capabilities
    }
}

#[derive(Debug, Default)]
pub struct UEventBuilder {
    attributes: BTreeMap<String, String>,
}

impl UEventBuilder {
    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn action(self, action: &str) -> Self {
        self.attribute(keys::ACTION, action)
    }

    pub fn dev_path(self, dev_path: &str) -> Self {
        self.attribute(keys::DEVPATH, dev_path)
    }

    pub fn dev_type(self, dev_type: &str) -> Self {
        self.attribute(keys::DEVTYPE, dev_type)
    }

    pub fn subsystem(self, subsystem: &str) -> Self {
        self.attribute(keys::SUBSYSTEM, subsystem)
    }

    pub fn dev_links(self, links: &[&str]) -> Self {
        self.attribute(keys::DEVLINKS, links.join(" "))
    }

    /// Unlike the parsers, the builder does not insist on `ACTION`/`DEVPATH`.
    pub fn build(self) -> UEvent {
        UEvent { attributes: self.attributes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_netlink_bytes_should_decode_header_and_attributes() {
        let raw = b"add@/devices/pci0000:00/usb1/1-1\0ACTION=add\0DEVPATH=/devices/pci0000:00/usb1/1-1\0SUBSYSTEM=usb\0DEVTYPE=usb_device\0SEQNUM=2311\0";

        let event = UEvent::from_netlink_bytes(raw).unwrap();

        assert_eq!(event.action(), DeviceAction::Add);
        assert_eq!(event.dev_path(), "/devices/pci0000:00/usb1/1-1");
        assert_eq!(event.subsystem(), "usb");
        assert_eq!(event.usb_device_type(), UsbDeviceType::UsbDevice);
        assert_eq!(event.attribute("SEQNUM"), Some("2311"));
    }

    #[test]
    fn from_netlink_bytes_should_fill_action_and_path_from_header_when_attributes_are_absent() {
        let event = UEvent::from_netlink_bytes(b"remove@/devices/usb1/1-2\0SUBSYSTEM=usb\0").unwrap();

        assert_eq!(event.action(), DeviceAction::Remove);
        assert_eq!(event.dev_path(), "/devices/usb1/1-2");
    }

    #[test]
    fn from_netlink_bytes_should_reject_udev_monitor_messages_and_headerless_buffers() {
        assert!(matches!(
            UEvent::from_netlink_bytes(b"libudev\0\xfe\xed\xca\xfe"),
            Err(UEventError::Malformed(_))
        ));
        assert!(matches!(UEvent::from_netlink_bytes(b"ACTION=add\0"), Err(UEventError::MissingHeader)));
        assert!(matches!(UEvent::from_netlink_bytes(b""), Err(UEventError::MissingHeader)));
        assert!(matches!(
            UEvent::from_netlink_bytes(b"add@/devices/x\0\xff\xfe=1\0"),
            Err(UEventError::NotUtf8)
        ));
    }

    #[test]
    fn from_properties_should_skip_monitor_banner_lines() {
        let lines = [
            "UDEV  [1523.004112] add      /devices/usb1/1-1 (usb)",
            "ACTION=add",
            "DEVPATH=/devices/usb1/1-1",
            "DEVLINKS=/dev/libmtp-1-1 /dev/mtp/phone",
            "ID_MEDIA_PLAYER=yes",
        ];

        let event = UEvent::from_properties(lines).unwrap();

        assert_eq!(event.dev_links(), vec!["/dev/libmtp-1-1", "/dev/mtp/phone"]);
        assert!(event.capabilities().contains(Capabilities::MEDIA_PLAYER));
    }

    #[test]
    fn from_properties_should_require_action_and_device_path() {
        let missing_path = UEvent::from_properties(["ACTION=add", "SUBSYSTEM=usb"]);
        assert!(matches!(missing_path, Err(UEventError::MissingAttribute(keys::DEVPATH))));

        let empty_action = UEvent::from_properties(["ACTION=", "DEVPATH=/devices/usb1"]);
        assert!(matches!(empty_action, Err(UEventError::MissingAttribute(keys::ACTION))));
    }

    #[test]
    fn missing_attributes_should_read_as_empty_values() {
        let event = UEvent::builder().action("add").dev_path("/devices/usb1/1-1").build();

        assert_eq!(event.dev_type(), "");
        assert_eq!(event.subsystem(), "");
        assert!(event.dev_links().is_empty());
        assert_eq!(event.capabilities(), Capabilities::empty());
    }

    #[test]
    fn capabilities_should_follow_udev_identification_attributes() {
        let event = UEvent::builder()
            .attribute(keys::ID_BLUETOOTH, "1")
            .attribute(keys::ID_USB_INTERFACES, ":e00101:010100:010200:")
            .build();
        assert_eq!(event.capabilities(), Capabilities::BLUETOOTH | Capabilities::AUDIO);

        let not_audio = UEvent::builder()
            .attribute(keys::ID_USB_INTERFACES, ":0e0100:ff0101:")
            .attribute(keys::ID_MEDIA_PLAYER, "no")
            .build();
        assert_eq!(not_audio.capabilities(), Capabilities::empty());
    }
}
