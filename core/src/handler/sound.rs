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
use crate::classifier::{DeviceAction, UsbDeviceType};
use crate::command::{Command, CommandResponse};
use crate::device::sound::is_card_node;
use crate::device::{Device, DeviceClass, DeviceDescriptor, SoundDevice};
use crate::errors::HandlerRegistryError;
use crate::handler::{DeviceHandler, HandlerBase};
use crate::handler_registry::{FactoryTable, HandlerContext, HandlerFactory};
use crate::notification::EventType;
use crate::power::PowerEvent;
use crate::query::QueryKind;
use crate::uevent::{Capabilities, UEvent};

const HANDLER_NAME: &str = "SoundDeviceHandler";
const SOUND_SUBSYSTEM: &str = "sound";

/// USB audio devices. The USB device record creates the entity; records of the sound cards
/// it exposes refine that entity in place.
pub struct SoundDeviceHandler {
    base: HandlerBase<SoundDevice>,
}

impl SoundDeviceHandler {
    pub fn new(context: &HandlerContext) -> Self {
        Self {
            base: HandlerBase::new(DeviceClass::Sound, context.notifier.clone()),
        }
    }

    fn create(context: &HandlerContext) -> Box<dyn DeviceHandler> {
        Box::new(Self::new(context))
    }

    fn on_usb_event(&mut self, event: &UEvent) {
        if event.usb_device_type() != UsbDeviceType::UsbDevice {
            debug!("Ignoring sound {} record of type {:?}", event.raw_action(), event.usb_device_type());
            return;
        }
        match event.action() {
            DeviceAction::Add => {
                if !self.base.redescribe(event) {
                    let device_num = self.base.registry().next_device_num();
                    self.base.add_device(SoundDevice::new(device_num, event));
                }
            }
            DeviceAction::Remove => {
                self.base.remove_device(event.dev_path(), |_| {});
            }
            DeviceAction::Change => {
                let Some(device) = self.base.registry_mut().find_by_path_mut(event.dev_path()) else {
                    debug!("Change for unattached sound device {}", event.dev_path());
                    return;
                };
                let before = device.descriptor();
                device.update_device_info(event);
                let after = device.descriptor();
                if after != before {
                    self.base.notify(EventType::Change, Some(after));
                }
            }
            DeviceAction::Unknown => debug!("Ignoring {} for sound device {}", event.raw_action(), event.dev_path()),
        }
    }

    fn on_card_event(&mut self, event: &UEvent) {
        let Some(device) = self.base.registry_mut().find_ancestor_of_mut(event.dev_path()) else {
            debug!("Sound card {} does not belong to an attached device", event.dev_path());
            return;
        };
        let before = device.descriptor();
        match event.action() {
            DeviceAction::Add | DeviceAction::Change => device.update_device_info(event),
            DeviceAction::Remove if is_card_node(event.dev_path()) => device.clear_card(),
            DeviceAction::Remove | DeviceAction::Unknown => return,
        }
        let after = device.descriptor();
        if after != before {
            self.base.notify(EventType::Change, Some(after));
        }
    }
}

pub fn register(table: &mut FactoryTable) -> Result<(), HandlerRegistryError> {
    table.register(HandlerFactory::new(DeviceClass::Sound, HANDLER_NAME, SoundDeviceHandler::create))
}

impl DeviceHandler for SoundDeviceHandler {
    fn device_class(&self) -> DeviceClass {
        self.base.device_class()
    }

    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    fn owns_event(&self, event: &UEvent) -> bool {
        event.subsystem() == SOUND_SUBSYSTEM || event.capabilities().contains(Capabilities::AUDIO)
    }

    fn process_event(&mut self, event: &UEvent) {
        if event.subsystem() == SOUND_SUBSYSTEM {
            self.on_card_event(event);
        } else {
            self.on_usb_event(event);
        }
    }

    fn handle_command(&mut self, _command: &Command, _response: &mut CommandResponse) -> bool {
        false
    }

    fn handle_power_event(&mut self, _event: PowerEvent) -> bool {
        true
    }

    fn query(&self, kind: QueryKind) -> Option<Vec<DeviceDescriptor>> {
        match kind {
            QueryKind::DeviceStatus | QueryKind::NonStorageDeviceList | QueryKind::AudioDeviceList => {
                Some(self.base.descriptors())
            }
            QueryKind::StorageDeviceList => None,
        }
    }

    fn device_count(&self) -> usize {
        self.base.device_count()
    }
}
