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
use crate::classifier::DeviceAction;
use crate::command::{Command, CommandResponse};
use crate::device::{BluetoothDevice, DeviceClass, DeviceDescriptor};
use crate::errors::HandlerRegistryError;
use crate::handler::{DeviceHandler, HandlerBase};
use crate::handler_registry::{FactoryTable, HandlerContext, HandlerFactory};
use crate::power::PowerEvent;
use crate::query::QueryKind;
use crate::uevent::{Capabilities, UEvent};

const HANDLER_NAME: &str = "BluetoothDeviceHandler";

pub struct BluetoothDeviceHandler {
    base: HandlerBase<BluetoothDevice>,
}

impl BluetoothDeviceHandler {
    pub fn new(context: &HandlerContext) -> Self {
        Self {
            base: HandlerBase::new(DeviceClass::Bluetooth, context.notifier.clone()),
        }
    }

    fn create(context: &HandlerContext) -> Box<dyn DeviceHandler> {
        Box::new(Self::new(context))
    }

    fn on_add(&mut self, event: &UEvent) {
        if self.base.redescribe(event) {
            return;
        }
        let device_num = self.base.registry().next_device_num();
        self.base.add_device(BluetoothDevice::new(device_num, event));
    }
}

pub fn register(table: &mut FactoryTable) -> Result<(), HandlerRegistryError> {
    table.register(HandlerFactory::new(DeviceClass::Bluetooth, HANDLER_NAME, BluetoothDeviceHandler::create))
}

impl DeviceHandler for BluetoothDeviceHandler {
    fn device_class(&self) -> DeviceClass {
        self.base.device_class()
    }

    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    fn owns_event(&self, event: &UEvent) -> bool {
        event.capabilities().contains(Capabilities::BLUETOOTH)
    }

    fn process_event(&mut self, event: &UEvent) {
        match event.action() {
            DeviceAction::Add => self.on_add(event),
            DeviceAction::Remove => {
                self.base.remove_device(event.dev_path(), |_| {});
            }
            DeviceAction::Change | DeviceAction::Unknown => {
                debug!("Ignoring {} for bluetooth device {}", event.raw_action(), event.dev_path());
            }
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
            QueryKind::DeviceStatus | QueryKind::NonStorageDeviceList => Some(self.base.descriptors()),
            QueryKind::StorageDeviceList | QueryKind::AudioDeviceList => None,
        }
    }

    fn device_count(&self) -> usize {
        self.base.device_count()
    }
}
