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

//! Device handler contract and the framework shared by every device-class handler.

use log::{debug, error};
use crate::command::{Command, CommandResponse};
use crate::device::{Device, DeviceClass, DeviceDescriptor};
use crate::notification::{EventType, Notifier};
use crate::power::PowerEvent;
use crate::query::QueryKind;
use crate::registry::DeviceRegistry;
use crate::uevent::UEvent;

pub mod bluetooth;
pub mod mtp;
pub mod sound;

pub use bluetooth::BluetoothDeviceHandler;
pub use mtp::MtpDeviceHandler;
pub use sound::SoundDeviceHandler;

/// One handler per device class. The handler registry offers every hotplug record to
/// `owns_event` and routes it to `process_event` of the first handler that claims it.
pub trait DeviceHandler: Send {
    fn device_class(&self) -> DeviceClass;

    fn name(&self) -> &'static str;

    /// Side-effect free ownership predicate.
    fn owns_event(&self, event: &UEvent) -> bool;

    fn process_event(&mut self, event: &UEvent);

    /// Returns whether the command id was recognised; a recognised command always writes
    /// `response`, also when the target device is not found.
    fn handle_command(&mut self, command: &Command, response: &mut CommandResponse) -> bool;

    /// Applies a power transition to every owned device and reports aggregate success.
    fn handle_power_event(&mut self, event: PowerEvent) -> bool;

    /// `None` when the handler does not answer this kind of list.
    fn query(&self, kind: QueryKind) -> Option<Vec<DeviceDescriptor>>;

    fn device_count(&self) -> usize;
}

/// Registry plus notification plumbing common to all handlers.
pub struct HandlerBase<D: Device> {
    device_class: DeviceClass,
    registry: DeviceRegistry<D>,
    notifier: Notifier,
}

impl<D: Device> HandlerBase<D> {
    pub fn new(device_class: DeviceClass, notifier: Notifier) -> Self {
        Self {
            device_class,
            registry: DeviceRegistry::new(),
            notifier,
        }
    }

    pub fn device_class(&self) -> DeviceClass {
        self.device_class
    }

    pub fn registry(&self) -> &DeviceRegistry<D> {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut DeviceRegistry<D> {
        &mut self.registry
    }

    pub fn notify(&self, action: EventType, device: Option<DeviceDescriptor>) {
        self.notifier.notify(self.device_class, action, device);
    }

    /// Mount-state changes go to every subscriber, not only this class's.
    pub fn notify_all(&self, action: EventType, device: Option<DeviceDescriptor>) {
        self.notifier.notify(DeviceClass::All, action, device);
    }

    pub fn notify_unknown(&self, action: EventType) {
        self.notifier.notify(DeviceClass::Unknown, action, None);
    }

    /// Re-describes an already registered device; `false` when the path is not registered.
    pub fn redescribe(&mut self, event: &UEvent) -> bool {
        match self.registry.find_by_path_mut(event.dev_path()) {
            Some(device) => {
                debug!("{} device {} already present, updating", self.device_class, event.dev_path());
                device.set_device_info(event);
                true
            }
            None => false,
        }
    }

    /// Registers a fully initialised device and announces it.
    pub fn add_device(&mut self, device: D) {
        let descriptor = device.descriptor();
        match self.registry.insert(device) {
            Ok(()) => self.notify(EventType::Add, Some(descriptor)),
            Err(e) => error!("Refusing to register {} device: {}", self.device_class, e),
        }
    }

    /// Runs `teardown` on the device registered under `dev_path`, then removes, releases and
    /// announces it. A path that is not registered yields an unknown-device removal.
    pub fn remove_device<F>(&mut self, dev_path: &str, teardown: F) -> bool
    where
        F: FnOnce(&mut D),
    {
        if !self.registry.contains_path(dev_path) {
            debug!("{} device {} is not registered", self.device_class, dev_path);
            self.notify_unknown(EventType::Remove);
            return false;
        }
        if let Some(device) = self.registry.find_by_path_mut(dev_path) {
            teardown(device);
        }

        let Some(device) = self.registry.remove_by_path(dev_path) else {
            return false;
        };
        let descriptor = device.descriptor();
        drop(device);
        self.notify(EventType::Remove, Some(descriptor));
        true
    }

    pub fn descriptors(&self) -> Vec<DeviceDescriptor> {
        self.registry.iter().map(Device::descriptor).collect()
    }

    pub fn device_count(&self) -> usize {
        self.registry.len()
    }
}
