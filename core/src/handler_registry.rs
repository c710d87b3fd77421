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

//! Process-wide table of device-class handlers.
//!
//! Each handler module contributes its factory through an explicit `register` call; the
//! table is complete before the first handler is constructed, so no factory may rely on
//! another class's handler.

use std::sync::Arc;
use log::{debug, info, warn};
use crate::command::{Command, CommandResponse};
use crate::config::PdmConfig;
use crate::device::{DeviceClass, DeviceDescriptor};
use crate::errors::HandlerRegistryError;
use crate::handler::{self, DeviceHandler};
use crate::mount::Mounter;
use crate::notification::Notifier;
use crate::power::PowerEvent;
use crate::query::QueryKind;
use crate::uevent::UEvent;

/// Collaborators handed to every handler at construction.
#[derive(Clone)]
pub struct HandlerContext {
    pub config: PdmConfig,
    pub mounter: Arc<dyn Mounter>,
    pub notifier: Notifier,
}

impl HandlerContext {
    pub fn new(config: PdmConfig, mounter: Arc<dyn Mounter>) -> Self {
        let notifier = Notifier::new(config.notification_capacity);
        Self { config, mounter, notifier }
    }
}

pub type HandlerCreateFn = fn(&HandlerContext) -> Box<dyn DeviceHandler>;

#[derive(Clone, Copy)]
pub struct HandlerFactory {
    pub device_class: DeviceClass,
    pub name: &'static str,
    create: HandlerCreateFn,
}

impl HandlerFactory {
    pub fn new(device_class: DeviceClass, name: &'static str, create: HandlerCreateFn) -> Self {
        Self { device_class, name, create }
    }

    pub fn create(&self, context: &HandlerContext) -> Box<dyn DeviceHandler> {
        (self.create)(context)
    }
}

/// Registration order is dispatch order.
#[derive(Default)]
pub struct FactoryTable {
    factories: Vec<HandlerFactory>,
}

impl FactoryTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, factory: HandlerFactory) -> Result<(), HandlerRegistryError> {
        if self.factories.iter().any(|f| f.device_class == factory.device_class) {
            return Err(HandlerRegistryError::DuplicateClass(factory.device_class));
        }
        debug!("Registered handler factory {} for {} devices", factory.name, factory.device_class);
        self.factories.push(factory);
        Ok(())
    }

    pub fn iter(&self) -> impl Iterator<Item = &HandlerFactory> {
        self.factories.iter()
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Every device class compiled into the service.
pub fn default_factories() -> Result<FactoryTable, HandlerRegistryError> {
    let mut table = FactoryTable::new();
    handler::bluetooth::register(&mut table)?;
    handler::mtp::register(&mut table)?;
    handler::sound::register(&mut table)?;
    Ok(table)
}

/// Owns exactly one handler per registered device class for the lifetime of the service.
pub struct HandlerRegistry {
    handlers: Vec<Box<dyn DeviceHandler>>,
}

impl HandlerRegistry {
    pub fn new(table: &FactoryTable, context: &HandlerContext) -> Result<Self, HandlerRegistryError> {
        if table.is_empty() {
            return Err(HandlerRegistryError::NoFactories);
        }
        let handlers = table
            .iter()
            .map(|factory| {
                debug!("Creating {}", factory.name);
                factory.create(context)
            })
            .collect();
        Ok(Self { handlers })
    }

    pub fn with_default_handlers(context: &HandlerContext) -> Result<Self, HandlerRegistryError> {
        Self::new(&default_factories()?, context)
    }

    pub fn handler_classes(&self) -> Vec<DeviceClass> {
        self.handlers.iter().map(|handler| handler.device_class()).collect()
    }

    /// Offers the record to each handler in turn; the first one claiming it processes it.
    /// Returns the class of the claiming handler.
    pub fn dispatch_event(&mut self, event: &UEvent) -> Option<DeviceClass> {
        if event.dev_path().is_empty() {
            warn!("Ignoring {} event without a device path", event.raw_action());
            return None;
        }
        let handler = self.handlers.iter_mut().find(|handler| handler.owns_event(event))?;
        debug!("{} claimed {} {}", handler.name(), event.raw_action(), event.dev_path());
        handler.process_event(event);
        Some(handler.device_class())
    }

    /// A targeted command goes to its class's handler only; a broadcast one to each handler
    /// until one recognises it.
    pub fn dispatch_command(&mut self, command: &Command, response: &mut CommandResponse) -> bool {
        let handled = self
            .handlers
            .iter_mut()
            .filter(|handler| command.target.map_or(true, |target| handler.device_class() == target))
            .any(|handler| handler.handle_command(command, response));
        if !handled {
            debug!("No handler recognised command {:?}", command.id);
        }
        handled
    }

    /// Every handler sees the event, whatever the others report.
    pub fn broadcast_power_event(&mut self, event: PowerEvent) -> bool {
        let mut all_succeeded = true;
        for handler in self.handlers.iter_mut() {
            if !handler.handle_power_event(event) {
                warn!("{} failed to apply {:?}", handler.name(), event);
                all_succeeded = false;
            }
        }
        all_succeeded
    }

    /// Concatenation of the answering handlers' lists, each in attachment order.
    pub fn query(&self, kind: QueryKind) -> Vec<DeviceDescriptor> {
        self.handlers
            .iter()
            .filter_map(|handler| handler.query(kind))
            .flatten()
            .collect()
    }

    pub fn device_count(&self) -> usize {
        self.handlers.iter().map(|handler| handler.device_count()).sum()
    }

    /// Destroys every handler, releasing every device it still owns.
    pub fn shutdown(self) {
        info!("Releasing {} devices held by {} handlers", self.device_count(), self.handlers.len());
        drop(self);
    }
}
