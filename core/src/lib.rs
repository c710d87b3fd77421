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

pub mod classifier;
pub mod command;
pub mod config;
pub mod device;
pub mod errors;
pub mod handler;
pub mod handler_registry;
pub mod hotplug_watch;
pub mod mount;
pub mod notification;
pub mod pdm_service;
pub mod power;
pub mod query;
pub mod registry;
pub mod service;
pub mod uevent;

#[cfg(test)]
mod test_support;

pub use classifier::{DeviceAction, UsbDeviceType};
pub use command::{Command, CommandId, CommandResponse, PdmStatus};
pub use config::PdmConfig;
pub use device::{Device, DeviceClass, DeviceDescriptor};
pub use handler::DeviceHandler;
pub use handler_registry::{default_factories, FactoryTable, HandlerContext, HandlerFactory, HandlerRegistry};
pub use hotplug_watch::{run_hotplug_watch, HotplugSource, StreamSource};
pub use mount::Mounter;
pub use notification::{DeviceNotification, EventType, Notifier};
pub use pdm_service::{CommandOutcome, PdmClient, PdmService};
pub use power::PowerEvent;
pub use query::{descriptors_to_json, QueryKind};
pub use service::{spawn_service, MultiServiceHandle, ServiceHandle, StopHandle};
pub use uevent::UEvent;
