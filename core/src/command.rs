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

//! Command routing contract: what a command carries and what a handler answers.

use serde::Serialize;
use crate::device::DeviceClass;

pub const EJECT_COMMAND_ID: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandId {
    Eject,
    Unknown(u32),
}

impl From<u32> for CommandId {
    fn from(id: u32) -> Self {
        match id {
            EJECT_COMMAND_ID => CommandId::Eject,
            other => CommandId::Unknown(other),
        }
    }
}

impl From<CommandId> for u32 {
    fn from(id: CommandId) -> Self {
        match id {
            CommandId::Eject => EJECT_COMMAND_ID,
            CommandId::Unknown(other) => other,
        }
    }
}

/// A device-targeted command. `target` restricts routing to one device class;
/// `None` offers the command to every handler until one recognises it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    pub id: CommandId,
    pub device_num: u32,
    pub target: Option<DeviceClass>,
}

impl Command {
    pub fn new(id: impl Into<CommandId>, device_num: u32) -> Self {
        Self { id: id.into(), device_num, target: None }
    }

    pub fn eject(device_num: u32) -> Self {
        Self::new(CommandId::Eject, device_num)
    }

    pub fn with_target(mut self, target: DeviceClass) -> Self {
        self.target = Some(target);
        self
    }
}

/// Status codes reported back to command issuers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PdmStatus {
    Success,
    DeviceNotFound,
    MountFailed,
    UnmountFailed,
    OperationFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommandResponse {
    pub status: PdmStatus,
}

impl Default for CommandResponse {
    fn default() -> Self {
        Self { status: PdmStatus::DeviceNotFound }
    }
}
