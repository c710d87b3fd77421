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

use std::path::PathBuf;

pub const MOUNT_ROOT_ENV: &str = "PDM_MOUNT_ROOT";
const DEFAULT_MOUNT_ROOT: &str = "/tmp/usb";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdmConfig {
    /// Directory under which storage-capable devices get their mount points.
    pub mount_root: PathBuf,
    /// Depth of the notification broadcast channel.
    pub notification_capacity: usize,
    /// Depth of the device manager's request queue.
    pub request_queue_capacity: usize,
}

impl Default for PdmConfig {
    fn default() -> Self {
        Self {
            mount_root: PathBuf::from(DEFAULT_MOUNT_ROOT),
            notification_capacity: 100,
            request_queue_capacity: 64,
        }
    }
}

impl PdmConfig {
    /// Defaults, with the mount root taken from `PDM_MOUNT_ROOT` when it is set and non-empty.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(mount_root) = std::env::var(MOUNT_ROOT_ENV) {
            if !mount_root.trim().is_empty() {
                config.mount_root = PathBuf::from(mount_root);
            }
        }
        config
    }
}
