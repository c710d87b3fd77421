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

//! Ordered, path-keyed collection of the devices one handler currently owns.

use crate::device::Device;
use crate::errors::RegistryError;

/// Insertion order is attachment order. At most one device per path; the registry is the
/// sole owner of its devices and drops each one exactly once (on removal by the caller or
/// when the registry itself is dropped).
pub struct DeviceRegistry<D: Device> {
    devices: Vec<D>,
}

impl<D: Device> Default for DeviceRegistry<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: Device> DeviceRegistry<D> {
    pub fn new() -> Self {
        Self { devices: Vec::new() }
    }

    pub fn find_by_path(&self, dev_path: &str) -> Option<&D> {
        self.devices.iter().find(|device| device.dev_path() == dev_path)
    }

    pub fn find_by_path_mut(&mut self, dev_path: &str) -> Option<&mut D> {
        self.devices.iter_mut().find(|device| device.dev_path() == dev_path)
    }

    pub fn find_by_num(&self, device_num: u32) -> Option<&D> {
        self.devices.iter().find(|device| device.device_num() == device_num)
    }

    pub fn find_by_num_mut(&mut self, device_num: u32) -> Option<&mut D> {
        self.devices.iter_mut().find(|device| device.device_num() == device_num)
    }

    /// Device whose path is a proper ancestor of `dev_path` (e.g. the USB device of a sound card).
    pub fn find_ancestor_of_mut(&mut self, dev_path: &str) -> Option<&mut D> {
        self.devices.iter_mut().find(|device| is_ancestor_path(device.dev_path(), dev_path))
    }

    pub fn contains_path(&self, dev_path: &str) -> bool {
        self.find_by_path(dev_path).is_some()
    }

    /// Rejects (and drops) a device whose path is already registered.
    pub fn insert(&mut self, device: D) -> Result<(), RegistryError> {
        if self.contains_path(device.dev_path()) {
            return Err(RegistryError::DuplicatePath(device.dev_path().to_string()));
        }
        self.devices.push(device);
        Ok(())
    }

    /// Scan-and-erase; ownership of the removed device moves to the caller.
    pub fn remove_by_path(&mut self, dev_path: &str) -> Option<D> {
        let index = self.devices.iter().position(|device| device.dev_path() == dev_path)?;
        Some(self.devices.remove(index))
    }

    /// Lowest ordinal not held by a live device, starting at 1.
    pub fn next_device_num(&self) -> u32 {
        self.next_device_num_where(|_| true)
    }

    /// Lowest ordinal not held by a live device for which `usable` also holds.
    pub fn next_device_num_where<F>(&self, usable: F) -> u32
    where
        F: Fn(u32) -> bool,
    {
        (1..)
            .find(|candidate| self.find_by_num(*candidate).is_none() && usable(*candidate))
            .unwrap_or(u32::MAX)
    }

    pub fn iter(&self) -> impl Iterator<Item = &D> {
        self.devices.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut D> {
        self.devices.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.devices.is_empty()
    }
}

fn is_ancestor_path(ancestor: &str, dev_path: &str) -> bool {
    dev_path
        .strip_prefix(ancestor)
        .is_some_and(|rest| rest.starts_with('/'))
}
