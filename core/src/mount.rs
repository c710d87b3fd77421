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

//! Boundary to the mount/unmount collaborator used by storage-capable device classes.

use std::path::Path;
use crate::errors::MountError;

/// Blocking mount operations. Timeouts and retries, if any, belong to the implementation.
pub trait Mounter: Send + Sync {
    fn mount(&self, source: &str, target: &Path) -> Result<(), MountError>;

    fn unmount(&self, target: &Path) -> Result<(), MountError>;
}
