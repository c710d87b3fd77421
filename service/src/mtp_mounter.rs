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

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Command;
use log::{debug, info};
use pdm_core::errors::MountError;
use pdm_core::Mounter;

/// Mounts MTP device links through external FUSE helpers, creating and removing the
/// mount point directories around them.
pub struct CommandMounter {
    mtp_helper: PathBuf,
    unmount_helper: PathBuf,
}

impl CommandMounter {
    pub fn new(mtp_helper: impl Into<PathBuf>, unmount_helper: impl Into<PathBuf>) -> Self {
        Self {
            mtp_helper: mtp_helper.into(),
            unmount_helper: unmount_helper.into(),
        }
    }

    fn run_helper(&self, program: &Path, args: &[&OsStr], target: &Path) -> Result<(), MountError> {
        debug!("Running {} {:?}", program.display(), args);
        let output = Command::new(program).args(args).output()?;
        if output.status.success() {
            return Ok(());
        }
        Err(MountError::HelperFailed {
            target: target.to_path_buf(),
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

fn remove_mount_point(target: &Path) {
    if let Err(e) = std::fs::remove_dir(target) {
        debug!("Mount point {} not removed: {}", target.display(), e);
    }
}

impl Mounter for CommandMounter {
    fn mount(&self, source: &str, target: &Path) -> Result<(), MountError> {
        if source.is_empty() {
            return Err(MountError::NoSource);
        }
        std::fs::create_dir_all(target)?;
        let result = self.run_helper(&self.mtp_helper, &[OsStr::new(source), target.as_os_str()], target);
        match &result {
            Ok(()) => info!("Mounted {} at {}", source, target.display()),
            Err(_) => remove_mount_point(target),
        }
        result
    }

    fn unmount(&self, target: &Path) -> Result<(), MountError> {
        self.run_helper(&self.unmount_helper, &[OsStr::new("-u"), target.as_os_str()], target)?;
        remove_mount_point(target);
        Ok(())
    }
}
