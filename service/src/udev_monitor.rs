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

use std::path::Path;
use std::process::Stdio;
use async_trait::async_trait;
use log::{debug, info, warn};
use pdm_core::errors::UEventError;
use pdm_core::{HotplugSource, UEvent};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tokio::process::{Child, ChildStdout, Command};

const SUBSYSTEM_FILTERS: [&str; 2] = ["--subsystem-match=usb", "--subsystem-match=sound"];

/// Splits `udevadm monitor --property` output into records. Records are separated by blank
/// lines; blocks without a single `KEY=VALUE` line (the monitor banner) are skipped.
pub struct PropertyBlocks<R> {
    lines: Lines<R>,
}

impl<R: AsyncBufRead + Unpin> PropertyBlocks<R> {
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }

    pub async fn next_block(&mut self) -> Option<Result<UEvent, UEventError>> {
        let mut block: Vec<String> = Vec::new();
        loop {
            match self.lines.next_line().await {
                Ok(Some(line)) if line.trim().is_empty() => {
                    if !block.is_empty() {
                        return Some(UEvent::from_properties(block));
                    }
                }
                Ok(Some(line)) => {
                    if line.contains('=') {
                        block.push(line);
                    }
                }
                Ok(None) => {
                    return (!block.is_empty()).then(|| UEvent::from_properties(block));
                }
                Err(e) => {
                    warn!("Failed to read udev monitor output: {}", e);
                    return None;
                }
            }
        }
    }
}

/// Hotplug source backed by a `udevadm monitor` child process.
pub struct UdevadmMonitor {
    _child: Child,
    blocks: PropertyBlocks<BufReader<ChildStdout>>,
}

impl UdevadmMonitor {
    pub fn spawn(udevadm: &Path) -> anyhow::Result<Self> {
        let mut child = Command::new(udevadm)
            .args(["monitor", "--udev", "--property"])
            .args(SUBSYSTEM_FILTERS)
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| anyhow::anyhow!("udevadm monitor has no stdout"))?;
        info!("Listening for udev events via {}", udevadm.display());
        Ok(Self { _child: child, blocks: PropertyBlocks::new(BufReader::new(stdout)) })
    }
}

#[async_trait]
impl HotplugSource for UdevadmMonitor {
    async fn next_event(&mut self) -> Option<Result<UEvent, UEventError>> {
        self.blocks.next_block().await
    }
}

/// Asks udev to replay add events for devices attached before the monitor started.
pub async fn trigger_coldplug(udevadm: &Path) -> anyhow::Result<()> {
    let status = Command::new(udevadm)
        .args(["trigger", "--action=add"])
        .args(SUBSYSTEM_FILTERS)
        .status()
        .await?;
    if !status.success() {
        anyhow::bail!("udevadm trigger exited with {}", status);
    }
    debug!("Coldplug triggered");
    Ok(())
}
