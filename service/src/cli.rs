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
use clap::{Parser, ValueEnum};
use log::LevelFilter;
use pdm_core::PdmConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn to_level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Trace => LevelFilter::Trace,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Set the log level
    #[arg(short, long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Also write the log to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Directory for MTP mount points (overrides PDM_MOUNT_ROOT)
    #[arg(short, long)]
    pub mount_root: Option<PathBuf>,

    /// Replay add events for devices attached before start-up
    #[arg(long)]
    pub coldplug: bool,

    /// udevadm executable used for monitoring and coldplug
    #[arg(long, default_value = "udevadm")]
    pub udevadm: PathBuf,

    /// FUSE helper mounting an MTP device link
    #[arg(long, default_value = "simple-mtpfs")]
    pub mtp_helper: PathBuf,

    /// Helper unmounting a FUSE mount point
    #[arg(long, default_value = "fusermount")]
    pub unmount_helper: PathBuf,
}

impl Cli {
    pub fn config(&self) -> PdmConfig {
        let mut config = PdmConfig::from_env();
        if let Some(mount_root) = &self.mount_root {
            config.mount_root = mount_root.clone();
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_should_use_info_level_and_the_standard_helpers() {
        let cli = Cli::parse_from(["pdm_service"]);

        assert_eq!(cli.log_level, LogLevel::Info);
        assert!(!cli.coldplug);
        assert_eq!(cli.mtp_helper, PathBuf::from("simple-mtpfs"));
        assert_eq!(cli.unmount_helper, PathBuf::from("fusermount"));
    }

    #[test]
    fn mount_root_flag_should_override_the_configured_root() {
        let cli = Cli::parse_from(["pdm_service", "--mount-root", "/run/pdm", "-l", "debug", "--coldplug"]);

        assert_eq!(cli.config().mount_root, PathBuf::from("/run/pdm"));
        assert_eq!(cli.log_level.to_level_filter(), LevelFilter::Debug);
        assert!(cli.coldplug);
    }

    #[test]
    fn unknown_log_level_should_be_rejected() {
        assert!(Cli::try_parse_from(["pdm_service", "--log-level", "loud"]).is_err());
    }
}
