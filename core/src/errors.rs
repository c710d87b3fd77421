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

use std::io;
use std::path::PathBuf;
use thiserror::Error;
use crate::device::DeviceClass;

#[derive(Error, Debug)]
pub enum UEventError {
    #[error("Record header is missing the action@devpath prefix")]
    MissingHeader,

    #[error("Record is not valid UTF-8")]
    NotUtf8,

    #[error("Record is missing mandatory attribute {0}")]
    MissingAttribute(&'static str),

    #[error("Malformed record: {0}")]
    Malformed(String),
}

#[derive(Error, Debug)]
pub enum MountError {
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),

    #[error("Mount helper for {target} exited with status {status}: {stderr}")]
    HelperFailed {
        target: PathBuf,
        status: i32,
        stderr: String,
    },

    #[error("No source device link to mount")]
    NoSource,

    #[error("Other error: {0}")]
    OtherError(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Device with path {0} is already registered")]
    DuplicatePath(String),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum HandlerRegistryError {
    #[error("A handler factory for {0} devices is already registered")]
    DuplicateClass(DeviceClass),

    #[error("No handler factories registered")]
    NoFactories,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Device manager is not running")]
    Stopped,
}
