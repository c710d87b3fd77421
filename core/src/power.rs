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

/// Host power-state transitions propagated to every handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerEvent {
    SuspendRequest,
    PrepareResume,
    UnmountAllRequest,
    PrepareSuspend,
}

impl PowerEvent {
    /// Both an explicit request and an imminent suspend unmount everything.
    pub fn unmounts_all(&self) -> bool {
        matches!(self, PowerEvent::UnmountAllRequest | PowerEvent::PrepareSuspend)
    }
}
