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

//! Pump from a hotplug record source into the device manager loop.

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use log::{debug, info, warn};
use tokio::select;
use crate::errors::UEventError;
use crate::pdm_service::PdmClient;
use crate::service::{spawn_service, ServiceHandle};
use crate::uevent::UEvent;

/// Producer of decoded hotplug records. `None` means the source is exhausted.
#[async_trait]
pub trait HotplugSource: Send {
    async fn next_event(&mut self) -> Option<Result<UEvent, UEventError>>;
}

/// Adapts any stream of decoded records.
pub struct StreamSource<S> {
    stream: S,
}

impl<S> StreamSource<S> {
    pub fn new(stream: S) -> Self {
        Self { stream }
    }
}

#[async_trait]
impl<S> HotplugSource for StreamSource<S>
where
    S: Stream<Item = Result<UEvent, UEventError>> + Send + Unpin,
{
    async fn next_event(&mut self) -> Option<Result<UEvent, UEventError>> {
        self.stream.next().await
    }
}

/// Forwards records until the source ends, the device manager stops, or shutdown is
/// requested. Malformed records are logged and skipped.
pub fn run_hotplug_watch<S>(mut source: S, client: PdmClient) -> ServiceHandle
where
    S: HotplugSource + 'static,
{
    spawn_service(move |mut stop| async move {
        loop {
            select! {
                biased;
                _ = stop.signaled() => {
                    debug!("Shutdown requested, stopping hotplug watch");
                    break;
                }
                next = source.next_event() => match next {
                    Some(Ok(event)) => {
                        if client.submit_event(event).await.is_err() {
                            info!("Device manager stopped, ending hotplug watch");
                            break;
                        }
                    }
                    Some(Err(e)) => warn!("Skipping malformed hotplug record: {}", e),
                    None => {
                        info!("Hotplug source ended");
                        break;
                    }
                }
            }
        }
    })
}
