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

//! Single-writer service loop. One task owns the handler registry; every hotplug record,
//! command, power event and query reaches it as a message on one queue and is applied to
//! completion before the next one is taken.

use log::{debug, info, warn};
use tokio::runtime::{Handle, RuntimeFlavor};
use tokio::select;
use tokio::sync::{mpsc, oneshot};
use crate::command::{Command, CommandResponse};
use crate::device::DeviceDescriptor;
use crate::errors::ServiceError;
use crate::handler_registry::HandlerRegistry;
use crate::power::PowerEvent;
use crate::query::QueryKind;
use crate::service::{spawn_service, ServiceHandle, StopHandle};
use crate::uevent::UEvent;

enum Request {
    Event(UEvent),
    Command(Command, oneshot::Sender<CommandOutcome>),
    Power(PowerEvent, oneshot::Sender<bool>),
    Query(QueryKind, oneshot::Sender<Vec<DeviceDescriptor>>),
    DeviceCount(oneshot::Sender<usize>),
}

/// What the handlers made of a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Whether any handler recognised the command id.
    pub handled: bool,
    pub response: CommandResponse,
}

/// Cheap-to-clone front end of the service loop.
#[derive(Clone)]
pub struct PdmClient {
    requests: mpsc::Sender<Request>,
}

impl PdmClient {
    async fn send(&self, request: Request) -> Result<(), ServiceError> {
        self.requests.send(request).await.map_err(|_| ServiceError::Stopped)
    }

    async fn call<T>(&self, request: impl FnOnce(oneshot::Sender<T>) -> Request) -> Result<T, ServiceError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(request(reply_tx)).await?;
        reply_rx.await.map_err(|_| ServiceError::Stopped)
    }

    /// Queues a hotplug record. Records are applied in submission order.
    pub async fn submit_event(&self, event: UEvent) -> Result<(), ServiceError> {
        self.send(Request::Event(event)).await
    }

    pub async fn command(&self, command: Command) -> Result<CommandOutcome, ServiceError> {
        self.call(|reply| Request::Command(command, reply)).await
    }

    pub async fn power_event(&self, event: PowerEvent) -> Result<bool, ServiceError> {
        self.call(|reply| Request::Power(event, reply)).await
    }

    pub async fn query(&self, kind: QueryKind) -> Result<Vec<DeviceDescriptor>, ServiceError> {
        self.call(|reply| Request::Query(kind, reply)).await
    }

    pub async fn device_count(&self) -> Result<usize, ServiceError> {
        self.call(Request::DeviceCount).await
    }
}

pub struct PdmService {
    registry: HandlerRegistry,
}

/// Runs work that may wait on mount helpers without stalling the other tasks of a
/// multi-thread runtime. A current-thread runtime has no other worker, so it runs inline.
fn run_blocking<T>(work: impl FnOnce() -> T) -> T {
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => tokio::task::block_in_place(work),
        _ => work(),
    }
}

impl PdmService {
    /// Moves `registry` into a new service task. The loop ends on a stop request or once
    /// every client is dropped; it then unmounts everything and releases all devices.
    pub fn spawn(registry: HandlerRegistry, queue_capacity: usize) -> (PdmClient, ServiceHandle) {
        let (requests, rx) = mpsc::channel(queue_capacity.max(1));
        let service = Self { registry };
        let handle = spawn_service(move |stop| service.run(rx, stop));
        (PdmClient { requests }, handle)
    }

    async fn run(mut self, mut rx: mpsc::Receiver<Request>, mut stop: StopHandle) {
        info!("Device manager started with handlers {:?}", self.registry.handler_classes());
        loop {
            select! {
                biased;
                _ = stop.signaled() => {
                    info!("Device manager shutdown requested");
                    break;
                }
                request = rx.recv() => match request {
                    Some(request) => self.apply(request),
                    None => {
                        debug!("All device manager clients dropped");
                        break;
                    }
                }
            }
        }
        self.shutdown();
    }

    fn apply(&mut self, request: Request) {
        match request {
            Request::Event(event) => {
                run_blocking(|| self.registry.dispatch_event(&event));
            }
            Request::Command(command, reply) => {
                let mut response = CommandResponse::default();
                let handled = run_blocking(|| self.registry.dispatch_command(&command, &mut response));
                let _ = reply.send(CommandOutcome { handled, response });
            }
            Request::Power(event, reply) => {
                info!("Applying power event {:?}", event);
                let _ = reply.send(run_blocking(|| self.registry.broadcast_power_event(event)));
            }
            Request::Query(kind, reply) => {
                let _ = reply.send(self.registry.query(kind));
            }
            Request::DeviceCount(reply) => {
                let _ = reply.send(self.registry.device_count());
            }
        }
    }

    fn shutdown(mut self) {
        if !run_blocking(|| self.registry.broadcast_power_event(PowerEvent::UnmountAllRequest)) {
            warn!("Some devices could not be unmounted on shutdown");
        }
        self.registry.shutdown();
        info!("Device manager stopped");
    }
}
