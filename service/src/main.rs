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

mod cli;
mod logger;
mod mtp_mounter;
mod udev_monitor;

use std::sync::Arc;
use clap::Parser;
use log::{debug, error, info, warn};
use pdm_core::{
    run_hotplug_watch, spawn_service, DeviceNotification, HandlerContext, HandlerRegistry, MultiServiceHandle,
    PdmService, ServiceHandle,
};
use tokio::select;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::broadcast;
use crate::cli::Cli;
use crate::logger::init_logger;
use crate::mtp_mounter::CommandMounter;
use crate::udev_monitor::{trigger_coldplug, UdevadmMonitor};

async fn shutdown_signal() -> anyhow::Result<()> {
    let mut terminate = signal(SignalKind::terminate())?;
    debug!("Press Ctrl+C or send SIGTERM to exit");
    select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl+C signal, exiting..."),
        _ = terminate.recv() => info!("Received SIGTERM, exiting..."),
    }
    Ok(())
}

/// Logs every device notification as one JSON line.
fn run_notification_log(mut rx: broadcast::Receiver<DeviceNotification>) -> ServiceHandle {
    spawn_service(move |mut stop| async move {
        loop {
            select! {
                biased;
                _ = stop.signaled() => break,
                recv_res = rx.recv() => match recv_res {
                    Ok(notification) => match serde_json::to_string(&notification) {
                        Ok(json) => info!("Device notification: {}", json),
                        Err(e) => warn!("Cannot serialize notification: {}", e),
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        warn!("Device notifications lagged by {} messages", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        debug!("Notification channel closed");
                        break;
                    }
                }
            }
        }
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if let Err(e) = init_logger(cli.log_file.clone(), cli.log_level) {
        eprintln!("Failed to initialize logger: {}", e);
    }

    let config = cli.config();
    info!("Starting peripheral device manager, mount root {}", config.mount_root.display());

    let mounter = Arc::new(CommandMounter::new(&cli.mtp_helper, &cli.unmount_helper));
    let context = HandlerContext::new(config.clone(), mounter);
    let notification_log = run_notification_log(context.notifier.subscribe());

    let registry = HandlerRegistry::with_default_handlers(&context)?;
    let (client, service) = PdmService::spawn(registry, config.request_queue_capacity);

    let mut services = MultiServiceHandle::new();
    match UdevadmMonitor::spawn(&cli.udevadm) {
        Ok(monitor) => services.add(run_hotplug_watch(monitor, client.clone())),
        Err(e) => error!("Failed to start udev monitor: {}", e),
    }
    services.add(service);

    if cli.coldplug {
        if let Err(e) = trigger_coldplug(&cli.udevadm).await {
            warn!("Coldplug failed: {}", e);
        }
    }

    shutdown_signal().await?;

    debug!("Shutting down services");
    if let Err(e) = services.shutdown().await {
        error!("Error shutting down services: {}", e);
    }
    if let Err(e) = notification_log.shutdown().await {
        error!("Error stopping notification log: {}", e);
    }
    info!("Peripheral device manager exited");
    Ok(())
}
