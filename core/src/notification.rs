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

use log::debug;
use serde::Serialize;
use tokio::sync::broadcast;
use crate::device::{DeviceClass, DeviceDescriptor};

/// What happened to a device (or, for `Unknown`, to a record nobody could register).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    Add,
    Remove,
    Change,
    Mount,
    Unmount,
}

/// One committed state transition, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceNotification {
    pub device_class: DeviceClass,
    pub action: EventType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device: Option<DeviceDescriptor>,
}

/// Fire-and-forget fan-out to every subscriber. Sending never blocks and never fails the
/// caller: with no subscriber the notification is dropped, a slow subscriber lags.
#[derive(Debug, Clone)]
pub struct Notifier {
    sender: broadcast::Sender<DeviceNotification>,
}

impl Notifier {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    pub fn notify(&self, device_class: DeviceClass, action: EventType, device: Option<DeviceDescriptor>) {
        debug!(
            "Notify {} {:?} {}",
            device_class,
            action,
            device.as_ref().map(|d| d.dev_path()).unwrap_or("-")
        );
        let _ = self.sender.send(DeviceNotification { device_class, action, device });
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DeviceNotification> {
        self.sender.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notify_without_subscribers_should_not_fail() {
        let notifier = Notifier::new(4);
        notifier.notify(DeviceClass::Unknown, EventType::Remove, None);
    }

    #[test]
    fn every_subscriber_should_receive_each_notification_once() {
        let notifier = Notifier::new(4);
        let mut first = notifier.subscribe();
        let mut second = notifier.subscribe();

        notifier.notify(DeviceClass::Mtp, EventType::Add, None);

        let expected = DeviceNotification { device_class: DeviceClass::Mtp, action: EventType::Add, device: None };
        assert_eq!(first.try_recv().unwrap(), expected);
        assert_eq!(second.try_recv().unwrap(), expected);
        assert!(first.try_recv().is_err());
    }

    #[test]
    fn notification_should_serialise_without_a_device_when_none_is_attached() {
        let notification = DeviceNotification { device_class: DeviceClass::Unknown, action: EventType::Add, device: None };

        let json = serde_json::to_value(&notification).unwrap();

        assert_eq!(json, serde_json::json!({ "deviceClass": "UNKNOWN", "action": "ADD" }));
    }
}
