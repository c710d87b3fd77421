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

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use log::{debug, info, warn};
use crate::classifier::{DeviceAction, UsbDeviceType};
use crate::command::{Command, CommandId, CommandResponse, PdmStatus};
use crate::device::{Device, DeviceClass, DeviceDescriptor, MtpDevice};
use crate::errors::HandlerRegistryError;
use crate::handler::{DeviceHandler, HandlerBase};
use crate::handler_registry::{FactoryTable, HandlerContext, HandlerFactory};
use crate::mount::Mounter;
use crate::notification::EventType;
use crate::power::PowerEvent;
use crate::query::QueryKind;
use crate::uevent::{Capabilities, UEvent};

const HANDLER_NAME: &str = "MtpDeviceHandler";

/// Media players: mounted on attach, unmounted on detach, eject and power transitions.
pub struct MtpDeviceHandler {
    base: HandlerBase<MtpDevice>,
    mounter: Arc<dyn Mounter>,
    mount_root: PathBuf,
    /// Mount points left mounted by devices that went away; never handed out again.
    stale_mounts: HashSet<PathBuf>,
}

impl MtpDeviceHandler {
    pub fn new(context: &HandlerContext) -> Self {
        Self {
            base: HandlerBase::new(DeviceClass::Mtp, context.notifier.clone()),
            mounter: context.mounter.clone(),
            mount_root: context.config.mount_root.clone(),
            stale_mounts: HashSet::new(),
        }
    }

    fn create(context: &HandlerContext) -> Box<dyn DeviceHandler> {
        Box::new(Self::new(context))
    }

    fn on_add(&mut self, event: &UEvent) {
        if self.base.redescribe(event) {
            return;
        }
        let dev_links = event.dev_links();
        if dev_links.is_empty() {
            debug!("MTP device {} has no device links yet, ignoring", event.dev_path());
            return;
        }

        let mount_root = &self.mount_root;
        let stale_mounts = &self.stale_mounts;
        let device_num = self
            .base
            .registry()
            .next_device_num_where(|num| !stale_mounts.contains(&MtpDevice::mount_path_for(mount_root, num)));
        let mut device = MtpDevice::new(device_num, event, &self.mount_root, self.mounter.clone());
        match device.mtp_mount(&dev_links) {
            PdmStatus::Success => self.base.add_device(device),
            status => {
                warn!("Dropping MTP device {}: {:?}", event.dev_path(), status);
                drop(device);
                self.base.notify_unknown(EventType::Add);
            }
        }
    }

    fn eject(&mut self, device_num: u32, response: &mut CommandResponse) {
        let Some(device) = self.base.registry_mut().find_by_num_mut(device_num) else {
            debug!("Eject: no MTP device number {}", device_num);
            response.status = PdmStatus::DeviceNotFound;
            return;
        };
        let was_mounted = device.is_mounted();
        response.status = device.eject();
        let descriptor = device.descriptor();
        if was_mounted && !device.is_mounted() {
            info!("Ejected MTP device {}", descriptor.dev_path());
            self.base.notify_all(EventType::Unmount, Some(descriptor));
        }
    }

    /// Unmounts every device for a power transition, attempting all of them.
    fn unmount_all(&mut self) -> bool {
        let mut all_succeeded = true;
        let mut unmounted = Vec::new();
        for device in self.base.registry_mut().iter_mut() {
            let was_mounted = device.is_mounted();
            if device.power_umount() != PdmStatus::Success {
                all_succeeded = false;
            } else if was_mounted {
                unmounted.push(device.descriptor());
            }
        }
        for descriptor in unmounted {
            self.base.notify_all(EventType::Unmount, Some(descriptor));
        }
        all_succeeded
    }

    fn resume(&mut self) -> bool {
        let mut all_succeeded = true;
        let mut remounted = Vec::new();
        for device in self.base.registry_mut().iter_mut() {
            let was_mounted = device.is_mounted();
            if device.resume_request() != PdmStatus::Success {
                all_succeeded = false;
            } else if !was_mounted && device.is_mounted() {
                remounted.push(device.descriptor());
            }
        }
        for descriptor in remounted {
            self.base.notify_all(EventType::Mount, Some(descriptor));
        }
        all_succeeded
    }
}

pub fn register(table: &mut FactoryTable) -> Result<(), HandlerRegistryError> {
    table.register(HandlerFactory::new(DeviceClass::Mtp, HANDLER_NAME, MtpDeviceHandler::create))
}

impl DeviceHandler for MtpDeviceHandler {
    fn device_class(&self) -> DeviceClass {
        self.base.device_class()
    }

    fn name(&self) -> &'static str {
        HANDLER_NAME
    }

    fn owns_event(&self, event: &UEvent) -> bool {
        event.capabilities().contains(Capabilities::MEDIA_PLAYER)
    }

    fn process_event(&mut self, event: &UEvent) {
        if event.usb_device_type() != UsbDeviceType::UsbDevice {
            debug!("Ignoring MTP {} record of type {:?}", event.raw_action(), event.usb_device_type());
            return;
        }
        match event.action() {
            DeviceAction::Add => self.on_add(event),
            DeviceAction::Remove => {
                let stale_mounts = &mut self.stale_mounts;
                self.base.remove_device(event.dev_path(), |device| {
                    device.on_device_remove();
                    if device.is_mounted() {
                        stale_mounts.insert(device.mount_path().to_path_buf());
                    }
                });
            }
            DeviceAction::Change | DeviceAction::Unknown => {
                debug!("Ignoring {} for MTP device {}", event.raw_action(), event.dev_path());
            }
        }
    }

    fn handle_command(&mut self, command: &Command, response: &mut CommandResponse) -> bool {
        match command.id {
            CommandId::Eject => {
                self.eject(command.device_num, response);
                true
            }
            CommandId::Unknown(_) => false,
        }
    }

    fn handle_power_event(&mut self, event: PowerEvent) -> bool {
        match event {
            PowerEvent::SuspendRequest => {
                for device in self.base.registry_mut().iter_mut() {
                    device.set_power_status(false);
                }
                true
            }
            PowerEvent::PrepareResume => self.resume(),
            _ if event.unmounts_all() => self.unmount_all(),
            _ => true,
        }
    }

    fn query(&self, kind: QueryKind) -> Option<Vec<DeviceDescriptor>> {
        match kind {
            QueryKind::DeviceStatus | QueryKind::StorageDeviceList => Some(self.base.descriptors()),
            QueryKind::NonStorageDeviceList | QueryKind::AudioDeviceList => None,
        }
    }

    fn device_count(&self) -> usize {
        self.base.device_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::config::PdmConfig;
    use crate::device::DeviceDetails;
    use crate::notification::DeviceNotification;
    use crate::test_support::*;
    use tokio::sync::broadcast::Receiver;

    fn handler(mounter: Arc<MockMounter>) -> (MtpDeviceHandler, Receiver<DeviceNotification>) {
        init_logger();
        let context = HandlerContext::new(PdmConfig::default(), mounter);
        let receiver = context.notifier.subscribe();
        (MtpDeviceHandler::new(&context), receiver)
    }

    fn drain(receiver: &mut Receiver<DeviceNotification>) -> Vec<(DeviceClass, EventType)> {
        std::iter::from_fn(|| receiver.try_recv().ok())
            .map(|notification| (notification.device_class, notification.action))
            .collect()
    }

    fn is_mounted(descriptor: &DeviceDescriptor) -> bool {
        matches!(descriptor.details, DeviceDetails::Mtp { is_mounted: true, .. })
    }

    #[test]
    fn add_should_mount_the_first_link_and_register_the_player() {
        let mounter = MockMounter::new();
        let (mut handler, mut notifications) = handler(mounter.clone());

        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1", "/dev/mtp/pixel"]));

        assert_eq!(mounter.mounted(), vec![("/dev/libmtp-1-1".to_string(), PathBuf::from("/tmp/usb/mtp1"))]);
        assert_eq!(drain(&mut notifications), vec![(DeviceClass::Mtp, EventType::Add)]);
        let listed = handler.query(QueryKind::StorageDeviceList).unwrap();
        assert_eq!(listed.len(), 1);
        assert!(is_mounted(&listed[0]));
    }

    #[test]
    fn add_without_device_links_should_be_ignored() {
        let mounter = MockMounter::new();
        let (mut handler, mut notifications) = handler(mounter.clone());

        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &[]));

        assert_eq!(handler.device_count(), 0);
        assert!(mounter.mounted().is_empty());
        assert!(drain(&mut notifications).is_empty());
    }

    #[test]
    fn failed_mount_should_drop_the_player_and_notify_an_unknown_add() {
        let mounter = MockMounter::new();
        mounter.fail_mount_of("/dev/libmtp-1-1");
        let (mut handler, mut notifications) = handler(mounter.clone());

        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));

        assert_eq!(handler.device_count(), 0);
        assert_eq!(drain(&mut notifications), vec![(DeviceClass::Unknown, EventType::Add)]);

        handler.process_event(&mtp_event("add", "/devices/usb1/1-2", &["/dev/libmtp-1-2"]));
        let listed = handler.query(QueryKind::DeviceStatus).unwrap();
        assert_eq!(listed[0].device_num, 1);
    }

    #[test]
    fn interface_records_and_changes_should_not_touch_the_registry() {
        let (mut handler, mut notifications) = handler(MockMounter::new());
        let interface = UEvent::builder()
            .action("add")
            .dev_path("/devices/usb1/1-1/1-1:1.0")
            .dev_type("usb_interface")
            .dev_links(&["/dev/libmtp-1-1"])
            .attribute("ID_MEDIA_PLAYER", "yes")
            .build();

        handler.process_event(&interface);
        handler.process_event(&mtp_event("change", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));

        assert_eq!(handler.device_count(), 0);
        assert!(drain(&mut notifications).is_empty());
    }

    #[test]
    fn remove_should_unmount_before_releasing_the_player() {
        let mounter = MockMounter::new();
        let (mut handler, mut notifications) = handler(mounter.clone());
        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));

        handler.process_event(&mtp_event("remove", "/devices/usb1/1-1", &[]));

        assert_eq!(mounter.unmounted(), vec![PathBuf::from("/tmp/usb/mtp1")]);
        assert_eq!(handler.device_count(), 0);
        assert_eq!(
            drain(&mut notifications),
            vec![(DeviceClass::Mtp, EventType::Add), (DeviceClass::Mtp, EventType::Remove)]
        );
    }

    #[test]
    fn eject_should_unmount_but_keep_the_player_attached() {
        let mounter = MockMounter::new();
        let (mut handler, mut notifications) = handler(mounter.clone());
        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));
        let _ = drain(&mut notifications);

        let mut response = CommandResponse::default();
        assert!(handler.handle_command(&Command::eject(1), &mut response));

        assert_eq!(response.status, PdmStatus::Success);
        assert_eq!(handler.device_count(), 1);
        assert!(!is_mounted(&handler.query(QueryKind::DeviceStatus).unwrap()[0]));
        assert_eq!(drain(&mut notifications), vec![(DeviceClass::All, EventType::Unmount)]);
    }

    #[test]
    fn eject_of_a_missing_number_should_be_recognised_and_report_device_not_found() {
        let (mut handler, _notifications) = handler(MockMounter::new());
        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));
        handler.process_event(&mtp_event("add", "/devices/usb1/1-2", &["/dev/libmtp-1-2"]));
        handler.process_event(&mtp_event("remove", "/devices/usb1/1-1", &[]));

        let mut response = CommandResponse { status: PdmStatus::Success };
        assert!(handler.handle_command(&Command::eject(1), &mut response));
        assert_eq!(response.status, PdmStatus::DeviceNotFound);

        let mut response = CommandResponse::default();
        assert!(handler.handle_command(&Command::eject(2), &mut response));
        assert_eq!(response.status, PdmStatus::Success);

        assert!(!handler.handle_command(&Command::new(42u32, 2), &mut response));
    }

    #[test]
    fn unmount_all_should_attempt_every_player_and_report_any_failure() {
        let mounter = MockMounter::new();
        mounter.fail_unmount_of("/tmp/usb/mtp2");
        let (mut handler, mut notifications) = handler(mounter.clone());
        for (path, link) in [("/devices/usb1/1-1", "/dev/a"), ("/devices/usb1/1-2", "/dev/b"), ("/devices/usb1/1-3", "/dev/c")] {
            handler.process_event(&mtp_event("add", path, &[link]));
        }
        let _ = drain(&mut notifications);

        assert!(!handler.handle_power_event(PowerEvent::UnmountAllRequest));

        assert_eq!(mounter.unmounted(), vec![PathBuf::from("/tmp/usb/mtp1"), PathBuf::from("/tmp/usb/mtp3")]);
        assert_eq!(
            drain(&mut notifications),
            vec![(DeviceClass::All, EventType::Unmount), (DeviceClass::All, EventType::Unmount)]
        );
    }

    #[test]
    fn suspend_and_resume_should_remount_only_players_unmounted_by_power_transitions() {
        let mounter = MockMounter::new();
        let (mut handler, mut notifications) = handler(mounter.clone());
        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/a"]));
        handler.process_event(&mtp_event("add", "/devices/usb1/1-2", &["/dev/b"]));
        let mut response = CommandResponse::default();
        handler.handle_command(&Command::eject(2), &mut response);
        let _ = drain(&mut notifications);

        assert!(handler.handle_power_event(PowerEvent::PrepareSuspend));
        assert!(handler.handle_power_event(PowerEvent::SuspendRequest));
        let suspended = handler.query(QueryKind::DeviceStatus).unwrap();
        assert!(suspended.iter().all(|d| matches!(d.details, DeviceDetails::Mtp { is_powered: false, .. })));

        assert!(handler.handle_power_event(PowerEvent::PrepareResume));

        let resumed = handler.query(QueryKind::DeviceStatus).unwrap();
        assert!(is_mounted(&resumed[0]));
        assert!(!is_mounted(&resumed[1]));
        assert_eq!(mounter.mounted().last().map(|(_, target)| target.as_path()), Some(Path::new("/tmp/usb/mtp1")));
        assert_eq!(
            drain(&mut notifications),
            vec![(DeviceClass::All, EventType::Unmount), (DeviceClass::All, EventType::Mount)]
        );
    }

    #[test]
    fn repeated_add_should_keep_one_player_with_a_single_mount_and_no_extra_notification() {
        let mounter = MockMounter::new();
        let (mut handler, mut notifications) = handler(mounter.clone());

        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));
        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/libmtp-1-1"]));

        assert_eq!(handler.device_count(), 1);
        assert_eq!(mounter.mounted().len(), 1);
        assert_eq!(drain(&mut notifications), vec![(DeviceClass::Mtp, EventType::Add)]);
    }

    #[test]
    fn mount_point_left_mounted_by_a_removed_player_should_not_be_reused() {
        let mounter = MockMounter::new();
        mounter.fail_unmount_of("/tmp/usb/mtp1");
        let (mut handler, _notifications) = handler(mounter.clone());
        handler.process_event(&mtp_event("add", "/devices/usb1/1-1", &["/dev/a"]));
        handler.process_event(&mtp_event("remove", "/devices/usb1/1-1", &[]));
        assert_eq!(handler.device_count(), 0);

        handler.process_event(&mtp_event("add", "/devices/usb1/1-9", &["/dev/b"]));

        assert_eq!(
            mounter.mounted(),
            vec![
                ("/dev/a".to_string(), PathBuf::from("/tmp/usb/mtp1")),
                ("/dev/b".to_string(), PathBuf::from("/tmp/usb/mtp2")),
            ]
        );
        assert_eq!(handler.query(QueryKind::DeviceStatus).unwrap()[0].device_num, 2);
    }
}
