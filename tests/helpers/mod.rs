#![allow(dead_code)]
pub mod fake_prober;
pub mod recording_deliverer;

use std::collections::BTreeMap;
use upwatch::core::NotifierDescriptor;
use upwatch::drivers::DriverKind;

/// Builds a webhook notifier pointing at `url`.
pub fn webhook_notifier(name: &str, url: &str, disabled: bool) -> NotifierDescriptor {
    NotifierDescriptor {
        name: name.to_string(),
        driver: DriverKind::Webhook,
        disabled,
        config: BTreeMap::from([("url".to_string(), url.to_string())]),
    }
}
