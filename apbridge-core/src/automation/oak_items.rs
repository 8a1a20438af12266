use std::time::Duration;

use super::{Automation, ButtonState};
use crate::flags::keys;
use crate::host::AutomationHost;
use crate::prefs::PreferenceStore;

/// Lifts the equipped oak item limit while unlocked.
#[derive(Debug, Default)]
pub struct OakItemsUnlimited;

impl Automation for OakItemsUnlimited {
    fn name(&self) -> &'static str {
        "Oak Items Unlimited"
    }

    fn flag(&self) -> &'static str {
        keys::OAK_ITEMS_UNLIMITED
    }

    fn interval(&self, _host: &dyn AutomationHost) -> Option<Duration> {
        None
    }

    fn on_enabled(&mut self, host: &mut dyn AutomationHost) {
        host.set_oak_items_unlimited(true);
    }

    fn on_disabled(&mut self, host: &mut dyn AutomationHost) {
        host.set_oak_items_unlimited(false);
    }

    fn buttons(&self, _enabled: bool) -> Vec<ButtonState> {
        Vec::new()
    }

    fn press(
        &mut self,
        _button: &str,
        _prefs: &mut PreferenceStore,
        _host: &mut dyn AutomationHost,
    ) -> bool {
        false
    }
}
