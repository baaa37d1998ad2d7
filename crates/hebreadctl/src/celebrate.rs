//! Badge celebration toasts.

use crate::display::Palette;
use hebread_common::badges::format_badge_unlock;
use hebread_common::{CoreEvent, EventBus, EventName, SubscriptionId};

pub fn toast_line(name: &str, p: Palette) -> String {
    p.ok(&format_badge_unlock(name))
}

/// Print a toast for every `badgeUnlocked`
pub fn attach(bus: &EventBus, palette: Palette) -> SubscriptionId {
    bus.on(EventName::BadgeUnlocked, move |event| {
        if let CoreEvent::BadgeUnlocked { name } = event {
            println!("{}", toast_line(name, palette));
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toast_text() {
        assert_eq!(
            toast_line("Mastered bet", Palette::plain()),
            "[*] Badge unlocked: Mastered bet"
        );
    }

    #[test]
    fn test_attach_registers_one_handler() {
        let bus = EventBus::new();
        attach(&bus, Palette::plain());
        assert_eq!(bus.subscriber_count(), 1);
        let delivered = bus.emit(&CoreEvent::BadgeUnlocked {
            name: "First attempt".into(),
        });
        assert_eq!(delivered, 1);
    }
}
