//! Interactive-mode state machine: stopped / passive / any_key_red.

use shared::InteractiveMode;

#[derive(Debug, Default, Clone, Copy)]
pub struct ModeMachine {
    mode: InteractiveMode,
}

impl ModeMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> InteractiveMode {
        self.mode
    }

    /// Move to `requested`. Returns the new mode only when it actually changed.
    pub fn transition(&mut self, requested: InteractiveMode) -> Option<InteractiveMode> {
        if requested == self.mode {
            return None;
        }
        self.mode = requested;
        Some(requested)
    }

    /// Whether a generic key event should force RED.
    pub fn key_forces_red(&self) -> bool {
        self.mode == InteractiveMode::AnyKeyRed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_passive() {
        let machine = ModeMachine::new();
        assert_eq!(machine.mode(), InteractiveMode::Passive);
        assert!(!machine.key_forces_red());
    }

    #[test]
    fn same_mode_is_not_a_transition() {
        let mut machine = ModeMachine::new();
        assert_eq!(machine.transition(InteractiveMode::Passive), None);
        assert_eq!(
            machine.transition(InteractiveMode::AnyKeyRed),
            Some(InteractiveMode::AnyKeyRed)
        );
        assert_eq!(machine.transition(InteractiveMode::AnyKeyRed), None);
        assert!(machine.key_forces_red());
    }

    #[test]
    fn every_mode_is_reachable_from_every_other() {
        let modes = [
            InteractiveMode::Stopped,
            InteractiveMode::Passive,
            InteractiveMode::AnyKeyRed,
        ];
        for from in modes {
            for to in modes {
                let mut machine = ModeMachine { mode: from };
                let changed = machine.transition(to);
                assert_eq!(changed.is_some(), from != to);
                assert_eq!(machine.mode(), to);
            }
        }
    }
}
