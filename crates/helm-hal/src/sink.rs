//! Generic `CommandSink` trait for anything that can apply autopilot
//! commands to the observed game.
//!
//! Delivery is fire-and-forget from the scheduler's point of view: a failed
//! send is logged by the caller and corrected by the next tick's
//! recomputation, never retried.

use helm_types::{Command, HelmError};

/// Outbound command interface.
pub trait CommandSink: Send {
    /// Deliver `command` to the observed process.
    ///
    /// # Errors
    ///
    /// Returns [`HelmError::Delivery`] if the command could not be applied.
    fn send(&mut self, command: Command) -> Result<(), HelmError>;
}

/// A sink that records every command in order and never fails.
#[derive(Debug, Default)]
pub struct RecordingSink {
    commands: Vec<Command>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded so far, oldest first.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    /// Take the recorded commands, leaving the sink empty.
    pub fn drain(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.commands)
    }
}

impl CommandSink for RecordingSink {
    fn send(&mut self, command: Command) -> Result<(), HelmError> {
        self.commands.push(command);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use helm_types::SystemId;

    #[test]
    fn recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.send(Command::RequestBatteryBoost).unwrap();
        sink.send(Command::ChangePower {
            system: SystemId::Shields,
            amount: 2,
        })
        .unwrap();

        assert_eq!(sink.commands().len(), 2);
        assert_eq!(sink.commands()[0], Command::RequestBatteryBoost);
    }

    #[test]
    fn drain_empties_the_sink() {
        let mut sink = RecordingSink::new();
        sink.send(Command::OpenJumpMenu).unwrap();
        assert_eq!(sink.drain(), vec![Command::OpenJumpMenu]);
        assert!(sink.commands().is_empty());
    }
}
