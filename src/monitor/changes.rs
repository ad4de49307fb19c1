//! Change counting over stable values.
//!
//! The first stable value of a session only establishes a baseline. Each later
//! stable value that differs from the last confirmed one counts as a change,
//! and the last confirmed value moves to it before the threshold is checked.

use super::config::ChangeThreshold;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeState {
    /// No stable value seen since the session (re)started
    AwaitingFirstValue,
    /// `last` is the most recently confirmed value
    Tracking { last: String },
}

/// What one stable value did to the accumulator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// Baseline recorded, nothing counted
    Initial(String),
    /// Same value confirmed again
    Unchanged,
    /// A genuine change; `fire` is set when the threshold was reached
    Changed {
        old: String,
        new: String,
        count: u32,
        fire: bool,
    },
}

#[derive(Debug)]
pub struct ChangeAccumulator {
    state: ChangeState,
    change_count: u32,
    threshold: ChangeThreshold,
}

impl ChangeAccumulator {
    pub fn new(threshold: ChangeThreshold) -> Self {
        Self {
            state: ChangeState::AwaitingFirstValue,
            change_count: 0,
            threshold,
        }
    }

    /// Feeds one stable value.
    pub fn observe(&mut self, stable: &str) -> ChangeEvent {
        match &self.state {
            ChangeState::AwaitingFirstValue => {
                self.state = ChangeState::Tracking {
                    last: stable.to_string(),
                };
                ChangeEvent::Initial(stable.to_string())
            }
            ChangeState::Tracking { last } if last == stable => ChangeEvent::Unchanged,
            ChangeState::Tracking { last } => {
                let old = last.clone();
                self.change_count += 1;
                self.state = ChangeState::Tracking {
                    last: stable.to_string(),
                };
                ChangeEvent::Changed {
                    old,
                    new: stable.to_string(),
                    count: self.change_count,
                    fire: self.threshold.is_reached(self.change_count),
                }
            }
        }
    }

    /// Zeroes the count after a dispatch. The baseline value is kept.
    pub fn reset_count(&mut self) {
        self.change_count = 0;
    }

    #[cfg(test)]
    pub fn change_count(&self) -> u32 {
        self.change_count
    }

    #[cfg(test)]
    pub fn state(&self) -> &ChangeState {
        &self.state
    }
}
