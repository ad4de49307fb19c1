//! Debounce for raw OCR reads.
//!
//! A read only counts once the same string has come back on consecutive
//! frames, which filters out single-frame misreads.

/// Consecutive identical reads needed before a value is considered stable.
pub const STABILITY_THRESHOLD: u32 = 2;

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Streak {
    /// Nothing read yet this session
    #[default]
    Empty,
    /// `value` has been read `count` times in a row
    Candidate { value: String, count: u32 },
}

impl Streak {
    /// Advances the streak with one non-empty read.
    pub fn advance(self, read: &str) -> Streak {
        match self {
            Streak::Candidate { value, count } if value == read => Streak::Candidate {
                value,
                count: count + 1,
            },
            _ => Streak::Candidate {
                value: read.to_string(),
                count: 1,
            },
        }
    }
}

#[derive(Debug, Default)]
pub struct StabilityFilter {
    streak: Streak,
}

impl StabilityFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one frame's read and returns the stable value, if any.
    ///
    /// A frame with no read leaves the streak untouched and emits nothing; it
    /// neither breaks nor extends the run.
    pub fn observe(&mut self, read: Option<&str>) -> Option<&str> {
        let read = read?;
        self.streak = std::mem::take(&mut self.streak).advance(read);
        match &self.streak {
            Streak::Candidate { value, count } if *count >= STABILITY_THRESHOLD => {
                Some(value.as_str())
            }
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn streak(&self) -> &Streak {
        &self.streak
    }
}
