//! Mapping absolute times onto discrete forecast steps.

use chrono::{DateTime, Utc};

/// Hours elapsed from `origin` to `t` (negative when `t` precedes it).
pub fn hours_since(origin: DateTime<Utc>, t: DateTime<Utc>) -> f64 {
    (t - origin).num_milliseconds() as f64 / 3_600_000.0
}

/// Picks the forecast step nearest to a requested time.
///
/// Steps are hour offsets from the run start and must be sorted ascending.
#[derive(Debug, Clone, Copy)]
pub struct TimeIndexResolver<'a> {
    run_start: DateTime<Utc>,
    steps_hours: &'a [f64],
}

impl<'a> TimeIndexResolver<'a> {
    pub fn new(run_start: DateTime<Utc>, steps_hours: &'a [f64]) -> Self {
        Self {
            run_start,
            steps_hours,
        }
    }

    /// Index of the step nearest to `epoch`.
    ///
    /// Times before the first step map to 0 and times after the last step map
    /// to the last index. Between two steps the closer one wins; an exact
    /// midpoint goes to the later step. An empty step list yields 0.
    pub fn resolve_index(&self, epoch: DateTime<Utc>) -> usize {
        let Some(&first) = self.steps_hours.first() else {
            return 0;
        };

        let target = hours_since(self.run_start, epoch);
        if target <= first {
            return 0;
        }

        for (i, &step) in self.steps_hours.iter().enumerate() {
            if step == target {
                return i;
            }
            if step > target {
                // target > first, so i >= 1 here
                let prev = self.steps_hours[i - 1];
                return if target - prev < step - target { i - 1 } else { i };
            }
        }

        self.steps_hours.len() - 1
    }
}
