use std::fmt;

use crate::field::ScheduleField;
use crate::schedule::CronSchedule;

/// Renders the seven canonical fields, e.g. `0 */15 9-17 * * 1-5 *`.
///
/// The output parses back to an equal schedule.
impl fmt::Display for CronSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.normalized())
    }
}

impl fmt::Display for ScheduleField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.raw())
    }
}
