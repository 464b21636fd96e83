use chrono::{Datelike, NaiveDate};
use serde::Serialize;

/// Last calendar day on which the submission window is open without an
/// override permission.
pub const WINDOW_LAST_DAY: u32 = 15;

/// State of the monthly submission window for one member on one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WindowState {
    /// Within the first 15 days; `days_remaining` is 0 on the 15th itself.
    Open { days_remaining: u8 },
    /// Past the 15th, but the member holds the late-submission permission.
    OpenOverride,
    Closed,
}

impl WindowState {
    pub const fn accepts_submissions(self) -> bool {
        matches!(self, WindowState::Open { .. } | WindowState::OpenOverride)
    }
}

/// Evaluate the submission window. Pure function of the calendar date and
/// the member's structured late-submission permission.
pub fn evaluate(today: NaiveDate, allow_late: bool) -> WindowState {
    let day = today.day();
    if day <= WINDOW_LAST_DAY {
        WindowState::Open {
            days_remaining: (WINDOW_LAST_DAY - day) as u8,
        }
    } else if allow_late {
        WindowState::OpenOverride
    } else {
        WindowState::Closed
    }
}
