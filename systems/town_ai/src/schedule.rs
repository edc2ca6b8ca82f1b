//! Pure time-of-day arithmetic behind the per-role routines.
//!
//! Every window here is expressed in minutes of day and wraps at midnight,
//! so the arithmetic stays valid for shops that trade across it.

use hamlet_core::MINUTES_PER_DAY;

/// Shopkeepers report early and tidy up late: the work window opens one hour
/// before the shop does and closes half an hour after trading ends.
const WORK_WINDOW_LEAD: u32 = 60;
const WORK_WINDOW_TAIL: u32 = 30;

/// Late-night band during which stranded NPCs seek shelter, 02:00 to 05:00.
const LATE_NIGHT_START: u32 = 120;
const LATE_NIGHT_END: u32 = 300;

/// Daily departure minutes are drawn from 18:00 to 21:00.
pub(crate) const DEPART_WINDOW_START: u32 = 1_080;
pub(crate) const DEPART_WINDOW_END: u32 = 1_260;

/// Residents start drifting homeward from 17:30 even before evening proper.
pub(crate) const HOMEWARD_MINUTES: u32 = 1_050;

/// Depart-minute assignment flags reset once the clock passes into the small
/// hours, ahead of the next morning's assignment.
pub(crate) const DEPART_RESET_BEFORE: u32 = 360;

/// Reports whether a minute falls inside a half-open window that may wrap
/// around midnight.
pub(crate) fn window_contains(start: u32, end: u32, minute: u32) -> bool {
    let start = start % MINUTES_PER_DAY;
    let end = end % MINUTES_PER_DAY;
    let minute = minute % MINUTES_PER_DAY;
    if start <= end {
        minute >= start && minute < end
    } else {
        minute >= start || minute < end
    }
}

/// Reports whether the shopkeeper should be on duty at the given minute.
///
/// The window runs from one hour before opening until half an hour after
/// closing, wrapping at midnight.
pub(crate) fn within_work_window(open_min: u32, close_min: u32, minute: u32) -> bool {
    let start = (open_min + MINUTES_PER_DAY - WORK_WINDOW_LEAD) % MINUTES_PER_DAY;
    let end = (close_min + WORK_WINDOW_TAIL) % MINUTES_PER_DAY;
    window_contains(start, end, minute)
}

/// Reports whether the shop is trading at the given minute.
pub(crate) fn shop_open(open_min: u32, close_min: u32, minute: u32) -> bool {
    window_contains(open_min, close_min, minute)
}

/// Reports whether the minute falls inside the late-night shelter band.
pub(crate) fn in_late_night_band(minute: u32) -> bool {
    window_contains(LATE_NIGHT_START, LATE_NIGHT_END, minute)
}
