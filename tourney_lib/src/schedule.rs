use serde::{Deserialize, Serialize};

/// One labeled block of an event day, expressed as an offset in minutes
/// from that day's 00:00 in the fixed Kuala Lumpur timezone the original
/// tool scheduled against (`original_source/threads.py::build_kl_schedule`;
/// see SPEC_FULL.md §3). The offsets are not adjusted per event calendar
/// date beyond which day number they fall on — only the day number and the
/// label/offsets matter to this core; translating day_number into an actual
/// calendar date is the caller's job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleSlot {
    pub day_number: u32,
    pub label: String,
    pub start_offset_minutes: u32,
    pub end_offset_minutes: u32,
}

fn slot(day: u32, label: &str, start_h: u32, start_m: u32, end_h: u32, end_m: u32) -> ScheduleSlot {
    ScheduleSlot {
        day_number: day,
        label: label.to_string(),
        start_offset_minutes: start_h * 60 + start_m,
        end_offset_minutes: end_h * 60 + end_m,
    }
}

/// Builds the fixed day schedule for a given round count (spec §4.7). Only
/// 3-round and 5-round events are defined; any other round count (not
/// reachable through `MaxPlayers::round_count`) returns an empty schedule.
pub fn build_schedule(round_count: u32) -> Vec<ScheduleSlot> {
    let mut slots = vec![
        slot(1, "briefing", 8, 30, 9, 0),
        slot(1, "round_1", 9, 0, 12, 0),
        slot(1, "lunch", 12, 0, 13, 0),
        slot(1, "round_2", 13, 0, 16, 0),
        slot(1, "break", 16, 0, 16, 15),
        slot(1, "round_3", 16, 15, 19, 15),
        slot(1, "results", 19, 15, 19, 30),
    ];

    if round_count == 5 {
        slots.extend([
            slot(2, "briefing", 8, 30, 9, 0),
            slot(2, "round_4", 9, 0, 12, 0),
            slot(2, "lunch", 12, 0, 13, 0),
            slot(2, "round_5", 13, 0, 16, 0),
            slot(2, "results", 16, 0, 16, 15),
        ]);
    }

    slots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_round_schedule_is_single_day() {
        let slots = build_schedule(3);
        assert_eq!(slots.iter().map(|s| s.day_number).max(), Some(1));
        assert_eq!(slots.len(), 7);
    }

    #[test]
    fn five_round_schedule_spans_two_days() {
        let slots = build_schedule(5);
        assert_eq!(slots.iter().map(|s| s.day_number).max(), Some(2));
        assert_eq!(slots.len(), 12);
    }
}
