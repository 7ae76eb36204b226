//! A small static fallback catalog of layouts and missions.
//!
//! The Ritual Engine's layout/mission pickers primarily draw from an
//! event's own `event_layouts`/`event_missions`, falling back to this
//! global catalog only when an event's own list is empty after filtering
//! (spec §4.4: "final fallback: global mission catalog"). Grounded on
//! `original_source/database.py`'s mission/faction tables (SPEC_FULL.md
//! supplemental item 4) — the exact content is a deployment concern, so
//! this ships a small representative seed rather than the full table.

use once_cell::sync::Lazy;

use crate::event::{Layout, Mission};

pub static GLOBAL_LAYOUTS: Lazy<Vec<Layout>> = Lazy::new(|| {
    (1..=6)
        .map(|n| Layout {
            number: n,
            name: format!("Layout {n}"),
        })
        .collect()
});

pub static GLOBAL_MISSIONS: Lazy<Vec<Mission>> = Lazy::new(|| {
    vec![
        Mission {
            code: "take_and_hold".into(),
            valid_layouts: vec![1, 2, 3, 4, 5, 6],
        },
        Mission {
            code: "crucible_of_battle".into(),
            valid_layouts: vec![1, 2, 3],
        },
        Mission {
            code: "sweeping_engagement".into(),
            valid_layouts: vec![4, 5, 6],
        },
    ]
});

pub fn default_layouts() -> Vec<Layout> {
    GLOBAL_LAYOUTS.clone()
}

pub fn default_missions() -> Vec<Mission> {
    GLOBAL_MISSIONS.clone()
}
