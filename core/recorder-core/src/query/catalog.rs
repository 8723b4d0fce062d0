//! Query catalog for the conferencing app's UI.
//!
//! Update this file when the app renames or restructures a control. The
//! attribute needles keep the app's own casing because attribute
//! strategies match case-sensitively.

use super::{Candidates, LabelRule, Strategy, UiElementQuery};

/// Terms that disqualify a control from being the start-recording control.
pub const RECORD_EXCLUSIONS: &[&str] = &["stop", "end", "paused"];

// ─────────────────────────────────────────────────────────────────────────────
// Join / host detection
// ─────────────────────────────────────────────────────────────────────────────

/// Any hit means the in-call UI is rendered.
pub static JOIN_INDICATORS: UiElementQuery = UiElementQuery {
    target: "join indicators",
    strategies: &[
        Strategy::Label {
            candidates: Candidates::Interactive,
            rule: LabelRule::contains(&["leave"]),
        },
        Strategy::AttributePresent {
            name: "data-self-name",
        },
        Strategy::AttributeEquals {
            name: "jsname",
            value: "BOHaEe",
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "microphone",
            case_insensitive: true,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "camera",
            case_insensitive: true,
        },
        Strategy::AttributePresent {
            name: "data-participant-id",
        },
        Strategy::AttributePresent {
            name: "data-meeting-title",
        },
    ],
    exclude: &[],
};

/// The green-room join button. Only counts while it has visible text.
pub static PRE_JOIN_AFFORDANCE: UiElementQuery = UiElementQuery {
    target: "pre-join affordance",
    strategies: &[
        Strategy::AttributeEquals {
            name: "jsname",
            value: "Qx7uuf",
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "Join",
            case_insensitive: false,
        },
        Strategy::Label {
            candidates: Candidates::Interactive,
            rule: LabelRule::any_of(&["join now", "ask to join"]),
        },
    ],
    exclude: &[],
};

pub static HOST_CONTROLS: UiElementQuery = UiElementQuery {
    target: "host controls",
    strategies: &[Strategy::Label {
        candidates: Candidates::Interactive,
        rule: LabelRule::any_of(&["host controls", "meeting safety", "host management", "moderation"]),
    }],
    exclude: &[],
};

/// General meeting controls; the leave control doubles as the clearly-in-call signal.
pub static IN_CALL_CONTROLS: UiElementQuery = UiElementQuery {
    target: "in-call controls",
    strategies: &[Strategy::Label {
        candidates: Candidates::Interactive,
        rule: LabelRule {
            all: &["leave"],
            any: &["call", "meeting"],
        },
    }],
    exclude: &[],
};

/// Present on meetings opened from a calendar event.
pub static SCHEDULED_MEETING_MARKERS: UiElementQuery = UiElementQuery {
    target: "scheduled meeting markers",
    strategies: &[
        Strategy::AttributePresent {
            name: "data-meeting-title",
        },
        Strategy::AttributePresent {
            name: "data-calendar-event-id",
        },
    ],
    exclude: &[],
};

// ─────────────────────────────────────────────────────────────────────────────
// Recording control cascade
// ─────────────────────────────────────────────────────────────────────────────

pub static RECORD_CONTROL: UiElementQuery = UiElementQuery {
    target: "recording control",
    strategies: &[
        Strategy::Label {
            candidates: Candidates::Interactive,
            rule: LabelRule::contains(&["record"]),
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "Start recording",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "start recording",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "Record meeting",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "record meeting",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "Record",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "record",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "data-tooltip",
            needle: "record",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "data-tooltip",
            needle: "Record",
            case_insensitive: false,
        },
    ],
    exclude: RECORD_EXCLUSIONS,
};

pub static MORE_OPTIONS: UiElementQuery = UiElementQuery {
    target: "more options",
    strategies: &[
        Strategy::LowerViewport {
            candidates: Candidates::Interactive,
            rule: LabelRule::any_of(&["more", "options"]),
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "More options",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "more options",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "More actions",
            case_insensitive: false,
        },
        Strategy::AttributeContains {
            name: "data-tooltip",
            needle: "More",
            case_insensitive: false,
        },
        Strategy::AttributeEquals {
            name: "jsname",
            value: "b3VHJd",
        },
    ],
    exclude: &[],
};

pub static MENU_CONTAINERS: UiElementQuery = UiElementQuery {
    target: "menu container",
    strategies: &[
        Strategy::AttributeEquals {
            name: "role",
            value: "menu",
        },
        Strategy::AttributeEquals {
            name: "role",
            value: "listbox",
        },
    ],
    exclude: &[],
};

pub static RECORD_MENU_ITEM: UiElementQuery = UiElementQuery {
    target: "recording menu item",
    strategies: &[Strategy::Label {
        candidates: Candidates::MenuItems,
        rule: LabelRule::contains(&["record"]),
    }],
    exclude: RECORD_EXCLUSIONS,
};

pub static ACTIVITIES: UiElementQuery = UiElementQuery {
    target: "activities",
    strategies: &[
        Strategy::Label {
            candidates: Candidates::Interactive,
            rule: LabelRule::contains(&["activities"]),
        },
        Strategy::AttributeContains {
            name: "data-tooltip",
            needle: "Activities",
            case_insensitive: false,
        },
    ],
    exclude: &[],
};

pub static ACTIVITIES_PANEL: UiElementQuery = UiElementQuery {
    target: "activities panel",
    strategies: &[Strategy::Label {
        candidates: Candidates::Panels,
        rule: LabelRule::contains(&["activities"]),
    }],
    exclude: &[],
};

// ─────────────────────────────────────────────────────────────────────────────
// Confirmation flow
// ─────────────────────────────────────────────────────────────────────────────

/// The recording side panel. Consent dialogs and the activities panel also
/// mention recording, so they are excluded here.
pub static RECORDING_PANEL: UiElementQuery = UiElementQuery {
    target: "recording panel",
    strategies: &[Strategy::Label {
        candidates: Candidates::Panels,
        rule: LabelRule::contains(&["record"]),
    }],
    exclude: &["is ready", "are ready", "consent", "let everyone know", "activities"],
};

pub static PANEL_START: UiElementQuery = UiElementQuery {
    target: "start-recording button",
    strategies: &[
        Strategy::Label {
            candidates: Candidates::Interactive,
            rule: LabelRule::contains(&["start", "record"]),
        },
        Strategy::Label {
            candidates: Candidates::Interactive,
            rule: LabelRule::contains(&["start"]),
        },
    ],
    exclude: &["stop", "end", "paused", "cancel"],
};

pub static CONSENT_DIALOG: UiElementQuery = UiElementQuery {
    target: "consent dialog",
    strategies: &[Strategy::Label {
        candidates: Candidates::Dialogs,
        rule: LabelRule::any_of(&["is ready", "are ready", "consent", "let everyone know"]),
    }],
    exclude: &[],
};

pub static CONSENT_CONFIRM: UiElementQuery = UiElementQuery {
    target: "consent confirm",
    strategies: &[Strategy::Label {
        candidates: Candidates::Interactive,
        rule: LabelRule::any_of(&["start", "confirm", "continue", "accept", "agree", "got it", "ok"]),
    }],
    exclude: &["cancel", "stop", "not now", "dismiss"],
};

// ─────────────────────────────────────────────────────────────────────────────
// Passive observation
// ─────────────────────────────────────────────────────────────────────────────

const INDICATOR_PHRASES: &[&str] = &["being recorded", "recording in progress", "stop recording"];

pub static RECORDING_INDICATOR: UiElementQuery = UiElementQuery {
    target: "recording indicator",
    strategies: &[
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "being recorded",
            case_insensitive: true,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "recording in progress",
            case_insensitive: true,
        },
        Strategy::AttributeContains {
            name: "aria-label",
            needle: "stop recording",
            case_insensitive: true,
        },
        Strategy::AttributeContains {
            name: "data-tooltip",
            needle: "being recorded",
            case_insensitive: true,
        },
        Strategy::AttributeContains {
            name: "data-tooltip",
            needle: "stop recording",
            case_insensitive: true,
        },
        Strategy::Label {
            candidates: Candidates::Status,
            rule: LabelRule::any_of(INDICATOR_PHRASES),
        },
    ],
    exclude: &[],
};

/// Every query, for diagnostics.
pub fn all() -> [&'static UiElementQuery; 16] {
    [
        &JOIN_INDICATORS,
        &PRE_JOIN_AFFORDANCE,
        &HOST_CONTROLS,
        &IN_CALL_CONTROLS,
        &SCHEDULED_MEETING_MARKERS,
        &RECORD_CONTROL,
        &MORE_OPTIONS,
        &MENU_CONTAINERS,
        &RECORD_MENU_ITEM,
        &ACTIVITIES,
        &ACTIVITIES_PANEL,
        &RECORDING_PANEL,
        &PANEL_START,
        &CONSENT_DIALOG,
        &CONSENT_CONFIRM,
        &RECORDING_INDICATOR,
    ]
}
