use super::schema::{ContentKind, HistoryRecord};
use chrono::{DateTime, Utc};

/// One card in the history grid: a stored record or an empty placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum HistorySlot {
    Filled(HistoryRecord),
    Empty { label: String },
}

impl HistorySlot {
    pub fn title(&self) -> &str {
        match self {
            Self::Filled(record) => &record.name,
            Self::Empty { label } => label,
        }
    }
}

/// Exactly `capacity` slots: stored records first, then numbered placeholders.
pub fn history_slots(
    kind: ContentKind,
    records: &[HistoryRecord],
    capacity: usize,
) -> Vec<HistorySlot> {
    let mut slots: Vec<HistorySlot> = records
        .iter()
        .take(capacity)
        .cloned()
        .map(HistorySlot::Filled)
        .collect();
    while slots.len() < capacity {
        let label = kind.placeholder_label(slots.len() + 1);
        slots.push(HistorySlot::Empty { label });
    }
    slots
}

pub fn relative_upload_time(upload_time: &str, now: DateTime<Utc>) -> String {
    let Ok(uploaded) = DateTime::parse_from_rfc3339(upload_time) else {
        return "No upload yet".to_string();
    };
    let hours = (now - uploaded.with_timezone(&Utc)).num_hours();
    if hours < 1 {
        "Just now".to_string()
    } else if hours < 24 {
        format!("{} hours ago", hours)
    } else {
        format!("{} days ago", hours / 24)
    }
}
