//! Opening-hours extraction from query tokens.
//!
//! Scans for an hour (digit or spelled one..twelve), optionally followed by
//! an am/pm marker, and classifies it as `open_from`/`open_until` by looking
//! at up to three preceding tokens for catalog context keywords.

use vicinity_core::TimeWindow;

use crate::catalog::CompiledCatalog;

const SPELLED_HOURS: &[(&str, u32)] = &[
    ("one", 1),
    ("two", 2),
    ("three", 3),
    ("four", 4),
    ("five", 5),
    ("six", 6),
    ("seven", 7),
    ("eight", 8),
    ("nine", 9),
    ("ten", 10),
    ("eleven", 11),
    ("twelve", 12),
];

/// Extract a time window from the token sequence, or `None` when the text
/// carries no hour at all.
///
/// The `open_until` context is checked before `open_from` so that phrasings
/// like "from 7 until 11" classify both bounds: the second hour's context
/// window still contains "from".
#[must_use]
pub fn extract_time_window(catalog: &CompiledCatalog, tokens: &[String]) -> Option<TimeWindow> {
    let mut window = TimeWindow::default();

    for (i, token) in tokens.iter().enumerate() {
        let Some(hour) = parse_hour(token) else {
            continue;
        };

        let meridiem = tokens
            .get(i + 1)
            .map(String::as_str)
            .filter(|t| *t == "am" || *t == "pm");

        let context = tokens[i.saturating_sub(3)..i].join(" ");

        if contains_any(&context, &catalog.open_until_keywords) {
            window.open_until = Some(to_24h(hour, meridiem.unwrap_or("pm")));
        } else if contains_any(&context, &catalog.open_from_keywords) {
            window.open_from = Some(to_24h(hour, meridiem.unwrap_or("am")));
        } else if window.is_empty() {
            // A bare hour with no context still counts, but only as the
            // first signal.
            window.open_from = Some(to_24h(hour, meridiem.unwrap_or("am")));
        }
    }

    (!window.is_empty()).then_some(window)
}

fn contains_any(context: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| context.contains(k.as_str()))
}

fn parse_hour(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return (n <= 23).then_some(n);
    }
    SPELLED_HOURS
        .iter()
        .find(|(word, _)| *word == token)
        .map(|(_, n)| *n)
}

/// Convert an hour with meridiem to "HH:MM". Hours 13..=23 are taken as
/// already 24-hour and the meridiem is ignored.
fn to_24h(hour: u32, meridiem: &str) -> String {
    let hour24 = if hour > 12 {
        hour
    } else if meridiem == "pm" && hour != 12 {
        hour + 12
    } else if meridiem == "am" && hour == 12 {
        0
    } else {
        hour
    };
    format!("{hour24:02}:00")
}
