//! Column label normalization and numeric cell cleaning.

use crate::domain::table::Cell;

pub const ENTITY_NAME: &str = "entity_name";
pub const LEFT_MIN: &str = "left_min";
pub const LEFT_MAX: &str = "left_max";
pub const LEFT_STEP: &str = "left_step";
pub const RIGHT_MIN: &str = "right_min";
pub const RIGHT_MAX: &str = "right_max";
pub const RIGHT_STEP: &str = "right_step";

/// Canonical keys the axis-configuration sheet must expose.
pub const AXIS_CONFIG_KEYS: [&str; 7] = [
    ENTITY_NAME,
    LEFT_MIN,
    LEFT_MAX,
    LEFT_STEP,
    RIGHT_MIN,
    RIGHT_MAX,
    RIGHT_STEP,
];

const FULLWIDTH_SPACE: char = '\u{3000}';
const FULLWIDTH_MINUS: char = '\u{2212}';

// Every value must map to itself so normalize stays idempotent.
const ALIASES: &[(&str, &str)] = &[
    ("组合名称", ENTITY_NAME),
    ("组合名", ENTITY_NAME),
    ("组合", ENTITY_NAME),
    ("名称", ENTITY_NAME),
    ("sheet", ENTITY_NAME),
    ("entity", ENTITY_NAME),
    ("name", ENTITY_NAME),
    ("leftmin", LEFT_MIN),
    ("left min", LEFT_MIN),
    ("left-min", LEFT_MIN),
    ("leftmax", LEFT_MAX),
    ("left max", LEFT_MAX),
    ("left-max", LEFT_MAX),
    ("leftstep", LEFT_STEP),
    ("leftste", LEFT_STEP),
    ("left_ste", LEFT_STEP),
    ("left step", LEFT_STEP),
    ("left-step", LEFT_STEP),
    ("rightmin", RIGHT_MIN),
    ("right min", RIGHT_MIN),
    ("right-min", RIGHT_MIN),
    ("rightmax", RIGHT_MAX),
    ("right max", RIGHT_MAX),
    ("right-max", RIGHT_MAX),
    ("rightstep", RIGHT_STEP),
    ("rightste", RIGHT_STEP),
    ("right_ste", RIGHT_STEP),
    ("right step", RIGHT_STEP),
    ("right-step", RIGHT_STEP),
];

/// Maps a raw column label to its canonical key.
///
/// Trims surrounding whitespace, drops full-width spaces, lower-cases and
/// turns the full-width minus into `-` before consulting the alias table.
/// Labels without an alias come back in that cleaned form.
pub fn normalize(label: &str) -> String {
    let cleaned: String = label
        .trim()
        .chars()
        .filter(|c| *c != FULLWIDTH_SPACE)
        .map(|c| if c == FULLWIDTH_MINUS { '-' } else { c })
        .collect::<String>()
        .trim()
        .to_lowercase();

    match ALIASES.iter().find(|(alias, _)| *alias == cleaned) {
        Some((_, canonical)) => (*canonical).to_string(),
        None => cleaned,
    }
}

/// Coerces a cell to a number, or `None` when it holds no usable value.
///
/// Text has its full-width minus and thousands separators removed first.
pub fn clean_number(cell: &Cell) -> Option<f64> {
    let value = match cell {
        Cell::Number(n) => *n,
        Cell::Text(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| *c != ',' && *c != FULLWIDTH_SPACE)
                .map(|c| if c == FULLWIDTH_MINUS { '-' } else { c })
                .collect();
            cleaned.trim().parse::<f64>().ok()?
        }
        Cell::Empty | Cell::Bool(_) | Cell::DateTime(_) | Cell::Error(_) => return None,
    };
    value.is_finite().then_some(value)
}
