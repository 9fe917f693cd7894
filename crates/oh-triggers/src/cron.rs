//! Quartz cron expression validation
//!
//! Fields: seconds, minutes, hours, day-of-month, month, day-of-week and an
//! optional year. Exactly one of day-of-month and day-of-week must be `?`.

use thiserror::Error;

/// Why a cron expression was rejected
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CronError {
    #[error("expected 6 or 7 fields, found {0}")]
    FieldCount(usize),

    #[error("invalid {field} '{value}'")]
    InvalidField { field: &'static str, value: String },

    #[error("'?' must be given for exactly one of day-of-month and day-of-week")]
    DayConflict,
}

struct Field {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const MONTHS: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const DAYS: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

const DAY_OF_MONTH: usize = 3;
const DAY_OF_WEEK: usize = 5;

const FIELDS: [Field; 7] = [
    Field { name: "seconds", min: 0, max: 59, names: &[] },
    Field { name: "minutes", min: 0, max: 59, names: &[] },
    Field { name: "hours", min: 0, max: 23, names: &[] },
    Field { name: "day-of-month", min: 1, max: 31, names: &[] },
    Field { name: "month", min: 1, max: 12, names: MONTHS },
    Field { name: "day-of-week", min: 1, max: 7, names: DAYS },
    Field { name: "year", min: 1970, max: 2099, names: &[] },
];

impl Field {
    fn value(&self, raw: &str) -> Option<u32> {
        if let Ok(n) = raw.parse::<u32>() {
            return (self.min..=self.max).contains(&n).then_some(n);
        }
        let upper = raw.to_ascii_uppercase();
        self.names
            .iter()
            .position(|name| *name == upper)
            .map(|i| self.min + i as u32)
    }

    fn item(&self, raw: &str) -> bool {
        let (base, step) = match raw.split_once('/') {
            Some((base, step)) => (base, Some(step)),
            None => (raw, None),
        };

        if let Some(step) = step {
            match step.parse::<u32>() {
                Ok(n) if n > 0 && n <= self.max => {}
                _ => return false,
            }
        }

        match base.split_once('-') {
            _ if base == "*" => true,
            Some((from, to)) => self.value(from).is_some() && self.value(to).is_some(),
            None => self.value(base).is_some(),
        }
    }
}

/// `L`, `LW`, `L-n` and `nW`
fn day_of_month_special(raw: &str) -> bool {
    match raw {
        "L" | "LW" => true,
        _ => {
            if let Some(offset) = raw.strip_prefix("L-") {
                return offset.parse::<u32>().is_ok_and(|n| n <= 30);
            }
            raw.strip_suffix('W')
                .and_then(|day| FIELDS[DAY_OF_MONTH].value(day))
                .is_some()
        }
    }
}

/// `L`, `nL` and `n#k`
fn day_of_week_special(raw: &str) -> bool {
    let field = &FIELDS[DAY_OF_WEEK];
    if raw == "L" {
        return true;
    }
    if let Some(day) = raw.strip_suffix('L') {
        return field.value(day).is_some();
    }
    if let Some((day, nth)) = raw.split_once('#') {
        return field.value(day).is_some() && nth.parse::<u32>().is_ok_and(|k| (1..=5).contains(&k));
    }
    false
}

fn check_field(index: usize, raw: &str) -> Result<(), CronError> {
    let field = &FIELDS[index];
    let invalid = || CronError::InvalidField {
        field: field.name,
        value: raw.to_string(),
    };

    if raw == "?" {
        return if index == DAY_OF_MONTH || index == DAY_OF_WEEK {
            Ok(())
        } else {
            Err(invalid())
        };
    }

    for part in raw.split(',') {
        let valid = field.item(part)
            || (index == DAY_OF_MONTH && day_of_month_special(part))
            || (index == DAY_OF_WEEK && day_of_week_special(part));
        if !valid {
            return Err(invalid());
        }
    }
    Ok(())
}

/// Validate a Quartz cron expression
pub fn validate(expression: &str) -> Result<(), CronError> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    if !(6..=7).contains(&fields.len()) {
        return Err(CronError::FieldCount(fields.len()));
    }

    for (index, raw) in fields.iter().enumerate() {
        check_field(index, raw)?;
    }

    if (fields[DAY_OF_MONTH] == "?") == (fields[DAY_OF_WEEK] == "?") {
        return Err(CronError::DayConflict);
    }
    Ok(())
}

/// Whether `expression` is a valid Quartz cron expression
pub fn is_valid(expression: &str) -> bool {
    validate(expression).is_ok()
}
