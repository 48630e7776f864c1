use chrono::{DateTime, Datelike, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// Lifecycle action the scheduler can apply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleAction {
    Start,
    Stop,
}

impl ScheduleAction {
    /// Parse an action name. Accepts `start` / `stop`, case-insensitive.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "start" => Some(Self::Start),
            "stop" => Some(Self::Stop),
            _ => None,
        }
    }
}

impl std::fmt::Display for ScheduleAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Start => f.write_str("start"),
            Self::Stop => f.write_str("stop"),
        }
    }
}

impl std::str::FromStr for ScheduleAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("unknown action '{s}' (expected 'start' or 'stop')"))
    }
}

/// Set of weekdays, stored as a bitmask indexed from Monday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaySet(u8);

impl DaySet {
    /// Every day of the week.
    pub fn all() -> Self {
        Self(0x7f)
    }

    /// No days.
    pub fn empty() -> Self {
        Self(0)
    }

    /// Add a day to the set.
    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    /// Whether the set contains the given day.
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }
}

/// A recurring day/time window, evaluated in UTC.
///
/// The window may wrap midnight (`22:00-06:00`); for a wrapping window the
/// day check applies to the calendar day of the instant being tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    /// Days on which the window recurs.
    pub days: DaySet,
    /// Inclusive start of the window.
    pub start: NaiveTime,
    /// Exclusive end of the window.
    pub end: NaiveTime,
}

impl TimeWindow {
    /// Whether the given instant falls inside the window.
    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        if !self.days.contains(now.weekday()) {
            return false;
        }
        let t = now.time();
        if self.start <= self.end {
            t >= self.start && t < self.end
        } else {
            t >= self.start || t < self.end
        }
    }

    /// The action implied by the window at the given instant: resources
    /// should be running inside the window and stopped outside it.
    pub fn implied_action(&self, now: DateTime<Utc>) -> ScheduleAction {
        if self.contains(now) {
            ScheduleAction::Start
        } else {
            ScheduleAction::Stop
        }
    }
}

/// Parsed form of a schedule tag value.
///
/// Derived from the tag on every run, never stored. Parsing is total:
/// unrecognizable values land in [`ScheduleDirective::Malformed`] with a
/// reason instead of an error, so the eligibility evaluator stays a pure
/// function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScheduleDirective {
    /// Unconditional marker (`always_on`): any instructed action is honored.
    Unconditional,
    /// Explicit allow-list of actions (`start`, `stop`, `start,stop`).
    AllowList(Vec<ScheduleAction>),
    /// Day/time window (`mon-fri 08:00-20:00`, `22:00-06:00`).
    Window(TimeWindow),
    /// Explicit opt-out marker (`opt_out`, `none`).
    OptOut,
    /// Unrecognizable value; carries the reason.
    Malformed(String),
}

impl ScheduleDirective {
    /// Parse a schedule tag value.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Self::Malformed("empty schedule value".to_owned());
        }

        let lower = trimmed.to_ascii_lowercase();
        match lower.as_str() {
            "always_on" | "always-on" => return Self::Unconditional,
            "opt_out" | "opt-out" | "none" => return Self::OptOut,
            _ => {}
        }

        // Allow-list: every comma-separated token is an action name.
        let tokens: Vec<&str> = lower.split(',').map(str::trim).collect();
        if tokens.iter().all(|t| !t.is_empty()) {
            let actions: Option<Vec<ScheduleAction>> =
                tokens.iter().map(|t| ScheduleAction::parse(t)).collect();
            if let Some(actions) = actions {
                return Self::AllowList(actions);
            }
        }

        match parse_window(&lower) {
            Ok(window) => Self::Window(window),
            Err(reason) => Self::Malformed(reason),
        }
    }
}

fn parse_window(s: &str) -> Result<TimeWindow, String> {
    let parts: Vec<&str> = s.split_whitespace().collect();
    let (days_part, time_part) = match parts.as_slice() {
        [time] => (None, *time),
        [days, time] => (Some(*days), *time),
        _ => {
            return Err(format!(
                "unrecognized schedule value '{s}' (expected a marker, an action list, \
                 or '[days] HH:MM-HH:MM')"
            ));
        }
    };

    let days = match days_part {
        Some(d) => parse_days(d)?,
        None => DaySet::all(),
    };

    let Some((start_s, end_s)) = time_part.split_once('-') else {
        return Err(format!("invalid time window '{time_part}' (expected 'HH:MM-HH:MM')"));
    };
    let start = parse_hhmm(start_s)?;
    let end = parse_hhmm(end_s)?;
    if start == end {
        return Err("time window start and end are equal".to_owned());
    }

    Ok(TimeWindow { days, start, end })
}

fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), "%H:%M").map_err(|_| format!("invalid time '{s}'"))
}

fn parse_days(s: &str) -> Result<DaySet, String> {
    let mut set = DaySet::empty();
    for part in s.split(',') {
        if let Some((from, to)) = part.split_once('-') {
            let from = parse_day(from)?;
            let to = parse_day(to)?;
            let mut day = from;
            loop {
                set.insert(day);
                if day == to {
                    break;
                }
                day = day.succ();
            }
        } else {
            set.insert(parse_day(part)?);
        }
    }
    Ok(set)
}

fn parse_day(s: &str) -> Result<Weekday, String> {
    match s.trim() {
        "mon" | "monday" => Ok(Weekday::Mon),
        "tue" | "tuesday" => Ok(Weekday::Tue),
        "wed" | "wednesday" => Ok(Weekday::Wed),
        "thu" | "thursday" => Ok(Weekday::Thu),
        "fri" | "friday" => Ok(Weekday::Fri),
        "sat" | "saturday" => Ok(Weekday::Sat),
        "sun" | "sunday" => Ok(Weekday::Sun),
        other => Err(format!("invalid day '{other}'")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(date: &str, time: &str) -> DateTime<Utc> {
        format!("{date}T{time}:00Z").parse().unwrap()
    }

    #[test]
    fn unconditional_markers() {
        assert_eq!(
            ScheduleDirective::parse("ALWAYS_ON"),
            ScheduleDirective::Unconditional
        );
        assert_eq!(
            ScheduleDirective::parse("always-on"),
            ScheduleDirective::Unconditional
        );
        assert_eq!(
            ScheduleDirective::parse("  Always_On  "),
            ScheduleDirective::Unconditional
        );
    }

    #[test]
    fn opt_out_markers() {
        assert_eq!(ScheduleDirective::parse("opt_out"), ScheduleDirective::OptOut);
        assert_eq!(ScheduleDirective::parse("OPT-OUT"), ScheduleDirective::OptOut);
        assert_eq!(ScheduleDirective::parse("none"), ScheduleDirective::OptOut);
    }

    #[test]
    fn allow_list_single() {
        assert_eq!(
            ScheduleDirective::parse("stop"),
            ScheduleDirective::AllowList(vec![ScheduleAction::Stop])
        );
    }

    #[test]
    fn allow_list_multiple() {
        assert_eq!(
            ScheduleDirective::parse("Start, Stop"),
            ScheduleDirective::AllowList(vec![ScheduleAction::Start, ScheduleAction::Stop])
        );
    }

    #[test]
    fn window_without_days() {
        let directive = ScheduleDirective::parse("08:00-20:00");
        let ScheduleDirective::Window(w) = directive else {
            panic!("expected window, got {directive:?}");
        };
        // 2026-01-05 is a Monday.
        assert!(w.contains(at("2026-01-05", "12:00")));
        assert!(!w.contains(at("2026-01-05", "21:00")));
        // All days: Sunday is in scope too.
        assert!(w.contains(at("2026-01-04", "12:00")));
    }

    #[test]
    fn window_with_day_range() {
        let directive = ScheduleDirective::parse("mon-fri 08:00-18:00");
        let ScheduleDirective::Window(w) = directive else {
            panic!("expected window, got {directive:?}");
        };
        assert!(w.contains(at("2026-01-05", "09:00"))); // Monday
        assert!(w.contains(at("2026-01-09", "17:59"))); // Friday
        assert!(!w.contains(at("2026-01-10", "09:00"))); // Saturday
        assert!(!w.contains(at("2026-01-05", "18:00"))); // end is exclusive
    }

    #[test]
    fn window_with_day_list() {
        let directive = ScheduleDirective::parse("mon,wed,fri 06:00-10:00");
        let ScheduleDirective::Window(w) = directive else {
            panic!("expected window, got {directive:?}");
        };
        assert!(w.contains(at("2026-01-07", "07:00"))); // Wednesday
        assert!(!w.contains(at("2026-01-06", "07:00"))); // Tuesday
    }

    #[test]
    fn window_wrapping_midnight() {
        let directive = ScheduleDirective::parse("22:00-06:00");
        let ScheduleDirective::Window(w) = directive else {
            panic!("expected window, got {directive:?}");
        };
        assert!(w.contains(at("2026-01-05", "23:00")));
        assert!(w.contains(at("2026-01-05", "05:00")));
        assert!(!w.contains(at("2026-01-05", "12:00")));
    }

    #[test]
    fn implied_action_follows_window() {
        let ScheduleDirective::Window(w) = ScheduleDirective::parse("08:00-20:00") else {
            panic!("expected window");
        };
        assert_eq!(w.implied_action(at("2026-01-05", "12:00")), ScheduleAction::Start);
        assert_eq!(w.implied_action(at("2026-01-05", "22:00")), ScheduleAction::Stop);
    }

    #[test]
    fn malformed_values() {
        for value in ["", "   ", "yes", "8am-8pm", "mon-fri", "25:00-26:00", "start,banana"] {
            let directive = ScheduleDirective::parse(value);
            assert!(
                matches!(directive, ScheduleDirective::Malformed(_)),
                "'{value}' should be malformed, got {directive:?}"
            );
        }
    }

    #[test]
    fn malformed_equal_bounds() {
        assert!(matches!(
            ScheduleDirective::parse("08:00-08:00"),
            ScheduleDirective::Malformed(_)
        ));
    }

    #[test]
    fn day_range_wraps_week() {
        let directive = ScheduleDirective::parse("sat-mon 00:00-23:59");
        let ScheduleDirective::Window(w) = directive else {
            panic!("expected window, got {directive:?}");
        };
        assert!(w.days.contains(Weekday::Sat));
        assert!(w.days.contains(Weekday::Sun));
        assert!(w.days.contains(Weekday::Mon));
        assert!(!w.days.contains(Weekday::Tue));
    }

    #[test]
    fn action_parse_and_display() {
        assert_eq!(ScheduleAction::parse("START"), Some(ScheduleAction::Start));
        assert_eq!(ScheduleAction::Stop.to_string(), "stop");
        assert!("reboot".parse::<ScheduleAction>().is_err());
    }
}
