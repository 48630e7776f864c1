use chrono::{DateTime, Utc};

use crate::schedule::{ScheduleAction, ScheduleDirective};
use crate::tags::TagSet;

/// Outcome of evaluating a resource's tags against a requested action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Eligibility {
    /// The resource should receive the requested action.
    Eligible,
    /// The resource is skipped; carries the reason.
    Ineligible(String),
    /// The schedule tag could not be parsed; the resource is skipped and a
    /// config warning is reported.
    MalformedTag(String),
}

impl Eligibility {
    /// Whether the resource should be acted on.
    pub fn is_eligible(&self) -> bool {
        matches!(self, Self::Eligible)
    }
}

/// Decide whether a resource should receive the requested action.
///
/// Pure function of the tag data, the request, and the current time.
///
/// In opt-in mode (`opt_in = true`) the schedule tag must explicitly
/// authorize the action: an unconditional marker honors anything, an
/// allow-list must name the action, and a time window must imply it. In
/// opt-out mode every schedule-tagged resource is eligible unless its tag
/// carries the explicit opt-out marker. Malformed tag values make the
/// resource ineligible in both modes, never abort the run.
pub fn evaluate(
    tags: &TagSet,
    action: ScheduleAction,
    opt_in: bool,
    now: DateTime<Utc>,
) -> Eligibility {
    let Some(value) = tags.schedule_value() else {
        // Discovery filters on the schedule tag, so this arm is only
        // reachable when the evaluator is called directly.
        return Eligibility::Ineligible("resource has no schedule tag".to_owned());
    };

    match ScheduleDirective::parse(value) {
        ScheduleDirective::Malformed(reason) => Eligibility::MalformedTag(reason),
        ScheduleDirective::OptOut => {
            Eligibility::Ineligible("schedule tag opts the resource out".to_owned())
        }
        _ if !opt_in => Eligibility::Eligible,
        ScheduleDirective::Unconditional => Eligibility::Eligible,
        ScheduleDirective::AllowList(actions) => {
            if actions.contains(&action) {
                Eligibility::Eligible
            } else {
                Eligibility::Ineligible(format!("schedule allow-list does not include '{action}'"))
            }
        }
        ScheduleDirective::Window(window) => {
            let implied = window.implied_action(now);
            if implied == action {
                Eligibility::Eligible
            } else {
                Eligibility::Ineligible(format!(
                    "schedule window implies '{implied}' at this time, not '{action}'"
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tags::SCHEDULE_TAG_KEY;

    fn tagged(value: &str) -> TagSet {
        [(SCHEDULE_TAG_KEY, value)].into_iter().collect()
    }

    fn noon_monday() -> DateTime<Utc> {
        "2026-01-05T12:00:00Z".parse().unwrap()
    }

    #[test]
    fn unconditional_honors_any_action_when_opted_in() {
        let tags = tagged("always_on");
        for action in [ScheduleAction::Start, ScheduleAction::Stop] {
            assert!(evaluate(&tags, action, true, noon_monday()).is_eligible());
        }
    }

    #[test]
    fn missing_tag_is_ineligible() {
        let tags: TagSet = [("Name", "web")].into_iter().collect();
        let result = evaluate(&tags, ScheduleAction::Stop, true, noon_monday());
        assert!(matches!(result, Eligibility::Ineligible(_)));
    }

    #[test]
    fn malformed_tag_is_reported_not_fatal() {
        let tags = tagged("whenever");
        let result = evaluate(&tags, ScheduleAction::Stop, true, noon_monday());
        assert!(matches!(result, Eligibility::MalformedTag(_)));
        // Same in opt-out mode.
        let result = evaluate(&tags, ScheduleAction::Stop, false, noon_monday());
        assert!(matches!(result, Eligibility::MalformedTag(_)));
    }

    #[test]
    fn opt_out_marker_blocks_both_modes() {
        let tags = tagged("opt_out");
        for opt_in in [true, false] {
            let result = evaluate(&tags, ScheduleAction::Stop, opt_in, noon_monday());
            assert!(matches!(result, Eligibility::Ineligible(_)), "opt_in={opt_in}");
        }
    }

    #[test]
    fn opt_out_mode_manages_any_tagged_resource() {
        // In opt-out mode a directive that would not authorize the action in
        // opt-in mode still leaves the resource managed.
        let tags = tagged("start");
        assert!(!evaluate(&tags, ScheduleAction::Stop, true, noon_monday()).is_eligible());
        assert!(evaluate(&tags, ScheduleAction::Stop, false, noon_monday()).is_eligible());
    }

    #[test]
    fn allow_list_gates_actions() {
        let tags = tagged("stop");
        assert!(evaluate(&tags, ScheduleAction::Stop, true, noon_monday()).is_eligible());
        let result = evaluate(&tags, ScheduleAction::Start, true, noon_monday());
        assert!(matches!(result, Eligibility::Ineligible(_)));
    }

    #[test]
    fn window_direction() {
        let tags = tagged("08:00-20:00");
        // Inside the window the implied action is start.
        assert!(evaluate(&tags, ScheduleAction::Start, true, noon_monday()).is_eligible());
        assert!(!evaluate(&tags, ScheduleAction::Stop, true, noon_monday()).is_eligible());

        let night: DateTime<Utc> = "2026-01-05T22:30:00Z".parse().unwrap();
        assert!(evaluate(&tags, ScheduleAction::Stop, true, night).is_eligible());
        assert!(!evaluate(&tags, ScheduleAction::Start, true, night).is_eligible());
    }
}
