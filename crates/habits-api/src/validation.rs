use habits_types::api::DurationInput;
use habits_types::models::{FrequencyUnit, Habit};

/// A habit should take no longer than two minutes.
pub const MAX_DURATION_SECS: u32 = 120;

/// A habit must be repeated at least once a week.
pub const MAX_PERIOD_DAYS: i64 = 7;

/// Seconds from `120`, `"120"`, `"02:00"` or `"00:02:00"`.
pub fn parse_duration(input: &DurationInput) -> Result<u32, String> {
    let text = match input {
        DurationInput::Seconds(secs) => return Ok(*secs),
        DurationInput::Text(text) => text.trim(),
    };

    let parts: Vec<&str> = text.split(':').collect();
    let numbers = parts
        .iter()
        .map(|p| p.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("invalid duration '{}'", text))?;

    let secs = match numbers.as_slice() {
        [s] => Some(*s),
        [m, s] if *s < 60 => m.checked_mul(60).and_then(|m| m.checked_add(*s)),
        [h, m, s] if *m < 60 && *s < 60 => h
            .checked_mul(3600)
            .and_then(|h| h.checked_add(m * 60 + s)),
        _ => None,
    };

    secs.ok_or_else(|| format!("invalid duration '{}'", text))
}

/// Rules every stored habit satisfies.
pub fn validate_habit(habit: &Habit) -> Result<(), String> {
    if habit.place.trim().is_empty() {
        return Err("place must not be empty".into());
    }
    if habit.action.trim().is_empty() {
        return Err("action must not be empty".into());
    }

    if !habits_db::is_storable(&habit.time) {
        return Err("time must fall between years 0 and 9999".into());
    }

    let has_reward = habit.reward.as_deref().is_some_and(|r| !r.trim().is_empty());
    if habit.is_pleasant && has_reward {
        return Err("a pleasant habit cannot have a reward".into());
    }
    if !habit.is_pleasant && !has_reward {
        return Err("a habit that is not pleasant needs a reward".into());
    }

    let unit: FrequencyUnit = habit.frequency_unit.parse().map_err(|e: habits_types::models::UnknownFrequencyUnit| e.to_string())?;
    if habit.frequency_number == 0 {
        return Err("frequency_number must be at least 1".into());
    }
    if unit.days(habit.frequency_number) > MAX_PERIOD_DAYS {
        return Err(format!(
            "a habit must be repeated at least once every {} days",
            MAX_PERIOD_DAYS
        ));
    }

    if habit.duration_secs == 0 || habit.duration_secs > MAX_DURATION_SECS {
        return Err(format!(
            "duration must be between 1 and {} seconds",
            MAX_DURATION_SECS
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn habit() -> Habit {
        Habit {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            place: "дом".into(),
            time: Utc::now(),
            action: "протереть пыль".into(),
            is_pleasant: false,
            frequency_number: 1,
            frequency_unit: "days".into(),
            reward: Some("посмотреть фильм".into()),
            duration_secs: 120,
            is_public: true,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn durations() {
        assert_eq!(parse_duration(&DurationInput::Seconds(90)), Ok(90));
        assert_eq!(parse_duration(&DurationInput::Text("120".into())), Ok(120));
        assert_eq!(parse_duration(&DurationInput::Text("02:00".into())), Ok(120));
        assert_eq!(parse_duration(&DurationInput::Text("00:02:00".into())), Ok(120));
        assert!(parse_duration(&DurationInput::Text("00:61".into())).is_err());
        assert!(parse_duration(&DurationInput::Text("two minutes".into())).is_err());
        assert!(parse_duration(&DurationInput::Text("1:2:3:4".into())).is_err());
    }

    #[test]
    fn accepts_a_useful_habit_with_reward() {
        assert_eq!(validate_habit(&habit()), Ok(()));
    }

    #[test]
    fn reward_and_pleasant_are_exclusive() {
        let mut h = habit();
        h.is_pleasant = true;
        assert!(validate_habit(&h).is_err());

        h.reward = None;
        assert_eq!(validate_habit(&h), Ok(()));

        h.is_pleasant = false;
        assert!(validate_habit(&h).is_err());
    }

    #[test]
    fn frequency_bounds() {
        let mut h = habit();
        h.frequency_number = 7;
        assert_eq!(validate_habit(&h), Ok(()));
        h.frequency_number = 8;
        assert!(validate_habit(&h).is_err());
        h.frequency_number = 0;
        assert!(validate_habit(&h).is_err());
        h.frequency_number = 1;
        h.frequency_unit = "months".into();
        assert!(validate_habit(&h).is_err());
    }

    #[test]
    fn duration_bounds() {
        let mut h = habit();
        h.duration_secs = 121;
        assert!(validate_habit(&h).is_err());
        h.duration_secs = 0;
        assert!(validate_habit(&h).is_err());
    }

    #[test]
    fn time_must_fit_four_digit_years() {
        let mut h = habit();
        h.time = Utc.with_ymd_and_hms(9999, 12, 31, 8, 0, 0).unwrap();
        assert_eq!(validate_habit(&h), Ok(()));
        h.time = Utc.with_ymd_and_hms(10000, 1, 1, 8, 0, 0).unwrap();
        assert!(validate_habit(&h).is_err());
    }
}
