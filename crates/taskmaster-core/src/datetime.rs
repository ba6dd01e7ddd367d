use anyhow::{Context, anyhow};
use chrono::{Duration, NaiveDate, NaiveDateTime};

/// Storage layout for due dates: minute precision, no zone, the same
/// shape an HTML `datetime-local` input produces.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M";

#[must_use]
pub fn format_due(due: NaiveDateTime) -> String {
    due.format("%Y-%m-%d %H:%M").to_string()
}

/// Parses a due-date expression from the CLI. `today` anchors the
/// relative keywords so callers (and tests) control the clock.
#[tracing::instrument(skip(today), fields(input = input))]
pub fn parse_due_expr(input: &str, today: NaiveDate) -> anyhow::Result<NaiveDateTime> {
    let token = input.trim();

    match token.to_ascii_lowercase().as_str() {
        "today" => return day_start(today, "today"),
        "tomorrow" => {
            let day = today
                .checked_add_signed(Duration::days(1))
                .ok_or_else(|| anyhow!("failed to advance to tomorrow"))?;
            return day_start(day, "tomorrow");
        }
        _ => {}
    }

    for fmt in [DUE_DATE_FORMAT, "%Y-%m-%d %H:%M"] {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(token, fmt) {
            return Ok(ndt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(token, "%Y-%m-%d") {
        return day_start(date, "date");
    }

    Err(anyhow!("unrecognized due date: {input}")).context(
        "supported formats: today, tomorrow, YYYY-MM-DD, YYYY-MM-DDTHH:MM, YYYY-MM-DD HH:MM",
    )
}

fn day_start(day: NaiveDate, context: &str) -> anyhow::Result<NaiveDateTime> {
    day.and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("failed to construct midnight for {context}"))
}

pub mod due_date_serde {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::DUE_DATE_FORMAT;

    pub fn serialize<S>(due: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&due.format(DUE_DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, DUE_DATE_FORMAT).map_err(serde::de::Error::custom)
    }

    pub mod option {
        use chrono::NaiveDateTime;
        use serde::{Deserialize, Deserializer, Serializer};

        use super::DUE_DATE_FORMAT;

        pub fn serialize<S>(due: &Option<NaiveDateTime>, serializer: S) -> Result<S::Ok, S::Error>
        where
            S: Serializer,
        {
            match due {
                Some(value) => super::serialize(value, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<NaiveDateTime>, D::Error>
        where
            D: Deserializer<'de>,
        {
            let opt = Option::<String>::deserialize(deserializer)?;
            match opt {
                Some(raw) => NaiveDateTime::parse_from_str(&raw, DUE_DATE_FORMAT)
                    .map(Some)
                    .map_err(serde::de::Error::custom),
                None => Ok(None),
            }
        }
    }
}
