//! Timestamps in the assorted RFC 3339 spellings the API emits.
use chrono::{DateTime, FixedOffset};

/// Tried in order; a trailing `Z` is rewritten to `+00:00` first.
const FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.9f%:z",
    "%Y-%m-%dT%H:%M:%S%.3f%:z",
    "%Y-%m-%dT%H:%M:%S%:z",
    "%Y-%m-%dT%H:%M%:z",
];

/// Parses nanosecond, millisecond, second and minute precision timestamps
/// with an offset, then anything else RFC 3339 accepts. `None` if no
/// spelling matches.
pub fn parse_date_time(text: &str) -> Option<DateTime<FixedOffset>> {
    let normalized = match text.strip_suffix(['Z', 'z']) {
        Some(local) => format!("{local}+00:00"),
        None => text.to_owned(),
    };
    FORMATS
        .iter()
        .find_map(|format| DateTime::parse_from_str(&normalized, format).ok())
        .or_else(|| DateTime::parse_from_rfc3339(text).ok())
}

/// `#[serde(with = "json_union::timestamp::lenient")]`
pub mod lenient {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(
        value: &DateTime<FixedOffset>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<DateTime<FixedOffset>, D::Error> {
        let text = String::deserialize(deserializer)?;
        super::parse_date_time(&text)
            .ok_or_else(|| de::Error::custom(format!("unrecognized timestamp {text:?}")))
    }
}

/// `#[serde(default, with = "json_union::timestamp::lenient_option")]`
///
/// An unparseable timestamp reads as `None` instead of failing the document.
pub mod lenient_option {
    use chrono::{DateTime, FixedOffset};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<DateTime<FixedOffset>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => super::lenient::serialize(value, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<FixedOffset>>, D::Error> {
        let Some(text) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let parsed = super::parse_date_time(&text);
        if parsed.is_none() {
            log::debug!("ignoring unrecognized timestamp {text:?}");
        }
        Ok(parsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[test]
    fn accepts_every_precision() {
        let cases = [
            ("2023-10-05T14:48:00.123456789Z", 1696517280),
            ("2023-10-05T14:48:00.123Z", 1696517280),
            ("2023-10-05T14:48:00Z", 1696517280),
            ("2023-10-05T16:48:00+02:00", 1696517280),
            ("2023-10-31T17:50Z", 1698774600),
            ("2023-10-05T14:48:00.5Z", 1696517280),
        ];
        for (text, epoch) in cases {
            let parsed = parse_date_time(text).unwrap_or_else(|| panic!("{text} did not parse"));
            assert_eq!(parsed.timestamp(), epoch, "{text}");
        }
    }

    #[test]
    fn keeps_the_offset_and_fraction() {
        let parsed = parse_date_time("2023-10-05T16:48:00.123456789+02:00").unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 2 * 3600);
        assert_eq!(parsed.timestamp_subsec_nanos(), 123_456_789);
    }

    #[test]
    fn rejects_non_timestamps() {
        assert_eq!(parse_date_time("not-a-date"), None);
        assert_eq!(parse_date_time(""), None);
        assert_eq!(parse_date_time("2023-10-05"), None);
    }

    #[derive(Debug, Serialize, Deserialize)]
    struct Commit {
        #[serde(with = "lenient")]
        authored_at: DateTime<FixedOffset>,
        #[serde(default, with = "lenient_option")]
        merged_at: Option<DateTime<FixedOffset>>,
    }

    #[test]
    fn serde_modules() {
        let commit: Commit = serde_json::from_value(json!({
            "authored_at": "2023-10-31T17:50Z",
            "merged_at": "yesterday"
        }))
        .unwrap();
        assert_eq!(commit.authored_at.timestamp(), 1698774600);
        assert_eq!(commit.merged_at, None);
        assert_eq!(
            serde_json::to_value(&commit).unwrap(),
            json!({"authored_at": "2023-10-31T17:50:00+00:00", "merged_at": null})
        );

        let missing: Commit =
            serde_json::from_value(json!({"authored_at": "2023-10-05T14:48:00Z"})).unwrap();
        assert_eq!(missing.merged_at, None);
        assert!(serde_json::from_value::<Commit>(json!({"authored_at": "soon"})).is_err());
    }
}
