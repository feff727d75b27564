use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
use serde_with::{DeserializeAs, SerializeAs};
use std::borrow::Cow;
use std::time::Duration;

/// `serde_with` adapter storing durations as humantime strings, e.g. `"5s"` or `"250ms"`.
pub struct HumanDuration;

impl SerializeAs<Duration> for HumanDuration {
    fn serialize_as<S>(source: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(&humantime::format_duration(*source))
    }
}

impl<'de> DeserializeAs<'de, Duration> for HumanDuration {
    fn deserialize_as<D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Cow::<'de, str>::deserialize(deserializer)?;
        humantime::parse_duration(raw.trim()).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Serialize;
    use serde_with::serde_as;

    #[serde_as]
    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Wrapper {
        #[serde_as(as = "HumanDuration")]
        value: Duration,
    }

    #[test]
    fn parses_humantime_strings() {
        let w: Wrapper = serde_json::from_str(r#"{"value": "250ms"}"#).unwrap();
        assert_eq!(w.value, Duration::from_millis(250));

        let w: Wrapper = serde_json::from_str(r#"{"value": "1m 30s"}"#).unwrap();
        assert_eq!(w.value, Duration::from_secs(90));
    }

    #[test]
    fn writes_humantime_strings() {
        let json = serde_json::to_string(&Wrapper {
            value: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(json, r#"{"value":"5s"}"#);
    }

    #[test]
    fn rejects_negative_durations() {
        assert!(serde_json::from_str::<Wrapper>(r#"{"value": "-5s"}"#).is_err());
    }
}
