//! Serde helpers for metrics that may be NaN or infinite.
//!
//! JSON has no literal for non-finite numbers, and `serde_json` silently writes
//! them as `null`. Stored analyses keep them as the strings `"NaN"`,
//! `"Infinity"` and `"-Infinity"` so a result read back from the document store
//! carries the same values it was computed with.

use serde::{de, Deserialize, Deserializer, Serializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
    Null(()),
}

fn from_repr<E: de::Error>(repr: Repr) -> Result<f64, E> {
    match repr {
        Repr::Number(v) => Ok(v),
        Repr::Null(()) => Ok(f64::NAN),
        Repr::Text(s) => match s.as_str() {
            "NaN" => Ok(f64::NAN),
            "Infinity" => Ok(f64::INFINITY),
            "-Infinity" => Ok(f64::NEG_INFINITY),
            other => Err(E::invalid_value(
                de::Unexpected::Str(other),
                &"a number, \"NaN\", \"Infinity\" or \"-Infinity\"",
            )),
        },
    }
}

pub fn serialize<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.is_nan() {
        serializer.serialize_str("NaN")
    } else if *value == f64::INFINITY {
        serializer.serialize_str("Infinity")
    } else if *value == f64::NEG_INFINITY {
        serializer.serialize_str("-Infinity")
    } else {
        serializer.serialize_f64(*value)
    }
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    from_repr(Repr::deserialize(deserializer)?)
}

/// Same encoding for optional metrics. Pair with `default` and
/// `skip_serializing_if = "Option::is_none"` so absence stays absence.
pub mod option {
    use super::Repr;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(v) => super::serialize(v, serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<f64>, D::Error> {
        Repr::deserialize(deserializer)
            .and_then(super::from_repr)
            .map(Some)
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    #[derive(Debug, Serialize, Deserialize)]
    struct Sample {
        #[serde(with = "super")]
        value: f64,
        #[serde(with = "super::option", default, skip_serializing_if = "Option::is_none")]
        maybe: Option<f64>,
    }

    #[test]
    fn test_non_finite_values_become_strings() {
        let json = serde_json::to_value(Sample {
            value: f64::NAN,
            maybe: Some(f64::NEG_INFINITY),
        })
        .unwrap();

        assert_eq!(json, json!({ "value": "NaN", "maybe": "-Infinity" }));
    }

    #[test]
    fn test_finite_values_stay_numbers() {
        let json = serde_json::to_value(Sample {
            value: 0.25,
            maybe: None,
        })
        .unwrap();

        assert_eq!(json, json!({ "value": 0.25 }));
    }

    #[test]
    fn test_reads_strings_numbers_and_null() {
        let sample: Sample =
            serde_json::from_value(json!({ "value": null, "maybe": "Infinity" })).unwrap();
        assert!(sample.value.is_nan());
        assert_eq!(sample.maybe, Some(f64::INFINITY));

        let sample: Sample = serde_json::from_value(json!({ "value": 3 })).unwrap();
        assert_eq!(sample.value, 3.0);
        assert_eq!(sample.maybe, None);
    }

    #[test]
    fn test_rejects_unknown_strings() {
        let result: Result<Sample, _> = serde_json::from_value(json!({ "value": "lots" }));
        assert!(result.is_err());
    }
}
