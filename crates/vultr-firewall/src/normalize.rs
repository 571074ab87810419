//! Response normalization.
//!
//! The v1 API returns collections as an object keyed by resource id. Facts
//! modules report them as a list of records whose fields are renamed and
//! converted according to a static [`FieldMapping`] table.

use crate::models::FirewallGroupRecord;
use crate::Result;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use vultr_core::Error;

/// How a field value is carried into the normalized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    /// Copy the value unchanged.
    Passthrough,
    /// Convert a number or numeric string to an integer.
    Integer,
}

/// One row of a normalization table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMapping {
    /// Field name in the provider response.
    pub source: &'static str,
    /// Field name in the normalized record.
    pub target: &'static str,
    /// Conversion applied to the value.
    pub conversion: Conversion,
}

impl FieldMapping {
    /// Copy `name` unchanged.
    #[must_use]
    pub const fn passthrough(name: &'static str) -> Self {
        Self {
            source: name,
            target: name,
            conversion: Conversion::Passthrough,
        }
    }

    /// Copy `source` unchanged under a new name.
    #[must_use]
    pub const fn renamed(source: &'static str, target: &'static str) -> Self {
        Self {
            source,
            target,
            conversion: Conversion::Passthrough,
        }
    }

    /// Convert `name` to an integer.
    #[must_use]
    pub const fn integer(name: &'static str) -> Self {
        Self {
            source: name,
            target: name,
            conversion: Conversion::Integer,
        }
    }

    fn apply(&self, entry: &Map<String, Value>) -> Result<Value> {
        let value = match entry.get(self.source) {
            None | Some(Value::Null) => return Err(Error::MissingField(self.source.to_string())),
            Some(value) => value,
        };

        match self.conversion {
            Conversion::Passthrough => Ok(value.clone()),
            Conversion::Integer => coerce_integer(self.source, value).map(Value::from),
        }
    }
}

/// Field table for firewall groups.
pub const FIREWALL_GROUP_FIELDS: &[FieldMapping] = &[
    FieldMapping::renamed("FIREWALLGROUPID", "id"),
    FieldMapping::passthrough("date_created"),
    FieldMapping::passthrough("date_modified"),
    FieldMapping::passthrough("description"),
    FieldMapping::integer("instance_count"),
    FieldMapping::integer("max_rule_count"),
    FieldMapping::integer("rule_count"),
];

/// Normalize a keyed API response into a list of records.
///
/// Keys are discarded and values are kept in the response's iteration order.
/// An absent or empty response yields an empty list. Fields not named in
/// `table` are dropped.
///
/// # Errors
///
/// Fails on the first entry that is not an object, lacks a field named in
/// `table`, or holds a value that cannot be converted. No partial list is
/// returned.
pub fn normalize<T>(raw: Option<&Map<String, Value>>, table: &[FieldMapping]) -> Result<Vec<T>>
where
    T: DeserializeOwned,
{
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    raw.iter()
        .map(|(key, entry)| {
            let entry = entry.as_object().ok_or_else(|| {
                Error::ParseError(format!("Entry `{key}` is not an object: {entry}"))
            })?;

            let mut record = Map::new();
            for mapping in table {
                record.insert(mapping.target.to_string(), mapping.apply(entry)?);
            }

            serde_json::from_value(Value::Object(record)).map_err(|err| {
                Error::ParseError(format!("Entry `{key}` has an unexpected shape: {err}"))
            })
        })
        .collect()
}

/// Normalize a firewall group listing with [`FIREWALL_GROUP_FIELDS`].
///
/// # Errors
///
/// See [`normalize`].
pub fn normalize_firewall_groups(
    raw: Option<&Map<String, Value>>,
) -> Result<Vec<FirewallGroupRecord>> {
    normalize(raw, FIREWALL_GROUP_FIELDS)
}

fn coerce_integer(field: &str, value: &Value) -> Result<i64> {
    let invalid = |message: String| Error::InvalidField {
        field: field.to_string(),
        message,
    };

    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().and_then(whole_float_to_i64))
            .ok_or_else(|| invalid(format!("`{number}` is not an integer"))),
        Value::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|err| invalid(format!("`{text}` is not an integer: {err}"))),
        other => Err(invalid(format!(
            "expected a number or numeric string, got {other}"
        ))),
    }
}

// `50.0` is a whole number; `1.5` and anything outside `i64` are not.
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
fn whole_float_to_i64(value: f64) -> Option<i64> {
    let in_range = value >= i64::MIN as f64 && value < i64::MAX as f64;
    (value.fract() == 0.0 && in_range).then(|| value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn group(id: &str) -> Value {
        json!({
            "FIREWALLGROUPID": id,
            "date_created": "2018-07-12 10:27:14",
            "date_modified": "2018-07-12 10:27:14",
            "description": "test",
            "instance_count": "0",
            "max_rule_count": "50",
            "rule_count": "0"
        })
    }

    fn mapping(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn absent_input_yields_empty_list() {
        assert!(normalize_firewall_groups(None).unwrap().is_empty());
    }

    #[test]
    fn empty_input_yields_empty_list() {
        let raw = Map::new();
        assert!(normalize_firewall_groups(Some(&raw)).unwrap().is_empty());
    }

    #[test]
    fn single_group_is_renamed_and_converted() {
        let raw = mapping(json!({ "5e128ff0": group("5e128ff0") }));
        let records = normalize_firewall_groups(Some(&raw)).unwrap();

        assert_eq!(
            records,
            vec![FirewallGroupRecord {
                id: "5e128ff0".into(),
                date_created: "2018-07-12 10:27:14".into(),
                date_modified: "2018-07-12 10:27:14".into(),
                description: "test".into(),
                instance_count: 0,
                max_rule_count: 50,
                rule_count: 0,
            }]
        );
    }

    #[test]
    fn numeric_counts_are_accepted() {
        let mut entry = group("1234abcd");
        entry["instance_count"] = json!(3);
        entry["max_rule_count"] = json!(50);
        entry["rule_count"] = json!(" 12 ");

        let raw = mapping(json!({ "1234abcd": entry }));
        let records = normalize_firewall_groups(Some(&raw)).unwrap();

        assert_eq!(records[0].instance_count, 3);
        assert_eq!(records[0].max_rule_count, 50);
        assert_eq!(records[0].rule_count, 12);
    }

    #[test]
    fn source_order_is_preserved() {
        let raw = mapping(json!({
            "zz000001": group("zz000001"),
            "aa000002": group("aa000002"),
            "mm000003": group("mm000003")
        }));

        let ids: Vec<String> = normalize_firewall_groups(Some(&raw))
            .unwrap()
            .into_iter()
            .map(|record| record.id)
            .collect();

        assert_eq!(ids, vec!["zz000001", "aa000002", "mm000003"]);
    }

    #[test]
    fn normalize_is_repeatable() {
        let raw = mapping(json!({
            "a": group("a"),
            "b": group("b")
        }));

        let first = normalize_firewall_groups(Some(&raw)).unwrap();
        let second = normalize_firewall_groups(Some(&raw)).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), raw.len());
    }

    #[test]
    fn non_numeric_count_is_fatal() {
        let mut bad = group("bad00001");
        bad["rule_count"] = json!("abc");
        let raw = mapping(json!({
            "good0001": group("good0001"),
            "bad00001": bad
        }));

        let err = normalize_firewall_groups(Some(&raw)).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidField { ref field, .. } if field == "rule_count"
        ));
    }

    #[test]
    fn fractional_count_is_fatal() {
        let mut entry = group("a");
        entry["instance_count"] = json!(1.5);
        let raw = mapping(json!({ "a": entry }));

        assert!(matches!(
            normalize_firewall_groups(Some(&raw)),
            Err(Error::InvalidField { .. })
        ));
    }

    #[test]
    fn whole_float_count_is_accepted() {
        let mut entry = group("a");
        entry["max_rule_count"] = json!(50.0);
        entry["rule_count"] = json!(-2.0);
        let raw = mapping(json!({ "a": entry }));

        let records = normalize_firewall_groups(Some(&raw)).unwrap();
        assert_eq!(records[0].max_rule_count, 50);
        assert_eq!(records[0].rule_count, -2);
    }

    #[test]
    fn out_of_range_or_boolean_count_is_fatal() {
        for value in [json!(1e20), json!(u64::MAX), json!(true)] {
            let mut entry = group("a");
            entry["rule_count"] = value;
            let raw = mapping(json!({ "a": entry }));

            assert!(matches!(
                normalize_firewall_groups(Some(&raw)),
                Err(Error::InvalidField { ref field, .. }) if field == "rule_count"
            ));
        }
    }

    #[test]
    fn missing_count_is_fatal() {
        let mut entry = group("a");
        entry.as_object_mut().unwrap().remove("max_rule_count");
        let raw = mapping(json!({ "a": entry }));

        assert_eq!(
            normalize_firewall_groups(Some(&raw)).unwrap_err(),
            Error::MissingField("max_rule_count".into())
        );
    }

    #[test]
    fn null_count_is_fatal() {
        let mut entry = group("a");
        entry["instance_count"] = Value::Null;
        let raw = mapping(json!({ "a": entry }));

        assert_eq!(
            normalize_firewall_groups(Some(&raw)).unwrap_err(),
            Error::MissingField("instance_count".into())
        );
    }

    #[test]
    fn missing_passthrough_field_is_fatal() {
        let mut entry = group("a");
        entry.as_object_mut().unwrap().remove("FIREWALLGROUPID");
        let raw = mapping(json!({ "a": entry }));

        assert_eq!(
            normalize_firewall_groups(Some(&raw)).unwrap_err(),
            Error::MissingField("FIREWALLGROUPID".into())
        );
    }

    #[test]
    fn non_object_entry_is_parse_error() {
        let raw = mapping(json!({ "a": "5e128ff0" }));
        assert!(matches!(
            normalize_firewall_groups(Some(&raw)),
            Err(Error::ParseError(_))
        ));
    }

    #[test]
    fn unmapped_fields_are_dropped() {
        let table = [FieldMapping::renamed("SUBID", "id"), FieldMapping::integer("ram")];
        let raw = mapping(json!({
            "576965": {"SUBID": "576965", "ram": "1024", "label": "web"}
        }));

        let records: Vec<Value> = normalize(Some(&raw), &table).unwrap();
        assert_eq!(records, vec![json!({"id": "576965", "ram": 1024})]);
    }
}
