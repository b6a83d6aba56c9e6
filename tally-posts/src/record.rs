use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::de::{Deserialize, Deserializer, Error as DeError};
use serde_json::Value;

/// Author of a post
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct User {
    /// Handle of the author
    pub username: String
}

/// A user mentioned by a post
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MentionedUser {
    /// Handle of the mentioned user
    pub username: String
}

/// One post, parsed from one line of input.  Fields not listed here are ignored.
///
/// Only `date` and `user.username` are required.  A missing or non-string `content` reads
/// as empty, and a `mentionedUsers` entry without a string `username` is dropped, so a bad
/// optional field never costs the post its date.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Calendar date of the post, as written in its timestamp
    #[serde(deserialize_with = "calendar_date")]
    pub date: NaiveDate,

    /// Author of the post
    pub user: User,

    /// Free-form text of the post
    #[serde(default, deserialize_with = "text_or_empty")]
    pub content: String,

    /// Users mentioned by the post; `null`, a missing field and a non-list all mean none
    #[serde(default, deserialize_with = "well_formed_mentions")]
    pub mentioned_users: Option<Vec<MentionedUser>>
}

/// Truncates an ISO-8601 timestamp to its calendar date.
///
/// The date is taken as written: an offset is parsed but never applied, so
/// `2023-01-01T23:30:00-05:00` stays on the first.
/// ```rust
/// use chrono::NaiveDate;
/// use tally_posts::record::parse_date;
///
/// let day = NaiveDate::from_ymd_opt(2021, 2, 24);
/// assert_eq!(parse_date("2021-02-24T09:23:35+00:00"), day);
/// assert_eq!(parse_date("2021-02-24"), day);
/// assert_eq!(parse_date("yesterday"), None);
/// ```
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_local().date());
    }
    for fmt in &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn calendar_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    parse_date(&raw).ok_or_else(|| D::Error::custom(format!("invalid date '{}'", raw)))
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(text) => Ok(text),
        _ => Ok(String::new())
    }
}

fn well_formed_mentions<'de, D>(deserializer: D) -> Result<Option<Vec<MentionedUser>>, D::Error>
where
    D: Deserializer<'de>
{
    match Value::deserialize(deserializer)? {
        Value::Array(entries) => Ok(Some(entries.into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect())),
        _ => Ok(None)
    }
}

#[cfg(test)]
mod record_test {
    use super::*;

    fn parse(line: &str) -> Result<Record, serde_json::Error> {
        serde_json::from_str(line)
    }

    #[test]
    fn test_full_record() {
        let line = r#"{"date": "2021-02-24T09:23:35+00:00", "user": {"username": "alice", "id": 1},
            "content": "hi @bob", "mentionedUsers": [{"username": "bob", "displayname": "Bob"}],
            "likeCount": 3}"#;
        let record = parse(line).unwrap();
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2021, 2, 24).unwrap());
        assert_eq!(record.user.username, "alice");
        assert_eq!(record.content, "hi @bob");
        assert_eq!(record.mentioned_users, Some(vec![MentionedUser { username: "bob".into() }]));
    }

    #[test]
    fn test_null_and_missing_mentions() {
        let null = r#"{"date": "2021-02-24", "user": {"username": "a"}, "content": "", "mentionedUsers": null}"#;
        let missing = r#"{"date": "2021-02-24", "user": {"username": "a"}, "content": ""}"#;
        assert_eq!(parse(null).unwrap().mentioned_users, None);
        assert_eq!(parse(missing).unwrap().mentioned_users, None);
    }

    #[test]
    fn test_offset_is_not_applied() {
        assert_eq!(parse_date("2023-01-01T23:30:00-05:00"), NaiveDate::from_ymd_opt(2023, 1, 1));
        assert_eq!(parse_date("2023-01-01 23:30:00"), NaiveDate::from_ymd_opt(2023, 1, 1));
    }

    #[test]
    fn test_malformed_records() {
        assert!(parse(r#"{"date": "soon", "user": {"username": "a"}, "content": ""}"#).is_err());
        assert!(parse(r#"{"date": "2021-02-24", "content": ""}"#).is_err());
        assert!(parse(r#"{"user": {"username": "a"}, "content": ""}"#).is_err());
        assert!(parse(r#"{"date": "2021-02-24", "user": {"id": 1}, "content": ""}"#).is_err());
        assert!(parse("not json").is_err());
    }

    #[test]
    fn test_bad_optional_fields_keep_the_post() {
        let null_content = parse(r#"{"date": "2023-01-01T00:00:00+00:00", "user": {"username": "alice"}, "content": null}"#).unwrap();
        assert_eq!(null_content.content, "");
        assert_eq!(null_content.user.username, "alice");

        let no_content = parse(r#"{"date": "2023-01-01", "user": {"username": "a"}, "content": 7}"#).unwrap();
        assert_eq!(no_content.content, "");

        let mixed = parse(r#"{"date": "2023-01-01", "user": {"username": "a"}, "content": "",
            "mentionedUsers": [{"id": 1}, {"username": "bob"}, null, {"username": 3}]}"#).unwrap();
        assert_eq!(mixed.mentioned_users, Some(vec![MentionedUser { username: "bob".into() }]));

        let scalar = parse(r#"{"date": "2023-01-01", "user": {"username": "a"}, "mentionedUsers": "bob"}"#).unwrap();
        assert_eq!(scalar.mentioned_users, None);
        assert_eq!(scalar.content, "");
    }
}
