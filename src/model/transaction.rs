use crate::error::Res;
use crate::model::Amount;
use anyhow::bail;
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Whether a transaction records money coming in or going out. Fixed at creation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// The identity the service assigns to a transaction. Some deployments use integer keys and some
/// use strings, so both are accepted on the wire and kept as text.
#[derive(Debug, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Res<Self> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            bail!("A transaction ID cannot be empty");
        }
        Ok(Self(trimmed.to_string()))
    }
}

impl From<u64> for TransactionId {
    fn from(value: u64) -> Self {
        Self(value.to_string())
    }
}

impl Serialize for TransactionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct IdVisitor;

        impl Visitor<'_> for IdVisitor {
            type Value = TransactionId;

            fn expecting(&self, f: &mut Formatter<'_>) -> fmt::Result {
                f.write_str("an integer or string transaction id")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<TransactionId, E> {
                Ok(TransactionId::from(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<TransactionId, E> {
                Ok(TransactionId(v.to_string()))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<TransactionId, E> {
                TransactionId::from_str(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(IdVisitor)
    }
}

/// A single income or expense record as held by the service.
///
/// `source` is only meaningful for income and `category`/`subcategory` only for expenses. The
/// amount is optional here so that a malformed record can still be loaded and then rejected by
/// the code that needs the amount, rather than being silently counted as zero.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    #[serde(rename = "type")]
    pub(crate) kind: TransactionType,
    #[serde(default)]
    pub(crate) amount: Option<Amount>,
    #[serde(default, with = "timestamp")]
    pub(crate) timestamp: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) subcategory: Option<String>,
}

impl Transaction {
    /// Creates a transaction with only the fields every record has. The type-specific fields are
    /// set with the `with_*` methods.
    pub fn new(
        id: impl Into<TransactionId>,
        kind: TransactionType,
        amount: Amount,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            kind,
            amount: Some(amount),
            timestamp: Some(timestamp),
            title: None,
            description: None,
            source: None,
            category: None,
            subcategory: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_subcategory(mut self, subcategory: impl Into<String>) -> Self {
        self.subcategory = Some(subcategory.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn kind(&self) -> TransactionType {
        self.kind
    }

    pub fn amount(&self) -> Option<Amount> {
        self.amount
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        self.timestamp
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn subcategory(&self) -> Option<&str> {
        self.subcategory.as_deref()
    }

    /// The calendar date of the timestamp as seen in `tz`.
    pub fn date_in<Tz: TimeZone>(&self, tz: &Tz) -> Option<NaiveDate> {
        self.timestamp.map(|ts| ts.with_timezone(tz).date_naive())
    }
}

impl From<&str> for TransactionId {
    fn from(value: &str) -> Self {
        TransactionId::new(value)
    }
}

/// Parses the timestamp formats the service has been seen to emit: RFC 3339, RFC 2822 (the HTTP
/// date format) and a naive ISO date-time, which is taken to be UTC.
pub(crate) fn parse_timestamp(s: &str) -> Res<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    bail!("Unrecognized timestamp '{s}'")
}

mod timestamp {
    use super::parse_timestamp;
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(
        value: &Option<DateTime<Utc>>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(ts) => serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Secs, true)),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<DateTime<Utc>>, D::Error> {
        match Option::<String>::deserialize(deserializer)? {
            Some(s) => parse_timestamp(&s)
                .map(Some)
                .map_err(serde::de::Error::custom),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn test_deserialize_expense() {
        let json = r#"{
            "id": 7,
            "type": "expense",
            "amount": 500,
            "timestamp": "2025-03-10T12:30:00Z",
            "category": "Food",
            "subcategory": "Snacks",
            "description": "chips"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id().as_str(), "7");
        assert_eq!(t.kind(), TransactionType::Expense);
        assert_eq!(t.amount(), Some(Amount::from(500_i64)));
        assert_eq!(t.category(), Some("Food"));
        assert_eq!(t.subcategory(), Some("Snacks"));
        assert_eq!(t.source(), None);
    }

    #[test]
    fn test_deserialize_income_with_string_id_and_http_date() {
        let json = r#"{
            "id": "abc123",
            "type": "income",
            "amount": "2500.50",
            "timestamp": "Mon, 10 Mar 2025 12:00:00 GMT",
            "source": "Salary"
        }"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.id().as_str(), "abc123");
        assert_eq!(t.source(), Some("Salary"));
        let expected = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        assert_eq!(t.timestamp(), Some(expected));
    }

    #[test]
    fn test_missing_amount_is_none() {
        let json = r#"{"id": 1, "type": "income", "source": "Gift", "amount": null}"#;
        let t: Transaction = serde_json::from_str(json).unwrap();
        assert_eq!(t.amount(), None);
        assert_eq!(t.timestamp(), None);
    }

    #[test]
    fn test_non_numeric_amount_is_rejected() {
        let json = r#"{"id": 1, "type": "income", "amount": "a lot"}"#;
        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"id": 1, "type": "transfer", "amount": 5}"#;
        assert!(serde_json::from_str::<Transaction>(json).is_err());
    }

    #[test]
    fn test_parse_naive_timestamp_as_utc() {
        let ts = parse_timestamp("2025-01-15T08:00:00.123").unwrap();
        assert_eq!(ts.date_naive(), NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
        assert!(parse_timestamp("yesterday").is_err());
    }

    #[test]
    fn test_date_in_time_zone() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
        let t = Transaction::new(1_u64, TransactionType::Expense, Amount::from(1_i64), ts);
        let utc_date = t.date_in(&Utc).unwrap();
        let east = FixedOffset::east_opt(3 * 3600).unwrap();
        let east_date = t.date_in(&east).unwrap();
        assert_eq!(utc_date, NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(east_date, NaiveDate::from_ymd_opt(2025, 3, 11).unwrap());
    }

    #[test]
    fn test_serialize_round_trip_keeps_fields() {
        let ts = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();
        let t = Transaction::new("9", TransactionType::Expense, Amount::from(42_i64), ts)
            .with_category("Transport")
            .with_description("bus");
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["id"], "9");
        assert_eq!(json["type"], "expense");
        assert_eq!(json["amount"], 42);
        assert_eq!(json["timestamp"], "2025-03-10T12:00:00Z");
        assert!(json.get("source").is_none());
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }

    #[test]
    fn test_transaction_id_from_str() {
        assert_eq!(TransactionId::from_str(" 12 ").unwrap().as_str(), "12");
        assert!(TransactionId::from_str("  ").is_err());
    }
}
