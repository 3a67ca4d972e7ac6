use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::collections::BTreeMap;

/// Field map of a record, ordered by field name.
pub type Fields = BTreeMap<String, String>;

/// A named set of fields owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    pub user_id: i64,
    pub name: String,
    pub fields: Fields,
    pub created_at: String,
    pub updated_at: String,
}

/// Row shape of the `records` table; `fields` is still JSON text.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct RecordRow {
    pub id: String,
    pub user_id: i64,
    pub name: String,
    pub fields: String,
    pub created_at: String,
    pub updated_at: String,
}

pub(crate) const RECORD_COLUMNS: &str = "id, user_id, name, fields, created_at, updated_at";

impl RecordRow {
    pub(crate) fn into_record(self) -> Result<Record, serde_json::Error> {
        let fields: Fields = serde_json::from_str(&self.fields)?;
        Ok(Record {
            id: self.id,
            user_id: self.user_id,
            name: self.name,
            fields,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl Record {
    /// The single `value` field of a free-text record, if that is all it holds.
    pub fn plain_value(&self) -> Option<&str> {
        match self.fields.len() {
            1 => self.fields.get(crate::utils::validation::DEFAULT_FIELD).map(String::as_str),
            _ => None,
        }
    }

    /// One-line plain text rendering: `value` or `k=v, k=v`.
    pub fn summary(&self) -> String {
        match self.plain_value() {
            Some(value) => value.to_string(),
            None => self
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    /// [`Record::summary`] cut to at most `max_chars` characters, ending in `…` when cut.
    pub fn preview(&self, max_chars: usize) -> String {
        let summary = self.summary();
        if summary.chars().count() <= max_chars {
            return summary;
        }
        let mut cut: String = summary.chars().take(max_chars.saturating_sub(1)).collect();
        cut.push('…');
        cut
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(fields: &[(&str, &str)]) -> Record {
        Record {
            id: "id".into(),
            user_id: 1,
            name: "r".into(),
            fields: fields.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_summary_of_plain_record() {
        let r = record(&[("value", "buy milk")]);
        assert_eq!(r.plain_value(), Some("buy milk"));
        assert_eq!(r.summary(), "buy milk");
    }

    #[test]
    fn test_summary_of_field_record() {
        let r = record(&[("lang", "de"), ("city", "Berlin")]);
        assert_eq!(r.plain_value(), None);
        assert_eq!(r.summary(), "city=Berlin, lang=de");
    }

    #[test]
    fn test_row_with_bad_json_fails() {
        let row = RecordRow {
            id: "id".into(),
            user_id: 1,
            name: "r".into(),
            fields: "not json".into(),
            created_at: String::new(),
            updated_at: String::new(),
        };
        assert!(row.into_record().is_err());
    }
}
