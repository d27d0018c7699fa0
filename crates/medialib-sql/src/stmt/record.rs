use crate::error::{SqlError, SqlResult};
use crate::value::SqlValue;

/// An ordered set of `column -> value` pairs used by INSERT and UPDATE.
///
/// Column order is insertion order. Setting an existing column replaces its
/// value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    pairs: Vec<(String, SqlValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Record::insert`].
    pub fn set(mut self, column: impl Into<String>, value: impl Into<SqlValue>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<SqlValue>) {
        let column = column.into();
        let value = value.into();
        match self.pairs.iter_mut().find(|(c, _)| *c == column) {
            Some(slot) => slot.1 = value,
            None => self.pairs.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&SqlValue> {
        self.pairs
            .iter()
            .find_map(|(c, v)| (c == column).then_some(v))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.pairs.iter().map(|(c, v)| (c.as_str(), v))
    }

    /// Split into parallel column and value lists, dropping `NULL` values.
    pub(crate) fn project(self) -> (Vec<String>, Vec<SqlValue>) {
        self.pairs
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .unzip()
    }

    /// Build a record from a JSON object, keeping the order the keys were written in.
    ///
    /// Scalars map to the matching [`SqlValue`]; arrays and nested objects are
    /// kept as [`SqlValue::Json`].
    pub fn from_json(value: serde_json::Value) -> SqlResult<Self> {
        let serde_json::Value::Object(map) = value else {
            return Err(SqlError::construction("record must be a JSON object"));
        };
        Ok(map
            .into_iter()
            .map(|(k, v)| (k, json_scalar(v)))
            .collect())
    }
}

fn json_scalar(value: serde_json::Value) -> SqlValue {
    use serde_json::Value;
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Bool(b),
        Value::String(s) => SqlValue::Text(s),
        Value::Number(n) => match n.as_i64() {
            Some(i) => SqlValue::Int(i),
            None => n.as_f64().map_or(SqlValue::Text(n.to_string()), SqlValue::Float),
        },
        other => SqlValue::Json(other),
    }
}

impl<K: Into<String>, V: Into<SqlValue>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut record = Record::new();
        for (k, v) in iter {
            record.insert(k, v);
        }
        record
    }
}

impl<'a> IntoIterator for &'a Record {
    type Item = (&'a str, &'a SqlValue);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a SqlValue)> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_in_place() {
        let r = Record::new().set("a", 1).set("b", 2).set("a", 3);
        let cols: Vec<_> = r.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, ["a", "b"]);
        assert_eq!(r.get("a"), Some(&SqlValue::Int(3)));
    }

    #[test]
    fn project_drops_nulls() {
        let r = Record::new()
            .set("title", "Heat")
            .set("cover", None::<String>)
            .set("release_year", 1995);
        let (cols, vals) = r.project();
        assert_eq!(cols, ["title", "release_year"]);
        assert_eq!(vals, [SqlValue::from("Heat"), SqlValue::Int(1995)]);
    }

    #[test]
    fn from_json_keeps_scalars() {
        let r = Record::from_json(serde_json::json!({
            "name": "drama",
            "weight": 1.5,
            "meta": {"k": 1}
        }))
        .unwrap();
        assert_eq!(r.get("name"), Some(&SqlValue::from("drama")));
        assert_eq!(r.get("weight"), Some(&SqlValue::Float(1.5)));
        assert!(matches!(r.get("meta"), Some(SqlValue::Json(_))));
    }

    #[test]
    fn from_json_keeps_written_key_order() {
        let r = Record::from_json(serde_json::json!({
            "title": "Heat",
            "path": "abc",
            "cover_img": null,
            "release_year": 1995
        }))
        .unwrap();
        let cols: Vec<_> = r.iter().map(|(c, _)| c).collect();
        assert_eq!(cols, ["title", "path", "cover_img", "release_year"]);

        let (cols, vals) = r.project();
        assert_eq!(cols, ["title", "path", "release_year"]);
        assert_eq!(
            vals,
            [SqlValue::from("Heat"), SqlValue::from("abc"), SqlValue::Int(1995)]
        );
        assert!(Record::from_json(serde_json::json!([1])).is_err());
    }
}
