use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Partial, path-addressable accumulation of intake answers.
///
/// Paths are dotted (`system.hvac.ac`). Intermediate objects are created on
/// write, and a JSON `null` reads back as absent.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormRecord(Map<String, Value>);

impl FormRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps a JSON object. Any other JSON shape is handed back unchanged.
    pub fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(other),
        }
    }

    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.0.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        (!current.is_null()).then_some(current)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn set(&mut self, path: &str, value: Value) {
        let segments: Vec<&str> = path.split('.').collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.0;
        for segment in parents {
            let slot =
                current.entry((*segment).to_string()).or_insert_with(|| Value::Object(Map::new()));
            if !slot.is_object() {
                *slot = Value::Object(Map::new());
            }
            current = match slot {
                Value::Object(map) => map,
                _ => return,
            };
        }
        current.insert((*last).to_string(), value);
    }

    pub fn remove(&mut self, path: &str) -> Option<Value> {
        let segments: Vec<&str> = path.split('.').collect();
        let (last, parents) = segments.split_last()?;

        let mut current = &mut self.0;
        for segment in parents {
            current = current.get_mut(*segment)?.as_object_mut()?;
        }
        current.remove(*last)
    }

    /// Top-level section object, e.g. `customer`.
    pub fn section(&self, name: &str) -> Option<&Map<String, Value>> {
        self.0.get(name).and_then(Value::as_object)
    }

    pub fn ensure_section(&mut self, name: &str) {
        let slot = self.0.entry(name.to_string()).or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.0.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

impl From<Map<String, Value>> for FormRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::FormRecord;

    #[test]
    fn nested_paths_are_created_on_write() {
        let mut record = FormRecord::new();
        record.set("system.hvac.ac", json!(true));

        assert_eq!(record.get("system.hvac.ac"), Some(&json!(true)));
        assert!(record.get("system.hvac").is_some_and(|value| value.is_object()));
        assert_eq!(record.get("system.hvac.heatExchanger"), None);
    }

    #[test]
    fn null_values_read_as_absent() {
        let record = FormRecord::from_value(json!({ "operation": { "loanAmount": null } }))
            .expect("object record");

        assert!(!record.contains("operation.loanAmount"));
        assert!(record.section("operation").is_some());
    }

    #[test]
    fn scalar_in_the_way_is_replaced_by_an_object() {
        let mut record = FormRecord::from_value(json!({ "system": "legacy" })).expect("object");
        record.set("system.systemType", json!("fixed_rack_custom"));

        assert_eq!(record.get("system.systemType"), Some(&json!("fixed_rack_custom")));
    }

    #[test]
    fn remove_returns_previous_value() {
        let mut record = FormRecord::new();
        record.set("customer.name", json!("Kim"));

        assert_eq!(record.remove("customer.name"), Some(json!("Kim")));
        assert_eq!(record.remove("customer.name"), None);
        assert_eq!(record.remove("missing.path"), None);
    }

    #[test]
    fn non_object_json_is_rejected() {
        let rejected = FormRecord::from_value(json!([1, 2, 3])).expect_err("array is not a record");
        assert_eq!(rejected, json!([1, 2, 3]));
    }
}
