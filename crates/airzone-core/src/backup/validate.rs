// ── Backup validation ──
//
// Works on raw JSON so that any file, however broken, yields a report.
// Checks run in document order and every issue carries the path of the
// offending value, e.g. `zones[3].setpoint`.

use std::collections::HashSet;
use std::fmt;

use airzone_api::{ALL, ALL_SYSTEMS};
use serde::Serialize;
use serde_json::{Map, Value};

use super::snapshot::{SCHEMA_VERSION, Snapshot};
use crate::model::{MAX_SLEEP_MINUTES, Units};

/// One problem found in a backup document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationIssue {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

/// Outcome of validating a backup. `valid` iff `errors` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn from_issues(errors: Vec<ValidationIssue>) -> Self {
        Self {
            valid: errors.is_empty(),
            errors,
        }
    }

    fn single(path: &str, reason: impl Into<String>) -> Self {
        Self::from_issues(vec![ValidationIssue {
            path: path.into(),
            reason: reason.into(),
        }])
    }
}

/// Validate raw backup file contents.
pub fn validate_bytes(bytes: &[u8]) -> ValidationReport {
    match serde_json::from_slice::<Value>(bytes) {
        Ok(value) => validate_value(&value),
        Err(e) => ValidationReport::single("$", format!("not valid JSON: {e}")),
    }
}

/// Validate an in-memory snapshot.
pub fn validate_snapshot(snapshot: &Snapshot) -> ValidationReport {
    match serde_json::to_value(snapshot) {
        Ok(value) => validate_value(&value),
        Err(e) => ValidationReport::single("$", format!("cannot encode snapshot: {e}")),
    }
}

/// Validate a parsed backup document.
pub fn validate_value(doc: &Value) -> ValidationReport {
    let Some(root) = doc.as_object() else {
        return ValidationReport::single("$", "backup must be a JSON object");
    };

    let mut v = Validator::default();
    v.check_header(root);
    v.check_device(root.get("device"));

    let systems = v.entity_list(root, "systems");
    let zones = v.entity_list(root, "zones");
    let sensors = v.entity_list(root, "sensors");

    let mut system_ids = HashSet::new();
    for (i, system) in systems.iter().enumerate() {
        let path = format!("systems[{i}]");
        if let Some(id) = v.system_id(&path, system) {
            if !system_ids.insert(id) {
                v.push(format!("{path}.systemID"), format!("duplicate system {id}"));
            }
        }
        v.check_mode(&path, system);
    }

    // An IAQ sensor carries the id of the zone it is fitted in, so zones
    // and sensors are checked for duplicates separately.
    let mut zone_ids = HashSet::new();
    for (i, zone) in zones.iter().enumerate() {
        let path = format!("zones[{i}]");
        v.check_member(&path, zone, "zoneID", &system_ids, &mut zone_ids);
        v.check_zone_ranges(&path, zone);
    }
    let mut sensor_ids = HashSet::new();
    for (i, sensor) in sensors.iter().enumerate() {
        let path = format!("sensors[{i}]");
        v.check_member(&path, sensor, "iaqsensorID", &system_ids, &mut sensor_ids);
        v.check_code_range(&path, sensor, "iaq_mode_vent", 0, 2);
    }

    ValidationReport::from_issues(v.issues)
}

#[derive(Default)]
struct Validator {
    issues: Vec<ValidationIssue>,
}

impl Validator {
    fn push(&mut self, path: impl Into<String>, reason: impl Into<String>) {
        self.issues.push(ValidationIssue {
            path: path.into(),
            reason: reason.into(),
        });
    }

    // ── Envelope ─────────────────────────────────────────────────────

    fn check_header(&mut self, root: &Map<String, Value>) {
        match root.get("version") {
            None => self.push("version", "missing"),
            Some(Value::Number(n)) if n.as_u64() == Some(u64::from(SCHEMA_VERSION)) => {}
            Some(other) => self.push(
                "version",
                format!("unsupported backup version {other} (expected {SCHEMA_VERSION})"),
            ),
        }

        match root.get("createdAt") {
            None => self.push("createdAt", "missing"),
            Some(Value::String(s)) => {
                if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                    self.push("createdAt", format!("not an RFC 3339 timestamp: {s:?}"));
                }
            }
            Some(_) => self.push("createdAt", "must be a string"),
        }
    }

    fn check_device(&mut self, device: Option<&Value>) {
        let Some(device) = device else {
            self.push("device", "missing");
            return;
        };
        let Some(device) = device.as_object() else {
            self.push("device", "must be an object");
            return;
        };
        for field in ["alias", "mac"] {
            match device.get(field) {
                Some(Value::String(s)) if !s.trim().is_empty() => {}
                Some(Value::String(_)) => self.push(format!("device.{field}"), "is empty"),
                Some(_) => self.push(format!("device.{field}"), "must be a string"),
                None => self.push(format!("device.{field}"), "missing"),
            }
        }
        if let Some(port) = device.get("port") {
            if port.as_u64().is_none_or(|p| p > u64::from(u16::MAX)) {
                self.push("device.port", format!("not a valid port: {port}"));
            }
        }
    }

    /// Objects of a top-level array. Non-object items are reported and skipped.
    fn entity_list<'a>(&mut self, root: &'a Map<String, Value>, key: &str) -> Vec<&'a Map<String, Value>> {
        match root.get(key) {
            None if key == "sensors" => Vec::new(),
            None => {
                self.push(key, "missing");
                Vec::new()
            }
            Some(Value::Array(items)) => items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| {
                    let obj = item.as_object();
                    if obj.is_none() {
                        self.push(format!("{key}[{i}]"), "must be an object");
                    }
                    obj
                })
                .collect(),
            Some(_) => {
                self.push(key, "must be an array");
                Vec::new()
            }
        }
    }

    // ── Identifiers ──────────────────────────────────────────────────

    fn id_field(&mut self, path: &str, entity: &Map<String, Value>, field: &str) -> Option<u64> {
        let field_path = format!("{path}.{field}");
        let Some(value) = entity.get(field) else {
            self.push(field_path, "missing");
            return None;
        };
        let Some(id) = value.as_u64() else {
            self.push(field_path, format!("must be a non-negative integer, got {value}"));
            return None;
        };
        if id == u64::from(ALL) {
            self.push(field_path, "0 is the broadcast selector, not an entity");
            return None;
        }
        Some(id)
    }

    fn system_id(&mut self, path: &str, entity: &Map<String, Value>) -> Option<u64> {
        let id = self.id_field(path, entity, "systemID")?;
        if id == u64::from(ALL_SYSTEMS) {
            self.push(
                format!("{path}.systemID"),
                "127 is the all-systems selector, not a system",
            );
            return None;
        }
        Some(id)
    }

    fn check_member(
        &mut self,
        path: &str,
        entity: &Map<String, Value>,
        id_field: &str,
        system_ids: &HashSet<u64>,
        seen: &mut HashSet<(u64, u64)>,
    ) {
        let system = self.system_id(path, entity);
        let id = self.id_field(path, entity, id_field);

        if let Some(system) = system {
            if !system_ids.contains(&system) {
                self.push(
                    format!("{path}.systemID"),
                    format!("references system {system}, which is not in the backup"),
                );
            }
            if let Some(id) = id {
                if !seen.insert((system, id)) {
                    self.push(
                        format!("{path}.{id_field}"),
                        format!("duplicate entity {system}/{id}"),
                    );
                }
            }
        }
    }

    // ── Value ranges ─────────────────────────────────────────────────

    fn check_zone_ranges(&mut self, path: &str, zone: &Map<String, Value>) {
        self.check_mode(path, zone);
        self.check_code_range(path, zone, "on", 0, 1);
        self.check_code_range(path, zone, "sleep", 0, i64::from(MAX_SLEEP_MINUTES));
        self.check_code_range(path, zone, "humidity", 0, 100);
        self.check_code_range(path, zone, "aq_mode", 0, 2);

        if let Some(setpoint) = zone.get("setpoint") {
            let units = Units::from_code(zone.get("units").and_then(Value::as_i64));
            let (min, max) = units.setpoint_range();
            match setpoint.as_f64() {
                Some(t) if (min..=max).contains(&t) => {}
                Some(t) => self.push(
                    format!("{path}.setpoint"),
                    format!("{t}{} is outside {min}..={max}", units.symbol()),
                ),
                None => self.push(format!("{path}.setpoint"), "must be a number"),
            }
        }
    }

    fn check_mode(&mut self, path: &str, entity: &Map<String, Value>) {
        self.check_code_range(path, entity, "mode", 1, 5);
    }

    /// Integer field (booleans count as 0/1) within `min..=max`, if present.
    fn check_code_range(&mut self, path: &str, entity: &Map<String, Value>, field: &str, min: i64, max: i64) {
        let Some(value) = entity.get(field) else {
            return;
        };
        let code = match value {
            Value::Bool(b) => Some(i64::from(*b)),
            Value::Number(n) => n.as_i64(),
            _ => None,
        };
        match code {
            Some(c) if (min..=max).contains(&c) => {}
            Some(c) => self.push(format!("{path}.{field}"), format!("{c} is outside {min}..={max}")),
            None => self.push(format!("{path}.{field}"), format!("must be an integer, got {value}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn valid_doc() -> Value {
        json!({
            "version": 1,
            "createdAt": "2024-05-01T10:00:00Z",
            "device": { "alias": "Casa", "mac": "AA:BB", "host": "10.0.0.5", "port": 3000 },
            "systems": [{ "systemID": 1 }, { "systemID": 2 }],
            "zones": [
                { "systemID": 1, "zoneID": 1, "on": 1, "setpoint": 22.5, "mode": 2 },
                { "systemID": 2, "zoneID": 1, "units": 1, "setpoint": 72 }
            ],
            "sensors": [{ "systemID": 1, "iaqsensorID": 2, "iaq_mode_vent": 2 }]
        })
    }

    fn paths(report: &ValidationReport) -> Vec<&str> {
        report.errors.iter().map(|e| e.path.as_str()).collect()
    }

    #[test]
    fn accepts_well_formed_backup() {
        let report = validate_value(&valid_doc());
        assert_eq!(report.errors, vec![]);
        assert!(report.valid);
    }

    #[test]
    fn reports_corrupted_zone_id_with_path() {
        let mut doc = valid_doc();
        doc["zones"][1]["zoneID"] = json!("three");
        let report = validate_value(&doc);
        assert!(!report.valid);
        assert_eq!(paths(&report), vec!["zones[1].zoneID"]);
    }

    #[test]
    fn rejects_unknown_version_and_missing_identity() {
        let mut doc = valid_doc();
        doc["version"] = json!(99);
        doc["device"].as_object_mut().unwrap().remove("mac");
        let report = validate_value(&doc);
        assert_eq!(paths(&report), vec!["version", "device.mac"]);
    }

    #[test]
    fn flags_duplicates_and_dangling_references() {
        let mut doc = valid_doc();
        doc["zones"].as_array_mut().unwrap().push(json!({ "systemID": 1, "zoneID": 1 }));
        doc["sensors"][0]["systemID"] = json!(9);
        let report = validate_value(&doc);
        assert_eq!(paths(&report), vec!["zones[2].zoneID", "sensors[0].systemID"]);
    }

    #[test]
    fn sensor_may_share_its_zone_id() {
        let mut doc = valid_doc();
        doc["sensors"][0]["iaqsensorID"] = json!(1);
        let report = validate_value(&doc);
        assert!(report.valid, "{:?}", report.errors);
    }

    #[test]
    fn duplicate_sensors_are_flagged() {
        let mut doc = valid_doc();
        doc["sensors"]
            .as_array_mut()
            .unwrap()
            .push(json!({ "systemID": 1, "iaqsensorID": 2 }));
        let report = validate_value(&doc);
        assert_eq!(paths(&report), vec!["sensors[1].iaqsensorID"]);
    }

    #[test]
    fn checks_value_ranges() {
        let mut doc = valid_doc();
        doc["zones"][0]["setpoint"] = json!(72);
        doc["zones"][0]["mode"] = json!(9);
        doc["zones"][0]["sleep"] = json!(2000);
        doc["zones"][0]["humidity"] = json!(101);
        doc["sensors"][0]["iaq_mode_vent"] = json!(3);
        let report = validate_value(&doc);
        assert_eq!(
            paths(&report),
            vec![
                "zones[0].mode",
                "zones[0].sleep",
                "zones[0].humidity",
                "zones[0].setpoint",
                "sensors[0].iaq_mode_vent",
            ]
        );
    }

    #[test]
    fn reserved_selectors_are_not_identifiers() {
        let mut doc = valid_doc();
        doc["systems"][1]["systemID"] = json!(127);
        doc["zones"][1]["zoneID"] = json!(0);
        let report = validate_value(&doc);
        assert!(paths(&report).contains(&"systems[1].systemID"));
        assert!(paths(&report).contains(&"zones[1].zoneID"));
    }

    #[test]
    fn garbage_never_panics() {
        for bytes in [&b""[..], b"[]", b"null", b"{\"version\":", b"{}"] {
            let report = validate_bytes(bytes);
            assert!(!report.valid);
        }
        let report = validate_bytes(b"{}");
        assert_eq!(
            paths(&report),
            vec!["version", "createdAt", "device", "systems", "zones"]
        );
    }

    #[test]
    fn validation_is_deterministic() {
        let mut doc = valid_doc();
        doc["zones"][0]["on"] = json!(7);
        assert_eq!(validate_value(&doc), validate_value(&doc));
    }
}
