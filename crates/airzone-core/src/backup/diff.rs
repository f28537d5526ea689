// ── Snapshot comparison ──

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};

use super::snapshot::{DeviceIdentity, Snapshot};

/// Which fields a diff looks at.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DiffScope {
    /// User-controllable configuration only (power, setpoint, mode, fan,
    /// slats, names, ventilation). Live readings are ignored.
    #[default]
    Control,
    /// Every field, including temperatures and sensor readings.
    All,
}

const ZONE_CONTROL_FIELDS: &[&str] = &[
    "name",
    "on",
    "setpoint",
    "mode",
    "sleep",
    "speed",
    "slats_vertical",
    "slats_horizontal",
    "slats_vswing",
    "slats_hswing",
    "aq_mode",
    "antifreeze",
    "eco_adapt",
    "units",
];

const SYSTEM_CONTROL_FIELDS: &[&str] = &["mode", "manufacturer", "system_firmware", "system_type"];

const SENSOR_CONTROL_FIELDS: &[&str] = &["name", "iaq_mode_vent"];

/// Tolerance for numeric field comparison.
const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum EntityRef {
    System { system_id: u32 },
    Zone { system_id: u32, zone_id: u32 },
    Sensor { system_id: u32, sensor_id: u32 },
}

impl fmt::Display for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System { system_id } => write!(f, "system {system_id}"),
            Self::Zone { system_id, zone_id } => write!(f, "zone {system_id}/{zone_id}"),
            Self::Sensor {
                system_id,
                sensor_id,
            } => write!(f, "IAQ sensor {system_id}/{sensor_id}"),
        }
    }
}

/// One field that differs. A side lacking the field shows as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityDiff {
    pub entity: EntityRef,
    pub name: String,
    pub changes: Vec<FieldChange>,
}

/// Differences between a snapshot (`source`) and another state (`target`).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiffResult {
    pub source: DeviceIdentity,
    pub target: DeviceIdentity,
    pub scope: DiffScope,
    pub changed: Vec<EntityDiff>,
    pub snapshot_only: Vec<EntityRef>,
    pub live_only: Vec<EntityRef>,
}

impl DiffResult {
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.snapshot_only.is_empty() && self.live_only.is_empty()
    }

    /// Whether both sides came from the same webserver (by MAC).
    pub fn same_device(&self) -> bool {
        self.source.mac.eq_ignore_ascii_case(&self.target.mac)
    }

    pub fn change_count(&self) -> usize {
        self.changed.iter().map(|e| e.changes.len()).sum()
    }
}

/// Compare two snapshots. Pure: no I/O, no writes.
pub fn diff(source: &Snapshot, target: &Snapshot, scope: DiffScope) -> DiffResult {
    let mut out = DiffResult {
        source: source.device().clone(),
        target: target.device().clone(),
        scope,
        changed: Vec::new(),
        snapshot_only: Vec::new(),
        live_only: Vec::new(),
    };

    let old = index(source);
    let new = index(target);

    for (entity, (name, old_fields)) in &old {
        let Some((_, new_fields)) = new.get(entity) else {
            out.snapshot_only.push(*entity);
            continue;
        };
        let changes = diff_fields(*entity, old_fields, new_fields, scope);
        if !changes.is_empty() {
            out.changed.push(EntityDiff {
                entity: *entity,
                name: name.clone(),
                changes,
            });
        }
    }
    out.live_only = new.keys().filter(|e| !old.contains_key(e)).copied().collect();
    out
}

type EntityIndex<'a> = BTreeMap<EntityRef, (String, &'a Map<String, Value>)>;

fn index(s: &Snapshot) -> EntityIndex<'_> {
    let mut map = EntityIndex::new();
    for system in s.systems() {
        map.insert(
            EntityRef::System {
                system_id: system.system_id,
            },
            (system.name(), &system.fields),
        );
    }
    for zone in s.zones() {
        map.insert(
            EntityRef::Zone {
                system_id: zone.system_id,
                zone_id: zone.zone_id,
            },
            (zone.display_name(), &zone.fields),
        );
    }
    for sensor in s.sensors() {
        map.insert(
            EntityRef::Sensor {
                system_id: sensor.system_id,
                sensor_id: sensor.sensor_id,
            },
            (sensor.display_name(), &sensor.fields),
        );
    }
    map
}

fn diff_fields(
    entity: EntityRef,
    old: &Map<String, Value>,
    new: &Map<String, Value>,
    scope: DiffScope,
) -> Vec<FieldChange> {
    // Control fields keep their declared order; `All` is alphabetical.
    let fields: Vec<&str> = match scope {
        DiffScope::Control => control_fields(entity).to_vec(),
        DiffScope::All => old
            .keys()
            .chain(new.keys())
            .map(String::as_str)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect(),
    };

    fields
        .into_iter()
        .filter_map(|field| {
            let a = old.get(field);
            let b = new.get(field);
            match (a, b) {
                (None, None) => None,
                (Some(a), Some(b)) if values_equal(a, b) => None,
                _ => Some(FieldChange {
                    field: field.to_owned(),
                    old: a.cloned().unwrap_or(Value::Null),
                    new: b.cloned().unwrap_or(Value::Null),
                }),
            }
        })
        .collect()
}

fn control_fields(entity: EntityRef) -> &'static [&'static str] {
    match entity {
        EntityRef::System { .. } => SYSTEM_CONTROL_FIELDS,
        EntityRef::Zone { .. } => ZONE_CONTROL_FIELDS,
        EntityRef::Sensor { .. } => SENSOR_CONTROL_FIELDS,
    }
}

/// Structural equality where numbers compare by value (`22 == 22.0`).
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs() < EPSILON,
            _ => x == y,
        },
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(xs), Value::Object(ys)) => {
            xs.len() == ys.len()
                && xs
                    .iter()
                    .all(|(k, x)| ys.get(k).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    fn snapshot(zones: Value, sensors: Value) -> Snapshot {
        serde_json::from_value(json!({
            "version": 1,
            "createdAt": "2024-05-01T10:00:00Z",
            "device": { "alias": "Casa", "mac": "AA:BB", "host": "h", "port": 3000 },
            "systems": [{ "systemID": 1 }],
            "zones": zones,
            "sensors": sensors,
        }))
        .unwrap()
    }

    #[test]
    fn only_setpoint_change_is_reported() {
        let before = snapshot(
            json!([{ "systemID": 1, "zoneID": 1, "on": 1, "setpoint": 22, "roomTemp": 21.3 }]),
            json!([]),
        );
        let after = snapshot(
            json!([{ "systemID": 1, "zoneID": 1, "on": 1, "setpoint": 24, "roomTemp": 23.9 }]),
            json!([]),
        );

        let result = diff(&before, &after, DiffScope::Control);
        assert_eq!(result.changed.len(), 1);
        assert_eq!(
            result.changed[0].changes,
            vec![FieldChange {
                field: "setpoint".into(),
                old: json!(22),
                new: json!(24),
            }]
        );
        assert!(result.snapshot_only.is_empty());
        assert!(result.live_only.is_empty());
        assert!(result.same_device());
    }

    #[test]
    fn all_scope_includes_readings() {
        let before = snapshot(json!([{ "systemID": 1, "zoneID": 1, "roomTemp": 21.3 }]), json!([]));
        let after = snapshot(json!([{ "systemID": 1, "zoneID": 1, "roomTemp": 23.9 }]), json!([]));
        assert!(diff(&before, &after, DiffScope::Control).is_empty());
        assert_eq!(diff(&before, &after, DiffScope::All).change_count(), 1);
    }

    #[test]
    fn integer_and_float_forms_are_equal() {
        let before = snapshot(json!([{ "systemID": 1, "zoneID": 1, "setpoint": 22 }]), json!([]));
        let after = snapshot(json!([{ "systemID": 1, "zoneID": 1, "setpoint": 22.0 }]), json!([]));
        assert!(diff(&before, &after, DiffScope::All).is_empty());
    }

    #[test]
    fn one_sided_entities_are_listed() {
        let before = snapshot(
            json!([{ "systemID": 1, "zoneID": 1 }, { "systemID": 1, "zoneID": 2 }]),
            json!([]),
        );
        let after = snapshot(
            json!([{ "systemID": 1, "zoneID": 1 }]),
            json!([{ "systemID": 1, "iaqsensorID": 3 }]),
        );
        let result = diff(&before, &after, DiffScope::Control);
        assert_eq!(
            result.snapshot_only,
            vec![EntityRef::Zone {
                system_id: 1,
                zone_id: 2
            }]
        );
        assert_eq!(
            result.live_only,
            vec![EntityRef::Sensor {
                system_id: 1,
                sensor_id: 3
            }]
        );
    }

    #[test]
    fn missing_field_on_one_side_is_a_change() {
        let before = snapshot(json!([{ "systemID": 1, "zoneID": 1, "sleep": 30 }]), json!([]));
        let after = snapshot(json!([{ "systemID": 1, "zoneID": 1 }]), json!([]));
        let result = diff(&before, &after, DiffScope::Control);
        assert_eq!(result.changed[0].changes[0].new, Value::Null);
    }
}
