// ── Error-code catalog ──
//
// Codes reported by Airzone systems and zones in their `errors` arrays,
// with a description and the remediation steps to try. None of them can
// be cleared remotely: the webserver exposes no restart.

use serde::Serialize;
use serde_json::Value;

use crate::model::{SystemState, ZoneState};

/// Catalog entry for one error code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub code: String,
    pub description: &'static str,
    pub solutions: &'static [&'static str],
    pub known: bool,
}

struct CatalogEntry {
    code: &'static str,
    description: &'static str,
    solutions: &'static [&'static str],
}

const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        code: "Error 9",
        description: "Gateway-System communication error. The system loses communication \
                      with the AC unit. The system will open all the zones and deactivate \
                      the control from the controllers, only allowing the operation of the \
                      unit from the controller of its manufacturer.",
        solutions: &[
            "Check physical connections between the gateway and the AC unit",
            "Power cycle both the AC unit and the Airzone system",
            "Verify that the AC unit is functioning correctly",
        ],
    },
    CatalogEntry {
        code: "Error 12",
        description: "Communication error between Airzone Cloud Webserver - system. The \
                      system loses communication with the Webserver. Check that the \
                      Webserver is correctly connected to the Control board's automation bus.",
        solutions: &[
            "Check physical connections between the webserver and the control board",
            "Power cycle the webserver",
            "Verify network connectivity if using an IP connection",
        ],
    },
    CatalogEntry {
        code: "IU error CONF",
        description: "Indoor Unit configuration error. There might be a mismatch in the \
                      configuration between the Airzone system and the indoor unit.",
        solutions: &[
            "Check configuration settings in the AC unit",
            "Verify compatibility between the Airzone system and the AC unit",
            "Try resetting the AC unit and the Airzone system",
        ],
    },
];

const UNKNOWN_DESCRIPTION: &str = "Unknown error code";

const GENERIC_SOLUTIONS: &[&str] = &[
    "Consult the Airzone documentation for specific error codes",
    "Contact Airzone technical support",
];

/// Steps that apply to every reported error, since none can be reset over the API.
pub const MANUAL_INTERVENTION: &[&str] = &[
    "Power cycle the Airzone webserver hardware",
    "Check all physical connections between components",
    "Power cycle the affected AC units",
    "If errors persist, contact Airzone technical support",
];

/// Look up a code, normalizing it first. Unknown codes get generic advice.
pub fn lookup(code: &str) -> ErrorInfo {
    let code = normalize(code);
    match CATALOG.iter().find(|entry| entry.code == code) {
        Some(entry) => ErrorInfo {
            code,
            description: entry.description,
            solutions: entry.solutions,
            known: true,
        },
        None => ErrorInfo {
            code,
            description: UNKNOWN_DESCRIPTION,
            solutions: GENERIC_SOLUTIONS,
            known: false,
        },
    }
}

/// Canonical spelling: bare numbers and any-case `error N` become `Error N`.
pub fn normalize(code: &str) -> String {
    let code = code.trim();
    if !code.is_empty() && code.bytes().all(|b| b.is_ascii_digit()) {
        return format!("Error {code}");
    }
    let lower = code.to_ascii_lowercase();
    if let Some(rest) = lower.strip_prefix("error") {
        let digits = rest.trim();
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            return format!("Error {digits}");
        }
    }
    code.to_owned()
}

/// Pull error codes out of an `errors` value.
///
/// Entries may be plain strings, numbers, or objects such as
/// `{"system": "Error 9"}`, `{"code": 12}` or `{"error": {"code": "9"}}`.
pub fn extract_codes(errors: &Value) -> Vec<String> {
    match errors {
        Value::Array(items) => items.iter().filter_map(code_of).collect(),
        Value::Null => Vec::new(),
        other => code_of(other).into_iter().collect(),
    }
}

fn code_of(entry: &Value) -> Option<String> {
    match entry {
        Value::String(s) if !s.trim().is_empty() => Some(normalize(s)),
        Value::Number(n) => Some(normalize(&n.to_string())),
        Value::Object(map) => map
            .get("code")
            .and_then(code_of)
            .or_else(|| map.get("error").and_then(code_of))
            .or_else(|| map.values().find_map(code_of)),
        _ => None,
    }
}

// ── Device-wide scan ────────────────────────────────────────────────

/// One error code reported by a system or zone.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityError {
    pub system_id: u32,
    pub zone_id: Option<u32>,
    pub zone_name: Option<String>,
    pub code: String,
}

impl EntityError {
    pub fn info(&self) -> ErrorInfo {
        lookup(&self.code)
    }
}

/// Collect every error code across systems and zones, systems first.
pub fn collect_errors(systems: &[SystemState], zones: &[ZoneState]) -> Vec<EntityError> {
    let system_errors = systems.iter().flat_map(|system| {
        system.error_codes().into_iter().map(|code| EntityError {
            system_id: system.system_id,
            zone_id: None,
            zone_name: None,
            code,
        })
    });
    let zone_errors = zones.iter().flat_map(|zone| {
        zone.error_codes().into_iter().map(|code| EntityError {
            system_id: zone.system_id,
            zone_id: Some(zone.zone_id),
            zone_name: zone.name().map(str::to_owned),
            code,
        })
    });
    system_errors.chain(zone_errors).collect()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn normalizes_numeric_codes() {
        assert_eq!(normalize("9"), "Error 9");
        assert_eq!(normalize("error 12"), "Error 12");
        assert_eq!(normalize(" IU error CONF "), "IU error CONF");
    }

    #[test]
    fn known_and_unknown_lookup() {
        let known = lookup("12");
        assert!(known.known);
        assert_eq!(known.code, "Error 12");
        assert_eq!(known.solutions.len(), 3);

        let unknown = lookup("Error 99");
        assert!(!unknown.known);
        assert_eq!(unknown.description, "Unknown error code");
        assert_eq!(unknown.solutions, GENERIC_SOLUTIONS);
    }

    #[test]
    fn extracts_from_mixed_shapes() {
        let errors = json!([
            "Error 9",
            12,
            {"Zone": "IU error CONF"},
            {"error": {"code": "3"}},
            {"code": 5},
            null
        ]);
        assert_eq!(
            extract_codes(&errors),
            vec!["Error 9", "Error 12", "IU error CONF", "Error 3", "Error 5"]
        );
    }
}
