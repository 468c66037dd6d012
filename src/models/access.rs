use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Pre-aggregated access-control activity for one tenant, property and hour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TenantActivity {
    pub tenant: String,

    #[serde(rename = "PropertyName")]
    pub property_name: String,

    pub event_date: NaiveDate,

    #[serde(default)]
    pub month_year: String,

    #[serde(default)]
    pub hour_of_day: u32,

    #[serde(default)]
    pub time_block: String,

    #[serde(default)]
    pub reader_category: String,

    #[serde(default)]
    pub access_category: String,

    #[serde(default)]
    pub business_hours: String,

    #[serde(default)]
    pub day_of_week: String,

    #[serde(default)]
    pub total_events: u64,

    #[serde(default)]
    pub unique_credentials: u64,

    #[serde(default)]
    pub business_hours_events: u64,

    #[serde(default)]
    pub weekend_events: u64,

    #[serde(default)]
    pub historical_events: u64,
}

impl TenantActivity {
    pub fn normalized_tenant(&self) -> String {
        normalize_tenant_name(&self.tenant)
    }
}

/// A single badge event from the raw access-control export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessEvent {
    pub building_id: String,
    pub tenant: Option<String>,
    pub event_at_local: Option<NaiveDateTime>,
}

impl AccessEvent {
    pub fn has_tenant(&self) -> bool {
        self.tenant
            .as_deref()
            .map(|t| !t.trim().is_empty())
            .unwrap_or(false)
    }
}

const TENANT_ALIASES: &[(&str, &str)] = &[
    ("GOOGLE", "Google"),
    ("AUDACY", "Audacy"),
    ("Kirkland and Ellis", "Kirkland & Ellis"),
    ("KIRKLAND", "Kirkland & Ellis"),
    ("Kirkland and ellis", "Kirkland & Ellis"),
    ("Lerer hippeau", "Lerer Hippeau"),
    ("LererHippeau", "Lerer Hippeau"),
    ("Lerer", "Lerer Hippeau"),
    ("LERER", "Lerer Hippeau"),
    ("LERER HIPPEAU", "Lerer Hippeau"),
    ("SalesForce", "Salesforce"),
    ("SALESFORCE", "Salesforce"),
    ("salesforce", "Salesforce"),
];

/// Map known spelling variants of a tenant to its canonical name
pub fn normalize_tenant_name(tenant: &str) -> String {
    TENANT_ALIASES
        .iter()
        .find(|(alias, _)| *alias == tenant)
        .map(|(_, canonical)| *canonical)
        .unwrap_or(tenant)
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_tenant_name() {
        assert_eq!(normalize_tenant_name("GOOGLE"), "Google");
        assert_eq!(normalize_tenant_name("Kirkland and Ellis"), "Kirkland & Ellis");
        assert_eq!(normalize_tenant_name("LERER"), "Lerer Hippeau");
        assert_eq!(normalize_tenant_name(" Acme Corp "), "Acme Corp");
    }

    #[test]
    fn test_deserialize_tenant_activity() {
        let json = r#"{
            "tenant": "SALESFORCE",
            "PropertyName": "Wolf Point South",
            "event_date": "2024-03-05",
            "month_year": "March 2024",
            "hour_of_day": 9,
            "time_block": "9a",
            "reader_category": "Primary_Entry",
            "access_category": "Entry",
            "business_hours": "yes",
            "day_of_week": "Tuesday",
            "total_events": 42,
            "unique_credentials": 30,
            "business_hours_events": 40,
            "weekend_events": 0,
            "historical_events": 38
        }"#;

        let activity: TenantActivity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.property_name, "Wolf Point South");
        assert_eq!(activity.normalized_tenant(), "Salesforce");
        assert_eq!(activity.total_events, 42);
    }

    #[test]
    fn test_access_event_tenant_presence() {
        let event = AccessEvent {
            building_id: "b1".to_string(),
            tenant: Some("  ".to_string()),
            event_at_local: None,
        };
        assert!(!event.has_tenant());
    }
}
