use crate::error::Result;
use crate::models::{AccessEvent, TenantActivity};
use crate::readers::fields::{decode_text, parse_datetime, FieldSource, HeaderIndex};
use std::path::Path;
use tracing::info;

/// Loader for access-control exports
pub struct AccessReader;

impl AccessReader {
    pub fn new() -> Self {
        Self
    }

    /// Read the pre-aggregated tenant activity JSON export
    pub fn read_tenant_activity(&self, path: &Path) -> Result<Vec<TenantActivity>> {
        let bytes = std::fs::read(path)?;
        let activity = self.parse_tenant_activity(&decode_text(&bytes))?;

        info!(path = %path.display(), rows = activity.len(), "Loaded tenant activity");
        Ok(activity)
    }

    pub fn parse_tenant_activity(&self, text: &str) -> Result<Vec<TenantActivity>> {
        Ok(serde_json::from_str(text)?)
    }

    /// Read raw badge events (`building_id`, `tenant`, `event_at_local`)
    pub fn read_events(&self, path: &Path) -> Result<Vec<AccessEvent>> {
        let bytes = std::fs::read(path)?;
        let events = self.parse_events(&decode_text(&bytes))?;

        info!(path = %path.display(), events = events.len(), "Loaded access events");
        Ok(events)
    }

    pub fn parse_events(&self, text: &str) -> Result<Vec<AccessEvent>> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(text.as_bytes());

        let index = HeaderIndex::new(reader.headers()?);
        let mut events = Vec::new();

        for result in reader.records() {
            let record = result?;
            let row = index.row(&record);

            let Some(building_id) = row.text("building_id") else {
                continue;
            };

            events.push(AccessEvent {
                building_id,
                tenant: row.text("tenant"),
                event_at_local: row.field("event_at_local").and_then(parse_datetime),
            });
        }

        Ok(events)
    }
}

impl Default for AccessReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_events() -> Result<()> {
        let text = "\
event_id,building_id,tenant,event_at_local
1,64be43c7,Google,2024-03-04 08:15:00
2,64be43c7,,2024-03-04 09:00:00
3,,Google,2024-03-04 09:30:00
4,64ccb49e,Salesforce,not a time
";
        let events = AccessReader::new().parse_events(text)?;

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].tenant.as_deref(), Some("Google"));
        assert!(events[0].event_at_local.is_some());
        assert!(!events[1].has_tenant());
        assert_eq!(events[2].building_id, "64ccb49e");
        assert!(events[2].event_at_local.is_none());

        Ok(())
    }

    #[test]
    fn test_parse_tenant_activity_rejects_malformed_json() {
        let result = AccessReader::new().parse_tenant_activity("{not json");
        assert!(result.is_err());
    }
}
