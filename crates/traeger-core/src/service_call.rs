//! Service call type for invoking Home Assistant services

use crate::Context;
use serde::{Deserialize, Serialize};

/// A call to a Home Assistant service
///
/// Every outbound command is lowered to one of these before it reaches the
/// host's service registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceCall {
    /// The domain the service belongs to (e.g., "climate", "switch")
    pub domain: String,

    /// The service name (e.g., "set_temperature", "turn_on")
    pub service: String,

    /// Data passed to the service (entity_id, temperature, value, ...)
    pub service_data: serde_json::Value,

    /// Context tracking who initiated this call
    pub context: Context,
}

impl ServiceCall {
    pub fn new(
        domain: impl Into<String>,
        service: impl Into<String>,
        service_data: serde_json::Value,
        context: Context,
    ) -> Self {
        Self {
            domain: domain.into(),
            service: service.into(),
            service_data,
            context,
        }
    }

    /// Get the full service identifier (domain.service)
    pub fn service_id(&self) -> String {
        format!("{}.{}", self.domain, self.service)
    }

    /// Get a value from service_data
    pub fn get<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.service_data
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Get entity_id(s) from service data, accepting a single string or a list
    pub fn entity_ids(&self) -> Vec<String> {
        match self.service_data.get("entity_id") {
            Some(serde_json::Value::String(s)) => vec![s.clone()],
            Some(serde_json::Value::Array(arr)) => arr
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect(),
            _ => vec![],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_service_call_accessors() {
        let call = ServiceCall::new(
            "climate",
            "set_temperature",
            json!({"entity_id": "climate.abc_climate", "temperature": 225}),
            Context::new(),
        );

        assert_eq!(call.service_id(), "climate.set_temperature");
        assert_eq!(call.get::<i64>("temperature"), Some(225));
        assert_eq!(call.get::<String>("missing"), None);
        assert_eq!(call.entity_ids(), vec!["climate.abc_climate"]);
    }

    #[test]
    fn test_entity_ids_list() {
        let call = ServiceCall::new(
            "number",
            "set_value",
            json!({"entity_id": ["number.a_cook_cycle", "number.b_cook_cycle"]}),
            Context::new(),
        );
        assert_eq!(call.entity_ids().len(), 2);
    }
}
