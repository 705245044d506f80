use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonStatus {
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Human readable summary of the install progress.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
    /// Last state reported to the OCM upgrade policy endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub upgrade_policy: Option<AddonUpgradePolicyStatus>,
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonUpgradePolicyStatus {
    /// Upgrade policy id in OCM.
    pub id: String,
    /// Addon version the value was reported for. Empty for records written
    /// before versions were tracked.
    #[serde(default)]
    pub version: String,
    pub value: AddonUpgradePolicyValue,
    #[serde(default)]
    pub observed_generation: i64,
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum AddonUpgradePolicyValue {
    #[default]
    Started,
    Completed,
}

impl AddonUpgradePolicyValue {
    pub fn as_str(&self) -> &'static str {
        match self {
            AddonUpgradePolicyValue::Started => "started",
            AddonUpgradePolicyValue::Completed => "completed",
        }
    }
}

impl std::fmt::Display for AddonUpgradePolicyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AddonStatus {
    /// Set or update a condition by type. See [`upsert_condition`].
    pub fn set_condition(&mut self, cond: Condition) {
        upsert_condition(&mut self.conditions, cond);
    }

    /// Drop the condition of `condition_type` if it currently carries `reason`.
    pub fn clear_condition_with_reason(&mut self, condition_type: &str, reason: &str) {
        self.conditions
            .retain(|c| !(c.condition_type == condition_type && c.reason == reason));
    }

    pub fn find_condition(&self, condition_type: &str) -> Option<&Condition> {
        self.conditions
            .iter()
            .find(|c| c.condition_type == condition_type)
    }

    pub fn is_condition_true(&self, condition_type: &str) -> bool {
        self.find_condition(condition_type)
            .is_some_and(|c| c.status == "True")
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: String,
    pub status: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default)]
    pub last_transition_time: String,
}

/// Well-known condition types.
pub mod condition_types {
    pub const AVAILABLE: &str = "Available";
    pub const OCM_CLIENT_READY: &str = "OCMClientReady";
}

/// Machine readable condition reasons.
pub mod condition_reasons {
    pub const CONFIG_ERROR: &str = "ConfigurationError";
    pub const OCM_CONFIGURED: &str = "OCMConfigured";
    pub const OCM_NOT_CONFIGURED: &str = "OCMNotConfigured";
}

impl Condition {
    /// Create a True condition.
    pub fn ok(condition_type: &str, reason: &str, message: &str, now: &str) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status: "True".to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
            observed_generation: 0,
            last_transition_time: now.to_string(),
        }
    }

    /// Create a False condition.
    pub fn fail(condition_type: &str, reason: &str, message: &str, now: &str) -> Self {
        Self {
            condition_type: condition_type.to_string(),
            status: "False".to_string(),
            reason: reason.to_string(),
            message: message.to_string(),
            observed_generation: 0,
            last_transition_time: now.to_string(),
        }
    }

    pub fn with_generation(mut self, generation: i64) -> Self {
        self.observed_generation = generation;
        self
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddonOperatorStatus {
    #[serde(default)]
    pub observed_generation: i64,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<String>,
}

impl AddonOperatorStatus {
    /// Set or update a condition by type. See [`upsert_condition`].
    pub fn set_condition(&mut self, cond: Condition) {
        upsert_condition(&mut self.conditions, cond);
    }
}

/// Set or update a condition by type. If a condition with the same type
/// already exists, update it in place; otherwise append it.
///
/// The transition time is kept when the status value did not change.
pub fn upsert_condition(conditions: &mut Vec<Condition>, cond: Condition) {
    if let Some(existing) = conditions
        .iter_mut()
        .find(|c| c.condition_type == cond.condition_type)
    {
        let last_transition_time = if existing.status == cond.status {
            existing.last_transition_time.clone()
        } else {
            cond.last_transition_time.clone()
        };
        *existing = Condition {
            last_transition_time,
            ..cond
        };
    } else {
        conditions.push(cond);
    }
}
