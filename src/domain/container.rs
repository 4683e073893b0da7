use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Length of the abbreviated id shown in listings.
pub const SHORT_ID_LEN: usize = 12;

/// Lifecycle state as reported by the container runtime.
///
/// Anything outside the runtime's known vocabulary decodes to `Unknown`,
/// keeping the raw text so it can still be displayed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ContainerState {
    Created,
    Running,
    Paused,
    Restarting,
    Removing,
    Exited,
    Dead,
    Unknown(String),
}

impl ContainerState {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "created" => Self::Created,
            "running" => Self::Running,
            "paused" => Self::Paused,
            "restarting" => Self::Restarting,
            "removing" => Self::Removing,
            "exited" => Self::Exited,
            "dead" => Self::Dead,
            _ => Self::Unknown(raw.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Paused => "paused",
            Self::Restarting => "restarting",
            Self::Removing => "removing",
            Self::Exited => "exited",
            Self::Dead => "dead",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }

    /// Whether `action` may be requested while the container is in this state
    pub fn allows(&self, action: LifecycleAction) -> bool {
        is_allowed(self, action)
    }

    /// Actions that may be requested from this state, in display order
    pub fn allowed_actions(&self) -> Vec<LifecycleAction> {
        LifecycleAction::ALL
            .into_iter()
            .filter(|action| self.allows(*action))
            .collect()
    }
}

impl From<String> for ContainerState {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<ContainerState> for String {
    fn from(state: ContainerState) -> Self {
        state.as_str().to_string()
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle command that can be sent to a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    Start,
    Stop,
    Restart,
    Pause,
    Resume,
}

impl LifecycleAction {
    pub const ALL: [LifecycleAction; 5] = [
        Self::Start,
        Self::Stop,
        Self::Restart,
        Self::Pause,
        Self::Resume,
    ];

    /// Path segment used by the dashboard API (`/api/{segment}/{id}`)
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Stop => "stop",
            Self::Restart => "restart",
            Self::Pause => "pause",
            Self::Resume => "resume",
        }
    }

    pub fn past_tense(self) -> &'static str {
        match self {
            Self::Start => "started",
            Self::Stop => "stopped",
            Self::Restart => "restarted",
            Self::Pause => "paused",
            Self::Resume => "resumed",
        }
    }

    /// Verb of the Docker Engine endpoint behind this action
    pub fn docker_verb(self) -> &'static str {
        match self {
            Self::Resume => "unpause",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for LifecycleAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown lifecycle action '{0}'")]
pub struct ParseActionError(pub String);

impl FromStr for LifecycleAction {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "start" => Ok(Self::Start),
            "stop" => Ok(Self::Stop),
            "restart" => Ok(Self::Restart),
            "pause" => Ok(Self::Pause),
            "resume" | "unpause" => Ok(Self::Resume),
            other => Err(ParseActionError(other.to_string())),
        }
    }
}

/// Legality table for lifecycle actions.
///
/// | action  | rejected when     |
/// |---------|-------------------|
/// | start   | running, paused   |
/// | stop    | exited            |
/// | restart | exited            |
/// | pause   | anything but running |
/// | resume  | anything but paused  |
///
/// A state outside the known vocabulary only permits `start` and `stop`;
/// restart, pause and resume need a state the runtime has confirmed.
pub fn is_allowed(state: &ContainerState, action: LifecycleAction) -> bool {
    use ContainerState::*;

    if state.is_unknown() {
        return matches!(action, LifecycleAction::Start | LifecycleAction::Stop);
    }

    match action {
        LifecycleAction::Start => !matches!(state, Running | Paused),
        LifecycleAction::Stop | LifecycleAction::Restart => !matches!(state, Exited),
        LifecycleAction::Pause => matches!(state, Running),
        LifecycleAction::Resume => matches!(state, Paused),
    }
}

/// Strips the leading `/` the Docker API puts in front of container names
pub fn canonical_name(raw: &str) -> &str {
    raw.strip_prefix('/').unwrap_or(raw)
}

/// One container as returned by the list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContainerRecord {
    pub id: String,
    pub names: Vec<String>,
    pub image: String,
    pub state: ContainerState,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, serde_json::Value>>,
}

impl ContainerRecord {
    pub fn new(id: impl Into<String>, name: impl Into<String>, state: ContainerState) -> Self {
        Self {
            id: id.into(),
            names: vec![name.into()],
            image: String::new(),
            state,
            status: String::new(),
            labels: None,
        }
    }

    /// First name without its path prefix; empty only for malformed records
    pub fn display_name(&self) -> &str {
        self.names
            .first()
            .map(|name| canonical_name(name))
            .unwrap_or_default()
    }

    pub fn short_id(&self) -> &str {
        self.id.get(..SHORT_ID_LEN).unwrap_or(&self.id)
    }

    /// Exact match against any of the names, compared in canonical form
    pub fn has_name(&self, name: &str) -> bool {
        let wanted = canonical_name(name);
        self.names.iter().any(|n| canonical_name(n) == wanted)
    }
}

/// Result of a lifecycle command as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    pub status: String,
    pub container_id: String,
}

impl ActionResult {
    pub fn new(action: LifecycleAction, container_id: impl Into<String>) -> Self {
        Self {
            status: action.past_tense().to_string(),
            container_id: container_id.into(),
        }
    }
}

/// Immutable view of the fleet as of one fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<ContainerRecord>,
}

impl Snapshot {
    pub fn new(records: Vec<ContainerRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[ContainerRecord] {
        &self.records
    }

    pub fn iter(&self) -> impl Iterator<Item = &ContainerRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ContainerRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Resolves a user-supplied key: full id, then name, then an unambiguous id prefix
    pub fn find(&self, key: &str) -> Option<&ContainerRecord> {
        if let Some(record) = self.get(key) {
            return Some(record);
        }

        if let Some(record) = self.records.iter().find(|r| r.has_name(key)) {
            return Some(record);
        }

        if key.is_empty() {
            return None;
        }

        let mut prefixed = self.records.iter().filter(|r| r.id.starts_with(key));
        match (prefixed.next(), prefixed.next()) {
            (Some(record), None) => Some(record),
            _ => None,
        }
    }

    pub fn display_names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.display_name()).collect()
    }
}
