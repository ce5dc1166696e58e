//! Task definitions: what a task is, as supplied by the caller.
//!
//! The JSON shape is kept loose on the way in (`kind`, optional `delay`,
//! optional `retryStrategy`) and validated into [`TaskDefinition`] so that a
//! timer always has a delay and an activity never does.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::action::Action;
use super::errors::DefinitionError;
use super::retry::RetryStrategy;

/// A `$<activity>.<field.path>` pointer into another activity's result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayReference {
    activity: String,
    path: Vec<String>,
}

impl DelayReference {
    pub fn activity(&self) -> &str {
        &self.activity
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Pull the referenced number of seconds out of a completion result.
    ///
    /// Integers, integral floats and numeric strings are accepted.
    pub fn extract(&self, result: &Value) -> Option<u64> {
        let mut current = result;
        for segment in &self.path {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }

        match current {
            Value::Number(n) => n.as_u64().or_else(|| {
                n.as_f64()
                    .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            }),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }
}

impl FromStr for DelayReference {
    type Err = DefinitionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DefinitionError::InvalidReference {
            reference: s.to_string(),
        };

        let body = s.strip_prefix('$').ok_or_else(invalid)?;
        let (activity, path) = body.split_once('.').ok_or_else(invalid)?;
        let path: Vec<String> = path.split('.').map(str::to_string).collect();
        if activity.is_empty() || path.iter().any(String::is_empty) {
            return Err(invalid());
        }

        Ok(Self {
            activity: activity.to_string(),
            path,
        })
    }
}

impl fmt::Display for DelayReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{}", self.activity, self.path.join("."))
    }
}

/// How long a timer waits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delay {
    Seconds(u64),
    Reference(DelayReference),
}

impl Delay {
    pub fn reference(reference: &str) -> Result<Self, DefinitionError> {
        reference.parse().map(Self::Reference)
    }
}

impl From<u64> for Delay {
    fn from(seconds: u64) -> Self {
        Self::Seconds(seconds)
    }
}

/// Activity or timer, with the settings only that kind may carry.
#[derive(Debug, Clone, PartialEq)]
pub enum TaskKind {
    Activity { retry_strategy: Option<RetryStrategy> },
    Timer { delay: Delay },
}

/// A validated, immutable task definition.
///
/// `name` doubles as the activity id / timer control that history events
/// are correlated by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTaskDefinition", into = "RawTaskDefinition")]
pub struct TaskDefinition {
    name: String,
    kind: TaskKind,
    input: Option<Value>,
    version: Option<String>,
}

impl TaskDefinition {
    pub fn activity(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Activity {
                retry_strategy: None,
            },
            input: None,
            version: None,
        }
    }

    pub fn timer(name: impl Into<String>, delay: impl Into<Delay>) -> Self {
        Self {
            name: name.into(),
            kind: TaskKind::Timer {
                delay: delay.into(),
            },
            input: None,
            version: None,
        }
    }

    pub fn with_input(mut self, input: Value) -> Self {
        self.input = Some(input);
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Attach a retry strategy. Ignored for timers.
    pub fn with_retry_strategy(mut self, strategy: RetryStrategy) -> Self {
        if let TaskKind::Activity { retry_strategy } = &mut self.kind {
            *retry_strategy = Some(strategy);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &TaskKind {
        &self.kind
    }

    pub fn input(&self) -> Option<&Value> {
        self.input.as_ref()
    }

    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn retry_strategy(&self) -> Option<&RetryStrategy> {
        match &self.kind {
            TaskKind::Activity { retry_strategy } => retry_strategy.as_ref(),
            TaskKind::Timer { .. } => None,
        }
    }

    /// The request that (re)starts this activity.
    pub fn schedule_action(&self) -> Action {
        Action::schedule(&self.name, self.input.clone(), self.version.clone())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RawKind {
    Activity,
    Timer,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum RawDelay {
    Seconds(u64),
    Reference(String),
}

/// Wire shape of a task definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTaskDefinition {
    name: String,

    #[serde(alias = "type")]
    kind: RawKind,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    delay: Option<RawDelay>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    retry_strategy: Option<RetryStrategy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    input: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    version: Option<String>,
}

impl TryFrom<RawTaskDefinition> for TaskDefinition {
    type Error = DefinitionError;

    fn try_from(raw: RawTaskDefinition) -> Result<Self, Self::Error> {
        if raw.name.trim().is_empty() {
            return Err(DefinitionError::EmptyName);
        }

        let kind = match raw.kind {
            RawKind::Activity => {
                if raw.delay.is_some() {
                    return Err(DefinitionError::UnexpectedDelay { name: raw.name });
                }
                TaskKind::Activity {
                    retry_strategy: raw.retry_strategy,
                }
            }
            RawKind::Timer => {
                if raw.retry_strategy.is_some() {
                    return Err(DefinitionError::UnexpectedRetryStrategy { name: raw.name });
                }
                let delay = match raw.delay {
                    Some(RawDelay::Seconds(seconds)) => Delay::Seconds(seconds),
                    Some(RawDelay::Reference(reference)) => Delay::reference(&reference)?,
                    None => return Err(DefinitionError::MissingDelay { name: raw.name }),
                };
                TaskKind::Timer { delay }
            }
        };

        Ok(Self {
            name: raw.name,
            kind,
            input: raw.input,
            version: raw.version,
        })
    }
}

impl From<TaskDefinition> for RawTaskDefinition {
    fn from(def: TaskDefinition) -> Self {
        let (kind, delay, retry_strategy) = match def.kind {
            TaskKind::Activity { retry_strategy } => (RawKind::Activity, None, retry_strategy),
            TaskKind::Timer { delay } => {
                let delay = match delay {
                    Delay::Seconds(seconds) => RawDelay::Seconds(seconds),
                    Delay::Reference(reference) => RawDelay::Reference(reference.to_string()),
                };
                (RawKind::Timer, Some(delay), None)
            }
        };

        Self {
            name: def.name,
            kind,
            delay,
            retry_strategy,
            input: def.input,
            version: def.version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn activity_definition_from_json() {
        let def: TaskDefinition = serde_json::from_value(json!({
            "name": "createOffer",
            "kind": "activity",
            "retryStrategy": { "kind": "constantBackoff", "backoffSeconds": 10, "maxRetries": 3 },
            "input": { "sku": "A-1" },
            "version": "2"
        }))
        .expect("deserialize");

        assert_eq!(def.name(), "createOffer");
        assert_eq!(
            def.retry_strategy(),
            Some(&RetryStrategy::ConstantBackoff {
                backoff_seconds: 10,
                max_retries: 3
            })
        );
        assert_eq!(def.input(), Some(&json!({ "sku": "A-1" })));
        assert_eq!(def.version(), Some("2"));
    }

    #[test]
    fn type_is_accepted_as_kind_alias() {
        let def: TaskDefinition =
            serde_json::from_value(json!({ "name": "newTask", "type": "activity" }))
                .expect("deserialize");
        assert!(matches!(def.kind(), TaskKind::Activity { retry_strategy: None }));
    }

    #[rstest]
    #[case::literal(json!(10), Delay::Seconds(10))]
    #[case::reference(
        json!("$previousActivity.someResult"),
        Delay::reference("$previousActivity.someResult").unwrap()
    )]
    fn timer_delay_forms(#[case] delay: Value, #[case] expected: Delay) {
        let def: TaskDefinition =
            serde_json::from_value(json!({ "name": "t", "kind": "timer", "delay": delay }))
                .expect("deserialize");
        assert_eq!(def.kind(), &TaskKind::Timer { delay: expected });
    }

    #[rstest]
    #[case::empty_name(
        json!({ "name": " ", "kind": "activity" }),
        DefinitionError::EmptyName
    )]
    #[case::timer_without_delay(
        json!({ "name": "t", "kind": "timer" }),
        DefinitionError::MissingDelay { name: "t".to_string() }
    )]
    #[case::activity_with_delay(
        json!({ "name": "a", "kind": "activity", "delay": 5 }),
        DefinitionError::UnexpectedDelay { name: "a".to_string() }
    )]
    #[case::timer_with_retry(
        json!({ "name": "t", "kind": "timer", "delay": 5, "retryStrategy": { "kind": "immediate", "maxRetries": 1 } }),
        DefinitionError::UnexpectedRetryStrategy { name: "t".to_string() }
    )]
    #[case::bad_reference(
        json!({ "name": "t", "kind": "timer", "delay": "previousActivity.someResult" }),
        DefinitionError::InvalidReference { reference: "previousActivity.someResult".to_string() }
    )]
    fn invalid_definitions_are_rejected(#[case] raw: Value, #[case] expected: DefinitionError) {
        let raw: RawTaskDefinition = serde_json::from_value(raw).expect("wire shape");
        let err = TaskDefinition::try_from(raw).unwrap_err();
        assert_eq!(err, expected);
    }

    #[test]
    fn invalid_definition_surfaces_through_serde() {
        let err = serde_json::from_value::<TaskDefinition>(json!({ "name": "t", "kind": "timer" }))
            .unwrap_err();
        assert!(err.to_string().contains("has no delay"));
    }

    #[rstest]
    #[case::missing_dollar("a.b")]
    #[case::missing_path("$a")]
    #[case::empty_activity("$.b")]
    #[case::empty_segment("$a.b..c")]
    fn malformed_references(#[case] raw: &str) {
        assert!(raw.parse::<DelayReference>().is_err());
    }

    #[test]
    fn reference_display_roundtrips() {
        let r: DelayReference = "$fetch.config.wait".parse().unwrap();
        assert_eq!(r.activity(), "fetch");
        assert_eq!(r.path(), &["config".to_string(), "wait".to_string()]);
        assert_eq!(r.to_string(), "$fetch.config.wait");
    }

    #[rstest]
    #[case::integer(json!({"wait": 30}), Some(30))]
    #[case::integral_float(json!({"wait": 30.0}), Some(30))]
    #[case::numeric_string(json!({"wait": "45"}), Some(45))]
    #[case::negative(json!({"wait": -1}), None)]
    #[case::fraction(json!({"wait": 1.5}), None)]
    #[case::missing(json!({"other": 1}), None)]
    #[case::not_a_number(json!({"wait": true}), None)]
    fn extract_reads_numeric_seconds(#[case] result: Value, #[case] expected: Option<u64>) {
        let r: DelayReference = "$a.wait".parse().unwrap();
        assert_eq!(r.extract(&result), expected);
    }

    #[test]
    fn extract_walks_nested_paths_and_arrays() {
        let r: DelayReference = "$a.steps.1.wait".parse().unwrap();
        let result = json!({ "steps": [{ "wait": 1 }, { "wait": 2 }] });
        assert_eq!(r.extract(&result), Some(2));
    }

    #[test]
    fn definition_serializes_back_to_wire_shape() {
        let def = TaskDefinition::timer("t", Delay::reference("$a.b").unwrap());
        let v = serde_json::to_value(&def).unwrap();
        assert_eq!(v, json!({ "name": "t", "kind": "timer", "delay": "$a.b" }));
    }

    #[test]
    fn retry_strategy_is_ignored_for_timers() {
        let def = TaskDefinition::timer("t", Delay::Seconds(5)).with_retry_strategy(RetryStrategy::Immediate {
            max_retries: 3,
        });
        assert_eq!(def.retry_strategy(), None);
    }
}
