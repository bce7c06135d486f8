//! Custom notification rules written in CEL (https://cel.dev).
//!
//! A rule is compiled once at startup and evaluated against a read-only
//! view of a track, bound to the variable `track`:
//!
//! | Field | Type |
//! |---|---|
//! | `first_box`, `last_box`, `average_box`, `total_box` | box: `a`, `b`, `w`, `h`, `center`, `area` |
//! | `movement_vector` | `direction` (degrees), `length` |
//! | `classification` | string |
//! | `first_t`, `last_t` | timestamp |
//! | `length_t` | duration |
//! | `predictions` | list of `{t, classification, box}` |
//!
//! Images are never exposed to rules.

use std::collections::HashMap;
use std::sync::Arc;

use cel_interpreter::objects::{Key, Map};
use cel_interpreter::{Context, Program, Value};
use chrono::{DateTime, Utc};

use dmon_models::{BoundingBox, DetectionEvent, Point, Vector};

use crate::error::{TrackerError, TrackerResult};
use crate::track::Track;

/// A compiled CEL rule over `track`.
pub struct TrackRule {
    expression: String,
    program: Program,
}

impl std::fmt::Debug for TrackRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackRule")
            .field("expression", &self.expression)
            .finish()
    }
}

impl TrackRule {
    /// Compile a rule expression. Fails on any syntax error.
    pub fn compile(expression: &str) -> TrackerResult<Self> {
        let program = Program::compile(expression).map_err(|e| TrackerError::RuleCompile {
            expression: expression.to_string(),
            reason: format!("{:?}", e),
        })?;
        Ok(Self {
            expression: expression.to_string(),
            program,
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// Evaluate the rule. Anything other than boolean `true` is a rejection.
    pub fn matches(&self, track: &Track) -> Result<bool, String> {
        let mut context = Context::default();
        context.add_variable_from_value("track", track_value(track));
        match self.program.execute(&context) {
            Ok(Value::Bool(result)) => Ok(result),
            Ok(other) => Err(format!("rule returned a non-boolean value: {:?}", other)),
            Err(e) => Err(format!("{:?}", e)),
        }
    }
}

fn map_value<const N: usize>(entries: [(&str, Value); N]) -> Value {
    let map: HashMap<Key, Value> = entries
        .into_iter()
        .map(|(k, v)| (Key::from(k), v))
        .collect();
    Value::Map(Map { map: Arc::new(map) })
}

fn string_value(s: &str) -> Value {
    Value::String(Arc::new(s.to_string()))
}

fn timestamp_value(t: DateTime<Utc>) -> Value {
    Value::Timestamp(t.fixed_offset())
}

fn point_value(p: &Point) -> Value {
    map_value([("x", Value::Float(p.x)), ("y", Value::Float(p.y))])
}

fn box_value(b: &BoundingBox) -> Value {
    map_value([
        ("a", point_value(&b.a)),
        ("b", point_value(&b.b)),
        ("w", Value::Float(b.w())),
        ("h", Value::Float(b.h())),
        ("center", point_value(&b.center())),
        ("area", Value::Float(b.area())),
    ])
}

fn vector_value(v: &Vector) -> Value {
    map_value([
        ("direction", Value::Float(v.direction)),
        ("length", Value::Float(v.length)),
    ])
}

fn prediction_value(e: &DetectionEvent) -> Value {
    map_value([
        ("t", timestamp_value(e.t)),
        ("classification", string_value(&e.classification)),
        ("box", box_value(&e.bbox)),
    ])
}

/// Build the read-only view of a track exposed to rules.
pub fn track_value(track: &Track) -> Value {
    let predictions: Vec<Value> = track.events().iter().map(prediction_value).collect();
    map_value([
        ("predictions", Value::List(Arc::new(predictions))),
        ("first_t", timestamp_value(track.first_t())),
        ("last_t", timestamp_value(track.last_t())),
        ("first_box", box_value(&track.first_box())),
        ("last_box", box_value(&track.last_box())),
        ("average_box", box_value(&track.average_box())),
        ("total_box", box_value(&track.total_box())),
        ("classification", string_value(track.classification())),
        ("length_t", Value::Duration(track.length_t())),
        ("movement_vector", vector_value(&track.movement_vector())),
    ])
}
