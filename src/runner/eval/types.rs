//! Core types for the evaluation engine.

use crate::runner::ds::error::JErrorType;
use crate::runner::ds::value::JsValue;

/// Completion record type.
/// Throwing is not a completion type here: exceptions travel as `Err(JErrorType)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CompletionType {
    /// Normal completion - execution continues.
    Normal,
    /// Return completion - function returns.
    Return,
    /// Break completion - break from loop.
    Break,
    /// Continue completion - continue loop iteration.
    Continue,
}

/// Completion record.
/// Every statement evaluation returns a completion record.
#[derive(Debug, Clone)]
pub struct Completion {
    /// The type of completion.
    pub completion_type: CompletionType,
    /// The value, if any.
    pub value: Option<JsValue>,
}

impl Completion {
    /// Create a normal completion with no value.
    pub fn normal() -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: None,
        }
    }

    /// Create a normal completion with a value.
    pub fn normal_with_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Normal,
            value: Some(value),
        }
    }

    /// Create a return completion.
    pub fn return_value(value: JsValue) -> Self {
        Completion {
            completion_type: CompletionType::Return,
            value: Some(value),
        }
    }

    /// Create a break completion.
    pub fn break_completion() -> Self {
        Completion {
            completion_type: CompletionType::Break,
            value: None,
        }
    }

    /// Create a continue completion.
    pub fn continue_completion() -> Self {
        Completion {
            completion_type: CompletionType::Continue,
            value: None,
        }
    }

    /// Check if this is a normal completion.
    pub fn is_normal(&self) -> bool {
        self.completion_type == CompletionType::Normal
    }

    /// Check if this is an abrupt completion (not normal).
    pub fn is_abrupt(&self) -> bool {
        !self.is_normal()
    }

    /// Get the value, or undefined if none.
    pub fn get_value(&self) -> JsValue {
        self.value.clone().unwrap_or(JsValue::Undefined)
    }

    /// Carries `value` forward when this completion produced none, the way a
    /// statement list keeps the value of its last value-producing statement.
    pub fn update_empty(self, value: Option<JsValue>) -> Self {
        if self.value.is_none() {
            Completion { value, ..self }
        } else {
            self
        }
    }
}

/// Where an assignment, update or `delete` lands.
#[derive(Debug, Clone)]
pub enum Reference {
    /// An identifier, resolved through the environment chain.
    Binding(String),
    /// A property of a value.
    Property { base: JsValue, key: String },
}

/// Result type for evaluation operations.
pub type EvalResult = Result<Completion, JErrorType>;

/// Result type for value-returning operations.
pub type ValueResult = Result<JsValue, JErrorType>;
