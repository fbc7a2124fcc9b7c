// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Error types shared across the metrics fabric.
//!
//! Only configuration mistakes and API misuse surface as errors. Operational
//! loss (a full buffer, a missing consumer, a suppressed loop) is reported
//! through a node's `drop` event instead and never interrupts producer code.

/// A specialized `Result` type for metric-related operations.
pub type MetricsResult<T> = Result<T, MetricsError>;

/// An error raised by producer construction or call-time validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MetricsError {
    /// The options did not carry a metric name.
    #[error("metric options must provide a 'name'")]
    MissingName,

    /// The metric name contains characters outside `[A-Za-z0-9_-]`.
    #[error("metric name '{0}' is invalid: allowed characters are a-z, A-Z, 0-9, '_' and '-'")]
    InvalidName(String),

    /// The metric description is missing or empty.
    #[error("metric description must be a non-empty string")]
    InvalidDescription,

    /// A required numeric argument was not a finite number.
    #[error("argument 'value' to method '.{0}()' must be a finite number")]
    InvalidValue(&'static str),

    /// Positional label values were supplied to a producer declared with
    /// named defaults, or named values to a positional declaration.
    #[error("label values do not match the producer's declared label binding mode")]
    LabelBindingMismatch,

    /// A `Metric` was coerced into a number.
    #[error("a Metric instance cannot be treated as a numeric type; read '.value()' or '.elapsed()' instead")]
    NotNumeric,

    /// A pull collector is already attached to the node.
    #[error("a collector is already attached to node '{0}'")]
    CollectorAttached(String),
}
