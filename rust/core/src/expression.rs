// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Style expressions and the evaluator interface.
//!
//! Expressions are stored as source text. Evaluation is delegated to an
//! [`ExpressionEvaluator`], so a scripting engine can be plugged in. The
//! built-in [`AttributeEvaluator`] supports `[attribute]` substitution,
//! quoted literals and basic arithmetic for numeric expressions.

use nom::{
    branch::alt,
    character::complete::{char, multispace0, one_of},
    combinator::{all_consuming, map},
    multi::fold_many0,
    number::complete::double,
    sequence::{delimited, pair, preceded},
    IResult,
};

use crate::error::{Error, Result};
use crate::feature::Feature;

/// Expression producing a string, such as an instance URL.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StringExpression {
    expr: String,
    /// Referrer used to resolve relative URIs produced by this expression.
    uri_context: Option<String>,
}

impl StringExpression {
    pub fn new(expr: &str) -> Self {
        Self {
            expr: expr.to_string(),
            uri_context: None,
        }
    }

    pub fn with_uri_context(mut self, referrer: &str) -> Self {
        self.uri_context = Some(referrer.to_string());
        self
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }

    pub fn uri_context(&self) -> Option<&str> {
        self.uri_context.as_deref()
    }

    pub fn is_empty(&self) -> bool {
        self.expr.trim().is_empty()
    }
}

/// Expression producing a number, such as a scale or heading.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NumericExpression {
    expr: String,
}

impl NumericExpression {
    pub fn new(expr: &str) -> Self {
        Self {
            expr: expr.to_string(),
        }
    }

    pub fn literal(value: f64) -> Self {
        Self {
            expr: value.to_string(),
        }
    }

    pub fn expr(&self) -> &str {
        &self.expr
    }
}

/// Evaluates style expressions against feature attributes.
pub trait ExpressionEvaluator {
    /// Evaluate a string expression.
    fn eval_string(&self, expr: &StringExpression, feature: &Feature) -> String;

    /// Evaluate a numeric expression. Failures evaluate to `0.0`.
    fn eval_numeric(&self, expr: &NumericExpression, feature: &Feature) -> f64;

    /// Run a pre-processing script for a feature.
    fn run_script(&self, script: &str, feature: &Feature) {
        let _ = (script, feature);
    }
}

/// Built-in evaluator based on `[attribute]` substitution.
///
/// Pre-processing scripts are ignored; supply another evaluator to run them.
#[derive(Debug, Default, Clone, Copy)]
pub struct AttributeEvaluator;

impl AttributeEvaluator {
    pub fn new() -> Self {
        Self
    }

    /// Replace each `[name]` with the feature's attribute value.
    ///
    /// Missing attributes are replaced by `missing`. An unterminated `[` is
    /// copied through as-is.
    fn substitute(expr: &str, feature: &Feature, numeric: bool) -> String {
        let mut out = String::with_capacity(expr.len());
        let mut rest = expr;

        while let Some(open) = rest.find('[') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            match after.find(']') {
                Some(close) => {
                    let name = after[..close].trim();
                    match feature.get(name) {
                        Some(value) if numeric => {
                            out.push_str(&value.as_double().unwrap_or(0.0).to_string())
                        }
                        Some(value) => out.push_str(&value.as_string()),
                        None if numeric => out.push('0'),
                        None => {}
                    }
                    rest = &after[close + 1..];
                }
                None => {
                    out.push_str(&rest[open..]);
                    rest = "";
                }
            }
        }
        out.push_str(rest);
        out
    }

    fn strip_quotes(s: &str) -> &str {
        let s = s.trim();
        for quote in ['"', '\''] {
            if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
                return &s[1..s.len() - 1];
            }
        }
        s
    }
}

impl ExpressionEvaluator for AttributeEvaluator {
    fn eval_string(&self, expr: &StringExpression, feature: &Feature) -> String {
        let substituted = Self::substitute(expr.expr(), feature, false);
        Self::strip_quotes(&substituted).to_string()
    }

    fn eval_numeric(&self, expr: &NumericExpression, feature: &Feature) -> f64 {
        let substituted = Self::substitute(expr.expr(), feature, true);
        match parse_numeric(&substituted) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(
                    feature = feature.id,
                    error = %e,
                    "Numeric expression evaluated to 0"
                );
                0.0
            }
        }
    }
}

/// Evaluate an arithmetic expression (`+ - * /`, parentheses, unary minus).
pub fn parse_numeric(input: &str) -> Result<f64> {
    let (_, value) = all_consuming(delimited(multispace0, sum, multispace0))(input)
        .map_err(|_| Error::InvalidExpression(input.to_string()))?;

    if value.is_finite() {
        Ok(value)
    } else {
        Err(Error::DivisionByZero(input.to_string()))
    }
}

fn sum(input: &str) -> IResult<&str, f64> {
    let (input, first) = product(input)?;
    fold_many0(
        pair(delimited(multispace0, one_of("+-"), multispace0), product),
        move || first,
        |acc, (op, value)| if op == '+' { acc + value } else { acc - value },
    )(input)
}

fn product(input: &str) -> IResult<&str, f64> {
    let (input, first) = factor(input)?;
    fold_many0(
        pair(delimited(multispace0, one_of("*/"), multispace0), factor),
        move || first,
        |acc, (op, value)| if op == '*' { acc * value } else { acc / value },
    )(input)
}

fn factor(input: &str) -> IResult<&str, f64> {
    alt((
        delimited(
            char('('),
            delimited(multispace0, sum, multispace0),
            char(')'),
        ),
        double,
        map(preceded(char('-'), factor), |v| -v),
    ))(input)
}
