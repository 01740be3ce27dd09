/*
 * This file is part of vcool.
 *
 * Copyright (C) 2025 vcool contributors
 *
 * vcool is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * vcool is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with vcool. If not, see <https://www.gnu.org/licenses/>.
 */

//! Strategy file parsing and rule selection
//!
//! A strategy file holds one rule per line, `<condition> <action>`:
//!
//! ```text
//! # hottest first, first match wins
//! C80|G85 F100
//! C70&G60 F60
//! C60 F40
//! ```
//!
//! A condition is `C<int>` or `G<int>`, optionally joined with a second term by
//! `|` (either) or `&` (both). The action is `F<0-100>`. The file is re-read on
//! every poll so edits take effect without restarting the daemon.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use tracing::{debug, warn};
use vc_error::ParseError;

use crate::condition::{Condition, Term};
use crate::types::{DutyCycle, Sensor, Temperature};

const FAN_ACTION: char = 'F';
const OR_SEPARATOR: char = '|';
const AND_SEPARATOR: char = '&';
const COMMENT: char = '#';

/// One strategy line: when `condition` holds, run the fan at `duty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rule {
    pub condition: Condition,
    pub duty: DutyCycle,
}

impl Rule {
    pub fn matches(&self, cpu: Temperature, gpu: Temperature) -> bool {
        self.condition.evaluate(cpu, gpu)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}{}", self.condition, FAN_ACTION, self.duty.percent())
    }
}

/// Parse a single strategy line into a rule.
pub fn parse_line(text: &str) -> Result<Rule, ParseError> {
    let mut tokens = text.split_whitespace();
    let condition = tokens.next().ok_or(ParseError::Empty)?;
    let action = tokens
        .next()
        .ok_or_else(|| ParseError::MalformedAction(format!("missing action after '{}'", condition)))?;
    if let Some(extra) = tokens.next() {
        return Err(ParseError::UnexpectedToken(extra.to_string()));
    }

    Ok(Rule {
        condition: parse_condition(condition)?,
        duty: parse_action(action)?,
    })
}

fn parse_action(action: &str) -> Result<DutyCycle, ParseError> {
    action
        .strip_prefix(FAN_ACTION)
        .and_then(|pct| pct.parse::<u8>().ok())
        .and_then(DutyCycle::new)
        .ok_or_else(|| ParseError::MalformedAction(action.to_string()))
}

fn parse_condition(expr: &str) -> Result<Condition, ParseError> {
    let has_or = expr.contains(OR_SEPARATOR);
    let has_and = expr.contains(AND_SEPARATOR);
    match (has_or, has_and) {
        (true, true) => Err(ParseError::AmbiguousCondition(expr.to_string())),
        (true, false) => {
            let (a, b) = split_pair(expr, OR_SEPARATOR)?;
            Ok(Condition::Or(a, b))
        }
        (false, true) => {
            let (a, b) = split_pair(expr, AND_SEPARATOR)?;
            Ok(Condition::And(a, b))
        }
        (false, false) => parse_term(expr).map(Condition::Simple),
    }
}

fn split_pair(expr: &str, separator: char) -> Result<(Term, Term), ParseError> {
    let parts: Vec<&str> = expr.split(separator).collect();
    match parts.as_slice() {
        [a, b] => Ok((parse_term(a)?, parse_term(b)?)),
        _ => Err(ParseError::MalformedCondition(expr.to_string())),
    }
}

fn parse_term(term: &str) -> Result<Term, ParseError> {
    let malformed = || ParseError::MalformedCondition(term.to_string());
    let mut chars = term.chars();
    let sensor = chars.next().and_then(Sensor::from_letter).ok_or_else(malformed)?;
    let threshold = chars.as_str().parse::<i32>().map_err(|_| malformed())?;
    Ok(Term::new(sensor, threshold))
}

fn is_ignorable(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with(COMMENT)
}

/// Parse a whole strategy document, skipping lines that do not parse.
///
/// Blank lines and `#` comments are skipped silently; malformed rules are
/// logged with their line number and skipped.
pub fn parse_rules(text: &str) -> Vec<Rule> {
    let mut rules = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if is_ignorable(line) {
            continue;
        }
        match parse_line(line) {
            Ok(rule) => rules.push(rule),
            Err(e) => warn!(line = idx + 1, error = %e, "Skipping strategy rule"),
        }
    }
    rules
}

/// Read and parse the strategy file at `path`.
pub fn load_rules(path: &Path) -> io::Result<Vec<Rule>> {
    let text = fs::read_to_string(path)?;
    let rules = parse_rules(&text);
    debug!(path = %path.display(), rules = rules.len(), "Strategy loaded");
    Ok(rules)
}

/// Duty cycle of the first rule whose condition holds.
pub fn select_duty(rules: &[Rule], cpu: Temperature, gpu: Temperature) -> Option<DutyCycle> {
    rules.iter().find(|r| r.matches(cpu, gpu)).map(|r| r.duty)
}
