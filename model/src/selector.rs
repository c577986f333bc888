use crate::error::{self, Result};
use regex::Regex;
use snafu::ensure;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const KEY_REGEX: &str = r"^([A-Za-z0-9][-A-Za-z0-9_./]*)?[A-Za-z0-9]$";
const VALUE_REGEX: &str = r"^(([A-Za-z0-9][-A-Za-z0-9_.]*)?[A-Za-z0-9])?$";
const SET_REGEX: &str = r"^(\S+)\s+(in|notin)\s*\((.*)\)$";

lazy_static::lazy_static! {
    static ref KEY: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(KEY_REGEX).unwrap()
    };
    static ref VALUE: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(VALUE_REGEX).unwrap()
    };
    static ref SET: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(SET_REGEX).unwrap()
    };
}

/// One clause of a label selector.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Requirement {
    Equals(String, String),
    NotEquals(String, String),
    In(String, BTreeSet<String>),
    NotIn(String, BTreeSet<String>),
    Exists(String),
    DoesNotExist(String),
}

impl Requirement {
    fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        match self {
            Requirement::Equals(key, value) => labels.get(key) == Some(value),
            Requirement::NotEquals(key, value) => labels.get(key) != Some(value),
            Requirement::In(key, values) => labels
                .get(key)
                .map(|value| values.contains(value))
                .unwrap_or(false),
            Requirement::NotIn(key, values) => labels
                .get(key)
                .map(|value| !values.contains(value))
                .unwrap_or(true),
            Requirement::Exists(key) => labels.contains_key(key),
            Requirement::DoesNotExist(key) => !labels.contains_key(key),
        }
    }
}

/// A Kubernetes-style label selector such as `suite=basic,test notin (checkspec)`. The empty
/// selector matches every set of labels.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct Selector {
    expression: String,
    requirements: Vec<Requirement>,
}

impl Selector {
    /// A selector that matches everything.
    pub fn everything() -> Self {
        Self::default()
    }

    pub fn parse(expression: &str) -> Result<Self> {
        let mut requirements = Vec::new();
        for clause in split_clauses(expression) {
            let clause = clause.trim();
            if clause.is_empty() {
                continue;
            }
            requirements.push(parse_requirement(expression, clause)?);
        }
        Ok(Self {
            expression: expression.trim().to_string(),
            requirements,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.requirements.is_empty()
    }

    pub fn requirements(&self) -> &[Requirement] {
        &self.requirements
    }

    /// `true` when every requirement is satisfied by `labels`.
    pub fn matches(&self, labels: &BTreeMap<String, String>) -> bool {
        self.requirements.iter().all(|r| r.matches(labels))
    }
}

impl FromStr for Selector {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl Display for Selector {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.expression)
    }
}

/// Split on commas that are not inside a parenthesized value set.
fn split_clauses(expression: &str) -> Vec<&str> {
    let mut clauses = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, c) in expression.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                clauses.push(&expression[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    clauses.push(&expression[start..]);
    clauses
}

fn parse_requirement(expression: &str, clause: &str) -> Result<Requirement> {
    if let Some(captures) = SET.captures(clause) {
        let key = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
        let operator = captures.get(2).map(|m| m.as_str()).unwrap_or_default();
        let values = captures.get(3).map(|m| m.as_str()).unwrap_or_default();
        let key = check_key(expression, key)?;
        ensure!(
            !values.trim().is_empty(),
            error::SelectorSnafu {
                selector: expression,
                reason: format!("'{}' requires at least one value", operator),
            }
        );
        let mut set = BTreeSet::new();
        for value in values.split(',') {
            set.insert(check_value(expression, value.trim())?);
        }
        return Ok(if operator == "in" {
            Requirement::In(key, set)
        } else {
            Requirement::NotIn(key, set)
        });
    }
    if let Some(key) = clause.strip_prefix('!') {
        return Ok(Requirement::DoesNotExist(check_key(expression, key.trim())?));
    }
    if let Some((key, value)) = clause.split_once("!=") {
        return Ok(Requirement::NotEquals(
            check_key(expression, key.trim())?,
            check_value(expression, value.trim())?,
        ));
    }
    if let Some((key, value)) = clause
        .split_once("==")
        .or_else(|| clause.split_once('='))
    {
        return Ok(Requirement::Equals(
            check_key(expression, key.trim())?,
            check_value(expression, value.trim())?,
        ));
    }
    Ok(Requirement::Exists(check_key(expression, clause)?))
}

fn check_key(expression: &str, key: &str) -> Result<String> {
    ensure!(
        KEY.is_match(key),
        error::SelectorSnafu {
            selector: expression,
            reason: format!("invalid label key '{}'", key),
        }
    );
    Ok(key.to_string())
}

fn check_value(expression: &str, value: &str) -> Result<String> {
    ensure!(
        VALUE.is_match(value),
        error::SelectorSnafu {
            selector: expression,
            reason: format!("invalid label value '{}'", value),
        }
    );
    Ok(value.to_string())
}
