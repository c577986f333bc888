use crate::constants::{LABEL_NECESSITY, LABEL_SUITE, LABEL_TEST};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// The name of a suite. Each suite variant declares its short name explicitly.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuiteName {
    Basic,
    Olm,
}

impl SuiteName {
    pub fn short_name(&self) -> &'static str {
        match self {
            SuiteName::Basic => "basic",
            SuiteName::Olm => "olm",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            SuiteName::Basic => "Basic Tests",
            SuiteName::Olm => "OLM Integration",
        }
    }
}

impl Display for SuiteName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A declared test. Labels are what a selector is matched against.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Test {
    pub name: String,
    pub description: String,
    pub labels: BTreeMap<String, String>,
}

impl Test {
    /// Declare a test that belongs to `suite`. The `suite`, `test` and `necessity` labels are
    /// filled in from the arguments.
    pub fn new<S1, S2>(suite: SuiteName, name: S1, description: S2, necessity: &str) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        let name = name.into();
        let mut labels = BTreeMap::new();
        labels.insert(LABEL_SUITE.to_string(), suite.short_name().to_string());
        labels.insert(LABEL_TEST.to_string(), format!("{}test", name));
        labels.insert(LABEL_NECESSITY.to_string(), necessity.to_string());
        Self {
            name,
            description: description.into(),
            labels,
        }
    }
}

/// The outcome of one executed test.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Pass,
    Fail,
    Error,
}

impl Default for State {
    fn default() -> Self {
        State::Pass
    }
}

impl Display for State {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            State::Pass => write!(f, "pass"),
            State::Fail => write!(f, "fail"),
            State::Error => write!(f, "error"),
        }
    }
}

/// One entry per executed test. A result starts out passing and is only changed by the test that
/// owns it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TestResult {
    pub test: Test,
    pub state: State,
    pub suggestions: Vec<String>,
    pub errors: Vec<String>,
}

impl TestResult {
    pub fn new(test: Test) -> Self {
        Self {
            test,
            state: State::Pass,
            suggestions: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Mark the test failed, with a suggestion for the operator author.
    pub fn fail<S>(&mut self, suggestion: S)
    where
        S: Into<String>,
    {
        if self.state == State::Pass {
            self.state = State::Fail;
        }
        self.suggestions.push(suggestion.into());
    }

    /// Mark the test errored: the check itself could not be carried out.
    pub fn error<S>(&mut self, error: S)
    where
        S: Into<String>,
    {
        self.state = State::Error;
        self.errors.push(error.into());
    }

    pub fn suggest<S>(&mut self, suggestion: S)
    where
        S: Into<String>,
    {
        self.suggestions.push(suggestion.into());
    }

    pub fn passed(&self) -> bool {
        self.state == State::Pass
    }
}

/// The serializable output of one suite execution.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SuiteOutput {
    pub name: SuiteName,
    pub results: Vec<TestResult>,
    /// The log captured while this suite's CR was provisioned and tested.
    pub log: String,
}

impl SuiteOutput {
    pub fn count(&self, state: State) -> usize {
        self.results.iter().filter(|r| r.state == state).count()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::NECESSITY_REQUIRED;

    #[test]
    fn declared_labels() {
        let test = Test::new(SuiteName::Basic, "checkspec", "desc", NECESSITY_REQUIRED);
        assert_eq!(test.labels[LABEL_SUITE], "basic");
        assert_eq!(test.labels[LABEL_TEST], "checkspectest");
        assert_eq!(test.labels[LABEL_NECESSITY], "required");
    }

    #[test]
    fn error_wins_over_fail() {
        let mut result = TestResult::new(Test::new(SuiteName::Olm, "x", "", NECESSITY_REQUIRED));
        assert!(result.passed());
        result.error("boom");
        result.fail("fix it");
        assert_eq!(result.state, State::Error);
        assert_eq!(result.suggestions, vec!["fix it".to_string()]);
        assert_eq!(result.errors, vec!["boom".to_string()]);
    }
}
