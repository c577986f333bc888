use crate::error::{self, Result};
use crate::{State, SuiteOutput};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use tabled::object::Segment;
use tabled::{Alignment, Modify, Style, Table, Tabled, Width};

/// `AggregatedReport` holds every suite that fully executed during a run, in the order the CR
/// manifests were processed. It is built once at the end of a run.
/// `AggregatedReport::to_table_string()` renders a table of per-test outcomes, and the report can
/// be serialized with `to_json()` for machine consumption.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct AggregatedReport {
    suites: Vec<SuiteOutput>,
}

impl AggregatedReport {
    pub fn new(suites: Vec<SuiteOutput>) -> Self {
        Self { suites }
    }

    pub fn suites(&self) -> &[SuiteOutput] {
        &self.suites
    }

    pub fn is_empty(&self) -> bool {
        self.suites.is_empty()
    }

    /// Number of results in `state` across all suites.
    pub fn count(&self, state: State) -> usize {
        self.suites.iter().map(|suite| suite.count(state)).sum()
    }

    /// `true` when no executed test failed or errored.
    pub fn all_passed(&self) -> bool {
        self.count(State::Fail) == 0 && self.count(State::Error) == 0
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self).context(error::ReportSerializeSnafu)?)
    }

    /// Create a table containing the outcome of every test.
    pub fn to_table_string(&self, width: usize) -> String {
        let mut table: Table = self.into();
        table.with(Width::truncate(width)).to_string()
    }
}

impl From<&AggregatedReport> for Table {
    fn from(report: &AggregatedReport) -> Self {
        let rows: Vec<ResultRow> = report
            .suites
            .iter()
            .flat_map(|suite| {
                suite.results.iter().map(move |result| ResultRow {
                    suite: suite.name.description().to_string(),
                    name: result.test.name.clone(),
                    state: result.state.to_string(),
                    suggestions: result.suggestions.join("; "),
                    errors: result.errors.join("; "),
                })
            })
            .collect();

        let mut table = Table::new(rows);
        table
            .with(Style::blank())
            .with(Modify::new(Segment::all()).with(Alignment::left()));
        table
    }
}

#[derive(Tabled, Default, Clone, Serialize)]
struct ResultRow {
    #[tabled(rename = "SUITE")]
    suite: String,
    #[tabled(rename = "TEST")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
    #[tabled(rename = "SUGGESTIONS")]
    suggestions: String,
    #[tabled(rename = "ERRORS")]
    errors: String,
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::constants::NECESSITY_REQUIRED;
    use crate::{SuiteName, Test, TestResult};

    fn report() -> AggregatedReport {
        let mut failing = TestResult::new(Test::new(
            SuiteName::Basic,
            "checkstatus",
            "",
            NECESSITY_REQUIRED,
        ));
        failing.fail("Add a status block");
        AggregatedReport::new(vec![SuiteOutput {
            name: SuiteName::Basic,
            results: vec![
                TestResult::new(Test::new(
                    SuiteName::Basic,
                    "checkspec",
                    "",
                    NECESSITY_REQUIRED,
                )),
                failing,
            ],
            log: "level=info msg=\"Running for cr: cr.yaml\"\n".to_string(),
        }])
    }

    #[test]
    fn counts() {
        let report = report();
        assert_eq!(report.count(State::Pass), 1);
        assert_eq!(report.count(State::Fail), 1);
        assert!(!report.all_passed());
    }

    #[test]
    fn table_lists_every_result() {
        let table = report().to_table_string(200);
        assert!(table.contains("checkspec"));
        assert!(table.contains("checkstatus"));
        assert!(table.contains("Add a status block"));
    }

    #[test]
    fn json_round_trips() {
        let report = report();
        let parsed: AggregatedReport = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(parsed, report);
    }
}
