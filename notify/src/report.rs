//! Report sections: engine output laid out as text tables

use runreport_engine::assembly::SUPPRESSED_MESSAGE;
use runreport_engine::{AnomalyReport, AnomalySection, ResultTuple, Scope, TallyColumn, TallyTable};

use crate::table::TextTable;

pub const ANOMALY_COLUMNS: [&str; 4] = ["Host", "Test Name", "Context", "Status"];
pub const UNIVERSAL_HEADING: &str = "These tests failed on all hosts and on all contexts";
pub const PARTIAL_HEADING: &str = "These tests failed on some hosts";

/// Table for one anomaly section, `None` when it has no rows
pub fn anomaly_table(section: &AnomalySection) -> Option<TextTable> {
    if section.is_empty() {
        return None;
    }
    let mut table = TextTable::with_columns(&ANOMALY_COLUMNS);
    for row in &section.rows {
        table.push_row([
            row.host.as_str(),
            row.test_name.as_str(),
            row.context.as_str(),
            row.status.code(),
        ]);
    }
    if section.suppressed {
        table.push_row([SUPPRESSED_MESSAGE]);
    }
    Some(table)
}

/// Universal and partial tables of an anomaly report
pub fn anomaly_tables(report: &AnomalyReport) -> (Option<TextTable>, Option<TextTable>) {
    (anomaly_table(&report.universal), anomaly_table(&report.partial))
}

pub fn summary_header(scope: &Scope) -> String {
    format!(
        "Project summary for {} and test_run {}\n\n",
        scope.project, scope.test_run
    )
}

/// Counts table, `All/All` first
pub fn summary_table(tally: &TallyTable) -> TextTable {
    let mut table = TextTable::with_columns(&["Host", "Context"]);
    for column in TallyColumn::ORDER {
        table.define_column(column.heading());
    }
    for row in tally.rows() {
        let mut cells = vec![row.host.clone(), row.context.clone()];
        cells.extend(row.values().iter().map(u64::to_string));
        table.push_row(cells);
    }
    table
}

/// Failures of the tests a user is a contact for
pub fn contact_table(failures: &[ResultTuple]) -> TextTable {
    let mut table = TextTable::with_columns(&["Test Name", "Host", "Context", "Status"]);
    for failure in failures {
        table.push_row([
            failure.test_name.as_str(),
            failure.host.as_str(),
            failure.context.as_str(),
            failure.status.code(),
        ]);
    }
    table
}
