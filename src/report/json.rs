//! JSON report output

use crate::report::{AnalysisReport, Summary};
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct JsonReport<'a> {
    generated: String,
    summary: Summary,
    report: &'a AnalysisReport,
}

pub fn write<W: Write>(writer: &mut W, report: &AnalysisReport) -> io::Result<()> {
    let doc = JsonReport {
        generated: chrono::Local::now().to_rfc3339(),
        summary: report.summary(),
        report,
    };
    serde_json::to_writer_pretty(&mut *writer, &doc)?;
    writeln!(writer)
}
