//! CSV report output: one row per text section and per image

use crate::report::AnalysisReport;
use std::io::{self, Write};

const HEADER: &str = "kind,id,page,ai_score,severity,generator,content";

fn field(s: &str) -> String {
    if s.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn write<W: Write>(writer: &mut W, report: &AnalysisReport) -> io::Result<()> {
    writeln!(writer, "{}", HEADER)?;

    for s in &report.sections {
        writeln!(
            writer,
            "text,{},{},{},{},,{}",
            field(&s.id),
            s.page,
            s.ai_score,
            s.severity().css_class(),
            field(&s.content)
        )?;
    }

    for i in &report.images {
        writeln!(
            writer,
            "image,{},{},{},{},{},{}",
            field(&i.id),
            i.page,
            i.ai_score,
            i.severity().css_class(),
            field(i.generator.as_deref().unwrap_or("")),
            field(&i.name)
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::sample_report;

    #[test]
    fn test_rows() {
        let mut out = Vec::new();
        write(&mut out, &sample_report()).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], HEADER);
        assert_eq!(lines.len(), 7);
        assert!(lines[1].starts_with("text,1,1,92,high,,\"The rapid"));
        assert_eq!(lines[5], "image,2,5,8,low,,chart_data.png");
        assert_eq!(lines[6], "image,3,7,78,high,Midjourney,illustration.jpg");
    }

    #[test]
    fn test_field_quoting() {
        assert_eq!(field("plain"), "plain");
        assert_eq!(field("a,b"), "\"a,b\"");
        assert_eq!(field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(field("line\r\nbreak"), "\"line\r\nbreak\"");
        assert_eq!(field("lone\rreturn"), "\"lone\rreturn\"");
    }
}
