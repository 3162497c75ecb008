//! HTML report page, also served by the web UI at `/analysis/<id>`

use crate::report::{highlight_words, AnalysisReport, Highlight, Severity};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fmt::Write as _;
use std::io::{self, Write};

/// Shared stylesheet for the report and every web UI page.
pub const STYLE: &str = r#"
    :root {
        --bg: #0d1117;
        --card: #161b22;
        --border: #30363d;
        --text: #e6edf3;
        --dim: #7d8590;
        --low: #3fb950;
        --moderate: #d29922;
        --high: #f85149;
        --rare: #a371f7;
        --accent: #58a6ff;
    }
    * { box-sizing: border-box; margin: 0; padding: 0; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Noto Sans', Helvetica, Arial, sans-serif;
        background: var(--bg);
        color: var(--text);
        line-height: 1.5;
    }
    a { color: var(--accent); text-decoration: none; }
    .container { max-width: 1100px; margin: 0 auto; padding: 2rem; }
    nav { display: flex; gap: 1.5rem; align-items: center; padding: 1rem 2rem; border-bottom: 1px solid var(--border); }
    nav .brand { font-weight: 800; font-size: 1.25rem; margin-right: auto;
        background: linear-gradient(135deg, var(--accent), var(--rare));
        -webkit-background-clip: text; -webkit-text-fill-color: transparent; }
    h1 { font-size: 1.75rem; margin-bottom: 0.25rem; }
    h2 { font-size: 1.1rem; color: var(--dim); margin-bottom: 1rem; }
    .subtitle, .dim { color: var(--dim); }
    .card { background: var(--card); border: 1px solid var(--border); border-radius: 12px; padding: 1.5rem; margin-bottom: 1.5rem; }
    .grid { display: grid; grid-template-columns: repeat(auto-fit, minmax(220px, 1fr)); gap: 1rem; margin-bottom: 1.5rem; }
    .stat { text-align: center; }
    .stat-value { font-size: 2.5rem; font-weight: 700; line-height: 1; }
    .stat-label { color: var(--dim); font-size: 0.8rem; text-transform: uppercase; letter-spacing: 0.05em; margin-top: 0.5rem; }
    .badge { display: inline-block; padding: 0.2rem 0.7rem; border-radius: 20px; font-size: 0.75rem; font-weight: 600; text-transform: uppercase; }
    .badge.high { background: rgba(248,81,73,0.15); color: var(--high); }
    .badge.moderate { background: rgba(210,153,34,0.15); color: var(--moderate); }
    .badge.low { background: rgba(63,185,80,0.15); color: var(--low); }
    .score.high { color: var(--high); } .score.moderate { color: var(--moderate); } .score.low { color: var(--low); }
    .section.high { border-color: rgba(248,81,73,0.3); }
    .section.moderate { border-color: rgba(210,153,34,0.3); }
    .section.low { border-color: rgba(63,185,80,0.3); }
    .bar { height: 8px; background: rgba(255,255,255,0.1); border-radius: 4px; overflow: hidden; margin: 0.5rem 0; }
    .bar-fill { height: 100%; background: var(--accent); border-radius: 4px; transition: width 0.2s; }
    .word { padding: 0 0.1rem; border-radius: 3px; }
    .word.very-likely { background: rgba(63,185,80,0.2); }
    .word.likely { background: rgba(210,153,34,0.2); }
    .word.unlikely { background: rgba(248,81,73,0.2); }
    .word.rare { background: rgba(163,113,247,0.2); }
    table { width: 100%; border-collapse: collapse; }
    th, td { padding: 0.75rem 1rem; text-align: left; border-bottom: 1px solid var(--border); }
    th { font-size: 0.75rem; text-transform: uppercase; letter-spacing: 0.05em; color: var(--dim); }
    input, button { font: inherit; padding: 0.5rem 0.9rem; border-radius: 8px; border: 1px solid var(--border); background: var(--bg); color: var(--text); }
    button { cursor: pointer; background: var(--accent); color: #0d1117; font-weight: 600; border: none; }
    button:disabled { opacity: 0.4; cursor: not-allowed; }
    .error { color: var(--high); font-size: 0.85rem; }
    .notice { background: rgba(248,81,73,0.15); color: var(--high); padding: 0.75rem 1rem; border-radius: 8px; display: none; }
    .step { display: flex; justify-content: space-between; padding: 0.75rem 1rem; border: 1px solid var(--border); border-radius: 8px; margin-bottom: 0.5rem; }
    .step.processing { border-color: var(--accent); }
    .step.complete { border-color: var(--low); }
    .step.pending { color: var(--dim); }
    .footer { margin-top: 2rem; padding-top: 1rem; border-top: 1px solid var(--border); color: var(--dim); font-size: 0.875rem; text-align: center; }
"#;

/// Minimal HTML escaping for text and attribute values.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn write<W: Write>(writer: &mut W, report: &AnalysisReport) -> io::Result<()> {
    writer.write_all(render_page(report).as_bytes())
}

/// Full standalone document.
pub fn render_page(report: &AnalysisReport) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Analysis Report - {name}</title>
    <style>{style}</style>
</head>
<body>
    <div class="container">
{body}
        <div class="footer">Generated by detecta</div>
    </div>
</body>
</html>
"#,
        name = escape(&report.document.name),
        style = STYLE,
        body = render_body(report),
    )
}

fn gauge(label: &str, score: u8) -> String {
    let severity = crate::report::severity(score);
    format!(
        r#"<div class="card stat">
            <div class="stat-value score {class}">{score}%</div>
            <div class="stat-label">{label}</div>
            <div class="bar"><div class="bar-fill" style="width: {score}%"></div></div>
            <span class="badge {class}">{status}</span>
        </div>"#,
        class = severity.css_class(),
        score = score,
        label = escape(label),
        status = severity.label(),
    )
}

/// Report content without the document shell, for embedding in the web UI.
pub fn render_body(report: &AnalysisReport) -> String {
    // Same words, same colours on every render of the same report
    let mut rng = StdRng::seed_from_u64(report.id.bytes().map(u64::from).sum());
    let mut html = String::new();

    let _ = write!(
        html,
        r#"<h1>Analysis Report</h1>
        <p class="subtitle">{name}</p>
        <div class="grid">
            <div class="card">
                <h2>Document Summary</h2>
                <table>
                    <tr><td class="dim">File Name</td><td>{name}</td></tr>
                    <tr><td class="dim">Pages</td><td>{pages}</td></tr>
                    <tr><td class="dim">Words</td><td>{words}</td></tr>
                    <tr><td class="dim">Images</td><td>{images}</td></tr>
                </table>
            </div>
            {text_gauge}
            {image_gauge}
        </div>
        <div class="card"><h2>Key Findings</h2><ul>"#,
        name = escape(&report.document.name),
        pages = report.document.pages,
        words = report.document.words,
        images = report.document.images,
        text_gauge = gauge("Text Detection", report.text_score),
        image_gauge = gauge("Image Detection", report.image_score),
    );

    for finding in &report.findings {
        let _ = write!(html, "<li>{}</li>", escape(finding));
    }
    html.push_str("</ul></div>\n<div class=\"card\"><h2>Text Sections Analysis</h2>\n");

    html.push_str("<p class=\"dim\">");
    for h in Highlight::ALL {
        let _ = write!(html, r#"<span class="word {}">{}</span> "#, h.css_class(), h.label());
    }
    html.push_str("</p>\n");

    for section in &report.sections {
        let severity: Severity = section.severity();
        let _ = write!(
            html,
            r#"<div class="card section {class}">
                <div><span class="badge {class}">{score}% AI</span> <span class="dim">Page {page}</span></div>
                <p>"#,
            class = severity.css_class(),
            score = section.ai_score,
            page = section.page,
        );
        for word in highlight_words(&section.content, &mut rng) {
            let _ = write!(
                html,
                r#"<span class="word {}">{}</span> "#,
                word.highlight.css_class(),
                escape(&word.text)
            );
        }
        html.push_str("</p></div>\n");
    }
    html.push_str("</div>\n<div class=\"card\"><h2>Image Analysis Results</h2><table>\n");
    html.push_str("<tr><th>Image</th><th>Page</th><th>Generator</th><th>AI Score</th></tr>\n");

    for image in &report.images {
        let _ = write!(
            html,
            r#"<tr><td>{name}</td><td>{page}</td><td>{generator}</td><td class="score {class}">{score}%</td></tr>
"#,
            name = escape(&image.name),
            page = image.page,
            generator = image
                .generator
                .as_deref()
                .map(escape)
                .unwrap_or_else(|| "-".to_string()),
            class = image.severity().css_class(),
            score = image.ai_score,
        );
    }
    html.push_str("</table></div>\n");
    html
}
