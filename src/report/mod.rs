//! Analysis report: sample scores, severity buckets and output formatters
//!
//! The report page shows a fixed sample document. Nothing here depends on
//! what was uploaded; the only computed logic is bucketing a 0-100 score
//! into a severity:
//!
//! | Score  | Severity | Label                   |
//! |--------|----------|-------------------------|
//! | 70-100 | High     | High AI Probability     |
//! | 40-69  | Moderate | Moderate AI Probability |
//! | 0-39   | Low      | Likely Human            |
//!
//! Formatters are picked from the output extension:
//!
//! ```ignore
//! use detecta::report;
//!
//! let r = report::sample_report();
//! report::generate("report.html", &r)?;  // HTML
//! report::generate("report.json", &r)?;  // JSON
//! report::generate("report.csv", &r)?;   // CSV
//! ```

pub mod csv;
pub mod html;
pub mod json;

use rand::Rng;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::Path;

/// The one report every analysis lands on.
pub const REPORT_ID: &str = "1";

pub const HIGH_THRESHOLD: u8 = 70;
pub const MODERATE_THRESHOLD: u8 = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

/// Bucket a score. Scores above 100 are treated as 100.
pub fn severity(score: u8) -> Severity {
    if score >= HIGH_THRESHOLD {
        Severity::High
    } else if score >= MODERATE_THRESHOLD {
        Severity::Moderate
    } else {
        Severity::Low
    }
}

impl Severity {
    pub fn label(&self) -> &'static str {
        match self {
            Severity::High => "High AI Probability",
            Severity::Moderate => "Moderate AI Probability",
            Severity::Low => "Likely Human",
        }
    }

    /// CSS class used by the web UI and the HTML report.
    pub fn css_class(&self) -> &'static str {
        match self {
            Severity::High => "high",
            Severity::Moderate => "moderate",
            Severity::Low => "low",
        }
    }

    /// ANSI colour for terminal output.
    pub fn ansi(&self) -> &'static str {
        match self {
            Severity::High => "\x1b[31m",
            Severity::Moderate => "\x1b[33m",
            Severity::Low => "\x1b[32m",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::High => write!(f, "HIGH"),
            Severity::Moderate => write!(f, "MODERATE"),
            Severity::Low => write!(f, "LOW"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TextSection {
    pub id: String,
    pub content: String,
    pub ai_score: u8,
    pub page: u32,
}

impl TextSection {
    pub fn severity(&self) -> Severity {
        severity(self.ai_score)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageResult {
    pub id: String,
    pub name: String,
    pub page: u32,
    pub ai_score: u8,
    pub generator: Option<String>,
}

impl ImageResult {
    pub fn severity(&self) -> Severity {
        severity(self.ai_score)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub name: String,
    pub pages: u32,
    pub words: u32,
    pub images: u32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub id: String,
    pub document: DocumentInfo,
    pub text_score: u8,
    pub image_score: u8,
    pub findings: Vec<String>,
    pub sections: Vec<TextSection>,
    pub images: Vec<ImageResult>,
}

impl AnalysisReport {
    pub fn text_severity(&self) -> Severity {
        severity(self.text_score)
    }

    pub fn image_severity(&self) -> Severity {
        severity(self.image_score)
    }

    pub fn summary(&self) -> Summary {
        Summary::from_report(self)
    }
}

fn section(id: &str, page: u32, ai_score: u8, content: &str) -> TextSection {
    TextSection {
        id: id.to_string(),
        content: content.to_string(),
        ai_score,
        page,
    }
}

fn image(id: &str, name: &str, page: u32, ai_score: u8, generator: Option<&str>) -> ImageResult {
    ImageResult {
        id: id.to_string(),
        name: name.to_string(),
        page,
        ai_score,
        generator: generator.map(str::to_string),
    }
}

/// The fixed sample shown for every analysis.
pub fn sample_report() -> AnalysisReport {
    AnalysisReport {
        id: REPORT_ID.to_string(),
        document: DocumentInfo {
            name: "Research_Paper_2024.pdf".to_string(),
            pages: 12,
            words: 4832,
            images: 4,
        },
        text_score: 78,
        image_score: 45,
        findings: vec![
            "78% of text content shows patterns consistent with AI generation.".to_string(),
            "Research methodology sections appear to be human-written.".to_string(),
        ],
        sections: vec![
            section(
                "1",
                1,
                92,
                "The rapid advancement of artificial intelligence has fundamentally transformed \
                 various industries, creating unprecedented opportunities for automation and \
                 efficiency. Machine learning algorithms now power everything from recommendation \
                 systems to autonomous vehicles.",
            ),
            section(
                "2",
                1,
                88,
                "However, the integration of these technologies raises important ethical \
                 considerations that society must address. Privacy concerns, algorithmic bias, \
                 and the displacement of human workers are challenges that require careful policy \
                 responses.",
            ),
            section(
                "3",
                2,
                15,
                "Based on our field research conducted over six months, we observed significant \
                 variations in user behavior across different demographic groups. The data was \
                 collected through surveys and interviews.",
            ),
        ],
        images: vec![
            image("1", "figure_1.png", 3, 95, Some("DALL-E 3")),
            image("2", "chart_data.png", 5, 8, None),
            image("3", "illustration.jpg", 7, 78, Some("Midjourney")),
        ],
    }
}

/// Look a report up by id. Only the sample exists.
pub fn find_report(id: &str) -> Option<AnalysisReport> {
    (id == REPORT_ID).then(sample_report)
}

// ============================================================================
// Word highlighting
// ============================================================================

/// Per-word likelihood shown when a text section is expanded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Highlight {
    VeryLikely,
    Likely,
    Unlikely,
    Rare,
}

impl Highlight {
    pub const ALL: [Highlight; 4] = [
        Highlight::VeryLikely,
        Highlight::Likely,
        Highlight::Unlikely,
        Highlight::Rare,
    ];

    pub fn css_class(&self) -> &'static str {
        match self {
            Highlight::VeryLikely => "very-likely",
            Highlight::Likely => "likely",
            Highlight::Unlikely => "unlikely",
            Highlight::Rare => "rare",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Highlight::VeryLikely => "Very Likely",
            Highlight::Likely => "Likely",
            Highlight::Unlikely => "Unlikely",
            Highlight::Rare => "Rare",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HighlightedWord {
    pub text: String,
    pub highlight: Highlight,
}

/// Split on single spaces and tag every word with a random highlight.
pub fn highlight_words<R: Rng>(content: &str, rng: &mut R) -> Vec<HighlightedWord> {
    content
        .split(' ')
        .filter(|w| !w.is_empty())
        .map(|word| HighlightedWord {
            text: word.to_string(),
            highlight: Highlight::ALL[rng.gen_range(0..Highlight::ALL.len())],
        })
        .collect()
}

// ============================================================================
// Summary
// ============================================================================

/// Severity counts across text sections and images.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Summary {
    pub sections: usize,
    pub images: usize,
    pub high: usize,
    pub moderate: usize,
    pub low: usize,
}

impl Summary {
    pub fn from_report(report: &AnalysisReport) -> Self {
        let mut summary = Self {
            sections: report.sections.len(),
            images: report.images.len(),
            ..Self::default()
        };

        let scores = report
            .sections
            .iter()
            .map(|s| s.ai_score)
            .chain(report.images.iter().map(|i| i.ai_score));

        for score in scores {
            match severity(score) {
                Severity::High => summary.high += 1,
                Severity::Moderate => summary.moderate += 1,
                Severity::Low => summary.low += 1,
            }
        }

        summary
    }
}

/// Write a report in the format matching the file extension (CSV otherwise).
pub fn generate<P: AsRef<Path>>(path: P, report: &AnalysisReport) -> io::Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let mut file = std::fs::File::create(path)?;

    match ext.as_str() {
        "html" | "htm" => html::write(&mut file, report),
        "json" => json::write(&mut file, report),
        _ => csv::write(&mut file, report),
    }
}
