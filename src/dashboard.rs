//! Dashboard: the list of previously analyzed documents
//!
//! The list is a fixed sample. Search is a case-insensitive substring match
//! on the document name.

use crate::report::{severity, Severity};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Pdf,
    Docx,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Completed,
    Processing,
    Pending,
}

impl fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentStatus::Completed => write!(f, "Completed"),
            DocumentStatus::Processing => write!(f, "Processing"),
            DocumentStatus::Pending => write!(f, "Pending"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub status: DocumentStatus,
    pub text_score: u8,
    pub image_score: u8,
    pub upload_date: NaiveDate,
    pub pages: u32,
    pub images: u32,
}

impl Document {
    /// Either score in the high bucket.
    pub fn is_high_risk(&self) -> bool {
        self.worst_severity() == Severity::High
    }

    pub fn worst_severity(&self) -> Severity {
        severity(self.text_score).max(severity(self.image_score))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub completed: usize,
    pub processing: usize,
    pub high_risk: usize,
}

impl DashboardStats {
    pub fn from_documents(docs: &[Document]) -> Self {
        Self {
            total: docs.len(),
            completed: docs
                .iter()
                .filter(|d| d.status == DocumentStatus::Completed)
                .count(),
            processing: docs
                .iter()
                .filter(|d| d.status == DocumentStatus::Processing)
                .count(),
            high_risk: docs.iter().filter(|d| d.is_high_risk()).count(),
        }
    }
}

fn doc(
    id: &str,
    name: &str,
    doc_type: DocumentType,
    status: DocumentStatus,
    scores: (u8, u8),
    (y, m, d): (i32, u32, u32),
    pages: u32,
    images: u32,
) -> Document {
    Document {
        id: id.to_string(),
        name: name.to_string(),
        doc_type,
        status,
        text_score: scores.0,
        image_score: scores.1,
        upload_date: NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default(),
        pages,
        images,
    }
}

pub fn sample_documents() -> Vec<Document> {
    use DocumentStatus::*;
    use DocumentType::*;
    vec![
        doc("1", "Research_Paper_2024.pdf", Pdf, Completed, (78, 45), (2024, 1, 15), 12, 4),
        doc("2", "Marketing_Report.docx", Docx, Completed, (23, 0), (2024, 1, 14), 8, 0),
        doc("3", "Thesis_Chapter3.pdf", Pdf, Processing, (0, 0), (2024, 1, 15), 45, 12),
        doc("4", "Blog_Article_Draft.docx", Docx, Completed, (92, 100), (2024, 1, 13), 3, 2),
    ]
}

/// Documents whose name contains `query`, ignoring case. An empty query
/// keeps everything.
pub fn filter<'a>(docs: &'a [Document], query: &str) -> Vec<&'a Document> {
    let needle = query.to_lowercase();
    docs.iter()
        .filter(|d| d.name.to_lowercase().contains(&needle))
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct DashboardView {
    pub query: String,
    pub stats: DashboardStats,
    pub documents: Vec<Document>,
}

/// Stats cover every document; the list honours the search.
pub fn view(query: &str) -> DashboardView {
    let docs = sample_documents();
    let stats = DashboardStats::from_documents(&docs);
    let documents = filter(&docs, query).into_iter().cloned().collect();
    DashboardView {
        query: query.to_string(),
        stats,
        documents,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats() {
        let stats = DashboardStats::from_documents(&sample_documents());
        assert_eq!(
            stats,
            DashboardStats {
                total: 4,
                completed: 3,
                processing: 1,
                high_risk: 2,
            }
        );
    }

    #[test]
    fn test_filter_is_case_insensitive_substring() {
        let docs = sample_documents();
        let hits = filter(&docs, "REPORT");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Marketing_Report.docx");

        assert_eq!(filter(&docs, ".pdf").len(), 2);
        assert!(filter(&docs, "nothing-matches").is_empty());
    }

    #[test]
    fn test_empty_query_keeps_all() {
        assert_eq!(filter(&sample_documents(), "").len(), 4);
    }

    #[test]
    fn test_view_stats_ignore_search() {
        let v = view("thesis");
        assert_eq!(v.documents.len(), 1);
        assert_eq!(v.stats.total, 4);
    }

    #[test]
    fn test_worst_severity() {
        let docs = sample_documents();
        assert_eq!(docs[0].worst_severity(), Severity::High);
        assert_eq!(docs[1].worst_severity(), Severity::Low);
        assert!(docs[3].is_high_risk());
    }
}
