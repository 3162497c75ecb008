//! Marketing copy for the home page

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Stat {
    pub value: u32,
    pub suffix: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct Feature {
    pub title: &'static str,
    pub description: &'static str,
}

pub const HEADLINE: &str = "Detect AI-Generated Content & Images";
pub const TAGLINE: &str = "Upload your PDF and DOCX files to instantly identify AI-written text and \
    AI-generated images. Protect authenticity with our advanced detection technology.";
pub const CALL_TO_ACTION: &str = "Ready to Verify Your Content?";

pub const STATS: &[Stat] = &[
    Stat { value: 99, suffix: "%", label: "Detection Accuracy" },
    Stat { value: 500, suffix: "K+", label: "Documents Analyzed" },
    Stat { value: 50, suffix: "M+", label: "Pages Scanned" },
    Stat { value: 10, suffix: "K+", label: "Happy Users" },
];

pub const FEATURES: &[Feature] = &[
    Feature {
        title: "Advanced AI Detection",
        description: "Our ML models detect content from ChatGPT, Claude, Gemini, and other AI systems with 99%+ accuracy.",
    },
    Feature {
        title: "Document Analysis",
        description: "Upload PDF and DOCX files for comprehensive text and image analysis in one seamless process.",
    },
    Feature {
        title: "Image Verification",
        description: "Identify AI-generated images created by DALL-E, Midjourney, Stable Diffusion, and more.",
    },
    Feature {
        title: "Instant Results",
        description: "Get detailed detection reports in seconds with confidence scores for each element analyzed.",
    },
    Feature {
        title: "Detailed Reports",
        description: "Receive comprehensive breakdowns highlighting exactly which sections are AI-generated.",
    },
    Feature {
        title: "Privacy First",
        description: "Your documents are encrypted and automatically deleted after analysis. We never store your content.",
    },
];

pub const HOW_IT_WORKS: &[Feature] = &[
    Feature {
        title: "Upload Your Document",
        description: "Drag and drop your PDF or DOCX file. We support documents up to 50MB with unlimited pages.",
    },
    Feature {
        title: "AI Analysis",
        description: "Our advanced algorithms scan every paragraph and image, comparing patterns against known AI signatures.",
    },
    Feature {
        title: "Get Your Report",
        description: "Receive a detailed report showing AI probability scores, highlighted sections, and verification status.",
    },
];

impl Stat {
    pub fn display(&self) -> String {
        format!("{}{}", self.value, self.suffix)
    }
}
