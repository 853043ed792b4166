//! Format-independent content model of a rendered report.

use serde::Serialize;

/// Font applied to every paragraph of the document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Typography {
    pub font_family: &'static str,
    pub font_size_pt: f32,
}

pub const REPORT_TYPOGRAPHY: Typography = Typography {
    font_family: "Times New Roman",
    font_size_pt: 12.0,
};

/// Vertical spacing after a paragraph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Spacing {
    /// No gap: the next paragraph starts on the following line.
    Tight,
    /// Standard paragraph gap.
    Normal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Paragraph {
    /// May contain `\n`; each segment starts a new line.
    pub text: String,
    pub bold: bool,
    pub spacing: Spacing,
}

impl Paragraph {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bold: false,
            spacing: Spacing::Normal,
        }
    }

    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            bold: true,
            ..Self::plain(text)
        }
    }

    pub fn tight(text: impl Into<String>) -> Self {
        Self {
            spacing: Spacing::Tight,
            ..Self::plain(text)
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.text.split('\n')
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    pub title: String,
    pub typography: Typography,
    pub paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            typography: REPORT_TYPOGRAPHY,
            paragraphs: Vec::new(),
        }
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    /// Every paragraph line, in order, without styling.
    pub fn plain_lines(&self) -> Vec<&str> {
        self.paragraphs.iter().flat_map(|p| p.lines()).collect()
    }

    pub fn to_plain_text(&self) -> String {
        self.plain_lines().join("\n")
    }
}
