//! Paper entry returned by the arXiv API.

use chrono::{DateTime, Utc};

/// One paper from an arXiv Atom feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaperEntry {
    /// Canonical identifier URL (`http://arxiv.org/abs/...`)
    pub id: String,

    /// Paper title, whitespace normalized
    pub title: String,

    /// Author names in feed order
    pub authors: Vec<String>,

    /// Abstract, whitespace normalized
    pub summary: String,

    /// Abstract page URL
    pub link: String,

    /// Submission time of the first version
    pub published: DateTime<Utc>,

    /// Submission time of the latest version
    pub updated: Option<DateTime<Utc>>,

    /// Author comment (page counts, venue, ...)
    pub comment: Option<String>,

    /// Primary subject class, e.g. `cs.LG`
    pub primary_category: Option<String>,

    /// All subject classes, primary first
    pub categories: Vec<String>,
}

impl PaperEntry {
    /// Authors joined for display.
    pub fn authors_line(&self) -> String {
        self.authors.join(", ")
    }

    /// Categories joined for display.
    pub fn categories_line(&self) -> String {
        self.categories.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_display_lines() {
        let entry = PaperEntry {
            id: "http://arxiv.org/abs/1706.03762v7".into(),
            title: "Attention Is All You Need".into(),
            authors: vec!["Ashish Vaswani".into(), "Noam Shazeer".into()],
            summary: "The dominant sequence transduction models...".into(),
            link: "http://arxiv.org/abs/1706.03762v7".into(),
            published: Utc.with_ymd_and_hms(2017, 6, 12, 17, 57, 34).unwrap(),
            updated: None,
            comment: None,
            primary_category: Some("cs.CL".into()),
            categories: vec!["cs.CL".into(), "cs.LG".into()],
        };
        assert_eq!(entry.authors_line(), "Ashish Vaswani, Noam Shazeer");
        assert_eq!(entry.categories_line(), "cs.CL, cs.LG");
    }
}
