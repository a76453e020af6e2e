use serde::{Deserialize, Serialize};

/// Topic, title and research question extracted from the user's request
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PaperDetails {
    pub topic: String,
    pub title: String,
    pub question: String,
}

impl PaperDetails {
    pub const ERROR_MARKER: &'static str = "Error";

    /// Record standing in for details that could not be parsed
    pub fn sentinel() -> Self {
        Self {
            topic: Self::ERROR_MARKER.to_string(),
            title: Self::ERROR_MARKER.to_string(),
            question: Self::ERROR_MARKER.to_string(),
        }
    }

    pub fn is_sentinel(&self) -> bool {
        self == &Self::sentinel()
    }
}

/// Ordered bullet points; position N becomes chapter N
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Outline(pub Vec<String>);

impl Outline {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    /// `- point` lines, as substituted for `{bulletpoints}`
    pub fn as_list(&self) -> String {
        self.0
            .iter()
            .map(|b| format!("- {}", b))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    /// Row id when the run is persisted
    pub store_id: Option<i64>,
    pub url: String,
    pub summary: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChapterPosition {
    Introduction,
    Chapter(usize),
    Conclusion,
}

impl std::fmt::Display for ChapterPosition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChapterPosition::Introduction => write!(f, "introduction"),
            ChapterPosition::Chapter(n) => write!(f, "chapter-{}", n),
            ChapterPosition::Conclusion => write!(f, "conclusion"),
        }
    }
}

impl std::str::FromStr for ChapterPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "introduction" => Ok(ChapterPosition::Introduction),
            "conclusion" => Ok(ChapterPosition::Conclusion),
            other => other
                .strip_prefix("chapter-")
                .and_then(|n| n.parse::<usize>().ok())
                .filter(|n| *n > 0)
                .map(ChapterPosition::Chapter)
                .ok_or_else(|| format!("Unknown chapter position: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    pub position: ChapterPosition,
    pub heading: String,
    pub body: String,
    /// Indices into `Paper::sources`
    pub sources: Vec<usize>,
}

#[derive(Debug, Clone)]
pub struct Paper {
    pub request_id: String,
    pub details: PaperDetails,
    pub outline: Outline,
    pub introduction: Section,
    pub chapters: Vec<Section>,
    pub conclusion: Section,
    /// Every source seen during the run, cited or not
    pub sources: Vec<Source>,
}

impl Paper {
    /// URLs cited by any section, in order of first fetch
    pub fn bibliography(&self) -> Vec<&str> {
        let mut cited: Vec<usize> = std::iter::once(&self.introduction)
            .chain(self.chapters.iter())
            .chain(std::iter::once(&self.conclusion))
            .flat_map(|s| s.sources.iter().copied())
            .collect();
        cited.sort_unstable();
        cited.dedup();
        cited
            .into_iter()
            .filter_map(|i| self.sources.get(i))
            .map(|s| s.url.as_str())
            .collect()
    }
}
