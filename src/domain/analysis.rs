use std::fmt;
use std::str::FromStr;

/// Focused analyses that can be run against a processed document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnalysisKind {
    KeyTerms,
    Obligations,
    Risks,
    Deadlines,
    Parties,
}

impl AnalysisKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisKind::KeyTerms => "key_terms",
            AnalysisKind::Obligations => "obligations",
            AnalysisKind::Risks => "risks",
            AnalysisKind::Deadlines => "deadlines",
            AnalysisKind::Parties => "parties",
        }
    }
}

impl FromStr for AnalysisKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "key_terms" => Ok(AnalysisKind::KeyTerms),
            "obligations" => Ok(AnalysisKind::Obligations),
            "risks" => Ok(AnalysisKind::Risks),
            "deadlines" => Ok(AnalysisKind::Deadlines),
            "parties" => Ok(AnalysisKind::Parties),
            _ => Err(format!("Unsupported analysis kind: {}", s)),
        }
    }
}

impl fmt::Display for AnalysisKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
