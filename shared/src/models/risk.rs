//! Disease risk labels

use serde::{Deserialize, Serialize};

/// Three-level disease risk classification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RiskLevel {
    /// No disease observed
    #[serde(rename = "Low Risk")]
    Low,
    /// Exactly one disease observed
    #[serde(rename = "Medium Risk")]
    Medium,
    /// Two or more diseases observed
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    /// Every label in class-index order
    pub const ALL: [RiskLevel; 3] = [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High];

    /// Label a growth cycle by how many diseases were seen in it
    pub fn from_disease_count(count: usize) -> Self {
        match count {
            0 => RiskLevel::Low,
            1 => RiskLevel::Medium,
            _ => RiskLevel::High,
        }
    }

    /// Dense class index used by classifiers
    pub fn index(&self) -> usize {
        match self {
            RiskLevel::Low => 0,
            RiskLevel::Medium => 1,
            RiskLevel::High => 2,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Medium => "Medium Risk",
            RiskLevel::High => "High Risk",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|level| level.as_str() == label)
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
