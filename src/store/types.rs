use serde::{Deserialize, Serialize};

/// Content category of the licensing exam. Each domain carries a fixed
/// weight in the real exam blueprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionDomain {
    Biomedical,
    Pharmaceutical,
    Social,
    Clinical,
}

impl QuestionDomain {
    pub const ALL: [QuestionDomain; 4] =
        [Self::Biomedical, Self::Pharmaceutical, Self::Social, Self::Clinical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Biomedical => "biomedical",
            Self::Pharmaceutical => "pharmaceutical",
            Self::Social => "social",
            Self::Clinical => "clinical",
        }
    }

    pub fn weight_percent(self) -> u8 {
        match self {
            Self::Biomedical => 10,
            Self::Pharmaceutical => 35,
            Self::Social => 20,
            Self::Clinical => 35,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuestionDifficulty {
    Easy,
    Medium,
    Hard,
}

impl QuestionDifficulty {
    pub const ALL: [QuestionDifficulty; 3] = [Self::Easy, Self::Medium, Self::Hard];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExamType {
    Practice,
    Mock,
    Custom,
}

impl ExamType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Mock => "mock",
            Self::Custom => "custom",
        }
    }
}

/// Half of a full mock exam; stored as the section number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum ExamSection {
    One,
    Two,
}

impl From<ExamSection> for u8 {
    fn from(section: ExamSection) -> Self {
        match section {
            ExamSection::One => 1,
            ExamSection::Two => 2,
        }
    }
}

impl TryFrom<u8> for ExamSection {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::One),
            2 => Ok(Self::Two),
            other => Err(format!("invalid exam section: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Admin,
}
