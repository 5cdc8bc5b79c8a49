//! Configurable policy parameters for aggregation
//!
//! Thresholds and vocabularies are deliberately not embedded at call sites:
//! the month-name table, position vocabulary, team synonyms, award-tier day
//! thresholds, and risk-score weights are all plain data here, loadable from
//! a TOML file and validated before the pipeline is assembled.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors produced while loading or validating a policy file
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("failed to read policy file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse policy file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid policy: {0}")]
    Invalid(String),
}

/// Month-name → month-number lookup table
///
/// Total over full English names and three-letter abbreviations, matched
/// case-insensitively. Kept as data so the resolver never hardcodes a
/// calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthNames {
    names: BTreeMap<String, u32>,
}

impl Default for MonthNames {
    fn default() -> Self {
        let full = [
            "january",
            "february",
            "march",
            "april",
            "may",
            "june",
            "july",
            "august",
            "september",
            "october",
            "november",
            "december",
        ];
        let mut names = BTreeMap::new();
        for (idx, name) in full.iter().enumerate() {
            let number = idx as u32 + 1;
            names.insert((*name).to_string(), number);
            names.insert(name[..3].to_string(), number);
        }
        Self { names }
    }
}

impl MonthNames {
    /// Look up a month-name token, case-insensitively
    pub fn lookup(&self, token: &str) -> Option<u32> {
        self.names.get(&token.to_lowercase()).copied()
    }

    /// All known tokens, longest first so regex alternation prefers full names
    pub fn tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.names.keys().cloned().collect();
        tokens.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        tokens
    }
}

/// Award tier derived from tenure thresholds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AwardTier {
    Platinum,
    Gold,
    Silver,
    Bronze,
    None,
}

impl AwardTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            AwardTier::Platinum => "platinum",
            AwardTier::Gold => "gold",
            AwardTier::Silver => "silver",
            AwardTier::Bronze => "bronze",
            AwardTier::None => "none",
        }
    }
}

/// Tenure-in-days thresholds for award tiers
///
/// Defaults approximate 10 / 5 / 3 / 1 years of service. The literals are
/// policy, not business rules; override them per deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardThresholds {
    pub platinum_days: i64,
    pub gold_days: i64,
    pub silver_days: i64,
    pub bronze_days: i64,
}

impl Default for AwardThresholds {
    fn default() -> Self {
        Self {
            platinum_days: 3650,
            gold_days: 1825,
            silver_days: 1095,
            bronze_days: 365,
        }
    }
}

impl AwardThresholds {
    /// Classify a tenure into its award tier
    pub fn classify(&self, tenure_days: i64) -> AwardTier {
        if tenure_days >= self.platinum_days {
            AwardTier::Platinum
        } else if tenure_days >= self.gold_days {
            AwardTier::Gold
        } else if tenure_days >= self.silver_days {
            AwardTier::Silver
        } else if tenure_days >= self.bronze_days {
            AwardTier::Bronze
        } else {
            AwardTier::None
        }
    }
}

/// Weights for the early-attrition risk score
///
/// The score is a heuristic indicator, not ground truth: each component
/// contributes points when the employee falls short of a floor, and the sum
/// is clamped to \[0, 100\].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskWeights {
    /// Attendance rate (percent) below which the attendance component starts scaling
    pub attendance_floor: f64,
    /// Maximum points the attendance shortfall can contribute
    pub attendance_max_points: f64,
    /// Training participation rate (percent) below which the training component scales
    pub training_floor: f64,
    /// Maximum points the training shortfall can contribute
    pub training_max_points: f64,
    /// Points contributed by negative mentor feedback
    pub negative_feedback_points: f64,
    /// Points contributed by neutral mentor feedback
    pub neutral_feedback_points: f64,
    /// Points contributed by each unauthorized absence (additive, uncapped per absence)
    pub unauthorized_absence_points: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        Self {
            attendance_floor: 90.0,
            attendance_max_points: 30.0,
            training_floor: 80.0,
            training_max_points: 25.0,
            negative_feedback_points: 25.0,
            neutral_feedback_points: 12.5,
            unauthorized_absence_points: 20.0,
        }
    }
}

/// Tenure thresholds used by the metric schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenureThresholds {
    /// Employees below this tenure (days, as of month-end) count as short-tenure
    pub short_tenure_days: i64,
    /// Resignations within this many days of assignment count as post-assignment
    pub post_assignment_days: i64,
    /// Employees at or above this tenure (days) count as long-term
    pub long_term_days: i64,
}

impl Default for TenureThresholds {
    fn default() -> Self {
        Self {
            short_tenure_days: 60,
            post_assignment_days: 90,
            long_term_days: 1825,
        }
    }
}

/// Full policy bundle consumed by the pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Policy {
    pub month_names: MonthNames,
    /// Known position vocabulary; values outside it are flagged, not rejected
    pub positions: PositionVocabulary,
    /// Team synonym → canonical-name table
    pub teams: TeamNormalizer,
    pub tenure: TenureThresholds,
    pub award_tiers: AwardThresholds,
    pub risk: RiskWeights,
}

impl Policy {
    /// Load a policy from a TOML file, falling back to defaults for omitted tables
    pub fn from_file(path: &Path) -> Result<Self, PolicyError> {
        let text = std::fs::read_to_string(path).map_err(|source| PolicyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let policy = Self::from_toml_str(&text)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Parse a policy from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, PolicyError> {
        Ok(toml::from_str(text)?)
    }

    /// Validate threshold sanity
    pub fn validate(&self) -> Result<(), PolicyError> {
        let tiers = &self.award_tiers;
        if !(tiers.bronze_days <= tiers.silver_days
            && tiers.silver_days <= tiers.gold_days
            && tiers.gold_days <= tiers.platinum_days)
        {
            return Err(PolicyError::Invalid(
                "award tier thresholds must be non-decreasing bronze..platinum".to_string(),
            ));
        }
        if self.risk.attendance_floor <= 0.0 || self.risk.attendance_floor > 100.0 {
            return Err(PolicyError::Invalid(format!(
                "attendance_floor must be in (0, 100], got {}",
                self.risk.attendance_floor
            )));
        }
        if self.risk.training_floor <= 0.0 || self.risk.training_floor > 100.0 {
            return Err(PolicyError::Invalid(format!(
                "training_floor must be in (0, 100], got {}",
                self.risk.training_floor
            )));
        }
        if self.tenure.short_tenure_days <= 0 {
            return Err(PolicyError::Invalid(format!(
                "short_tenure_days must be positive, got {}",
                self.tenure.short_tenure_days
            )));
        }
        Ok(())
    }
}

/// Known position titles
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PositionVocabulary {
    positions: Vec<String>,
}

impl Default for PositionVocabulary {
    fn default() -> Self {
        Self {
            positions: [
                "staff",
                "senior staff",
                "team lead",
                "supervisor",
                "manager",
                "director",
                "contractor",
                "trainee",
            ]
            .iter()
            .map(|s| (*s).to_string())
            .collect(),
        }
    }
}

impl PositionVocabulary {
    pub fn contains(&self, position: &str) -> bool {
        let lowered = position.to_lowercase();
        self.positions.iter().any(|p| *p == lowered)
    }
}

/// Team synonym normalization table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamNormalizer {
    /// synonym (lowercase) → canonical team name
    synonyms: BTreeMap<String, String>,
}

impl Default for TeamNormalizer {
    fn default() -> Self {
        let mut synonyms = BTreeMap::new();
        synonyms.insert("eng".to_string(), "Engineering".to_string());
        synonyms.insert("engineering".to_string(), "Engineering".to_string());
        synonyms.insert("ops".to_string(), "Operations".to_string());
        synonyms.insert("operations".to_string(), "Operations".to_string());
        synonyms.insert("sales".to_string(), "Sales".to_string());
        synonyms.insert("hr".to_string(), "People".to_string());
        synonyms.insert("people".to_string(), "People".to_string());
        Self { synonyms }
    }
}

impl TeamNormalizer {
    /// Resolve a raw team value to its canonical name
    ///
    /// Returns `(canonical, was_synonym)`. Unknown teams pass through
    /// unchanged; they are simply not normalized.
    pub fn normalize(&self, raw: &str) -> (String, bool) {
        let trimmed = raw.trim();
        match self.synonyms.get(&trimmed.to_lowercase()) {
            Some(canonical) if canonical != trimmed => (canonical.clone(), true),
            Some(canonical) => (canonical.clone(), false),
            None => (trimmed.to_string(), false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_month_names_case_insensitive_lookup() {
        let names = MonthNames::default();
        assert_eq!(names.lookup("July"), Some(7));
        assert_eq!(names.lookup("JULY"), Some(7));
        assert_eq!(names.lookup("jul"), Some(7));
        assert_eq!(names.lookup("Frimaire"), None);
    }

    #[test]
    fn test_month_names_tokens_prefer_full_names() {
        let tokens = MonthNames::default().tokens();
        let full_pos = tokens.iter().position(|t| t == "september").unwrap();
        let abbr_pos = tokens.iter().position(|t| t == "sep").unwrap();
        assert!(full_pos < abbr_pos);
    }

    #[test]
    fn test_award_tier_classification() {
        let tiers = AwardThresholds::default();
        assert_eq!(tiers.classify(4000), AwardTier::Platinum);
        assert_eq!(tiers.classify(2000), AwardTier::Gold);
        assert_eq!(tiers.classify(1100), AwardTier::Silver);
        assert_eq!(tiers.classify(400), AwardTier::Bronze);
        assert_eq!(tiers.classify(100), AwardTier::None);
    }

    #[test]
    fn test_award_tier_boundary_is_inclusive() {
        let tiers = AwardThresholds::default();
        assert_eq!(tiers.classify(3650), AwardTier::Platinum);
        assert_eq!(tiers.classify(3649), AwardTier::Gold);
        assert_eq!(tiers.classify(365), AwardTier::Bronze);
        assert_eq!(tiers.classify(364), AwardTier::None);
    }

    #[test]
    fn test_team_normalizer_reports_synonym_use() {
        let teams = TeamNormalizer::default();
        assert_eq!(teams.normalize("eng"), ("Engineering".to_string(), true));
        assert_eq!(
            teams.normalize("Engineering"),
            ("Engineering".to_string(), false)
        );
        assert_eq!(teams.normalize("Quality"), ("Quality".to_string(), false));
    }

    #[test]
    fn test_policy_default_validates() {
        Policy::default().validate().unwrap();
    }

    #[test]
    fn test_policy_rejects_inverted_tiers() {
        let mut policy = Policy::default();
        policy.award_tiers.bronze_days = 5000;
        assert!(matches!(policy.validate(), Err(PolicyError::Invalid(_))));
    }

    #[test]
    fn test_policy_from_toml_partial_override() {
        let policy = Policy::from_toml_str(
            r#"
            [tenure]
            short_tenure_days = 90
            post_assignment_days = 120
            long_term_days = 3650
            "#,
        )
        .unwrap();
        assert_eq!(policy.tenure.short_tenure_days, 90);
        // Unspecified tables keep their defaults.
        assert_eq!(policy.award_tiers.platinum_days, 3650);
        assert_eq!(policy.risk.attendance_floor, 90.0);
    }

    #[test]
    fn test_policy_rejects_bad_floor() {
        let mut policy = Policy::default();
        policy.risk.attendance_floor = 0.0;
        assert!(policy.validate().is_err());
    }
}
