//! Moderation oracle client.
//!
//! Sends content text to an external risk-scoring service and derives the
//! stored verdict (risk level tier, per-dimension flags, primary issue).
//! Unlike classification there is no local fallback: oracle failures
//! propagate so the moderation sweep can degrade to a skipped outcome.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Score above which a dimension is flagged.
const DIMENSION_FLAG_THRESHOLD: f64 = 0.5;

/// Risk score above which content should be flagged for review.
const FLAG_THRESHOLD: f64 = 0.6;

/// Ordered risk tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Minimal,
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// Tier for a risk score in [0,1].
    #[must_use]
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            Self::Critical
        } else if score >= 0.6 {
            Self::High
        } else if score >= 0.4 {
            Self::Moderate
        } else if score >= 0.2 {
            Self::Low
        } else {
            Self::Minimal
        }
    }
}

/// Raw per-dimension scores returned by the oracle.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct DimensionScores {
    #[serde(default)]
    pub toxicity: f64,
    #[serde(default)]
    pub misinformation: f64,
    #[serde(default)]
    pub sensitivity: f64,
}

/// Full verdict for one content item.
#[derive(Debug, Clone)]
pub struct ModerationVerdict {
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub toxic: bool,
    pub misinformation: bool,
    pub sensitive: bool,
    pub should_flag: bool,
    pub primary_issue: String,
    pub scores: DimensionScores,
}

#[derive(Debug, Serialize)]
struct AssessRequest<'a> {
    text: &'a str,
}

/// HTTP client for the moderation oracle.
#[derive(Debug, Clone)]
pub struct ModerationClient {
    client: reqwest::Client,
    base_url: String,
}

impl ModerationClient {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Score one piece of text.
    ///
    /// # Errors
    ///
    /// Returns an error when the oracle is unreachable or responds with a
    /// non-success status or an unparsable payload.
    pub async fn assess(&self, text: &str) -> Result<ModerationVerdict> {
        let response = self
            .client
            .post(format!("{}/api/moderate", self.base_url))
            .json(&AssessRequest { text })
            .send()
            .await
            .context("Moderation oracle unreachable")?;

        let status = response.status();
        if !status.is_success() {
            anyhow::bail!("Moderation oracle returned status {status}");
        }

        let scores: DimensionScores = response
            .json()
            .await
            .context("Failed to parse moderation oracle response")?;

        Ok(derive_verdict(scores))
    }
}

/// Derive the stored verdict from raw dimension scores. Pure.
#[must_use]
pub fn derive_verdict(scores: DimensionScores) -> ModerationVerdict {
    let scores = DimensionScores {
        toxicity: scores.toxicity.clamp(0.0, 1.0),
        misinformation: scores.misinformation.clamp(0.0, 1.0),
        sensitivity: scores.sensitivity.clamp(0.0, 1.0),
    };

    let dimensions = [
        ("toxic", scores.toxicity),
        ("misinformation", scores.misinformation),
        ("sensitive", scores.sensitivity),
    ];

    let risk_score = dimensions
        .iter()
        .map(|(_, s)| *s)
        .fold(0.0_f64, f64::max);

    let primary_issue = dimensions
        .iter()
        .fold(("none", 0.0_f64), |acc, (name, score)| {
            if *score > acc.1 {
                (name, *score)
            } else {
                acc
            }
        })
        .0
        .to_string();

    ModerationVerdict {
        risk_score,
        risk_level: RiskLevel::from_score(risk_score),
        toxic: scores.toxicity >= DIMENSION_FLAG_THRESHOLD,
        misinformation: scores.misinformation >= DIMENSION_FLAG_THRESHOLD,
        sensitive: scores.sensitivity >= DIMENSION_FLAG_THRESHOLD,
        should_flag: risk_score >= FLAG_THRESHOLD,
        primary_issue,
        scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_tiers() {
        assert_eq!(RiskLevel::from_score(0.0), RiskLevel::Minimal);
        assert_eq!(RiskLevel::from_score(0.2), RiskLevel::Low);
        assert_eq!(RiskLevel::from_score(0.45), RiskLevel::Moderate);
        assert_eq!(RiskLevel::from_score(0.6), RiskLevel::High);
        assert_eq!(RiskLevel::from_score(0.95), RiskLevel::Critical);
    }

    #[test]
    fn test_risk_levels_are_ordered() {
        assert!(RiskLevel::Minimal < RiskLevel::Low);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_derive_verdict_flags_and_primary_issue() {
        let verdict = derive_verdict(DimensionScores {
            toxicity: 0.1,
            misinformation: 0.7,
            sensitivity: 0.55,
        });
        assert!((verdict.risk_score - 0.7).abs() < f64::EPSILON);
        assert_eq!(verdict.risk_level, RiskLevel::High);
        assert!(!verdict.toxic);
        assert!(verdict.misinformation);
        assert!(verdict.sensitive);
        assert!(verdict.should_flag);
        assert_eq!(verdict.primary_issue, "misinformation");
    }

    #[test]
    fn test_derive_verdict_benign_content() {
        let verdict = derive_verdict(DimensionScores {
            toxicity: 0.05,
            misinformation: 0.0,
            sensitivity: 0.1,
        });
        assert_eq!(verdict.risk_level, RiskLevel::Minimal);
        assert!(!verdict.should_flag);
        assert_eq!(verdict.primary_issue, "sensitive");
    }

    #[test]
    fn test_derive_verdict_clamps_out_of_range() {
        let verdict = derive_verdict(DimensionScores {
            toxicity: 1.8,
            misinformation: -0.5,
            sensitivity: 0.0,
        });
        assert!((verdict.risk_score - 1.0).abs() < f64::EPSILON);
        assert_eq!(verdict.risk_level, RiskLevel::Critical);
    }
}
