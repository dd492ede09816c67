//! Two-tier article classification.
//!
//! The primary tier asks an Ollama model to pick a category from the fixed
//! set. When the oracle is unreachable, returns a non-200, or produces
//! unparsable output, a deterministic local keyword scorer takes over.
//! [`ThemeClassifier::classify`] never fails; the method tag is the only
//! observable difference between the tiers.

mod keywords;

pub use keywords::KEYWORD_TABLE;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Maximum characters of article body sent to the oracle.
const MAX_BODY_CHARS: usize = 2000;

/// Maximum keywords kept on a classification.
const MAX_KEYWORDS: usize = 5;

/// Confidence assigned when no keyword matches at all.
const NO_MATCH_CONFIDENCE: f64 = 0.5;

/// The closed category set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Politics,
    Economy,
    Security,
    Health,
    Culture,
    Sport,
    Other,
}

impl Category {
    pub const ALL: &'static [Self] = &[
        Self::Politics,
        Self::Economy,
        Self::Security,
        Self::Health,
        Self::Culture,
        Self::Sport,
        Self::Other,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Politics => "politics",
            Self::Economy => "economy",
            Self::Security => "security",
            Self::Health => "health",
            Self::Culture => "culture",
            Self::Sport => "sport",
            Self::Other => "other",
        }
    }

    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "politics" => Some(Self::Politics),
            "economy" => Some(Self::Economy),
            "security" => Some(Self::Security),
            "health" => Some(Self::Health),
            "culture" => Some(Self::Culture),
            "sport" => Some(Self::Sport),
            "other" => Some(Self::Other),
            _ => None,
        }
    }
}

/// Which tier produced a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClassifyMethod {
    Ollama,
    KeywordFallback,
}

impl ClassifyMethod {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ollama => "ollama",
            Self::KeywordFallback => "keyword_fallback",
        }
    }
}

/// A classification verdict for one article.
#[derive(Debug, Clone)]
pub struct Classification {
    pub category: Category,
    pub confidence: f64,
    pub keywords: Vec<String>,
    pub justification: String,
    pub method: ClassifyMethod,
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f64,
    num_predict: u32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

#[derive(Debug, Deserialize)]
struct OracleVerdict {
    category: Option<String>,
    confidence: Option<f64>,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    justification: String,
}

/// Classifier over an Ollama endpoint with a local keyword fallback.
#[derive(Debug, Clone)]
pub struct ThemeClassifier {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

impl ThemeClassifier {
    #[must_use]
    pub fn new(client: reqwest::Client, base_url: &str, model: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    /// Check whether the oracle endpoint is reachable.
    pub async fn check_status(&self) -> bool {
        let result = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await;
        matches!(result, Ok(r) if r.status().is_success())
    }

    /// Classify an article. Infallible: falls back to keyword scoring when
    /// the oracle cannot produce a usable verdict.
    pub async fn classify(&self, title: &str, body: &str) -> Classification {
        match self.classify_with_oracle(title, body).await {
            Some(classification) => classification,
            None => keyword_classify(title, body),
        }
    }

    async fn classify_with_oracle(&self, title: &str, body: &str) -> Option<Classification> {
        let truncated: String = body.chars().take(MAX_BODY_CHARS).collect();
        let prompt = build_prompt(title, &truncated);

        let request = GenerateRequest {
            model: &self.model,
            prompt: &prompt,
            stream: false,
            options: GenerateOptions {
                // Low temperature for consistent category picks.
                temperature: 0.3,
                num_predict: 200,
            },
        };

        let response = match self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                warn!("Classification oracle unreachable, using keyword fallback: {e}");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(
                status = %response.status(),
                "Classification oracle returned an error, using keyword fallback"
            );
            return None;
        }

        let payload: GenerateResponse = response.json().await.ok()?;
        let verdict = parse_oracle_output(&payload.response)?;
        debug!(category = verdict.category.as_str(), "Oracle classification");
        Some(verdict)
    }
}

/// Extract and validate the JSON verdict embedded in the oracle's reply.
fn parse_oracle_output(raw: &str) -> Option<Classification> {
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }

    let verdict: OracleVerdict = serde_json::from_str(&raw[start..=end]).ok()?;

    // A category outside the fixed set is coerced to the catch-all.
    let category = verdict
        .category
        .as_deref()
        .and_then(Category::from_str)
        .unwrap_or(Category::Other);

    // The oracle's confidence is not trusted verbatim.
    let confidence = verdict.confidence.unwrap_or(0.7).clamp(0.0, 1.0);

    let mut keywords = verdict.keywords;
    keywords.truncate(MAX_KEYWORDS);

    Some(Classification {
        category,
        confidence,
        keywords,
        justification: verdict.justification,
        method: ClassifyMethod::Ollama,
    })
}

fn build_prompt(title: &str, body: &str) -> String {
    let categories = Category::ALL
        .iter()
        .filter(|c| **c != Category::Other)
        .map(Category::as_str)
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "You are an expert news article classifier.\n\
         Pick the single best category for this article from: {categories}, other.\n\
         Use \"other\" only when no listed category clearly applies.\n\n\
         Article:\n---\n{title}\n\n{body}\n---\n\n\
         Reply with ONLY this JSON (no text before or after):\n\
         {{\n\
             \"category\": \"name_of_category\",\n\
             \"confidence\": 0.95,\n\
             \"keywords\": [\"word1\", \"word2\", \"word3\"],\n\
             \"justification\": \"short explanation\"\n\
         }}"
    )
}

/// Local keyword-scoring fallback. Pure function of the text and the
/// keyword table: same input always yields the same verdict.
#[must_use]
pub fn keyword_classify(title: &str, body: &str) -> Classification {
    let text = format!("{title} {body}").to_lowercase();

    let mut best: Option<(Category, usize)> = None;
    for (category, words) in KEYWORD_TABLE {
        let hits = words.iter().filter(|w| text.contains(**w)).count();
        if hits == 0 {
            continue;
        }
        // Strictly-greater comparison keeps the first-declared category on
        // ties.
        match best {
            Some((_, best_hits)) if hits <= best_hits => {}
            _ => best = Some((*category, hits)),
        }
    }

    match best {
        Some((category, hits)) => {
            let matched: Vec<String> = KEYWORD_TABLE
                .iter()
                .find(|(c, _)| *c == category)
                .map(|(_, words)| {
                    words
                        .iter()
                        .filter(|w| text.contains(**w))
                        .take(MAX_KEYWORDS)
                        .map(ToString::to_string)
                        .collect()
                })
                .unwrap_or_default();

            Classification {
                category,
                confidence: (hits as f64 / 10.0).min(0.9),
                keywords: matched,
                justification: format!("{hits} keyword(s) matched"),
                method: ClassifyMethod::KeywordFallback,
            }
        }
        None => Classification {
            category: Category::Other,
            confidence: NO_MATCH_CONFIDENCE,
            keywords: Vec::new(),
            justification: "no category keywords matched".to_string(),
            method: ClassifyMethod::KeywordFallback,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_classify_is_deterministic() {
        let a = keyword_classify("Le gouvernement adopte une loi", "Le ministre a signé un décret");
        let b = keyword_classify("Le gouvernement adopte une loi", "Le ministre a signé un décret");
        assert_eq!(a.category, b.category);
        assert!((a.confidence - b.confidence).abs() < f64::EPSILON);
        assert_eq!(a.keywords, b.keywords);
        assert_eq!(a.method, ClassifyMethod::KeywordFallback);
    }

    #[test]
    fn test_keyword_classify_picks_highest_count() {
        let result = keyword_classify(
            "Match de football",
            "L'équipe a remporté la victoire au stade devant ses supporters",
        );
        assert_eq!(result.category, Category::Sport);
        assert!(result.confidence > 0.0);
        assert!(!result.keywords.is_empty());
    }

    #[test]
    fn test_keyword_classify_tie_breaks_by_declaration_order() {
        // One politics keyword and one sport keyword: politics is declared
        // first and must win the tie.
        let result = keyword_classify("gouvernement et football", "");
        assert_eq!(result.category, Category::Politics);
    }

    #[test]
    fn test_keyword_classify_no_match_is_catch_all() {
        let result = keyword_classify("zzz", "qqq");
        assert_eq!(result.category, Category::Other);
        assert!((result.confidence - NO_MATCH_CONFIDENCE).abs() < f64::EPSILON);
        assert!(result.keywords.is_empty());
    }

    #[test]
    fn test_keyword_classify_confidence_saturates() {
        // Many hits: confidence is capped below 1.0.
        let text = KEYWORD_TABLE
            .iter()
            .find(|(c, _)| *c == Category::Economy)
            .map(|(_, words)| words.join(" "))
            .unwrap();
        let result = keyword_classify(&text, "");
        assert_eq!(result.category, Category::Economy);
        assert!((result.confidence - 0.9).abs() < f64::EPSILON);
        assert!(result.keywords.len() <= 5);
    }

    #[test]
    fn test_parse_oracle_output_valid() {
        let raw = r#"Sure! {"category": "sport", "confidence": 0.92,
            "keywords": ["match", "but"], "justification": "football report"}"#;
        let verdict = parse_oracle_output(raw).unwrap();
        assert_eq!(verdict.category, Category::Sport);
        assert!((verdict.confidence - 0.92).abs() < f64::EPSILON);
        assert_eq!(verdict.method, ClassifyMethod::Ollama);
    }

    #[test]
    fn test_parse_oracle_output_coerces_unknown_category() {
        let raw = r#"{"category": "astrology", "confidence": 0.8}"#;
        let verdict = parse_oracle_output(raw).unwrap();
        assert_eq!(verdict.category, Category::Other);
    }

    #[test]
    fn test_parse_oracle_output_clamps_confidence() {
        let raw = r#"{"category": "health", "confidence": 3.5}"#;
        let verdict = parse_oracle_output(raw).unwrap();
        assert!((verdict.confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_oracle_output_rejects_garbage() {
        assert!(parse_oracle_output("no json here").is_none());
        assert!(parse_oracle_output("{not valid json}").is_none());
    }
}
