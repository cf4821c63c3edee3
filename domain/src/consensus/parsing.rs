//! Reply parsing for consensus analysis.
//!
//! Scoring prompts ask for a JSON reply. These functions read that JSON
//! first and fall back to labelled free text ("Score: 0.7", bullet lists
//! under a heading) when a reply ignores the requested format. None of them
//! fail: a reply that yields nothing returns `None` or an empty list and the
//! caller applies its documented default.
//!
//! | Function | Reads |
//! |----------|-------|
//! | [`parse_unit_score`] | `{"score": 0.7}`, `Score: 70%`, `7/10` |
//! | [`parse_claim_analysis`] | agreed / unique / conflicting claims + overlap |
//! | [`parse_recommendation_analysis`] | per-member recommendations + alignment |
//! | [`parse_line_items`] | JSON array or bullet list |
//! | [`parse_self_confidence`] | trailing `Confidence: 0.8` in a member's statement |
//! | [`extract_citations`] | `Sources:` / `References:` / `Citations:` sections |

use super::types::{
    ActionType, ClaimStance, ExtractedClaim, ExtractedRecommendation, NEUTRAL_SCORE, Priority,
    clamp_unit,
};
use serde_json::Value;

const SCORE_KEYS: &[&str] = &[
    "score",
    "similarity",
    "overlap",
    "alignment",
    "evidence_overlap",
    "value",
];

/// Claims partitioned by how the panel relates to them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClaimAnalysis {
    pub claims: Vec<ExtractedClaim>,
    /// Overlap stated by the analyst, if any
    pub overlap: Option<f64>,
}

impl ClaimAnalysis {
    pub fn count(&self, stance: ClaimStance) -> usize {
        self.claims.iter().filter(|c| c.stance == stance).count()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecommendationAnalysis {
    pub recommendations: Vec<ExtractedRecommendation>,
    /// Alignment stated by the analyst, if any
    pub alignment: Option<f64>,
    /// Short description of how the recommendations relate
    pub narrative: Option<String>,
}

impl RecommendationAnalysis {
    pub fn actions(&self) -> Vec<ActionType> {
        self.recommendations.iter().map(|r| r.action).collect()
    }
}

/// Pull a JSON value out of a reply that may wrap it in prose or a code fence.
pub fn extract_json(reply: &str) -> Option<Value> {
    let trimmed = reply.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }

    for fence in ["```json", "```"] {
        if let Some(start) = trimmed.find(fence) {
            let body = &trimmed[start + fence.len()..];
            let body = body.find("```").map_or(body, |end| &body[..end]);
            if let Ok(value) = serde_json::from_str(body.trim()) {
                return Some(value);
            }
        }
    }

    for (open, close) in [('{', '}'), ('[', ']')] {
        if let Some(start) = trimmed.find(open)
            && let Some(end) = trimmed.rfind(close)
            && end > start
            && let Ok(value) = serde_json::from_str(&trimmed[start..=end])
        {
            return Some(value);
        }
    }
    None
}

/// Interpret one token as a score in [0, 1].
///
/// `70%` and `7/10` are always accepted. Without a label (`lenient` unset) a
/// bare number must carry a decimal point, so counts and ordinals in prose
/// such as "Expert 1" are not read as scores.
fn normalize_score_token(token: &str, lenient: bool) -> Option<f64> {
    let token = token
        .trim_matches(|c: char| !(c.is_ascii_digit() || matches!(c, '.' | '%' | '/')))
        .trim_matches(|c: char| c == '.' || c == '/');
    if token.is_empty() {
        return None;
    }
    if let Some(percent) = token.strip_suffix('%') {
        let value: f64 = percent.parse().ok()?;
        return (0.0..=100.0).contains(&value).then_some(value / 100.0);
    }
    if let Some((numerator, denominator)) = token.split_once('/') {
        let numerator: f64 = numerator.parse().ok()?;
        let denominator: f64 = denominator.parse().ok()?;
        if denominator <= 0.0 || numerator < 0.0 || numerator > denominator {
            return None;
        }
        return Some(numerator / denominator);
    }
    if !lenient && !token.contains('.') {
        return None;
    }
    rescale_unit(token.parse().ok()?, lenient)
}

/// Map a raw number onto [0, 1]. Labelled or structured values above 1 are
/// read as out of 10 or out of 100.
fn rescale_unit(value: f64, lenient: bool) -> Option<f64> {
    if (0.0..=1.0).contains(&value) {
        Some(value)
    } else if lenient && value > 1.0 && value <= 10.0 {
        Some(value / 10.0)
    } else if lenient && value > 10.0 && value <= 100.0 {
        Some(value / 100.0)
    } else {
        None
    }
}

fn first_score_in(text: &str, lenient: bool) -> Option<f64> {
    text.split_whitespace()
        .find_map(|token| normalize_score_token(token, lenient))
}

/// Strip markdown decoration from the start of a line.
fn strip_decoration(line: &str) -> &str {
    line.trim()
        .trim_start_matches(|c: char| matches!(c, '#' | '*' | '_' | '>' | '-'))
        .trim()
}

/// Score following a `label` at the start of some line, e.g. `Overlap: 0.6`.
fn labelled_score(reply: &str, label: &str) -> Option<f64> {
    reply.lines().find_map(|line| {
        let line = strip_decoration(line);
        let lower = line.to_lowercase();
        lower
            .strip_prefix(label)
            .and_then(|rest| first_score_in(rest, true))
    })
}

fn json_number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter().find_map(|key| {
        let field = value.get(key)?;
        match field.as_f64() {
            Some(number) => rescale_unit(number, true),
            None => field.as_str().and_then(|s| first_score_in(s, true)),
        }
    })
}

/// A single score in [0, 1], or `None` if the reply holds no usable number.
///
/// ```
/// use panel_domain::consensus::parsing::parse_unit_score;
///
/// assert_eq!(parse_unit_score(r#"{"score": 0.72, "rationale": "close"}"#), Some(0.72));
/// assert_eq!(parse_unit_score("Score: 80%"), Some(0.8));
/// assert_eq!(parse_unit_score("I would say 7/10."), Some(0.7));
/// assert_eq!(parse_unit_score("They broadly agree."), None);
/// ```
pub fn parse_unit_score(reply: &str) -> Option<f64> {
    if let Some(value) = extract_json(reply) {
        if let Some(score) = json_number(&value, SCORE_KEYS) {
            return Some(clamp_unit(score));
        }
        if let Some(score) = value.as_f64().and_then(|v| rescale_unit(v, true)) {
            return Some(score);
        }
    }
    SCORE_KEYS
        .iter()
        .find_map(|label| labelled_score(reply, label))
        .or_else(|| first_score_in(reply, false))
        .map(clamp_unit)
}

/// Text of a bullet or numbered list line, without its marker.
fn list_item(line: &str) -> Option<&str> {
    let trimmed = line.trim();
    for marker in ["- ", "* ", "• ", "+ "] {
        if let Some(rest) = trimmed.strip_prefix(marker) {
            return Some(rest.trim());
        }
    }
    let digits = trimmed.chars().take_while(|c| c.is_ascii_digit()).count();
    if digits > 0 {
        let rest = &trimmed[digits..];
        if let Some(rest) = rest.strip_prefix(". ").or_else(|| rest.strip_prefix(") ")) {
            return Some(rest.trim());
        }
    }
    None
}

/// List items under the first line that starts with one of `headings`.
fn section_items(reply: &str, headings: &[&str]) -> Vec<String> {
    let mut lines = reply.lines();
    let found = lines.by_ref().any(|line| {
        let lower = strip_decoration(line).to_lowercase();
        headings.iter().any(|h| lower.starts_with(h))
    });
    if !found {
        return Vec::new();
    }
    lines
        .map(str::trim)
        .skip_while(|line| line.is_empty())
        .take_while(|line| list_item(line).is_some())
        .filter_map(list_item)
        .filter(|item| !item.is_empty())
        .map(|item| item.trim_matches('*').trim().to_string())
        .collect()
}

fn json_string_list(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(|s| s.trim().to_string()))
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

fn json_text(item: &Value, keys: &[&str]) -> Option<String> {
    if let Some(text) = item.as_str() {
        return Some(text.trim().to_string()).filter(|t| !t.is_empty());
    }
    keys.iter()
        .find_map(|key| item.get(key).and_then(Value::as_str))
        .map(|s| s.trim().to_string())
        .filter(|t| !t.is_empty())
}

fn json_member(item: &Value) -> Option<String> {
    if let Some(member) = item.get("member").and_then(Value::as_str) {
        return Some(member.to_string());
    }
    let members = json_string_list(item.get("members"));
    (!members.is_empty()).then(|| members.join(", "))
}

fn claims_from_json(value: &Value) -> Vec<ExtractedClaim> {
    let buckets = [
        ("agreed", ClaimStance::Agreed),
        ("unique", ClaimStance::Unique),
        ("conflicting", ClaimStance::Conflicting),
    ];
    let mut claims = Vec::new();
    for (key, stance) in buckets {
        let Some(items) = value.get(key).and_then(Value::as_array) else {
            continue;
        };
        for item in items {
            let Some(text) = json_text(item, &["claim", "text"]) else {
                continue;
            };
            claims.push(ExtractedClaim {
                text,
                member: json_member(item),
                stance,
                confidence: item
                    .get("confidence")
                    .and_then(Value::as_f64)
                    .map(clamp_unit)
                    .unwrap_or(NEUTRAL_SCORE),
                evidence: json_string_list(item.get("evidence")),
            });
        }
    }
    claims
}

fn claims_from_text(reply: &str) -> Vec<ExtractedClaim> {
    let buckets: [(&[&str], ClaimStance); 3] = [
        (&["agreed", "shared", "common"], ClaimStance::Agreed),
        (&["unique"], ClaimStance::Unique),
        (&["conflicting", "contradict", "disputed"], ClaimStance::Conflicting),
    ];
    buckets
        .into_iter()
        .flat_map(|(headings, stance)| {
            section_items(reply, headings)
                .into_iter()
                .map(move |text| ExtractedClaim {
                    text,
                    member: None,
                    stance,
                    confidence: NEUTRAL_SCORE,
                    evidence: Vec::new(),
                })
        })
        .collect()
}

/// Claims partitioned into agreed, unique and conflicting buckets.
pub fn parse_claim_analysis(reply: &str) -> ClaimAnalysis {
    if let Some(value) = extract_json(reply)
        && value.is_object()
    {
        return ClaimAnalysis {
            claims: claims_from_json(&value),
            overlap: json_number(&value, &["overlap", "claim_overlap", "score"]).map(clamp_unit),
        };
    }
    ClaimAnalysis {
        claims: claims_from_text(reply),
        overlap: labelled_score(reply, "overlap").map(clamp_unit),
    }
}

fn recommendation_from_json(item: &Value) -> Option<ExtractedRecommendation> {
    let text = json_text(item, &["recommendation", "text"])?;
    let action = item
        .get("action")
        .and_then(Value::as_str)
        .map(ActionType::from_label)
        .filter(|action| *action != ActionType::Other)
        .unwrap_or_else(|| ActionType::classify(&text));
    Some(ExtractedRecommendation {
        member: json_member(item),
        action,
        priority: item
            .get("priority")
            .and_then(Value::as_str)
            .map(Priority::from_label)
            .unwrap_or(Priority::Medium),
        text,
    })
}

fn recommendation_from_text(item: String) -> ExtractedRecommendation {
    let (member, text) = match item.split_once(':') {
        Some((name, rest)) if !name.is_empty() && name.chars().count() <= 60 => {
            (Some(name.trim().to_string()), rest.trim().to_string())
        }
        _ => (None, item),
    };
    ExtractedRecommendation {
        action: ActionType::classify(&text),
        priority: Priority::Medium,
        member,
        text,
    }
}

/// Per-member recommendations, their action types, and stated alignment.
pub fn parse_recommendation_analysis(reply: &str) -> RecommendationAnalysis {
    if let Some(value) = extract_json(reply)
        && value.is_object()
    {
        let recommendations = value
            .get("recommendations")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(recommendation_from_json).collect())
            .unwrap_or_default();
        return RecommendationAnalysis {
            recommendations,
            alignment: json_number(&value, &["alignment", "score"]).map(clamp_unit),
            narrative: json_text(&value, &["summary", "narrative"]),
        };
    }

    let narrative = reply.lines().find_map(|line| {
        let line = strip_decoration(line);
        let lower = line.to_lowercase();
        lower
            .starts_with("summary:")
            .then(|| line["summary:".len()..].trim().to_string())
            .filter(|s| !s.is_empty())
    });
    RecommendationAnalysis {
        recommendations: section_items(reply, &["recommendations"])
            .into_iter()
            .map(recommendation_from_text)
            .collect(),
        alignment: labelled_score(reply, "alignment").map(clamp_unit),
        narrative,
    }
}

/// Short list items from a JSON array or a bullet list, at most `cap`.
pub fn parse_line_items(reply: &str, cap: usize) -> Vec<String> {
    let from_json = extract_json(reply).and_then(|value| {
        let array = match &value {
            Value::Array(items) => items.clone(),
            Value::Object(map) => map.values().find_map(|v| v.as_array().cloned())?,
            _ => return None,
        };
        Some(
            array
                .iter()
                .filter_map(|item| json_text(item, &["point", "theme", "text"]))
                .collect::<Vec<_>>(),
        )
    });

    let mut items = match from_json {
        Some(items) if !items.is_empty() => items,
        _ => reply
            .lines()
            .filter_map(list_item)
            .map(|item| item.trim_matches('*').trim().to_string())
            .filter(|item| !item.is_empty() && !item.ends_with(':'))
            .collect(),
    };
    items.dedup();
    items.truncate(cap);
    items
}

/// A member's self-reported confidence from a trailing `Confidence:` line.
///
/// Accepts `0.8`, `80%`, `8/10`, or the words high / moderate / low.
pub fn parse_self_confidence(text: &str) -> Option<f64> {
    text.lines().rev().find_map(|line| {
        let lower = strip_decoration(line).to_lowercase();
        let rest = lower.strip_prefix("confidence")?;
        let rest = rest.trim_start_matches(|c: char| c.is_alphabetic() || c == ' ');
        first_score_in(rest, true).map(clamp_unit).or_else(|| {
            let word = rest.trim_start_matches(|c: char| !c.is_alphabetic());
            match word.split_whitespace().next()? {
                w if w.starts_with("high") => Some(0.85),
                w if w.starts_with("moderate") || w.starts_with("medium") => Some(0.6),
                w if w.starts_with("low") => Some(0.35),
                _ => None,
            }
        })
    })
}

const CITATION_HEADINGS: &[&str] = &["sources", "references", "citations"];

/// Citations listed under a `Sources:` / `References:` / `Citations:` heading,
/// either inline after the colon or as list lines below it. De-duplicated,
/// first occurrence wins.
pub fn extract_citations(text: &str) -> Vec<String> {
    let mut citations: Vec<String> = Vec::new();
    let mut push = |citation: &str| {
        let citation = citation.trim().trim_end_matches('.').trim();
        if !citation.is_empty() && !citations.iter().any(|c| c == citation) {
            citations.push(citation.to_string());
        }
    };

    let mut lines = text.lines().peekable();
    while let Some(line) = lines.next() {
        let stripped = strip_decoration(line);
        let lower = stripped.to_lowercase();
        let Some(heading) = CITATION_HEADINGS.iter().find(|h| lower.starts_with(*h)) else {
            continue;
        };
        let Some(inline) = stripped[heading.len()..].trim_start().strip_prefix(':') else {
            continue;
        };
        let inline = inline.trim().trim_start_matches('*').trim();
        if !inline.is_empty() {
            let separator = if inline.contains(';') { ';' } else { ',' };
            inline.split(separator).for_each(&mut push);
        }
        while let Some(next) = lines.peek() {
            match list_item(next) {
                Some(item) => {
                    push(item);
                    lines.next();
                }
                None if next.trim().is_empty() && inline.is_empty() => {
                    lines.next();
                }
                None => break,
            }
        }
    }
    citations
}
