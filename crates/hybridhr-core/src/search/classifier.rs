//! Query classification and routing
//!
//! Classification is a pure function of the question text. Signals are
//! extracted once, then an ordered rule table picks the first matching
//! intent; anything unmatched degrades to a hybrid search.

use super::Domain;
use crate::config::ClassifierConfig;
use crate::db::FieldFilter;
use crate::error::{HybridError, Result};
use chrono::NaiveDate;
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref AGGREGATE_RE: Regex = Regex::new(
        r"(?i)\b(list|how many|count|show (me )?all|find (all |the )?(employees?|staff|people)|employees? (named|called))\b"
    )
    .unwrap();
    // Selection phrases without a count/list verb; a policy phrase outranks them
    static ref SELECTION_RE: Regex = Regex::new(
        r"(?i)\b(which employees|who works? (in|at|for)|everyone (in|at))\b"
    )
    .unwrap();
    // "how many days of leave" asks about entitlement, not a count of records
    static ref ENTITLEMENT_RE: Regex =
        Regex::new(r"(?i)\bhow many (days|hours|weeks)\b").unwrap();
    static ref POLICY_RE: Regex = Regex::new(
        r"(?i)\b(polic(y|ies)|what happens if|how much leave|how many days|requirements?|entitle(d|ment)|allowed to|rules?|eligib(le|ility))\b"
    )
    .unwrap();
    static ref LEAVE_TYPE_RE: Regex =
        Regex::new(r"(?i)\b(sick|annual|casual|maternity|paternity|unpaid)\s+leaves?\b").unwrap();
    static ref LEAVE_STATUS_RE: Regex = Regex::new(r"(?i)\b(approved|pending|rejected)\b").unwrap();
    static ref JOINED_RE: Regex = Regex::new(
        r"(?i)\b(?:joined|hired|started)\s+(in|after|since|before)\s+(\d{4})\b"
    )
    .unwrap();
    static ref JOINED_BETWEEN_RE: Regex = Regex::new(
        r"(?i)\b(?:joined|hired|started)\s+between\s+(\d{4})\s+and\s+(\d{4})\b"
    )
    .unwrap();
    static ref NAME_RE: Regex = Regex::new(r"(?i)\b(?:named|called)\s+([a-z][a-z'-]*)").unwrap();
}

/// Field names whose presence points an aggregate query at leave history
const LEAVE_FIELDS: &[&str] = &["leave_type", "status"];

/// What the question asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    EntityLookup,
    AggregateFilter,
    PolicyQuestion,
    Unknown,
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntityLookup => "entity_lookup",
            Self::AggregateFilter => "aggregate_filter",
            Self::PolicyQuestion => "policy_question",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which retrievers a query is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Routing {
    Structured,
    Semantic,
    Hybrid,
}

impl Routing {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Structured => "structured",
            Self::Semantic => "semantic",
            Self::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for Routing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified question; immutable once built
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub text: String,
    /// Upper-cased identifier for entity lookups
    pub entity_id: Option<String>,
    pub intent: Intent,
    pub routing: Routing,
    /// Recognised structured filters (aggregate and unknown queries)
    pub filters: Vec<FieldFilter>,
    /// The single semantic domain implied by the intent, if any
    pub domain_hint: Option<Domain>,
}

/// Everything the rules look at, extracted in one pass
struct Signals {
    entity_id: Option<String>,
    aggregate_phrase: bool,
    selection_phrase: bool,
    policy_phrase: bool,
    filters: Vec<FieldFilter>,
}

struct Rule {
    intent: Intent,
    routing: Routing,
    matches: fn(&Signals) -> bool,
}

fn has_entity(s: &Signals) -> bool {
    s.entity_id.is_some()
}

fn is_aggregate(s: &Signals) -> bool {
    let asks_for_records = s.aggregate_phrase || (s.selection_phrase && !s.policy_phrase);
    asks_for_records && !s.filters.is_empty()
}

fn is_policy(s: &Signals) -> bool {
    s.policy_phrase
}

/// Priority order: first match wins
const RULES: &[Rule] = &[
    Rule {
        intent: Intent::EntityLookup,
        routing: Routing::Structured,
        matches: has_entity,
    },
    Rule {
        intent: Intent::AggregateFilter,
        routing: Routing::Structured,
        matches: is_aggregate,
    },
    Rule {
        intent: Intent::PolicyQuestion,
        routing: Routing::Semantic,
        matches: is_policy,
    },
];

/// Deterministic rule-based classifier
pub struct QueryClassifier {
    entity_re: Regex,
    departments: Vec<(String, Regex)>,
    locations: Vec<(String, Regex)>,
}

impl QueryClassifier {
    /// Compile the configured vocabulary; an invalid prefix is a configuration error
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let prefix = &config.entity_prefix;
        if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(HybridError::Config(format!(
                "invalid entity identifier prefix '{}'",
                prefix
            )));
        }

        let entity_re = Regex::new(&format!(r"(?i)\b{}\d+\b", regex::escape(prefix)))?;

        Ok(Self {
            entity_re,
            departments: compile_vocabulary(&config.departments)?,
            locations: compile_vocabulary(&config.locations)?,
        })
    }

    /// Classify a question. Never fails.
    pub fn classify(&self, text: &str) -> Query {
        let signals = self.signals(text);

        let (intent, routing) = RULES
            .iter()
            .find(|rule| (rule.matches)(&signals))
            .map(|rule| (rule.intent, rule.routing))
            .unwrap_or((Intent::Unknown, Routing::Hybrid));

        // Unknown queries keep their filters so the hybrid route can still hit the record store
        let filters = match intent {
            Intent::AggregateFilter | Intent::Unknown => signals.filters,
            Intent::EntityLookup | Intent::PolicyQuestion => Vec::new(),
        };

        let domain_hint = match intent {
            Intent::EntityLookup => Some(Domain::Employee),
            Intent::AggregateFilter => {
                if filters.iter().any(|f| LEAVE_FIELDS.contains(&f.field())) {
                    Some(Domain::Leave)
                } else {
                    Some(Domain::Employee)
                }
            }
            Intent::PolicyQuestion => Some(Domain::Policy),
            Intent::Unknown => None,
        };

        let entity_id = if intent == Intent::EntityLookup {
            signals.entity_id
        } else {
            None
        };

        tracing::debug!(
            "Classified '{}' as {} ({} routing, {} filters)",
            text,
            intent,
            routing,
            filters.len()
        );

        Query {
            text: text.to_string(),
            entity_id,
            intent,
            routing,
            filters,
            domain_hint,
        }
    }

    fn signals(&self, text: &str) -> Signals {
        let entity_id = self
            .entity_re
            .find(text)
            .map(|m| m.as_str().to_uppercase());

        Signals {
            entity_id,
            aggregate_phrase: AGGREGATE_RE.is_match(text) && !ENTITLEMENT_RE.is_match(text),
            selection_phrase: SELECTION_RE.is_match(text),
            policy_phrase: POLICY_RE.is_match(text),
            filters: self.extract_filters(text),
        }
    }

    fn extract_filters(&self, text: &str) -> Vec<FieldFilter> {
        let mut filters = Vec::new();

        if let Some(department) = earliest_match(&self.departments, text) {
            filters.push(FieldFilter::eq("department", department));
        }
        if let Some(location) = earliest_match(&self.locations, text) {
            filters.push(FieldFilter::eq("location", location));
        }
        if let Some(range) = joining_range(text) {
            filters.push(range);
        }
        if let Some(caps) = LEAVE_TYPE_RE.captures(text) {
            filters.push(FieldFilter::contains("leave_type", caps[1].to_lowercase()));
        }
        if let Some(caps) = LEAVE_STATUS_RE.captures(text) {
            filters.push(FieldFilter::eq("status", caps[1].to_lowercase()));
        }
        if let Some(caps) = NAME_RE.captures(text) {
            filters.push(FieldFilter::contains("name", &caps[1]));
        }

        filters
    }
}

fn compile_vocabulary(terms: &[String]) -> Result<Vec<(String, Regex)>> {
    terms
        .iter()
        .filter(|t| !t.trim().is_empty())
        .map(|term| {
            let re = Regex::new(&format!(r"(?i)\b{}\b", regex::escape(term.trim())))?;
            Ok((term.trim().to_string(), re))
        })
        .collect()
}

/// Vocabulary term occurring first in the text
fn earliest_match<'a>(vocabulary: &'a [(String, Regex)], text: &str) -> Option<&'a str> {
    vocabulary
        .iter()
        .filter_map(|(term, re)| re.find(text).map(|m| (m.start(), term.as_str())))
        .min_by_key(|(start, _)| *start)
        .map(|(_, term)| term)
}

/// Turn "joined in/after/since/before YYYY" or "joined between X and Y" into a date range
fn joining_range(text: &str) -> Option<FieldFilter> {
    let (from, to) = if let Some(caps) = JOINED_BETWEEN_RE.captures(text) {
        let a: i32 = caps[1].parse().ok()?;
        let b: i32 = caps[2].parse().ok()?;
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        (Some(year_start(lo)?), Some(year_end(hi)?))
    } else {
        let caps = JOINED_RE.captures(text)?;
        let year: i32 = caps[2].parse().ok()?;
        match caps[1].to_lowercase().as_str() {
            "in" => (Some(year_start(year)?), Some(year_end(year)?)),
            "after" => (Some(year_start(year + 1)?), None),
            "since" => (Some(year_start(year)?), None),
            "before" => (None, Some(year_end(year - 1)?)),
            _ => return None,
        }
    };

    Some(FieldFilter::Range {
        field: "joining_date".to_string(),
        from,
        to,
    })
}

fn year_start(year: i32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(|d| d.format("%Y-%m-%d").to_string())
}

fn year_end(year: i32) -> Option<String> {
    NaiveDate::from_ymd_opt(year, 12, 31).map(|d| d.format("%Y-%m-%d").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> QueryClassifier {
        QueryClassifier::new(&ClassifierConfig::default()).unwrap()
    }

    #[test]
    fn test_entity_lookup() {
        let q = classifier().classify("Who is employee emp1005?");
        assert_eq!(q.intent, Intent::EntityLookup);
        assert_eq!(q.routing, Routing::Structured);
        assert_eq!(q.entity_id.as_deref(), Some("EMP1005"));
        assert_eq!(q.domain_hint, Some(Domain::Employee));
    }

    #[test]
    fn test_entity_wins_over_policy_phrase() {
        let q = classifier().classify("What is the leave policy for EMP42?");
        assert_eq!(q.intent, Intent::EntityLookup);
        assert_eq!(q.entity_id.as_deref(), Some("EMP42"));
    }

    #[test]
    fn test_prefix_needs_digits_and_word_boundary() {
        let c = classifier();
        assert_eq!(c.classify("Tell me about EMP").intent, Intent::Unknown);
        assert_eq!(c.classify("XEMP1005 status").intent, Intent::Unknown);
    }

    #[test]
    fn test_aggregate_filter_department_and_location() {
        let q = classifier().classify("List all employees in marketing based in Singapore");
        assert_eq!(q.intent, Intent::AggregateFilter);
        assert_eq!(q.routing, Routing::Structured);
        assert_eq!(
            q.filters,
            vec![
                FieldFilter::eq("department", "Marketing"),
                FieldFilter::eq("location", "Singapore"),
            ]
        );
        assert_eq!(q.domain_hint, Some(Domain::Employee));
    }

    #[test]
    fn test_aggregate_phrase_without_filter_is_not_aggregate() {
        let q = classifier().classify("list everything you know");
        assert_eq!(q.intent, Intent::Unknown);
        assert_eq!(q.routing, Routing::Hybrid);
        assert!(q.filters.is_empty());
    }

    #[test]
    fn test_leave_filters_hint_leave_domain() {
        let q = classifier().classify("How many sick leave requests are pending?");
        assert_eq!(q.intent, Intent::AggregateFilter);
        assert!(q.filters.contains(&FieldFilter::contains("leave_type", "sick")));
        assert!(q.filters.contains(&FieldFilter::eq("status", "pending")));
        assert_eq!(q.domain_hint, Some(Domain::Leave));
    }

    #[test]
    fn test_joining_date_ranges() {
        let c = classifier();
        let q = c.classify("List employees who joined in 2021");
        assert_eq!(
            q.filters,
            vec![FieldFilter::Range {
                field: "joining_date".into(),
                from: Some("2021-01-01".into()),
                to: Some("2021-12-31".into()),
            }]
        );

        let q = c.classify("Count engineers that joined after 2019 in Engineering");
        assert!(q.filters.contains(&FieldFilter::Range {
            field: "joining_date".into(),
            from: Some("2020-01-01".into()),
            to: None,
        }));

        let q = c.classify("show all staff hired between 2020 and 2018");
        assert_eq!(
            q.filters,
            vec![FieldFilter::Range {
                field: "joining_date".into(),
                from: Some("2018-01-01".into()),
                to: Some("2020-12-31".into()),
            }]
        );
    }

    #[test]
    fn test_employee_named() {
        let q = classifier().classify("Find the employee named Priya");
        assert_eq!(q.intent, Intent::AggregateFilter);
        assert_eq!(q.filters, vec![FieldFilter::contains("name", "Priya")]);
    }

    #[test]
    fn test_policy_question() {
        let q = classifier().classify("What is the sick leave policy for Singapore?");
        assert_eq!(q.intent, Intent::PolicyQuestion);
        assert_eq!(q.routing, Routing::Semantic);
        assert_eq!(q.domain_hint, Some(Domain::Policy));
        assert!(q.filters.is_empty());
    }

    #[test]
    fn test_policy_about_employees_in_location_stays_policy() {
        let c = classifier();
        for text in [
            "What is the leave policy for employees in Singapore?",
            "What are the rules for employees in London?",
            "Which employees are eligible for maternity leave?",
        ] {
            let q = c.classify(text);
            assert_eq!(q.intent, Intent::PolicyQuestion, "{}", text);
            assert_eq!(q.routing, Routing::Semantic);
            assert!(q.filters.is_empty());
        }
    }

    #[test]
    fn test_selection_phrase_without_policy_is_aggregate() {
        let q = classifier().classify("Which employees work in Sales?");
        assert_eq!(q.intent, Intent::AggregateFilter);
        assert_eq!(q.filters, vec![FieldFilter::eq("department", "Sales")]);
    }

    #[test]
    fn test_unknown_keeps_recognised_filters() {
        let q = classifier().classify("Tell me about the Marketing team in Singapore");
        assert_eq!(q.intent, Intent::Unknown);
        assert_eq!(q.routing, Routing::Hybrid);
        assert_eq!(
            q.filters,
            vec![
                FieldFilter::eq("department", "Marketing"),
                FieldFilter::eq("location", "Singapore"),
            ]
        );
        assert_eq!(q.domain_hint, None);
    }

    #[test]
    fn test_entitlement_count_is_policy() {
        let q = classifier().classify("How many days of annual leave am I entitled to?");
        assert_eq!(q.intent, Intent::PolicyQuestion);
    }

    #[test]
    fn test_unknown_goes_hybrid() {
        let q = classifier().classify("asdkjasdkj random text");
        assert_eq!(q.intent, Intent::Unknown);
        assert_eq!(q.routing, Routing::Hybrid);
        assert_eq!(q.domain_hint, None);
        assert_eq!(q.entity_id, None);
    }

    #[test]
    fn test_deterministic() {
        let c = classifier();
        let text = "which employees work in Sales in London?";
        assert_eq!(c.classify(text), c.classify(text));
    }

    #[test]
    fn test_custom_prefix_and_invalid_prefix() {
        let config = ClassifierConfig {
            entity_prefix: "HR".to_string(),
            ..ClassifierConfig::default()
        };
        let q = QueryClassifier::new(&config).unwrap().classify("details for hr77");
        assert_eq!(q.entity_id.as_deref(), Some("HR77"));

        let config = ClassifierConfig {
            entity_prefix: "E-".to_string(),
            ..ClassifierConfig::default()
        };
        assert!(matches!(
            QueryClassifier::new(&config),
            Err(HybridError::Config(_))
        ));
    }
}
