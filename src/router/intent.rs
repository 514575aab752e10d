//! Pattern-based intent extraction
//!
//! Fallback classifier input used when the tool-calling model is unavailable
//! or returns something unusable. Pure CPU logic, no I/O.
//!
//! Money patterns are matched case-insensitively against the original text so
//! currency symbols and amounts survive untouched. Keyword cues are matched
//! against the trimmed, lowercased text.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// An amount of money with what it was for
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoneyEntry {
    /// Non-negative, finite
    pub amount: f64,
    /// Trimmed, non-empty
    pub description: String,
}

/// "last N transactions" style request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentQuery {
    /// Always > 0
    pub count: u32,
}

/// Everything recognised in one message
///
/// Fields are independent: a single message can log an expense, ask for a
/// summary and ask for advice at the same time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParsedIntent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_expense: Option<MoneyEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_income: Option<MoneyEntry>,
    #[serde(default)]
    pub query_summary: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_recent: Option<RecentQuery>,
    #[serde(default)]
    pub request_coach: bool,
    #[serde(default)]
    pub request_insights: bool,
}

impl ParsedIntent {
    /// True if any field is set
    pub fn has_intent(&self) -> bool {
        self.has_data_intent() || self.has_coaching_intent()
    }

    /// Expense, income, summary or recent-transactions request present
    pub fn has_data_intent(&self) -> bool {
        self.log_expense.is_some()
            || self.log_income.is_some()
            || self.query_summary
            || self.query_recent.is_some()
    }

    /// Coaching or insight request present
    pub fn has_coaching_intent(&self) -> bool {
        self.request_coach || self.request_insights
    }
}

/// One row of a money pattern table
///
/// Capture group indices say where the amount and description live, so rows
/// like "bought X for N" and "spent N on X" share the same extractor.
struct AmountRule {
    pattern: Regex,
    amount_group: usize,
    description_group: usize,
}

impl AmountRule {
    fn new(pattern: &str, amount_group: usize, description_group: usize) -> Self {
        Self {
            pattern: Regex::new(pattern).expect("static intent pattern must compile"),
            amount_group,
            description_group,
        }
    }

    /// `None` when the row does not match; `Some(None)` when it matches but
    /// the captured amount or description is unusable
    fn extract(&self, text: &str) -> Option<Option<MoneyEntry>> {
        self.pattern
            .captures(text)
            .map(|caps| self.entry_from(&caps))
    }

    fn entry_from(&self, caps: &Captures<'_>) -> Option<MoneyEntry> {
        let amount = parse_amount(caps, self.amount_group)?;
        let description = caps.get(self.description_group)?.as_str().trim();
        if description.is_empty() {
            return None;
        }
        Some(MoneyEntry {
            amount,
            description: description.to_string(),
        })
    }
}

fn parse_amount(caps: &Captures<'_>, group: usize) -> Option<f64> {
    let amount: f64 = caps.get(group)?.as_str().parse().ok()?;
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

// Currency token allowed before or after an amount
const CURRENCY: &str = r"(?:rs\.?|inr|rupees|₹|\$|dollars)";
const AMOUNT: &str = r"(\d+(?:\.\d+)?)";
// Description runs to end of line, minus trailing sentence punctuation
const TAIL: &str = r"(\S.*?)[\s.!?]*$";

fn amount_with_currency() -> String {
    format!(r"(?:{CURRENCY}\s*)?{AMOUNT}(?:\s*{CURRENCY})?")
}

/// Expense rows, first matching row decides
static EXPENSE_RULES: LazyLock<Vec<AmountRule>> = LazyLock::new(|| {
    let money = amount_with_currency();
    vec![
        AmountRule::new(
            &format!(r"(?im)\bspent\s+{money}\s+(?:on|for)\s+{TAIL}"),
            1,
            2,
        ),
        AmountRule::new(
            &format!(r"(?im)\bpaid\s+{money}\s+(?:for|to)\s+{TAIL}"),
            1,
            2,
        ),
        AmountRule::new(
            &format!(r"(?im)\b(?:bought|purchased)\s+(\S.*?)\s+for\s+{money}[\s.!?]*$"),
            2,
            1,
        ),
        AmountRule::new(
            &format!(r"(?im)\b(?:expense|spend)\s+(?:of\s+)?{money}\s+(?:on|for)\s+{TAIL}"),
            1,
            2,
        ),
    ]
});

/// Income rows, first matching row decides
static INCOME_RULES: LazyLock<Vec<AmountRule>> = LazyLock::new(|| {
    let money = amount_with_currency();
    vec![
        AmountRule::new(
            &format!(r"(?im)\b(?:received|got|earned)\s+{money}\s+(?:from|as|for)\s+{TAIL}"),
            1,
            2,
        ),
        AmountRule::new(
            &format!(r"(?im)\b(salary|bonus|income|refund)\s+of\s+{money}"),
            2,
            1,
        ),
    ]
});

static SUMMARY_VERB: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:show|get|fetch|give me|what|display|how much|tell me|list)\b")
        .expect("static intent pattern must compile")
});

static FINANCIAL_NOUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:spending|spent|spend|expenses?|transactions?|summary|balance|income|money|total)\b",
    )
    .expect("static intent pattern must compile")
});

static RECENT_COUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:last|recent)\s+(\d+)\s+(?:transactions?|expenses?|payments?)\b")
        .expect("static intent pattern must compile")
});

static COACH_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:budget\w*|advice|advise|coach\w*|chatur|should i|help me save|save more|saving tips|plan|planning|recommend\w*|suggest\w*)\b",
    )
    .expect("static intent pattern must compile")
});

static INSIGHT_CUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?:habits?|insights?|patterns?|analy[sz]e|analysis|trends?|overspend\w*)\b|\bwhy\b.*\bspend",
    )
    .expect("static intent pattern must compile")
});

// Later rows are not consulted once a row matches, even if its amount is rejected
fn first_match(rules: &[AmountRule], text: &str) -> Option<MoneyEntry> {
    rules.iter().find_map(|rule| rule.extract(text))?
}

fn recent_count(normalized: &str) -> Option<RecentQuery> {
    let caps = RECENT_COUNT.captures(normalized)?;
    let count: u32 = caps.get(1)?.as_str().parse().ok()?;
    (count > 0).then_some(RecentQuery { count })
}

/// Extract every recognisable intent from a raw message
///
/// Never panics; unrecognised text yields `ParsedIntent::default()`.
pub fn parse_user_intent(text: &str) -> ParsedIntent {
    let original = text.trim();
    let normalized = original.to_lowercase();

    ParsedIntent {
        log_expense: first_match(&EXPENSE_RULES, original),
        log_income: first_match(&INCOME_RULES, original),
        query_summary: SUMMARY_VERB.is_match(&normalized) && FINANCIAL_NOUN.is_match(&normalized),
        query_recent: recent_count(&normalized),
        request_coach: COACH_CUE.is_match(&normalized),
        request_insights: INSIGHT_CUE.is_match(&normalized),
    }
}

/// True iff at least one intent field is set
pub fn has_intent(intent: &ParsedIntent) -> bool {
    intent.has_intent()
}
