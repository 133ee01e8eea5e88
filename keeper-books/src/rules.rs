//! Deterministic keyword oracle for running without a model.
//!
//! Description keywords map to the same style of labels a model is asked for, so the
//! classification policy treats both the same way. A keyword matches at the start of a
//! word, so "ADVERTIS" still catches "Advertising" but "RENT" never fires on "Parent".

use keeper_core::{KeeperError, KeeperResult, UNCATEGORIZED};
use regex::Regex;
use rust_decimal::Decimal;

use crate::oracle::Oracle;

/// Which side of the books a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Out,
    In,
    Any,
}

struct Rule {
    flow: Flow,
    keywords: &'static [&'static str],
    label: &'static str,
}

const RULES: &[Rule] = &[
    Rule {
        flow: Flow::Out,
        keywords: &[
            "AWS", "AMAZON WEB SERVICES", "DIGITAL OCEAN", "DIGITALOCEAN", "VERCEL", "HEROKU",
            "NETLIFY", "CLOUDFLARE", "GOOGLE CLOUD", "AZURE", "HOSTING",
        ],
        label: "Hosting Expenses",
    },
    Rule {
        flow: Flow::Out,
        keywords: &[
            "GITHUB", "FIGMA", "NOTION", "SLACK", "ATLASSIAN", "ZOOM", "OPENAI", "ANTHROPIC",
            "CURSOR", "GOOGLE WORKSPACE", "MICROSOFT",
        ],
        label: "Software Subscriptions",
    },
    Rule {
        flow: Flow::Out,
        keywords: &["STAPLES", "OFFICE DEPOT", "PRINTER", "PAPER", "SUPPLIES"],
        label: "Office Supplies",
    },
    Rule {
        flow: Flow::Out,
        keywords: &["GOOGLE ADS", "META ADS", "FACEBOOK ADS", "LINKEDIN", "ADVERTIS", "SPONSOR"],
        label: "Marketing Expenses",
    },
    Rule {
        flow: Flow::Out,
        keywords: &["PAYROLL", "GUSTO", "SALARY", "CONTRACTOR", "DEEL"],
        label: "Payroll Expenses",
    },
    Rule {
        flow: Flow::Out,
        keywords: &["RENT", "LEASE", "WEWORK", "COWORKING"],
        label: "Rent Expenses",
    },
    Rule {
        flow: Flow::Out,
        keywords: &["LEGAL", "LAWYER", "ATTORNEY", "ACCOUNTANT", "CPA", "BOOKKEEP"],
        label: "Professional Services",
    },
    Rule {
        flow: Flow::Out,
        keywords: &["AIRLINE", "HOTEL", "UBER", "LYFT", "TRAVEL"],
        label: "Travel",
    },
    Rule {
        flow: Flow::In,
        keywords: &["STRIPE", "PADDLE", "CUSTOMER PAYMENT", "SUBSCRIPTION", "GUMROAD"],
        label: "Subscription Revenue",
    },
    Rule {
        flow: Flow::In,
        keywords: &["INVOICE", "CONSULTING", "RETAINER"],
        label: "Consulting Income",
    },
    Rule {
        flow: Flow::Any,
        keywords: &["REFUND", "CHARGEBACK"],
        label: "Refunds",
    },
];

/// Keyword table oracle; first matching rule wins
#[derive(Debug, Clone)]
pub struct RuleOracle {
    rules: Vec<(Flow, Regex, &'static str)>,
}

impl RuleOracle {
    pub fn new() -> KeeperResult<Self> {
        let rules = RULES
            .iter()
            .map(|r| {
                let alternatives: Vec<String> =
                    r.keywords.iter().map(|k| regex::escape(k)).collect();
                let pattern = format!(r"(?i)\b(?:{})", alternatives.join("|"));
                Regex::new(&pattern)
                    .map(|re| (r.flow, re, r.label))
                    .map_err(|e| KeeperError::Validation(format!("rule for {}: {e}", r.label)))
            })
            .collect::<KeeperResult<_>>()?;
        Ok(Self { rules })
    }

    pub fn label_for(&self, description: &str, amount: Decimal) -> &'static str {
        let flow = if amount.is_sign_negative() && !amount.is_zero() {
            Flow::Out
        } else {
            Flow::In
        };
        self.rules
            .iter()
            .filter(|(f, _, _)| *f == Flow::Any || *f == flow)
            .find(|(_, re, _)| re.is_match(description))
            .map(|(_, _, label)| *label)
            .unwrap_or(UNCATEGORIZED)
    }
}

impl Oracle for RuleOracle {
    fn classify(&self, description: &str, amount: Decimal) -> KeeperResult<String> {
        Ok(self.label_for(description, amount).to_string())
    }
}
