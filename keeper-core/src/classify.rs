//! Category label sanitizing and the label -> ledger type policy.
//!
//! Oracle output is free text. It is reduced to a single title-cased label before
//! the policy looks at it, so the policy never sees quotes, markdown or extra lines.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ledger::LedgerType;

pub const UNCATEGORIZED: &str = "Uncategorized";

const QUOTES: [char; 3] = ['"', '\'', '`'];

/// Reduce an oracle response to a category label.
///
/// First non-empty line, quote characters removed, whitespace collapsed, title-cased.
pub fn sanitize_label(response: &str) -> String {
    let first = response
        .lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .unwrap_or("");
    let unquoted: String = first.chars().filter(|c| !QUOTES.contains(c)).collect();
    let collapsed = unquoted.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() {
        return UNCATEGORIZED.to_string();
    }
    title_case(&collapsed)
}

/// Uppercase the first letter of every alphabetic run, lowercase the rest
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

/// Keyword table mapping a category label and amount sign to a ledger type.
///
/// Outflows (`amount < 0`) are payables when the label carries a payable keyword,
/// plain expenses otherwise. Inflows are revenue when the label carries a revenue
/// keyword, receivables otherwise. Matching ignores case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationPolicy {
    #[serde(default = "default_payable_keywords")]
    pub payable_keywords: Vec<String>,
    #[serde(default = "default_revenue_keywords")]
    pub revenue_keywords: Vec<String>,
}

fn default_payable_keywords() -> Vec<String> {
    vec!["Expense".to_string(), "Supplies".to_string()]
}

fn default_revenue_keywords() -> Vec<String> {
    vec!["Revenue".to_string()]
}

impl Default for ClassificationPolicy {
    fn default() -> Self {
        Self {
            payable_keywords: default_payable_keywords(),
            revenue_keywords: default_revenue_keywords(),
        }
    }
}

impl ClassificationPolicy {
    pub fn classify(&self, category: &str, amount: Decimal) -> LedgerType {
        if amount.is_sign_negative() && !amount.is_zero() {
            if contains_any(category, &self.payable_keywords) {
                LedgerType::AccountsPayable
            } else {
                LedgerType::Expense
            }
        } else if contains_any(category, &self.revenue_keywords) {
            LedgerType::Revenue
        } else {
            LedgerType::AccountsReceivable
        }
    }
}

fn contains_any(category: &str, keywords: &[String]) -> bool {
    let haystack = category.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| haystack.contains(&k.trim().to_lowercase()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn amt(cents: i64) -> Decimal {
        Decimal::new(cents, 2)
    }

    #[test]
    fn test_sanitize_first_line_and_quotes() {
        let raw = "  \"hosting expenses\"\nBecause AWS is a cloud provider.";
        assert_eq!(sanitize_label(raw), "Hosting Expenses");
    }

    #[test]
    fn test_sanitize_skips_leading_blank_lines() {
        assert_eq!(sanitize_label("\n\n 'subscription revenue' \n"), "Subscription Revenue");
    }

    #[test]
    fn test_sanitize_empty_is_uncategorized() {
        assert_eq!(sanitize_label("   \n ''\n"), UNCATEGORIZED);
        assert_eq!(sanitize_label(""), UNCATEGORIZED);
    }

    #[test]
    fn test_title_case_matches_word_boundaries() {
        assert_eq!(title_case("OFFICE supplies"), "Office Supplies");
        assert_eq!(title_case("saas/cloud-hosting"), "Saas/Cloud-Hosting");
        assert_eq!(title_case("3d printing"), "3D Printing");
    }

    #[test]
    fn test_negative_hosting_is_expense() {
        let policy = ClassificationPolicy::default();
        assert_eq!(policy.classify("Hosting", amt(-5000)), LedgerType::Expense);
    }

    #[test]
    fn test_negative_hosting_expenses_is_payable() {
        let policy = ClassificationPolicy::default();
        assert_eq!(
            policy.classify("Hosting Expenses", amt(-5000)),
            LedgerType::AccountsPayable
        );
        assert_eq!(
            policy.classify("Office Supplies", amt(-1299)),
            LedgerType::AccountsPayable
        );
    }

    #[test]
    fn test_positive_revenue_is_revenue() {
        let policy = ClassificationPolicy::default();
        assert_eq!(policy.classify("Revenue", amt(20000)), LedgerType::Revenue);
        assert_eq!(
            policy.classify("Subscription Revenue", amt(20000)),
            LedgerType::Revenue
        );
    }

    #[test]
    fn test_positive_without_revenue_is_receivable() {
        let policy = ClassificationPolicy::default();
        assert_eq!(
            policy.classify("Consulting Invoice", amt(20000)),
            LedgerType::AccountsReceivable
        );
    }

    #[test]
    fn test_zero_counts_as_inflow() {
        let policy = ClassificationPolicy::default();
        assert_eq!(policy.classify("Refund", Decimal::ZERO), LedgerType::AccountsReceivable);
        assert_eq!(policy.classify("Refund", amt(0)), LedgerType::AccountsReceivable);
    }

    #[test]
    fn test_custom_keywords() {
        let policy = ClassificationPolicy {
            payable_keywords: vec!["services".into()],
            revenue_keywords: vec!["sales".into(), "  ".into()],
        };
        assert_eq!(
            policy.classify("Legal Services", amt(-100)),
            LedgerType::AccountsPayable
        );
        assert_eq!(policy.classify("Hosting Expenses", amt(-100)), LedgerType::Expense);
        assert_eq!(policy.classify("Product Sales", amt(100)), LedgerType::Revenue);
        assert_eq!(policy.classify("Other", amt(100)), LedgerType::AccountsReceivable);
    }
}
