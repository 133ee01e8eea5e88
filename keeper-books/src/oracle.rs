//! The categorization oracle seam.
//!
//! The processor only needs `classify(description, amount) -> label`. Text-completion
//! backends plug in through [`Completion`] and [`PromptOracle`], which turns a
//! transaction into a prompt. Whatever comes back is untrusted and gets sanitized by
//! the processor before use.

use keeper_core::{format_amount, KeeperError, KeeperResult};
use rust_decimal::Decimal;

/// Something that can label a transaction
pub trait Oracle {
    fn classify(&self, description: &str, amount: Decimal) -> KeeperResult<String>;
}

impl<O: Oracle + ?Sized> Oracle for &O {
    fn classify(&self, description: &str, amount: Decimal) -> KeeperResult<String> {
        (**self).classify(description, amount)
    }
}

impl<O: Oracle + ?Sized> Oracle for Box<O> {
    fn classify(&self, description: &str, amount: Decimal) -> KeeperResult<String> {
        (**self).classify(description, amount)
    }
}

/// A text-completion backend: prompt in, free text out
pub trait Completion {
    fn invoke(&self, prompt: &str) -> KeeperResult<String>;
}

impl<F> Completion for F
where
    F: Fn(&str) -> KeeperResult<String>,
{
    fn invoke(&self, prompt: &str) -> KeeperResult<String> {
        self(prompt)
    }
}

/// Prompt asking for a single short category label
pub fn categorization_prompt(description: &str, amount: Decimal) -> String {
    format!(
        "Categorize this transaction for a SaaS startup's books.\n\
         Description: '{description}'\n\
         Amount: {}\n\n\
         Instructions:\n\
         - Reply with a short category label only, such as 'Hosting Expenses', \
         'Subscription Revenue' or 'Office Supplies'.\n\
         - No explanation, no markdown. One line.",
        format_amount(amount)
    )
}

/// Adapts a [`Completion`] backend to the [`Oracle`] interface
pub struct PromptOracle<C> {
    completion: C,
}

impl<C: Completion> PromptOracle<C> {
    pub fn new(completion: C) -> Self {
        Self { completion }
    }
}

impl<C: Completion> Oracle for PromptOracle<C> {
    fn classify(&self, description: &str, amount: Decimal) -> KeeperResult<String> {
        let prompt = categorization_prompt(description, amount);
        self.completion.invoke(&prompt).map_err(|e| match e {
            KeeperError::Oracle(_) => e,
            other => KeeperError::Oracle(other.to_string()),
        })
    }
}
