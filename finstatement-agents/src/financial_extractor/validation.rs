use crate::runtime::{OutputSchema, SchemaViolation};
use regex::Regex;
use shared_types::{FinancialExtraction, ZERO_AMOUNT};
use std::sync::LazyLock;

// Millions of USD with at most two decimals; no symbols or separators
static AMOUNT_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^-?[0-9]+(\.[0-9]{1,2})?$").expect("amount pattern compiles"));

pub fn validate_amount(field: &str, value: &str) -> Result<(), SchemaViolation> {
    if AMOUNT_PATTERN.is_match(value) {
        Ok(())
    } else {
        Err(SchemaViolation::new(
            field,
            format!(
                "must be a decimal amount in millions with at most 2 decimals, got {:?}",
                value
            ),
        ))
    }
}

impl OutputSchema for FinancialExtraction {
    fn validate(&self) -> Result<(), SchemaViolation> {
        for (field, value) in self.amounts() {
            validate_amount(field, value)?;
        }

        if self.note.trim().is_empty() {
            if self.is_zeroed() {
                return Err(SchemaViolation::new(
                    "note",
                    "must explain why no figures were extracted",
                ));
            }
        } else if let Some((field, _)) = self
            .amounts()
            .into_iter()
            .find(|(_, value)| *value != ZERO_AMOUNT)
        {
            // A note means the extraction failed; partial figures are not allowed
            return Err(SchemaViolation::new(
                field,
                format!("must be \"{}\" when note reports a failure", ZERO_AMOUNT),
            ));
        }

        Ok(())
    }
}
