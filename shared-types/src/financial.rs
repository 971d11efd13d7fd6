use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// Sentinel written to every figure when a statement cannot be extracted
pub const ZERO_AMOUNT: &str = "0";

/// Figures extracted from a financial statement.
///
/// Amounts are decimal strings in millions of USD rounded to 2 decimals.
/// When the statement is not in USD or the figures are missing, all three
/// amounts are "0" and `note` says why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema, TS)]
#[serde(deny_unknown_fields)]
pub struct FinancialExtraction {
    /// The revenue in the financial statement, in millions of USD, rounded to 2 decimals
    pub revenue: String,
    /// The cost of goods sold in the financial statement, in millions of USD, rounded to 2 decimals
    pub cogs: String,
    /// The net income in the financial statement, in millions of USD, rounded to 2 decimals
    pub net_income: String,
    /// Informs the user if the currency is not USD or if the financial information is unavailable
    pub note: String,
}

/// Outcome of an extraction as seen by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "kebab-case")]
pub enum ExtractionStatus {
    Extracted,
    Unavailable,
}

impl FinancialExtraction {
    /// Zeroed result carrying the reason in `note`
    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            revenue: ZERO_AMOUNT.to_string(),
            cogs: ZERO_AMOUNT.to_string(),
            net_income: ZERO_AMOUNT.to_string(),
            note: note.into(),
        }
    }

    /// Build a result from amounts already expressed in millions of USD
    pub fn from_millions(revenue: f64, cogs: f64, net_income: f64) -> Self {
        Self {
            revenue: format_millions(revenue),
            cogs: format_millions(cogs),
            net_income: format_millions(net_income),
            note: String::new(),
        }
    }

    pub fn amounts(&self) -> [(&'static str, &str); 3] {
        [
            ("revenue", self.revenue.as_str()),
            ("cogs", self.cogs.as_str()),
            ("net_income", self.net_income.as_str()),
        ]
    }

    /// True when every figure is zero ("0", "0.00", ...)
    pub fn is_zeroed(&self) -> bool {
        self.amounts()
            .iter()
            .all(|(_, value)| matches!(value.trim().parse::<f64>(), Ok(v) if v == 0.0))
    }

    pub fn status(&self) -> ExtractionStatus {
        if self.is_zeroed() {
            ExtractionStatus::Unavailable
        } else {
            ExtractionStatus::Extracted
        }
    }
}

/// Format an amount in millions with exactly two decimals
pub fn format_millions(value: f64) -> String {
    let formatted = format!("{:.2}", value);
    // "-0.00" would otherwise leak out of small negative amounts
    if formatted == "-0.00" {
        "0.00".to_string()
    } else {
        formatted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_exactly_four_string_keys() {
        let extraction = FinancialExtraction::from_millions(120.456, 45.123, 30.789);
        let value = serde_json::to_value(&extraction).unwrap();
        let object = value.as_object().unwrap();

        assert_eq!(object.len(), 4);
        for key in ["revenue", "cogs", "net_income", "note"] {
            assert!(object.get(key).unwrap().is_string(), "{key} should be a string");
        }

        let back: FinancialExtraction = serde_json::from_value(value).unwrap();
        assert_eq!(back, extraction);
    }

    #[test]
    fn test_from_millions_rounds_to_two_decimals() {
        let extraction = FinancialExtraction::from_millions(120.456, 45.123, 30.789);
        assert_eq!(extraction.revenue, "120.46");
        assert_eq!(extraction.cogs, "45.12");
        assert_eq!(extraction.net_income, "30.79");
        assert_eq!(extraction.note, "");
        assert_eq!(extraction.status(), ExtractionStatus::Extracted);
    }

    #[test]
    fn test_unavailable_is_zeroed() {
        let extraction = FinancialExtraction::unavailable("The statement is reported in EUR, not USD");
        assert_eq!(extraction.revenue, "0");
        assert_eq!(extraction.cogs, "0");
        assert_eq!(extraction.net_income, "0");
        assert!(extraction.is_zeroed());
        assert_eq!(extraction.status(), ExtractionStatus::Unavailable);
    }

    #[test]
    fn test_zero_with_decimals_counts_as_zeroed() {
        let extraction = FinancialExtraction {
            revenue: "0.00".to_string(),
            cogs: "0".to_string(),
            net_income: "0.0".to_string(),
            note: "No figures found".to_string(),
        };
        assert!(extraction.is_zeroed());

        let partial = FinancialExtraction {
            net_income: "-3.50".to_string(),
            ..extraction
        };
        assert!(!partial.is_zeroed());
    }

    #[test]
    fn test_rejects_unknown_and_missing_keys() {
        let extra = r#"{"revenue":"1","cogs":"1","net_income":"1","note":"","currency":"USD"}"#;
        assert!(serde_json::from_str::<FinancialExtraction>(extra).is_err());

        let missing = r#"{"revenue":"1","cogs":"1","note":""}"#;
        assert!(serde_json::from_str::<FinancialExtraction>(missing).is_err());

        let numeric = r#"{"revenue":1.0,"cogs":"1","net_income":"1","note":""}"#;
        assert!(serde_json::from_str::<FinancialExtraction>(numeric).is_err());
    }

    #[test]
    fn test_format_millions_negative_zero() {
        assert_eq!(format_millions(-0.001), "0.00");
        assert_eq!(format_millions(-12.5), "-12.50");
    }
}
