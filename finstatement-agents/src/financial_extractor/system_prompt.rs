use shared_types::ZERO_AMOUNT;

pub const AGENT_NAME: &str = "financial_structured_output_agent";
pub const OUTPUT_KEY: &str = "statement";
pub const AGENT_DESCRIPTION: &str =
    "You are a helpful agent who reads financial reports and extracts the required data.";

pub fn build_instruction() -> String {
    format!(
        r#"{description}

## Target Data Structure

Reply with a single JSON object that has exactly these four string fields:
- **revenue**: The revenue in the financial statement, in millions of USD, rounded to 2 decimals
- **cogs**: The cost of goods sold in the financial statement, in millions of USD, rounded to 2 decimals
- **net_income**: The net income in the financial statement, in millions of USD, rounded to 2 decimals
- **note**: Informs the user if the currency is not USD or if the financial information is unavailable

## Rules

1. Amounts are plain decimal strings such as "120.46" or "-3.10". Do not include currency
   symbols, units, thousands separators or words.
2. Convert amounts to millions of USD before rounding (e.g. $1,250,000 becomes "1.25").
3. If the financial statement is not reported in USD, set revenue, cogs and net_income to
   "{zero}" and explain in note that the currency is not USD. Do not convert currencies.
4. If the revenue, cost of goods sold or net income cannot be found in the text, set
   revenue, cogs and net_income to "{zero}" and explain in note which information is missing.
5. Otherwise leave note as an empty string.

## Examples

Input: Acme Corp FY2023: Revenue $120.456M, COGS $45.123M, Net Income $30.789M
Output: {{"revenue":"120.46","cogs":"45.12","net_income":"30.79","note":""}}

Input: In FY2023, Acme Corp (reporting in EUR) had revenue of 100M EUR...
Output: {{"revenue":"{zero}","cogs":"{zero}","net_income":"{zero}","note":"The financial statement is reported in EUR, not USD."}}

Input: Acme Corp hired 40 engineers last year.
Output: {{"revenue":"{zero}","cogs":"{zero}","net_income":"{zero}","note":"No revenue, cost of goods sold or net income was found in the text."}}

## Important Notes

- Reply with the JSON object only, no Markdown and no commentary
- Every field must be present, even when it is "{zero}" or empty"#,
        description = AGENT_DESCRIPTION,
        zero = ZERO_AMOUNT,
    )
}
