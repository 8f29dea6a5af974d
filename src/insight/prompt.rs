//! Prompt text for the insight request.

use crate::models::AnalyticsSummary;

pub const SYSTEM_ROLE: &str =
    "You are a financial analyst who specializes in trading pattern analysis.";

/// Embed the summary as pretty JSON inside the fixed analysis instructions.
pub fn build_prompt(summary: &AnalyticsSummary) -> serde_json::Result<String> {
    let data = serde_json::to_string_pretty(summary)?;

    Ok(format!(
        "You are a financial analyst reviewing trading data.
Here is a summary of the transactions:

{data}

Please analyze this and cover:
1. Trading patterns: which tickers are most traded, any buy/sell imbalances?
2. Concentration risks: any traders or tickers taking up too much of the volume?
3. Unusual activity: anything that stands out as abnormal?
4. Time patterns: when does most trading happen?
5. What should be monitored further?

Use specific numbers from the data. Format with headers and bullet points."
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::{summarize, AnalyticsOptions};
    use crate::pipeline::load_reader;

    #[test]
    fn test_prompt_embeds_summary() {
        let csv = "timestamp,ticker,action,quantity,price,trader_id\n\
                   2024-01-01 09:00:00,NVDA,BUY,7,500,trader_42\n";
        let data = load_reader(csv.as_bytes()).unwrap();
        let summary = summarize(&data.ledger, &AnalyticsOptions::default());
        let prompt = build_prompt(&summary).unwrap();

        assert!(prompt.contains("\"total_transactions\": 1"));
        assert!(prompt.contains("NVDA"));
        assert!(prompt.contains("trader_42"));
        assert!(prompt.contains("Concentration risks"));
        assert!(prompt.ends_with("headers and bullet points."));
    }
}
