use crate::config;
use crate::prompt::AugmentedPrompt;
use std::fmt::Write;

pub const GENERIC_EDUCATIONAL_TEXT: &str = "Options are contracts that give the right, but not the \
obligation, to buy (calls) or sell (puts) an underlying at a set strike price before expiration. \
When comparing contracts, traders usually look at liquidity (volume and open interest), the \
bid/ask spread, implied volatility, and delta, which approximates how much the option moves for \
a one-dollar move in the underlying.";

pub const DISCLAIMER: &str = "This is educational information only, not financial advice.";

const COVERED_CALL_TEXT: &str = "A covered call means holding 100 shares of a stock and selling \
one call option against them. The premium collected is income, but upside above the strike is \
capped, and the shares still carry full downside risk.";

const ZERO_DTE_TEXT: &str = "0DTE options expire the same trading day. They are cheap in dollar \
terms but lose time value very quickly, and small moves in the underlying can swing their price \
sharply in either direction.";

const DATA_UNAVAILABLE_TEXT: &str = "Live screener data could not be loaded right now, so this \
answer sticks to general concepts.";

/// What happened when the chat path tried to load screener data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenerLookup {
    /// The question did not ask for screener data
    Skipped,
    /// The fetch failed
    Unavailable,
    /// The fetch worked but nothing matched
    Empty,
    Loaded,
}

/// Build the templated answer for a chat prompt. No model is involved.
pub fn generate_answer(
    prompt: &AugmentedPrompt,
    symbol: &str,
    lookup: ScreenerLookup,
) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    let lowered = prompt.question.to_lowercase();

    match &prompt.screener_block {
        Some(block) => {
            writeln!(
                out,
                "Here is what the options screener surfaced for {} right now.",
                symbol
            )?;
            writeln!(out)?;
            writeln!(out, "{}", block)?;
            writeln!(out)?;
            writeln!(
                out,
                "How to read these: volume and OI show how actively a contract trades, IV is the \
                 market's implied volatility, delta approximates sensitivity to the underlying, \
                 and premium is the fair-market value per share."
            )?;
        }
        None => {
            if !prompt.question.is_empty() {
                writeln!(out, "You asked: \"{}\"", prompt.question)?;
                writeln!(out)?;
            }
            if lowered.contains("covered call") {
                writeln!(out, "{}", COVERED_CALL_TEXT)?;
                writeln!(out)?;
            }
            if lowered.contains("0dte") || lowered.contains("0 dte") {
                writeln!(out, "{}", ZERO_DTE_TEXT)?;
                writeln!(out)?;
            }
            match lookup {
                ScreenerLookup::Unavailable => {
                    writeln!(out, "{}", DATA_UNAVAILABLE_TEXT)?;
                    writeln!(out)?;
                }
                ScreenerLookup::Empty => {
                    writeln!(
                        out,
                        "The screener returned no matching contracts for {} at the moment.",
                        symbol
                    )?;
                    writeln!(out)?;
                }
                ScreenerLookup::Skipped | ScreenerLookup::Loaded => {}
            }
            writeln!(out, "{}", GENERIC_EDUCATIONAL_TEXT)?;
        }
    }

    writeln!(out)?;
    write!(out, "{}", DISCLAIMER)?;
    Ok(out)
}

/// Cap an answer at roughly `max_tokens` tokens. Zero means no cap.
pub fn truncate_answer(answer: String, max_tokens: u32) -> String {
    if max_tokens == 0 {
        return answer;
    }

    let budget = (max_tokens as usize).saturating_mul(config::CHARS_PER_TOKEN);
    match answer.char_indices().nth(budget) {
        Some((cut, _)) => format!("{}...", answer[..cut].trim_end()),
        None => answer,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let answer = "é".repeat(10);
        let cut = truncate_answer(answer, 1);
        assert_eq!(cut, format!("{}...", "é".repeat(4)));
    }

    #[test]
    fn test_truncate_short_answer_untouched() {
        assert_eq!(truncate_answer("short".into(), 100), "short");
        assert_eq!(truncate_answer("x".repeat(50), 0).len(), 50);
    }

    #[test]
    fn test_empty_lookup_mentions_symbol() {
        let prompt = AugmentedPrompt::new("screener please".into(), None);
        let answer = generate_answer(&prompt, "QQQ", ScreenerLookup::Empty).unwrap();
        assert!(answer.contains("no matching contracts for QQQ"));
        assert!(answer.contains(GENERIC_EDUCATIONAL_TEXT));
    }
}
