//! Trader dialogue.
//!
//! Pure presentation: picks a line for a decision that has already been
//! made. Nothing here feeds back into prices.

use rust_decimal::Decimal;

use super::personality::Personality;
use crate::random::RandomSource;

/// Outcome category a line is chosen for.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Outcome {
    Accept,
    /// Trader asks for this much more cash.
    Counter(Decimal),
    Reject,
    /// Trader opens with a cash offer for a card.
    Offer(Decimal),
}

fn pool(personality: Personality, outcome: &Outcome) -> &'static [&'static str] {
    use Personality::*;
    match (outcome, personality) {
        (Outcome::Accept, Collector) => &[
            "That fills a gap in my binder. Deal!",
            "Exactly what my set was missing. Accepted.",
            "I've hunted for these for ages. We have a deal!",
        ],
        (Outcome::Accept, Investor) => &[
            "The numbers check out. Deal.",
            "A sound position. I'll take it.",
            "Acceptable return. We have a deal.",
        ],
        (Outcome::Accept, Casual) => &[
            "Sounds good to me!",
            "Nice, let's do it!",
            "Sure thing, deal!",
        ],
        (Outcome::Accept, Competitive) => &[
            "That sharpens my deck. Accepted.",
            "These will serve me well. Deal.",
            "A strategic pickup. Done.",
        ],
        (Outcome::Counter(_), Collector) => &[
            "Close, but I'd need {amount} more to make it fair.",
            "Add {amount} and it goes in my collection.",
        ],
        (Outcome::Counter(_), Investor) => &[
            "I see a gap of {amount}. Cover it and we're done.",
            "Add {amount} and the trade makes sense.",
        ],
        (Outcome::Counter(_), Casual) => &[
            "Throw in {amount} and we're even?",
            "Just {amount} more and it's a deal!",
        ],
        (Outcome::Counter(_), Competitive) => &[
            "I require {amount} on top.",
            "{amount} more and this works for me.",
        ],
        (Outcome::Reject, Collector) => &[
            "That doesn't help my collection enough.",
            "Not the cards I'm after, sorry.",
        ],
        (Outcome::Reject, Investor) => &[
            "The return isn't there. I'll pass.",
            "Doesn't meet my criteria.",
        ],
        (Outcome::Reject, Casual) => &[
            "I'll pass on this one, thanks.",
            "Not really my thing right now.",
        ],
        (Outcome::Reject, Competitive) => &[
            "That weakens my position. Declined.",
            "I need better value than that.",
        ],
        (Outcome::Offer(_), Collector) => &[
            "That would fit my collection perfectly. How about {amount}?",
            "I need that one for my set. Would you take {amount}?",
        ],
        (Outcome::Offer(_), Investor) => &[
            "That card has upside. I'll pay {amount}.",
            "{amount} seems fair for it.",
        ],
        (Outcome::Offer(_), Casual) => &[
            "Cool card! Would you take {amount}?",
            "I like that one. {amount}?",
        ],
        (Outcome::Offer(_), Competitive) => &[
            "I could use that. {amount} is my offer.",
            "{amount} for it?",
        ],
    }
}

/// A line for `outcome` in the voice of `personality`.
pub fn line_for(personality: Personality, outcome: Outcome, rng: &mut dyn RandomSource) -> String {
    let lines = pool(personality, &outcome);
    let line = lines[rng.pick_index(lines.len())];
    match outcome {
        Outcome::Counter(amount) | Outcome::Offer(amount) => {
            line.replace("{amount}", &format!("${:.2}", amount))
        }
        Outcome::Accept | Outcome::Reject => line.to_string(),
    }
}
