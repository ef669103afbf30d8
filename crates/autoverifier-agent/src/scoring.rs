use crate::claim_analysis::Stance;
use crate::credibility::round_to;
use autoverifier_core::ScoringConfig;

/// Deterministic trust score for one evidence item.
///
/// - base = source credibility, clamped to [0, 1]
/// - stance: `+stance_bonus` for assertions, `-stance_bonus` for speculation/questions
/// - `-fallacy_penalty` per fallacy, counting at most `max_penalized_fallacies`
/// - `+length_bonus` once the content reaches `length_threshold` characters
///
/// The result is rounded to 3 decimals and clamped to [0, 1].
pub fn compute_trust_score(
    config: &ScoringConfig,
    cred: f64,
    stance: Stance,
    fallacies: &[String],
    content_len: usize,
) -> f64 {
    let base = if cred.is_nan() { 0.0 } else { cred.clamp(0.0, 1.0) };

    let stance_bonus = match stance {
        Stance::Assertion => config.stance_bonus,
        Stance::Speculation | Stance::Question => -config.stance_bonus,
        Stance::Opinion => 0.0,
    };

    let penalized = fallacies.len().min(config.max_penalized_fallacies);
    let fallacy_penalty = -config.fallacy_penalty * penalized as f64;

    let length_bonus = if content_len >= config.length_threshold {
        config.length_bonus
    } else {
        0.0
    };

    round_to(base + stance_bonus + fallacy_penalty + length_bonus, 3).clamp(0.0, 1.0)
}
