//! Offline question bank used whenever generation is unavailable.

use super::model::Question;

/// Raw bank entries: `(prompt, a, b)`.
const BANK: [(&str, &str, &str); 12] = [
    (
        "During rides, you prefer:",
        "A calm, quiet ride where we can relax with little to no conversation.",
        "A friendly ride with light conversation to make the trip feel social and welcoming.",
    ),
    (
        "Pickup timing matters most when it is:",
        "Right on schedule, so I can plan my day confidently around exact pickup times.",
        "Flexible within a few minutes, as long as updates are shared clearly and early.",
    ),
    (
        "For route planning you value:",
        "The fastest route overall, even if it changes day to day based on traffic.",
        "A consistent, predictable route that helps me avoid uncertainty and stress.",
    ),
    (
        "In shared rides you prioritize:",
        "Lower trip cost, even if that means minor detours or a slightly longer ride.",
        "Higher comfort, with fewer detours and a smoother, more direct ride experience.",
    ),
    (
        "When plans change, you prefer:",
        "Immediate real-time updates so I can quickly adapt and make new plans.",
        "One clear summary message before pickup with all key changes in one place.",
    ),
    (
        "Driver behavior you value more:",
        "Smooth, steady driving that feels safe and comfortable throughout the trip.",
        "Fast and efficient driving that helps us arrive as quickly as possible.",
    ),
    (
        "For recurring trips, you'd rather:",
        "Ride with familiar people to build trust and predictable ride habits over time.",
        "Ride with whoever is available if it improves convenience and flexibility.",
    ),
    (
        "You care most about:",
        "Reducing environmental impact through efficient shared rides and fewer vehicles.",
        "Reducing travel uncertainty with dependable timing and clear expectations.",
    ),
    (
        "At pickup points, you prefer:",
        "The closest pickup location, even if it is slightly less visible to others.",
        "A safer, well-lit, and clearly visible pickup location, even if it is farther.",
    ),
    (
        "You feel best matched with riders who are:",
        "Highly punctual and reliable about arriving exactly when they say they will.",
        "Easygoing and adaptable when small delays or changes happen.",
    ),
    (
        "For wait time tolerance, you prefer:",
        "No waiting at pickup, so rides start exactly at the planned time.",
        "A short wait of up to five minutes, if communication stays clear and respectful.",
    ),
    (
        "For communication style, you prefer:",
        "Brief and direct messages that focus only on what is essential.",
        "Warm, conversational messages that feel personal and friendly.",
    ),
];

/// The built-in question bank, with ids `q1..q12`.
pub fn default_bank() -> Vec<Question> {
    BANK.iter()
        .enumerate()
        .map(|(i, (prompt, a, b))| Question::new(super::model::positional_id(i), *prompt, *a, *b))
        .collect()
}
