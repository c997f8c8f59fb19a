//! Quotes bundled with the application, used when every quote source fails.
use rand::seq::SliceRandom;

use crate::Category;

/// A quote that ships with the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BundledQuote {
    pub text: &'static str,
    pub author: &'static str,
}

const fn q(text: &'static str, author: &'static str) -> BundledQuote {
    BundledQuote { text, author }
}

const INSPIRATIONAL: &[BundledQuote] = &[
    q("The only way to do great work is to love what you do.", "Steve Jobs"),
    q("Believe you can and you're halfway there.", "Theodore Roosevelt"),
    q(
        "The future belongs to those who believe in the beauty of their dreams.",
        "Eleanor Roosevelt",
    ),
];

const MOTIVATIONAL: &[BundledQuote] = &[
    q(
        "Success is not final, failure is not fatal: It is the courage to continue that counts.",
        "Winston Churchill",
    ),
    q(
        "The only limit to our realization of tomorrow is our doubts of today.",
        "Franklin D. Roosevelt",
    ),
    q(
        "It does not matter how slowly you go as long as you do not stop.",
        "Confucius",
    ),
];

const LIFE: &[BundledQuote] = &[
    q(
        "In the end, it's not the years in your life that count. It's the life in your years.",
        "Abraham Lincoln",
    ),
    q(
        "Life is what happens when you're busy making other plans.",
        "John Lennon",
    ),
    q("The purpose of our lives is to be happy.", "Dalai Lama"),
];

const SUCCESS: &[BundledQuote] = &[
    q(
        "Success is not the key to happiness. Happiness is the key to success. If you love what you are doing, you will be successful.",
        "Albert Schweitzer",
    ),
    q(
        "The road to success and the road to failure are almost exactly the same.",
        "Colin R. Davis",
    ),
    q(
        "Success usually comes to those who are too busy to be looking for it.",
        "Henry David Thoreau",
    ),
];

const FUNNY: &[BundledQuote] = &[
    q("I'm not lazy, I'm on energy saving mode.", "Unknown"),
    q("I'm not arguing, I'm just explaining why I'm right.", "Unknown"),
    q("I'm not procrastinating, I'm doing side quests.", "Unknown"),
];

const LOVE: &[BundledQuote] = &[
    q(
        "The best thing to hold onto in life is each other.",
        "Audrey Hepburn",
    ),
    q("We are most alive when we're in love.", "John Updike"),
    q(
        "The best and most beautiful things in this world cannot be seen or even heard, but must be felt with the heart.",
        "Helen Keller",
    ),
];

/// All bundled quotes for a category.
pub fn bundled_quotes(category: Category) -> &'static [BundledQuote] {
    match category {
        Category::Inspirational => INSPIRATIONAL,
        Category::Motivational => MOTIVATIONAL,
        Category::Life => LIFE,
        Category::Success => SUCCESS,
        Category::Funny => FUNNY,
        Category::Love => LOVE,
    }
}

/// A random bundled quote for a category.
pub fn random_bundled_quote(category: Category) -> BundledQuote {
    let quotes = bundled_quotes(category);
    // every category ships at least one quote
    *quotes
        .choose(&mut rand::thread_rng())
        .unwrap_or(&quotes[0])
}
