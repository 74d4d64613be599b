use slug::slugify;
use std::sync::atomic::{AtomicI64, Ordering};

/// Slugs that would shadow the `/category/create` and `/tag/create` routes.
pub const RESERVED_SLUGS: [&str; 1] = ["create"];

pub fn generate_slug(title: &str) -> String {
    match transliterate(title) {
        Some(latin) => slugify(latin),
        None => slugify(title),
    }
}

pub fn validate_slug(slug: &str) -> bool {
    if slug.is_empty() || slug.len() > 200 {
        return false;
    }
    slug.chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
}

pub fn is_reserved(slug: &str) -> bool {
    RESERVED_SLUGS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(slug.trim()))
}

/// Reverse-transliterates Russian Cyrillic into Latin script.
///
/// Returns `None` when the text holds no Cyrillic letters, meaning the source
/// language could not be detected and the caller should use the text as is.
pub fn transliterate(text: &str) -> Option<String> {
    if !text.chars().any(is_cyrillic) {
        return None;
    }

    let mut out = String::with_capacity(text.len() * 2);
    for c in text.chars() {
        match latin_for(c) {
            Some(latin) => {
                if c.is_uppercase() {
                    let mut chars = latin.chars();
                    if let Some(first) = chars.next() {
                        out.extend(first.to_uppercase());
                        out.push_str(chars.as_str());
                    }
                } else {
                    out.push_str(latin);
                }
            }
            None => out.push(c),
        }
    }
    Some(out)
}

fn is_cyrillic(c: char) -> bool {
    matches!(c, '\u{0400}'..='\u{04FF}')
}

fn latin_for(c: char) -> Option<&'static str> {
    let lower = c.to_lowercase().next()?;
    let latin = match lower {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' => "e",
        'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "j",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "ts",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "ju",
        'я' => "ja",
        _ => return None,
    };
    Some(latin)
}

/// Source of post slug suffixes.
///
/// Suffixes are Unix timestamps in seconds, bumped past the previous value
/// whenever two posts are created within the same second, so a clock never
/// hands out the same suffix twice.
#[derive(Debug, Default)]
pub struct SlugClock {
    last: AtomicI64,
}

impl SlugClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// A clock that only hands out suffixes greater than `last`.
    pub fn starting_after(last: i64) -> Self {
        Self {
            last: AtomicI64::new(last),
        }
    }

    /// Moves the clock past a suffix issued elsewhere.
    pub fn advance_past(&self, seen: i64) {
        self.last.fetch_max(seen, Ordering::AcqRel);
    }

    pub fn next_suffix(&self) -> i64 {
        self.next_after(chrono::Utc::now().timestamp())
    }

    fn next_after(&self, now: i64) -> i64 {
        let mut current = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(current + 1);
            match self
                .last
                .compare_exchange_weak(current, next, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => current = actual,
            }
        }
    }
}

/// Builds the server-side slug of a post: the slugified title followed by a
/// clock suffix.
pub fn post_slug(title: &str, clock: &SlugClock) -> String {
    let base = generate_slug(title);
    let suffix = clock.next_suffix();
    if base.is_empty() {
        suffix.to_string()
    } else {
        format!("{}-{}", base, suffix)
    }
}

/// The clock suffix at the end of a post slug, if it has one.
pub fn slug_suffix(slug: &str) -> Option<i64> {
    slug.rsplit('-').next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seeded_clock_continues_after_last() {
        let clock = SlugClock::starting_after(1_700_000_005);
        assert_eq!(clock.next_after(1_700_000_000), 1_700_000_006);
    }

    #[test]
    fn test_advance_past_only_moves_forward() {
        let clock = SlugClock::new();
        clock.next_after(500);
        clock.advance_past(100);
        assert_eq!(clock.next_after(0), 501);
        clock.advance_past(900);
        assert_eq!(clock.next_after(0), 901);
    }

    #[test]
    fn test_slug_suffix() {
        assert_eq!(slug_suffix("rust-2024-1700000000"), Some(1_700_000_000));
        assert_eq!(slug_suffix("1700000000"), Some(1_700_000_000));
        assert_eq!(slug_suffix("hello-world"), None);
    }

    #[test]
    fn test_clock_bumps_within_same_second() {
        let clock = SlugClock::new();
        assert_eq!(clock.next_after(1_700_000_000), 1_700_000_000);
        assert_eq!(clock.next_after(1_700_000_000), 1_700_000_001);
        assert_eq!(clock.next_after(1_700_000_000), 1_700_000_002);
    }

    #[test]
    fn test_clock_follows_wall_time_when_ahead() {
        let clock = SlugClock::new();
        clock.next_after(100);
        assert_eq!(clock.next_after(500), 500);
    }

    #[test]
    fn test_clock_never_goes_backwards() {
        let clock = SlugClock::new();
        clock.next_after(500);
        assert_eq!(clock.next_after(100), 501);
    }
}
