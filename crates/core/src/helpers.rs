//! Identifier generation and text helpers

use chrono::{DateTime, Utc};

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    let mut hash = FNV_OFFSET;
    for byte in bytes {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Generate a segment id for an objective, keyed to today
///
/// Format: `SEG_YYYYMMDD_XXXXXXXX`. The hash half depends only on the
/// objective text, so the same objective on the same calendar day yields
/// the same id (idempotent overwrite in the cache).
pub fn generate_segment_id(campaign_objective: &str) -> String {
    generate_segment_id_at(campaign_objective, Utc::now())
}

/// Segment id for an explicit timestamp; the deterministic core of
/// [`generate_segment_id`]
pub fn generate_segment_id_at(campaign_objective: &str, at: DateTime<Utc>) -> String {
    let digest = fnv1a(campaign_objective.as_bytes());
    let folded = (digest ^ (digest >> 32)) as u32;
    format!("SEG_{}_{:08X}", at.format("%Y%m%d"), folded)
}

/// Sanitize a string for use as a query identifier
///
/// Keeps ASCII alphanumerics and underscores, replaces everything else with
/// underscores, prefixes an underscore when the result would start with a
/// digit, and lowercases.
pub fn sanitize_identifier(identifier: &str) -> String {
    let mut sanitized: String = identifier
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        sanitized.insert(0, '_');
    }

    sanitized.to_ascii_lowercase()
}

/// Turn a snake_case token into a display name ("free_shipping" -> "Free Shipping")
pub fn title_case(snake: &str) -> String {
    snake
        .split('_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_segment_id_is_deterministic_per_day() {
        let day = Utc.with_ymd_and_hms(2025, 3, 14, 9, 30, 0).unwrap();
        let later_same_day = Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 59).unwrap();

        let a = generate_segment_id_at("recover abandoned carts", day);
        let b = generate_segment_id_at("recover abandoned carts", later_same_day);
        assert_eq!(a, b);
        assert!(a.starts_with("SEG_20250314_"));

        let other = generate_segment_id_at("win back lapsed customers", day);
        assert_ne!(a, other);

        let next_day = Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 1).unwrap();
        let c = generate_segment_id_at("recover abandoned carts", next_day);
        assert_ne!(a, c);
    }

    #[test]
    fn test_segment_id_shape() {
        let day = Utc.with_ymd_and_hms(2025, 1, 2, 0, 0, 0).unwrap();
        let id = generate_segment_id_at("objective", day);
        let parts: Vec<&str> = id.split('_').collect();
        assert_eq!(parts[0], "SEG");
        assert_eq!(parts[1], "20250102");
        assert_eq!(parts[2].len(), 8);
        assert!(parts[2].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_sanitize_identifier() {
        assert_eq!(sanitize_identifier("free shipping!"), "free_shipping_");
        assert_eq!(sanitize_identifier("Discount"), "discount");
        assert_eq!(sanitize_identifier("7day_offer"), "_7day_offer");
        assert_eq!(sanitize_identifier("drop table; --"), "drop_table____");
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("free_shipping"), "Free Shipping");
        assert_eq!(
            title_case("personalized_discount_offer"),
            "Personalized Discount Offer"
        );
        assert_eq!(title_case("clv_score"), "Clv Score");
    }
}
