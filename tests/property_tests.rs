//! Property-based tests for rust_log_pipeline using proptest

use proptest::prelude::*;
use rust_log_pipeline::prelude::*;
use rust_log_pipeline::{mask, sanitize_line, LevelFilter, Redactor, Sampler};

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warning),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel / LevelFilter Tests
// ============================================================================

proptest! {
    /// Test that LogLevel string conversions roundtrip correctly
    #[test]
    fn test_log_level_str_roundtrip(level in any_level()) {
        let parsed: LogLevel = level.to_str().parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Test that LogLevel ordering matches the ordinals
    #[test]
    fn test_log_level_ordering(level1 in any_level(), level2 in any_level()) {
        prop_assert_eq!(level1 <= level2, level1.ordinal() <= level2.ordinal());
        prop_assert_eq!(level1 < level2, level1.ordinal() < level2.ordinal());
    }

    /// Raising the minimum never admits a level that was rejected before
    #[test]
    fn test_level_filter_monotonic(
        level in any_level(),
        min1 in any_level(),
        min2 in any_level(),
    ) {
        let (low, high) = if min1 <= min2 { (min1, min2) } else { (min2, min1) };
        let filter = LevelFilter::new(high);
        let admitted_high = filter.should_log(level);
        filter.set_min_level(low);
        let admitted_low = filter.should_log(level);

        prop_assert!(!admitted_high || admitted_low);
        prop_assert_eq!(admitted_low, level >= low);
    }

    /// Test that parsing accepts case-insensitive input
    #[test]
    fn test_log_level_case_insensitive(level in any_level(), use_lower in any::<bool>()) {
        let input = if use_lower {
            level.to_str().to_lowercase()
        } else {
            level.to_str().to_string()
        };
        prop_assert_eq!(input.parse::<LogLevel>().unwrap(), level);
    }

    /// Unknown names are configuration errors
    #[test]
    fn test_log_level_invalid_parse(invalid in "[xyzq]{1,12}") {
        let err = invalid.parse::<LogLevel>().unwrap_err();
        prop_assert!(err.is_configuration());
    }
}

// ============================================================================
// Masking Tests
// ============================================================================

proptest! {
    /// Masked output has the same character count (at least 1)
    #[test]
    fn test_mask_preserves_length(value in ".{0,64}") {
        let masked = mask(&value);
        let len = value.chars().count();
        prop_assert_eq!(masked.result.chars().count(), len.max(1));
    }

    /// Visible head and tail match the input; the middle is all stars
    #[test]
    fn test_mask_keeps_head_and_tail(value in ".{0,64}") {
        let masked = mask(&value);
        let input: Vec<char> = value.chars().collect();
        let output: Vec<char> = masked.result.chars().collect();
        let len = input.len();

        prop_assert_eq!(&output[..masked.head_kept], &input[..masked.head_kept]);
        prop_assert_eq!(
            &output[output.len() - masked.tail_kept..],
            &input[len - masked.tail_kept..]
        );
        let middle = &output[masked.head_kept..output.len() - masked.tail_kept];
        prop_assert!(middle.iter().all(|c| *c == '*'));

        let expected_kept = match len {
            0..=3 => 0,
            4 => 1,
            _ => 2,
        };
        prop_assert_eq!(masked.head_kept, expected_kept);
        prop_assert_eq!(masked.tail_kept, expected_kept);
    }
}

// ============================================================================
// Sampler Tests
// ============================================================================

proptest! {
    /// Exactly floor(n / threshold) of the first n calls are admitted
    #[test]
    fn test_sampler_admission_count(rate in 0.01f64..1.0, calls in 1usize..500) {
        let sampler = Sampler::new();
        sampler.set_sample_rate("key", rate).unwrap();

        let threshold = (1.0 / rate).floor() as usize;
        let admitted = (0..calls).filter(|_| sampler.should_sample("key")).count();
        prop_assert_eq!(admitted, calls / threshold);
    }

    /// Out-of-range rates are rejected and leave the configured rate alone
    #[test]
    fn test_sampler_rejects_out_of_range(
        bad in prop_oneof![1.0001f64..1e6, -1e6f64..-0.0001],
        good in 0.0f64..=1.0,
    ) {
        let sampler = Sampler::new();
        sampler.set_sample_rate("key", good).unwrap();
        prop_assert!(sampler.set_sample_rate("key", bad).is_err());
        prop_assert_eq!(sampler.sample_rate("key"), Some(good));
    }
}

// ============================================================================
// Redaction Tests
// ============================================================================

proptest! {
    /// Non-sensitive fields survive redaction unchanged
    #[test]
    fn test_redaction_keeps_plain_fields(
        key in "[a-z]{1,8}",
        value in ".{0,32}",
        secret in ".{0,32}",
    ) {
        prop_assume!(key != "password");
        let redactor = Redactor::new(SensitiveFields::from_iter(["password"]));

        let input = Object::new()
            .with(key.clone(), value.clone())
            .with("password", secret.clone());
        let output = redactor.redact(&Value::from(input));
        let output = output.as_object().unwrap();

        let plain = output.get(&key).unwrap();
        prop_assert_eq!(plain.as_str(), Some(value.as_str()));
        let masked = output.get("password").unwrap();
        let expected = mask(&secret).result;
        prop_assert_eq!(masked.as_str(), Some(expected.as_str()));
    }
}

// ============================================================================
// Sanitization Tests (Security Critical!)
// ============================================================================

proptest! {
    /// Sanitized text never contains raw line breaks or tabs
    #[test]
    fn test_sanitize_line(message in "(?s).{0,128}") {
        let sanitized = sanitize_line(&message);
        prop_assert!(!sanitized.contains('\n'));
        prop_assert!(!sanitized.contains('\r'));
        prop_assert!(!sanitized.contains('\t'));
    }

    /// A rendered text line is always a single line
    #[test]
    fn test_text_format_single_line(level in any_level(), message in "(?s).{0,128}", label in "(?s).{0,16}") {
        let entry = LogEntry::message(level, message).with_label(label);
        let line = OutputFormat::Text.format(&entry, &TimestampFormat::Iso8601);
        prop_assert!(!line.contains('\n'));
        prop_assert!(!line.contains('\r'));
    }

    /// JSON lines always parse back
    #[test]
    fn test_json_format_parses(level in any_level(), message in "(?s).{0,128}") {
        let entry = LogEntry::message(level, message.clone());
        let line = OutputFormat::Json.format(&entry, &TimestampFormat::Iso8601);
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(parsed["message"].as_str(), Some(message.as_str()));
    }
}
