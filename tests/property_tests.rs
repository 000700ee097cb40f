//! Property-based tests for telemetry_log using proptest

use proptest::prelude::*;
use telemetry_log::prelude::*;
use telemetry_log::{LogContext, FieldRecorder};

fn any_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::Fatal),
    ]
}

// ============================================================================
// LogLevel Tests
// ============================================================================

proptest! {
    /// Level names parse back case-insensitively
    #[test]
    fn test_log_level_name_roundtrip(level in any_level(), upper in any::<bool>()) {
        let name = if upper { level.to_str().to_string() } else { level.to_str().to_lowercase() };
        let parsed: LogLevel = name.parse().unwrap();
        prop_assert_eq!(level, parsed);
    }

    /// Ordering follows the numeric value
    #[test]
    fn test_log_level_ordering(a in any_level(), b in any_level()) {
        prop_assert_eq!(a.cmp(&b), (a as u8).cmp(&(b as u8)));
    }

    /// Only 0..=4 are valid numeric levels
    #[test]
    fn test_numeric_levels(value in any::<u8>()) {
        let result = LogLevel::try_from(value);
        prop_assert_eq!(result.is_ok(), value <= 4);
    }

    /// An entry passes exactly when its level reaches the threshold
    #[test]
    fn test_threshold_gate(threshold in any_level(), level in any_level()) {
        let sink = MemorySink::new();
        let logger = Logger::builder()
            .level(threshold)
            .without_console()
            .sink(sink.clone())
            .build()
            .unwrap();

        if level != LogLevel::Fatal {
            logger.log(level, "probe", &[]);
            prop_assert_eq!(sink.count() == 1, level >= threshold);
        }
    }
}

// ============================================================================
// Field context Tests
// ============================================================================

proptest! {
    /// The latest write of a key wins after flattening
    #[test]
    fn test_last_write_wins(writes in prop::collection::vec(("[a-d]", any::<i64>()), 1..40)) {
        let mut context = LogContext::new();
        for (key, value) in &writes {
            context.i64(key, *value);
        }

        let flat = context.flatten();
        prop_assert_eq!(context.len(), writes.len());
        for (key, value) in flat {
            let last = writes.iter().rev().find(|(k, _)| *k == key).map(|(_, v)| *v);
            prop_assert_eq!(Some(FieldValue::Int(last.unwrap())), Some(value));
        }
    }

    /// Deriving never changes the parent's base context
    #[test]
    fn test_derivation_is_persistent(keys in prop::collection::vec("[a-z]{1,6}", 0..10)) {
        let root = Logger::builder().without_console().build().unwrap();
        let mut derived = root.clone();
        for key in &keys {
            let before = derived.base_context();
            let next = derived.with_ctx(ctx::bool(key.clone(), true));
            prop_assert_eq!(derived.base_context(), before);
            derived = next;
        }
        prop_assert!(root.base_context().is_empty());
        prop_assert_eq!(derived.base_context().len(), keys.len());
    }
}

// ============================================================================
// Entry Tests
// ============================================================================

proptest! {
    /// Messages never contain raw line breaks or tabs (prevents log injection)
    #[test]
    fn test_message_sanitization(message in ".*") {
        let entry = Entry::new(LogLevel::Info, &message, Default::default());

        prop_assert!(!entry.message.contains('\n'));
        prop_assert!(!entry.message.contains('\r'));
        prop_assert!(!entry.message.contains('\t'));
        if message.contains('\n') {
            prop_assert!(entry.message.contains("\\n"));
        }
    }

    /// Field keys and values never break the one-line-per-entry layout
    #[test]
    fn test_field_sanitization(key in "\\PC*[\n\r]?\\PC*", value in ".*[\n\r\u{b}]?.*") {
        let mut fields = telemetry_log::Fields::new();
        fields.insert(key, FieldValue::String(value.clone()));
        fields.insert("err".to_string(), FieldValue::Error(value));
        let entry = Entry::new(LogLevel::Info, "ok", fields);

        for format in [OutputFormat::Text, OutputFormat::Logfmt] {
            let line = format.format(&entry, &Default::default());
            prop_assert!(!line.contains('\n'));
            prop_assert!(!line.contains('\r'));
            prop_assert!(!line.chars().any(char::is_control));
        }
    }

    /// Console formats never panic and JSON output always parses
    #[test]
    fn test_json_output_parses(message in ".*", key in "[a-z_]{1,12}", value in ".*") {
        let mut fields = telemetry_log::Fields::new();
        fields.insert(key.clone(), FieldValue::String(value.clone()));
        let entry = Entry::new(LogLevel::Warn, &message, fields);

        let line = OutputFormat::Json.format(&entry, &Default::default());
        let parsed: serde_json::Value = serde_json::from_str(&line).unwrap();
        prop_assert_eq!(parsed["level"].as_str(), Some("warning"));

        let _ = OutputFormat::Text.format(&entry, &Default::default());
        let _ = OutputFormat::Logfmt.format(&entry, &Default::default());
    }
}
