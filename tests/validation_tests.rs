use keeper_bot::utils::validation::*;

#[cfg(test)]
mod validation_tests {
    use super::*;

    // Record name validation tests
    #[test]
    fn test_valid_record_names() {
        let valid_names = vec![
            ("note", "note"),
            ("Shopping_List", "shopping_list"),
            ("trip-2024", "trip-2024"),
            ("  padded  ", "padded"),
            ("a", "a"),
        ];

        for (input, expected) in valid_names {
            let result = validate_record_name(input);
            assert_eq!(result.unwrap(), expected, "Should accept name: {}", input);
        }

        let longest = "n".repeat(MAX_RECORD_NAME_LEN);
        assert!(validate_record_name(&longest).is_ok());
    }

    #[test]
    fn test_invalid_record_names() {
        let invalid_names = vec![
            "".to_string(),
            "   ".to_string(),
            "two words".to_string(),
            "menu:list".to_string(),
            "emoji🎲".to_string(),
            "n".repeat(MAX_RECORD_NAME_LEN + 1),
        ];

        for name in invalid_names {
            assert!(validate_record_name(&name).is_err(), "Should reject name: {}", name);
        }
    }

    // Field parsing tests
    #[test]
    fn test_plain_text_goes_to_default_field() {
        let fields = parse_fields("buy milk and eggs").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields.get(DEFAULT_FIELD).map(String::as_str), Some("buy milk and eggs"));
    }

    #[test]
    fn test_key_value_pairs_become_fields() {
        let fields = parse_fields("city=Berlin  Lang=de").unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields.get("city").map(String::as_str), Some("Berlin"));
        assert_eq!(fields.get("lang").map(String::as_str), Some("de"), "keys are normalized");
    }

    #[test]
    fn test_mixed_text_is_stored_verbatim() {
        let fields = parse_fields("a=1 and more").unwrap();
        assert_eq!(fields.get(DEFAULT_FIELD).map(String::as_str), Some("a=1 and more"));
    }

    #[test]
    fn test_invalid_field_input() {
        assert!(parse_fields("").is_err());
        assert!(parse_fields("   ").is_err());
        assert!(parse_fields("city=").is_err(), "empty value in a pair");
        assert!(parse_fields("bad:key=1").is_err());
        assert!(parse_fields(&"x".repeat(MAX_VALUE_LEN + 1)).is_err());

        let too_many: Vec<String> = (0..=MAX_FIELDS).map(|i| format!("k{i}=v")).collect();
        assert!(parse_fields(&too_many.join(" ")).is_err());
    }

    #[test]
    fn test_value_length_counts_characters() {
        let value = "é".repeat(MAX_VALUE_LEN);
        assert!(validate_field_value(&value).is_ok());
    }

    // User id validation tests
    #[test]
    fn test_parse_user_id() {
        assert_eq!(parse_user_id("123456789").unwrap(), 123456789);
        assert_eq!(parse_user_id(" 42 ").unwrap(), 42);
        assert!(parse_user_id("0").is_err());
        assert!(parse_user_id("-5").is_err());
        assert!(parse_user_id("abc").is_err());
        assert!(parse_user_id("").is_err());
    }

    #[test]
    fn test_split_first_word() {
        assert_eq!(split_first_word("note buy  milk"), ("note", "buy  milk"));
        assert_eq!(split_first_word("  note  "), ("note", ""));
        assert_eq!(split_first_word(""), ("", ""));
    }
}
