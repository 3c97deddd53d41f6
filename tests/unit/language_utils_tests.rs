/*!
 * Tests for language code utilities
 */

use smartdub::language_utils::{
    language_codes_match, normalize_to_part1_or_part2t, normalize_to_part2t, resolve_language_name,
    validate_language_code, LanguageCodeType,
};

#[test]
fn test_validateLanguageCode_shouldClassifyCodes() {
    assert_eq!(validate_language_code("en").unwrap(), LanguageCodeType::Part1);
    assert_eq!(validate_language_code("spa").unwrap(), LanguageCodeType::Part2T);
    assert_eq!(validate_language_code("ger").unwrap(), LanguageCodeType::Part2B);
    assert_eq!(validate_language_code(" FR ").unwrap(), LanguageCodeType::Part1);
    assert!(validate_language_code("xx").is_err());
    assert!(validate_language_code("english").is_err());
}

#[test]
fn test_normalize_shouldAcceptCodesAndNames() {
    assert_eq!(normalize_to_part2t("es").unwrap(), "spa");
    assert_eq!(normalize_to_part2t("fre").unwrap(), "fra");
    assert_eq!(normalize_to_part1_or_part2t("deu").unwrap(), "de");
    assert_eq!(normalize_to_part1_or_part2t("Spanish").unwrap(), "es");
    assert_eq!(normalize_to_part1_or_part2t("spanish").unwrap(), "es");
    assert!(normalize_to_part1_or_part2t("Klingonese").is_err());
}

#[test]
fn test_resolveLanguageName_shouldReturnEnglishName() {
    assert_eq!(resolve_language_name("es").unwrap(), "Spanish");
    assert_eq!(resolve_language_name("jpn").unwrap(), "Japanese");
    assert_eq!(resolve_language_name("French").unwrap(), "French");
    assert!(resolve_language_name("").is_err());
}

#[test]
fn test_languageCodesMatch_acrossFormats_shouldMatch() {
    assert!(language_codes_match("en", "eng"));
    assert!(language_codes_match("de", "ger"));
    assert!(language_codes_match("es", "Spanish"));
    assert!(!language_codes_match("en", "fr"));
    assert!(!language_codes_match("en", "zz"));
}
