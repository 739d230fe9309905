//! Field rules and formatting helpers.
//!
//! All the functions in this module are pure: they look at a record and
//! return what is wrong with it, without touching the session state.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::*;

/// Number of digits of a CPF.
pub const NATIONAL_ID_LEN: usize = 11;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    // Same shape as the historical forms: something@something.something
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap()
});

/// Upper-cases the first letter of each word and lower-cases the rest.
///
/// The whitespace is kept as typed, so that the respondent can keep typing
/// the next word.
pub fn capitalize_words(s: &str) -> String {
    let mut res = String::with_capacity(s.len());
    let mut word_start = true;
    for c in s.chars() {
        if c.is_whitespace() {
            res.push(c);
            word_start = true;
        } else if word_start {
            res.extend(c.to_uppercase());
            word_start = false;
        } else {
            res.extend(c.to_lowercase());
        }
    }
    res
}

pub fn national_id_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Formats a CPF as `XXX.XXX.XXX-XX`.
///
/// Incomplete inputs are returned as bare digits.
pub fn format_national_id(s: &str) -> String {
    let digits = national_id_digits(s);
    if digits.len() != NATIONAL_ID_LEN {
        return digits;
    }
    format!(
        "{}.{}.{}-{}",
        &digits[0..3],
        &digits[3..6],
        &digits[6..9],
        &digits[9..11]
    )
}

// Computes a CPF check digit over the given digits. The weights go from
// `len + 1` down to 2.
fn check_digit(digits: &[u32]) -> u32 {
    let top = digits.len() as u32 + 1;
    let sum: u32 = digits
        .iter()
        .enumerate()
        .map(|(i, d)| d * (top - i as u32))
        .sum();
    let rest = (sum * 10) % 11;
    if rest >= 10 {
        0
    } else {
        rest
    }
}

/// Checks the two check digits of a CPF. Punctuation is ignored.
pub fn is_valid_national_id(s: &str) -> bool {
    let digits: Vec<u32> = national_id_digits(s)
        .chars()
        .filter_map(|c| c.to_digit(10))
        .collect();
    if digits.len() != NATIONAL_ID_LEN {
        return false;
    }
    // The all-zero sequence passes the checksum.
    if digits.iter().all(|d| *d == 0) {
        return false;
    }
    check_digit(&digits[0..9]) == digits[9] && check_digit(&digits[0..10]) == digits[10]
}

pub fn is_valid_email(s: &str) -> bool {
    EMAIL_RE.is_match(s)
}

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

fn required(value: &str, key: FieldKey) -> Option<FieldError> {
    if is_blank(value) {
        Some(FieldError::Required(key))
    } else {
        None
    }
}

/// The error of a single field, if any.
pub fn validate_field(
    record: &FormRecord,
    variant: &FormVariant,
    key: FieldKey,
) -> Option<FieldError> {
    match key {
        FieldKey::FullName => {
            if is_blank(&record.full_name) {
                Some(FieldError::Required(key))
            } else if record.full_name.split_whitespace().count() < 2 {
                Some(FieldError::IncompleteName)
            } else {
                None
            }
        }
        FieldKey::Email => {
            if is_blank(&record.email) {
                Some(FieldError::Required(key))
            } else if !is_valid_email(&record.email) {
                Some(FieldError::InvalidEmail)
            } else {
                None
            }
        }
        FieldKey::BirthPlace => required(&record.birth_place, key),
        FieldKey::NationalId => {
            if is_blank(&record.national_id) {
                Some(FieldError::Required(key))
            } else if !is_valid_national_id(&record.national_id) {
                Some(FieldError::InvalidNationalId)
            } else {
                None
            }
        }
        FieldKey::BirthDate => match record.birth_date {
            Some(_) => None,
            None => Some(FieldError::Required(key)),
        },
        FieldKey::PurposeStatement => required(&record.purpose_statement, key),
        FieldKey::ApplicationMode => match record.application_mode {
            Some(_) => None,
            None => Some(FieldError::Required(key)),
        },
        FieldKey::ApplicatorName => match record.application_mode {
            Some(ApplicationMode::Assisted) => required(&record.applicator_name, key),
            _ => None,
        },
        FieldKey::ActivityChoice => match record.activity_choice {
            Some(_) => None,
            None => Some(FieldError::Required(key)),
        },
        FieldKey::BehaviorFractal if variant.has_behavior_fractal() => {
            required(record.behavior_fractal.as_deref().unwrap_or(""), key)
        }
        FieldKey::BehaviorFractal => None,
        FieldKey::Answer(slot, field) => {
            let answer = record.answer(slot);
            match field {
                AnswerField::Text => required(&answer.answer_text, key),
                AnswerField::Rank => match answer.rank {
                    Some(_) => None,
                    None => Some(FieldError::Required(key)),
                },
                AnswerField::Justification => required(&answer.justification, key),
            }
        }
        FieldKey::FinalFeedback => required(&record.final_feedback, key),
    }
}

/// All the errors of the record, for the fields of the variant.
pub fn validate_all(record: &FormRecord, variant: &FormVariant) -> ErrorMap {
    FieldKey::all(variant)
        .into_iter()
        .filter_map(|key| validate_field(record, variant, key).map(|e| (key, e)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn national_id_checksum() {
        assert!(is_valid_national_id("52998224725"));
        assert!(is_valid_national_id("529.982.247-25"));
        assert!(is_valid_national_id("12345678909"));
        assert!(!is_valid_national_id("12345678900"));
        assert!(!is_valid_national_id("52998224726"));
    }

    #[test]
    fn national_id_zeros() {
        assert!(!is_valid_national_id("00000000000"));
        assert!(!is_valid_national_id("000.000.000-00"));
    }

    #[test]
    fn national_id_repeated_digits() {
        assert!(is_valid_national_id("11111111111"));
        assert!(is_valid_national_id("222.222.222-22"));
        assert!(!is_valid_national_id("11111111112"));
    }

    #[test]
    fn national_id_wrong_length() {
        let full = "52998224725";
        for len in 0..full.len() {
            assert!(!is_valid_national_id(&full[..len]), "len {}", len);
        }
        assert!(!is_valid_national_id("529982247250"));
    }

    #[test]
    fn national_id_format() {
        assert_eq!(format_national_id("52998224725"), "529.982.247-25");
        assert_eq!(format_national_id("529.982.247-25"), "529.982.247-25");
        assert_eq!(format_national_id("5299"), "5299");
        assert_eq!(format_national_id("abc"), "");
    }

    #[test]
    fn capitalize() {
        assert_eq!(capitalize_words("maria silva"), "Maria Silva");
        assert_eq!(capitalize_words("MARIA DA SILVA"), "Maria Da Silva");
        assert_eq!(capitalize_words("joão  "), "João  ");
        assert_eq!(capitalize_words(" ana"), " Ana");
        assert_eq!(capitalize_words(""), "");
    }

    #[test]
    fn email_shape() {
        assert!(is_valid_email("maria@example.com"));
        assert!(is_valid_email("a.b@c.d.e"));
        assert!(!is_valid_email("maria@example"));
        assert!(!is_valid_email("maria example@x.com"));
        assert!(!is_valid_email("maria@@example.com"));
        assert!(!is_valid_email("@example.com"));
        assert!(!is_valid_email("maria@.com"));
    }

    #[test]
    fn empty_record_errors() {
        let variant = FormVariant::standard();
        let errors = validate_all(&FormRecord::empty(&variant), &variant);
        assert_eq!(errors.get(&FieldKey::FullName), Some(&FieldError::Required(FieldKey::FullName)));
        // Not asked unless the application is assisted.
        assert_eq!(errors.get(&FieldKey::ApplicatorName), None);
        assert_eq!(errors.get(&FieldKey::BehaviorFractal), None);
        // 8 identity and application fields, 9 answer cells, the feedback.
        assert_eq!(errors.len(), 18);
    }

    #[test]
    fn behavior_fractal_required_in_variant() {
        let variant = FormVariant::behavior_fractal();
        let errors = validate_all(&FormRecord::empty(&variant), &variant);
        assert_eq!(
            errors.get(&FieldKey::BehaviorFractal),
            Some(&FieldError::Required(FieldKey::BehaviorFractal))
        );
        assert_eq!(errors.len(), 19);
    }

    #[test]
    fn single_word_name() {
        let variant = FormVariant::standard();
        let mut record = FormRecord::empty(&variant);
        record.full_name = "Maria ".to_string();
        assert_eq!(
            validate_field(&record, &variant, FieldKey::FullName),
            Some(FieldError::IncompleteName)
        );
        record.full_name = "Maria Silva".to_string();
        assert_eq!(validate_field(&record, &variant, FieldKey::FullName), None);
    }
}
