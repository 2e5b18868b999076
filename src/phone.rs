/// Normalize a phone number for carrier submission: digits only, no
/// separators, `+`/country code (977 Nepal, 91 India) and leading zeros
/// stripped. Returns an empty string for empty input.
pub fn clean_for_carrier(phone: &str) -> String {
    let mut p: String = phone.chars().filter(|c| !c.is_whitespace()).collect();

    if let Some(rest) = p.strip_prefix('+') {
        p = rest.to_string();
    }

    for prefix in ["977", "91"] {
        if let Some(rest) = p.strip_prefix(prefix) {
            p = rest.to_string();
            break;
        }
    }

    p.trim_start_matches('0').chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Canonical display form stored on the shipment snapshot: `+977` plus the
/// last ten digits of the subscriber number.
pub fn format_with_country_code(phone: &str) -> String {
    let cleaned: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    let cleaned = cleaned.trim_start_matches('0');
    let without_country = cleaned.strip_prefix("+977").unwrap_or(cleaned);

    let digits: Vec<char> = without_country.chars().collect();
    let last_ten: String = if digits.len() > 10 {
        digits[digits.len() - 10..].iter().collect()
    } else {
        without_country.to_string()
    };

    format!("+977{last_ten}")
}

#[cfg(test)]
mod tests {
    use super::{clean_for_carrier, format_with_country_code};

    #[test]
    fn equivalent_inputs_normalize_to_the_same_carrier_form() {
        let expected = "9800000000";
        assert_eq!(clean_for_carrier("+977 9800000000"), expected);
        assert_eq!(clean_for_carrier("09800000000"), expected);
        assert_eq!(clean_for_carrier("9800000000"), expected);
    }

    #[test]
    fn indian_country_code_is_stripped() {
        assert_eq!(clean_for_carrier("+91 9812345678"), "9812345678");
    }

    #[test]
    fn separators_are_dropped() {
        assert_eq!(clean_for_carrier("980-00-00000"), "9800000000");
    }

    #[test]
    fn empty_input_stays_empty() {
        assert_eq!(clean_for_carrier(""), "");
    }

    #[test]
    fn country_code_format_keeps_last_ten_digits() {
        assert_eq!(format_with_country_code("9800000000"), "+9779800000000");
        assert_eq!(format_with_country_code("09800000000"), "+9779800000000");
        assert_eq!(format_with_country_code("+9779800000000"), "+9779800000000");
    }
}
