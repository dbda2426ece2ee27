//! Conversions between campus term codes (`2016-D`), warehouse term ids
//! (`2168`) and term catalog slugs (`fall-2016`).

use crate::utils::error::{EnrollmentError, Result};

const SEASONS: [(&str, &str, char); 3] = [
    ("B", "spring", '2'),
    ("C", "summer", '5'),
    ("D", "fall", '8'),
];

fn invalid(code: &str) -> EnrollmentError {
    EnrollmentError::InvalidTermCode {
        code: code.to_string(),
    }
}

/// `2016-D` → `("2016", "D")`; a warehouse id is decoded first.
pub fn split_term_code(term_code: &str) -> Result<(String, String)> {
    if let Some((year, code)) = term_code.split_once('-') {
        if year.len() == 4 && year.chars().all(|c| c.is_ascii_digit()) {
            if SEASONS.iter().any(|(c, _, _)| *c == code) {
                return Ok((year.to_string(), code.to_string()));
            }
        }
        return Err(invalid(term_code));
    }
    from_edo_id(term_code)
}

/// `2168` → `("2016", "D")`
pub fn from_edo_id(term_id: &str) -> Result<(String, String)> {
    let digits: Vec<char> = term_id.chars().collect();
    if digits.len() != 4 || !digits.iter().all(char::is_ascii_digit) {
        return Err(invalid(term_id));
    }
    let century = match digits[0] {
        '1' => 1900,
        '2' => 2000,
        _ => return Err(invalid(term_id)),
    };
    let yy = digits[1].to_digit(10).unwrap_or(0) * 10 + digits[2].to_digit(10).unwrap_or(0);
    let (code, _, _) = SEASONS
        .iter()
        .find(|(_, _, digit)| *digit == digits[3])
        .ok_or_else(|| invalid(term_id))?;
    Ok(((century + yy).to_string(), code.to_string()))
}

/// `2016-D` → `2168`. Warehouse ids pass through.
pub fn to_edo_id(term_code: &str) -> Result<String> {
    let (year, code) = split_term_code(term_code)?;
    let century = match &year[..2] {
        "19" => '1',
        "20" => '2',
        _ => return Err(invalid(term_code)),
    };
    let (_, _, digit) = SEASONS
        .iter()
        .find(|(c, _, _)| *c == code)
        .ok_or_else(|| invalid(term_code))?;
    Ok(format!("{}{}{}", century, &year[2..], digit))
}

/// `2016-D` → `fall-2016`
pub fn to_slug(term_code: &str) -> Result<String> {
    let (year, code) = split_term_code(term_code)?;
    let (_, season, _) = SEASONS
        .iter()
        .find(|(c, _, _)| *c == code)
        .ok_or_else(|| invalid(term_code))?;
    Ok(format!("{}-{}", season, year))
}
