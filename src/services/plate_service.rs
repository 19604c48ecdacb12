use crate::error::PlateError;
use crate::local_storage::attachment::Attachment;
use crate::local_storage::car::PARTS_PLACEHOLDER;
use crate::local_storage::core_local_storage::capitalize;

/// Country codes that mark a plate as foreign; such plates are kept as typed.
const FOREIGN_PREFIXES: [&str; 2] = ["RU", "EU"];

const DIGIT_COUNT: usize = 5;
const LETTER_COUNT: usize = 2;

/// Brings a plate number to the domestic `1234 AB-5` form.
///
/// Spare parts have no plate, so their label is built from the record id
/// and the entered text instead. Plates starting with a country code are
/// returned without the code and otherwise untouched. Characters other
/// than letters and digits are skipped, so canonical output normalizes
/// to itself.
pub fn normalize_plate(
    raw: &str,
    record_id: Option<i64>,
    attachment: Option<Attachment>,
) -> Result<String, PlateError> {
    if attachment == Some(Attachment::SpareParts) {
        return Ok(spare_parts_label(raw, record_id));
    }

    let upper = raw.trim().to_uppercase();
    if upper.is_empty() {
        return Err(PlateError::Empty);
    }

    if let Some(prefix) = FOREIGN_PREFIXES.iter().find(|p| upper.starts_with(*p)) {
        let rest = upper[prefix.len()..].trim();
        if rest.is_empty() {
            return Err(PlateError::Empty);
        }
        return Ok(rest.to_string());
    }

    let mut digits = String::new();
    let mut letters = String::new();

    for c in upper.chars() {
        if c.is_ascii_digit() {
            digits.push(c);
        } else if c.is_alphabetic() {
            letters.push(latin_lookalike(c).ok_or(PlateError::UnsupportedCharacter(c))?);
        }
    }

    if digits.len() != DIGIT_COUNT || letters.len() != LETTER_COUNT {
        return Err(PlateError::LengthMismatch { digits, letters });
    }

    let (number, region) = digits.split_at(DIGIT_COUNT - 1);
    let region = region.chars().next().unwrap_or('0');
    if !('1'..='7').contains(&region) {
        return Err(PlateError::RegionCode { letters, region });
    }

    Ok(format!("{} {}-{}", number, letters, region))
}

fn spare_parts_label(raw: &str, record_id: Option<i64>) -> String {
    let text = match raw.trim() {
        "" => PARTS_PLACEHOLDER.to_string(),
        text => capitalize(text),
    };
    match record_id {
        Some(id) => format!("{}: {}", id, text),
        None => text,
    }
}

/// Maps an upper-case letter to the Latin letter used on plates.
fn latin_lookalike(c: char) -> Option<char> {
    let latin = match c {
        'А' | 'A' => 'A',
        'В' | 'B' => 'B',
        'Е' | 'E' => 'E',
        'К' | 'K' => 'K',
        'М' | 'M' => 'M',
        'Н' | 'H' => 'H',
        'О' | 'O' => 'O',
        'Р' | 'P' => 'P',
        'С' | 'C' => 'C',
        'Т' | 'T' => 'T',
        'Х' | 'X' => 'X',
        'У' | 'Y' => 'Y',
        'I' => 'I',
        _ => return None,
    };
    Some(latin)
}
