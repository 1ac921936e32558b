//! Address and range helpers for spreadsheet-style A1 references.

use crate::{AddressError, CellAddress, CellRange, Result};

pub const MAX_ROW_COUNT: u32 = 1_048_576;
pub const MAX_COLUMN_COUNT: u32 = 16_384;

/// Strip `$` markers and upper-case an address (`$a$1:b2` => `A1:B2`).
pub fn normalize_address(address: &str) -> String {
    address
        .trim()
        .chars()
        .filter(|c| *c != '$')
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Converts a single-cell address (e.g. "B2", "$C$3") to 1-based coordinates.
pub fn address_to_coordinates(address: &str) -> Result<CellAddress> {
    let normalized = normalize_address(address);
    let split = normalized
        .find(|c: char| c.is_ascii_digit())
        .ok_or_else(|| AddressError::InvalidAddress(address.to_string()))?;
    let (letters, digits) = normalized.split_at(split);

    if letters.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(AddressError::InvalidAddress(address.to_string()));
    }

    let col = column_letters_to_number(letters)
        .ok_or_else(|| AddressError::InvalidAddress(address.to_string()))?;
    let row = digits
        .parse::<u32>()
        .map_err(|_| AddressError::InvalidAddress(address.to_string()))?;

    if row == 0 || row > MAX_ROW_COUNT || col > MAX_COLUMN_COUNT {
        return Err(AddressError::InvalidAddress(address.to_string()));
    }

    Ok(CellAddress::new(row, col))
}

/// Convert 1-based coordinates to a relative A1 address (1,1 => "A1", 1,27 => "AA1").
pub fn coordinates_to_address(row: u32, col: u32) -> String {
    format!("{}{}", column_number_to_letters(col), row)
}

/// Column letters to a 1-based column number (A=1, Z=26, AA=27).
pub fn column_letters_to_number(letters: &str) -> Option<u32> {
    if letters.is_empty() {
        return None;
    }
    let mut result: u32 = 0;
    for ch in letters.chars() {
        let upper = ch.to_ascii_uppercase();
        if !upper.is_ascii_uppercase() {
            return None;
        }
        let value = u32::from(upper as u8 - b'A' + 1);
        result = result.checked_mul(26)?.checked_add(value)?;
    }
    Some(result)
}

/// 1-based column number to letters. Base 26 without a zero digit.
pub fn column_number_to_letters(mut number: u32) -> String {
    if number < 1 {
        return "A".to_string();
    }
    let mut letters = Vec::new();
    while number > 0 {
        let rem = ((number - 1) % 26) as u8;
        letters.push((b'A' + rem) as char);
        number = (number - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// Parse a range address into its rectangular bounds.
///
/// Accepts a single cell ("B2", equal to the range B2:B2), a cell range
/// ("A1:B10"), a full-column range ("A:C") or a full-row range ("1:3").
pub fn parse_range(address: &str) -> Result<CellRange> {
    let normalized = normalize_address(address);
    let Some((left, right)) = normalized.split_once(':') else {
        return address_to_coordinates(&normalized).map(CellRange::single);
    };

    if let (Ok(start), Ok(end)) = (address_to_coordinates(left), address_to_coordinates(right)) {
        return Ok(CellRange::new(start, end).normalized());
    }

    if let (Some(start), Some(end)) = (
        full_column(left).and_then(column_letters_to_number),
        full_column(right).and_then(column_letters_to_number),
    ) {
        return Ok(CellRange::new(
            CellAddress::new(1, start),
            CellAddress::new(MAX_ROW_COUNT, end),
        )
        .normalized());
    }

    if let (Some(start), Some(end)) = (full_row(left), full_row(right)) {
        return Ok(CellRange::new(
            CellAddress::new(start, 1),
            CellAddress::new(end, MAX_COLUMN_COUNT),
        )
        .normalized());
    }

    Err(AddressError::InvalidAddress(address.to_string()))
}

/// Whether `cell` falls within the bounds of `range` (both given as addresses).
pub fn range_contains(range: &str, cell: &str) -> Result<bool> {
    let bounds = parse_range(range)?;
    let cell = address_to_coordinates(cell)?;
    Ok(bounds.contains(&cell))
}

/// Split `Sheet1!A1` or `'My Sheet'!A1` into an unquoted sheet name and address.
pub fn split_sheet_prefix(qualified: &str) -> (Option<String>, &str) {
    match qualified.rsplit_once('!') {
        Some((sheet, address)) => (Some(unquote_sheet_name(sheet)), address),
        None => (None, qualified),
    }
}

/// Remove single quotes from a sheet name (`'It''s'` => `It's`).
pub fn unquote_sheet_name(name: &str) -> String {
    let trimmed = name.strip_prefix('\'').unwrap_or(name);
    let trimmed = trimmed.strip_suffix('\'').unwrap_or(trimmed);
    trimmed.replace("''", "'")
}

fn full_column(part: &str) -> Option<&str> {
    (!part.is_empty() && part.chars().all(|c| c.is_ascii_alphabetic())).then_some(part)
}

fn full_row(part: &str) -> Option<u32> {
    if part.is_empty() || !part.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    part.parse::<u32>().ok().filter(|row| *row >= 1)
}
