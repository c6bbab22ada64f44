// Parsing, formatting and naming helpers.
//
// This module centralizes the "dirty" CSV/number/date handling so the
// rest of the code can assume clean, typed values.
use chrono::{NaiveDate, NaiveTime};
use num_format::{Locale, ToFormattedString};

/// Characters that spreadsheet applications reject in sheet names and that
/// are unsafe in file names on Windows/macOS.
const INVALID_NAME_CHARS: [char; 11] = ['\\', '/', ':', '*', '?', '[', ']', '"', '<', '>', '|'];

/// Excel's hard limit on sheet names.
pub const SHEET_NAME_MAX: usize = 31;

pub const DEFAULT_SHEET_NAME: &str = "Pendentes";

/// Trim a raw field and turn empty strings into `None`.
pub fn clean_text(s: Option<String>) -> Option<String> {
    let s = s?;
    let t = s.trim();
    if t.is_empty() {
        None
    } else if t.len() == s.len() {
        Some(s)
    } else {
        Some(t.to_string())
    }
}

/// Parse a numeric field while being forgiving about formatting.
///
/// - Trims whitespace.
/// - Rejects values that contain alphabetic characters.
/// - Accepts a decimal comma (`"1,5"`) when there is no decimal point.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    match s.parse::<f64>() {
        Ok(v) => Some(v),
        Err(_) if !s.contains('.') => s.replace(',', ".").parse::<f64>().ok(),
        Err(_) => None,
    }
}

/// Parse a day-first calendar date.
///
/// Accepts `D/M/YYYY` with `/`, `-` or `.` separators, two-digit years
/// (read as 20YY), ISO `YYYY-MM-DD`, and an optional trailing `HH:MM[:SS]`.
/// Anything else, including impossible dates like `31/02/2025`, is `None`:
/// one bad value never fails the whole file.
pub fn parse_date_dayfirst(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    let mut pieces = s.splitn(2, |c: char| c == ' ' || c == 'T');
    let date_part = pieces.next()?;
    if let Some(time_part) = pieces.next() {
        let time_part = time_part.trim();
        let valid_time = NaiveTime::parse_from_str(time_part, "%H:%M:%S").is_ok()
            || NaiveTime::parse_from_str(time_part, "%H:%M").is_ok();
        if !valid_time {
            return None;
        }
    }

    let parts: Vec<&str> = date_part.split(&['/', '-', '.'][..]).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit())) {
        return None;
    }
    let num = |p: &str| p.parse::<u32>().ok();

    let (year, month, day) = if parts[0].len() == 4 {
        (num(parts[0])? as i32, num(parts[1])?, num(parts[2])?)
    } else {
        if parts[0].len() > 2 || parts[1].len() > 2 {
            return None;
        }
        let year = match parts[2].len() {
            2 => 2000 + num(parts[2])? as i32,
            4 => num(parts[2])? as i32,
            _ => return None,
        };
        (year, num(parts[1])?, num(parts[0])?)
    };
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parse the `DD/MM/YYYY` form used on the command line.
pub fn parse_cutoff(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}

pub fn format_date(d: NaiveDate) -> String {
    d.format("%d/%m/%Y").to_string()
}

/// Format a count with `.` as the thousands separator (`9.855`), the way
/// the dashboard's audience reads numbers.
pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en).replace(',', ".")
}

pub fn format_pct(v: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, v)
}

/// Parse `#rrggbb`, `rrggbb` or the short `#rgb` form.
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.trim().trim_start_matches('#');
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        6 => Some((
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
        )),
        3 => {
            let digit = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            Some((digit(0)?, digit(1)?, digit(2)?))
        }
        _ => None,
    }
}

fn replace_invalid_and_collapse(s: &str) -> String {
    let replaced: String = s
        .chars()
        .map(|c| if INVALID_NAME_CHARS.contains(&c) { '_' } else { c })
        .collect();
    replaced.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Make a string usable as a worksheet name.
///
/// Invalid characters become `_`, whitespace runs collapse to one space,
/// the result is cut to 31 characters and trimmed again so that applying
/// the function twice gives the same name. A leading or trailing `'`
/// becomes `_`. Empty input falls back to `"Pendentes"`.
pub fn sanitize_sheet_title(s: &str) -> String {
    let collapsed = replace_invalid_and_collapse(s);
    let truncated: String = collapsed.chars().take(SHEET_NAME_MAX).collect();
    let out = truncated.trim_end();
    if out.is_empty() {
        return DEFAULT_SHEET_NAME.to_string();
    }
    // Excel also refuses a leading or trailing apostrophe and the name "History".
    let mut chars: Vec<char> = out.chars().collect();
    let last = chars.len() - 1;
    for i in [0, last] {
        if chars[i] == '\'' {
            chars[i] = '_';
        }
    }
    let mut out: String = chars.into_iter().collect();
    if out.eq_ignore_ascii_case("history") {
        out.push('_');
    }
    out
}

/// Same rules as [`sanitize_sheet_title`] without the length limit.
pub fn sanitize_filename(s: &str) -> String {
    let out = replace_invalid_and_collapse(s);
    if out.is_empty() {
        DEFAULT_SHEET_NAME.to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn parses_day_first_dates() {
        assert_eq!(parse_date_dayfirst(Some("05/03/2024")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some("5/3/2024")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some("05-03-2024")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some("05.03.2024")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some("05/03/24")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some(" 2024-03-05 ")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some("05/03/2024 14:30")), Some(ymd(2024, 3, 5)));
        assert_eq!(parse_date_dayfirst(Some("2024-03-05T08:00:00")), Some(ymd(2024, 3, 5)));
    }

    #[test]
    fn bad_dates_become_missing() {
        assert_eq!(parse_date_dayfirst(Some("31/02/2025")), None);
        assert_eq!(parse_date_dayfirst(Some("13/13/2025")), None);
        assert_eq!(parse_date_dayfirst(Some("not a date")), None);
        assert_eq!(parse_date_dayfirst(Some("")), None);
        assert_eq!(parse_date_dayfirst(Some("+1/02/2025")), None);
        assert_eq!(parse_date_dayfirst(Some("01/02/2025 99:99")), None);
        assert_eq!(parse_date_dayfirst(None), None);
    }

    #[test]
    fn numbers_tolerate_decimal_comma() {
        assert_eq!(parse_f64_safe(Some(" 12 ")), Some(12.0));
        assert_eq!(parse_f64_safe(Some("-3.5")), Some(-3.5));
        assert_eq!(parse_f64_safe(Some("1,5")), Some(1.5));
        assert_eq!(parse_f64_safe(Some("abc")), None);
        assert_eq!(parse_f64_safe(Some("")), None);
    }

    #[test]
    fn clean_text_trims_and_drops_blank() {
        assert_eq!(clean_text(Some("  8553 ".into())), Some("8553".to_string()));
        assert_eq!(clean_text(Some("   ".into())), None);
        assert_eq!(clean_text(None), None);
    }

    #[test]
    fn counts_use_dot_separator() {
        assert_eq!(format_int(9855usize), "9.855");
        assert_eq!(format_int(1234567usize), "1.234.567");
        assert_eq!(format_int(12usize), "12");
    }

    #[test]
    fn hex_colors() {
        assert_eq!(parse_hex_color("#e72914"), Some((0xe7, 0x29, 0x14)));
        assert_eq!(parse_hex_color("0fe267"), Some((0x0f, 0xe2, 0x67)));
        assert_eq!(parse_hex_color("#fff"), Some((255, 255, 255)));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn sheet_titles_are_sanitized() {
        assert_eq!(sanitize_sheet_title("a/b:c*d?e[f]g\"h<i>j|k\\l"), "a_b_c_d_e_f_g_h_i_j_k_l");
        assert_eq!(sanitize_sheet_title("  GEREL   NORTE \t SUL "), "GEREL NORTE SUL");
        assert_eq!(sanitize_sheet_title(""), "Pendentes");
        assert_eq!(sanitize_sheet_title("   "), "Pendentes");
        let long = "X".repeat(40);
        assert_eq!(sanitize_sheet_title(&long).chars().count(), 31);
    }

    #[test]
    fn sheet_titles_never_border_on_apostrophes() {
        assert_eq!(sanitize_sheet_title("'8553"), "_8553");
        assert_eq!(sanitize_sheet_title("UOR '"), "UOR _");
        assert_eq!(sanitize_sheet_title("'"), "_");
        assert_eq!(sanitize_sheet_title("O'Neil"), "O'Neil");
        // The apostrophe only becomes the last char after truncation.
        let cut = format!("{}' tail", "a".repeat(30));
        assert_eq!(sanitize_sheet_title(&cut), format!("{}_", "a".repeat(30)));
        assert_eq!(sanitize_sheet_title("History"), "History_");
    }

    #[test]
    fn sheet_title_sanitizing_is_idempotent() {
        let inputs = [
            "",
            "Pendentes",
            "UOR 123 / Agência: Centro [SP]",
            "abcdefghijklmnopqrstuvwxyz01234 56789",
            "   leading and     trailing   ",
            "ÁÉÍÓÚ ãõç ÁÉÍÓÚ ãõç ÁÉÍÓÚ ãõç ÁÉÍÓÚ",
            "'8553",
            "UOR '",
            "history",
            "abcdefghijklmnopqrstuvwxyz0123' tail",
        ];
        for input in inputs {
            let once = sanitize_sheet_title(input);
            let twice = sanitize_sheet_title(&once);
            assert_eq!(once, twice, "input {input:?}");
            assert!(!once.is_empty());
            assert!(once.chars().count() <= SHEET_NAME_MAX);
        }
    }

    #[test]
    fn filenames_keep_full_length() {
        let long = format!("{} Pendentes", "UOR".repeat(15));
        assert_eq!(sanitize_filename(&long), long);
        assert_eq!(sanitize_filename("a/b Pendentes"), "a_b Pendentes");
        assert_eq!(sanitize_filename(" "), "Pendentes");
    }
}
