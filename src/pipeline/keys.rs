/// `N(M)` token inside a visit-days cell, with byte offsets into the scanned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayToken {
    pub inpatient: u32,
    pub outpatient: u32,
    pub start: usize,
    pub end: usize,
}

fn is_open_paren(character: char) -> bool {
    matches!(character, '(' | '（')
}

fn is_close_paren(character: char) -> bool {
    matches!(character, ')' | '）')
}

fn is_hangul_syllable(character: char) -> bool {
    ('가'..='힣').contains(&character)
}

pub fn strip_whitespace(text: &str) -> String {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .collect()
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Aggregation key for an institution name: Hangul, ASCII letters and digits only, lowercased.
pub fn normalize_institution(name: &str) -> String {
    name.trim()
        .chars()
        .filter(|character| character.is_ascii_alphanumeric() || is_hangul_syllable(*character))
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn normalize_drug(text: &str) -> String {
    text.chars()
        .filter(|character| !character.is_whitespace() && *character != '_')
        .collect()
}

pub fn is_pharmacy(institution_name: &str) -> bool {
    strip_whitespace(institution_name).contains("약국")
}

/// Scans for every `digits(digits)` token, accepting full-width parentheses.
pub fn find_day_tokens(text: &str) -> Vec<DayToken> {
    let characters = text.char_indices().collect::<Vec<_>>();
    let digit_run_end = |from: usize| {
        let mut cursor = from;
        while cursor < characters.len() && characters[cursor].1.is_ascii_digit() {
            cursor += 1;
        }
        cursor
    };
    let byte_at = |position: usize| {
        characters
            .get(position)
            .map_or(text.len(), |(offset, _)| *offset)
    };

    let mut tokens = Vec::new();
    let mut position = 0;
    while position < characters.len() {
        if !characters[position].1.is_ascii_digit() {
            position += 1;
            continue;
        }

        let first_end = digit_run_end(position);
        let Some((_, open)) = characters.get(first_end) else {
            break;
        };
        if !is_open_paren(*open) {
            position = first_end;
            continue;
        }

        let second_end = digit_run_end(first_end + 1);
        let closes = second_end > first_end + 1
            && characters
                .get(second_end)
                .is_some_and(|(_, close)| is_close_paren(*close));
        if !closes {
            position = first_end + 1;
            continue;
        }

        let start = byte_at(position);
        let end = byte_at(second_end + 1);
        let inpatient = text[start..byte_at(first_end)].parse().unwrap_or(0);
        let outpatient = text[byte_at(first_end + 1)..byte_at(second_end)]
            .parse()
            .unwrap_or(0);
        tokens.push(DayToken {
            inpatient,
            outpatient,
            start,
            end,
        });
        position = second_end + 1;
    }

    tokens
}

/// `"N(M)"` yields `N + M`, a bare `"N"` yields `N`, anything else yields 0.
pub fn parse_total_days(text: &str) -> u32 {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return 0;
    }
    if trimmed.chars().all(|character| character.is_ascii_digit()) {
        return trimmed.parse().unwrap_or(0);
    }

    match find_day_tokens(trimmed).as_slice() {
        [token] if token.start == 0 && token.end == trimmed.len() => {
            token.inpatient.saturating_add(token.outpatient)
        }
        _ => 0,
    }
}

/// First number of the first `N(M)` token, whitespace ignored; 0 when absent.
pub fn extract_inpatient_days(text: &str) -> u32 {
    find_day_tokens(&strip_whitespace(text))
        .first()
        .map_or(0, |token| token.inpatient)
}

/// Fail-soft count parse that drops every non-digit first.
pub fn parse_digits(text: &str) -> u32 {
    let digits = text
        .chars()
        .filter(char::is_ascii_digit)
        .collect::<String>();
    digits.parse().unwrap_or(0)
}

/// Joins runs of single Hangul syllables that text extraction split apart, e.g. `"서 울 병원"`.
pub fn repair_split_syllables(name: &str) -> String {
    let mut repaired: Vec<String> = Vec::new();
    let mut joining = false;

    for token in name.split_whitespace() {
        let mut characters = token.chars();
        let single_syllable = matches!(
            (characters.next(), characters.next()),
            (Some(character), None) if is_hangul_syllable(character)
        );

        match repaired.last_mut() {
            Some(last) if single_syllable && joining => last.push_str(token),
            _ => repaired.push(token.to_string()),
        }
        joining = single_syllable;
    }

    repaired.join(" ")
}
