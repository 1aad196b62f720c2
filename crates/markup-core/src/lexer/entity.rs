//! Entity and character reference decoding

use crate::diagnostics::ErrorCode;

/// Substituted for references that cannot be decoded
pub const PLACEHOLDER: char = '\u{FFFD}';

const NAMED_ENTITIES: [(&str, char); 5] = [
    ("amp", '&'),
    ("lt", '<'),
    ("gt", '>'),
    ("quot", '"'),
    ("apos", '\''),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct EntityError {
    pub code: ErrorCode,
    pub arg: Option<String>,
    /// Byte offset from the `&`
    pub offset: usize,
    pub width: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entity {
    /// Bytes consumed, starting at the `&`
    pub len: usize,
    pub decoded: char,
    pub error: Option<EntityError>,
}

impl Entity {
    fn failed(len: usize, code: ErrorCode, arg: Option<String>, offset: usize, width: usize) -> Entity {
        Entity {
            len,
            decoded: PLACEHOLDER,
            error: Some(EntityError {
                code,
                arg,
                offset,
                width,
            }),
        }
    }
}

/// Scans one reference; `rest` starts at an `&`
///
/// Never fails: undecodable references produce [`PLACEHOLDER`] and an
/// error, and a lone `&` is kept as itself.
pub(crate) fn scan_entity(rest: &str) -> Entity {
    debug_assert!(rest.starts_with('&'));
    if rest[1..].starts_with('#') {
        scan_character_reference(rest)
    } else {
        scan_named_entity(rest)
    }
}

fn alphanumeric_run(text: &str) -> usize {
    text.bytes().take_while(u8::is_ascii_alphanumeric).count()
}

fn scan_character_reference(rest: &str) -> Entity {
    let hex = rest[2..].starts_with('x');
    let digits_start = if hex { 3 } else { 2 };
    let digits = &rest[digits_start..digits_start + alphanumeric_run(&rest[digits_start..])];
    let mut end = digits_start + digits.len();
    let terminated = rest[end..].starts_with(';');
    if terminated {
        end += 1;
    }
    let bad_digit = if hex {
        ErrorCode::BadHexDigit
    } else {
        ErrorCode::BadDecimalDigit
    };

    if digits.is_empty() {
        let found = rest[digits_start..].chars().next().map(String::from);
        return Entity::failed(end, bad_digit, Some(found.unwrap_or_default()), digits_start, 0);
    }

    let radix = if hex { 16 } else { 10 };
    let mut value: Option<u32> = Some(0);
    for (index, c) in digits.char_indices() {
        let Some(digit) = c.to_digit(radix) else {
            return Entity::failed(
                end,
                bad_digit,
                Some(c.to_string()),
                digits_start + index,
                c.len_utf8(),
            );
        };
        value = value
            .and_then(|value| value.checked_mul(radix))
            .and_then(|value| value.checked_add(digit));
    }

    let Some(value) = value else {
        return Entity::failed(end, ErrorCode::EntityValueOverflow, None, 0, end);
    };
    let Some(decoded) = char::from_u32(value).filter(|c| *c != '\0') else {
        return Entity::failed(
            end,
            ErrorCode::InvalidUnicodeValue,
            Some(rest[..end].to_string()),
            0,
            end,
        );
    };
    Entity {
        len: end,
        decoded,
        error: (!terminated).then(|| missing_semicolon(end)),
    }
}

fn scan_named_entity(rest: &str) -> Entity {
    let name_len = alphanumeric_run(&rest[1..]);
    if name_len == 0 {
        return Entity {
            len: 1,
            decoded: '&',
            error: Some(EntityError {
                code: ErrorCode::IllegalCharacter,
                arg: Some("&".to_string()),
                offset: 0,
                width: 1,
            }),
        };
    }
    let name = &rest[1..1 + name_len];
    let mut end = 1 + name_len;
    let terminated = rest[end..].starts_with(';');
    if terminated {
        end += 1;
    }
    match NAMED_ENTITIES.iter().find(|(entity, _)| *entity == name) {
        Some((_, decoded)) => Entity {
            len: end,
            decoded: *decoded,
            error: (!terminated).then(|| missing_semicolon(end)),
        },
        None => Entity::failed(end, ErrorCode::UnknownEntity, Some(name.to_string()), 0, end),
    }
}

fn missing_semicolon(end: usize) -> EntityError {
    EntityError {
        code: ErrorCode::MissingEntitySemicolon,
        arg: None,
        offset: end,
        width: 0,
    }
}
