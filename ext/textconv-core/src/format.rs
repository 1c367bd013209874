//! Timestamp format patterns
//!
//! A pattern is literal text interleaved with `%` directives, compiled once per call into an
//! immutable token list that every element task replays.
//!
//! | directive | field                 | width                   | range     |
//! |-----------|-----------------------|-------------------------|-----------|
//! | `%Y`      | year                  | 4                       | 0000–9999 |
//! | `%y`      | year of century       | 2                       | 00–99     |
//! | `%m`      | month                 | 2                       | 01–12     |
//! | `%d`      | day of month          | 2                       | 01–31     |
//! | `%j`      | day of year           | 3                       | 001–366   |
//! | `%H`      | hour, 24-hour clock   | 2                       | 00–23     |
//! | `%I`      | hour, 12-hour clock   | 2                       | 01–12     |
//! | `%p`      | `AM` / `PM`           | 2                       |           |
//! | `%M`      | minute                | 2                       | 00–59     |
//! | `%S`      | second                | 2                       | 00–59     |
//! | `%f`      | fractional second     | 1–9 when parsing        |           |
//! | `%Nf`     | fractional second     | N, for N in 1–9         |           |
//! | `%z`      | UTC offset `±hhmm`    | 5                       |           |
//! | `%%`      | literal `%`           |                         |           |
//!
//! `%y` maps 69–99 to 1969–1999 and 00–68 to 2000–2068. When formatting, plain `%f` writes
//! as many digits as the column resolution carries (3, 6 or 9; 6 for second and day
//! columns) and `%z` always writes `+0000`. Any other character after `%`, a width digit
//! before anything but `f`, or a trailing lone `%` is rejected when the pattern is compiled.

use crate::{ConvertError, Result};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Pattern used by `from_timestamps` when the caller supplies none
pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Calendar or clock field a directive reads or writes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Year,
    YearOfCentury,
    Month,
    Day,
    DayOfYear,
    Hour24,
    Hour12,
    Meridiem,
    Minute,
    Second,
    Fraction,
    UtcOffset,
}

/// Number of characters a field occupies
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Width {
    Fixed(usize),
    /// Parsing consumes digits greedily, between `min` and `max` of them
    Variable { min: usize, max: usize },
}

/// A field directive together with its width and accepted value range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub field: Field,
    pub width: Width,
    pub min: u32,
    pub max: u32,
}

impl FieldSpec {
    const fn fixed(field: Field, width: usize, min: u32, max: u32) -> Self {
        Self {
            field,
            width: Width::Fixed(width),
            min,
            max,
        }
    }
}

/// One token of a compiled pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatItem {
    Literal(Box<str>),
    Field(FieldSpec),
}

#[derive(Debug, Clone, Copy)]
enum ScanState {
    ScanningLiteral,
    /// `start` is the byte position of the `%`, `width` an optional width digit
    ScanningDirective { start: usize, width: Option<usize> },
}

/// Compiled, immutable timestamp pattern
///
/// Cloning is cheap: the token list is shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatPattern {
    source: Arc<str>,
    items: Arc<[FormatItem]>,
    use_day_of_year: bool,
}

impl FormatPattern {
    /// Compile `pattern` into a token list
    pub fn compile(pattern: &str) -> Result<Self> {
        if pattern.is_empty() {
            return Err(ConvertError::invalid_argument(
                "timestamp pattern must not be empty",
            ));
        }

        let mut items = Vec::new();
        let mut literal = String::new();
        let mut state = ScanState::ScanningLiteral;

        for (pos, ch) in pattern.char_indices() {
            state = match state {
                ScanState::ScanningLiteral if ch == '%' => ScanState::ScanningDirective {
                    start: pos,
                    width: None,
                },
                ScanState::ScanningLiteral => {
                    literal.push(ch);
                    ScanState::ScanningLiteral
                }
                ScanState::ScanningDirective { width: None, .. } if ch == '%' => {
                    literal.push('%');
                    ScanState::ScanningLiteral
                }
                ScanState::ScanningDirective { start, width: None }
                    if ('1'..='9').contains(&ch) =>
                {
                    ScanState::ScanningDirective {
                        start,
                        width: Some(ch as usize - '0' as usize),
                    }
                }
                ScanState::ScanningDirective { start, width } => {
                    let spec = directive(ch, width).ok_or_else(|| {
                        ConvertError::pattern(format!(
                            "unrecognized directive '{}' at position {} in {:?}",
                            &pattern[start..pos + ch.len_utf8()],
                            start,
                            pattern
                        ))
                    })?;
                    if !literal.is_empty() {
                        items.push(FormatItem::Literal(std::mem::take(&mut literal).into()));
                    }
                    items.push(FormatItem::Field(spec));
                    ScanState::ScanningLiteral
                }
            };
        }

        if let ScanState::ScanningDirective { start, .. } = state {
            return Err(ConvertError::pattern(format!(
                "incomplete directive at position {} in {:?}",
                start, pattern
            )));
        }
        if !literal.is_empty() {
            items.push(FormatItem::Literal(literal.into()));
        }

        let has = |field: Field| {
            items
                .iter()
                .any(|item| matches!(item, FormatItem::Field(spec) if spec.field == field))
        };
        let use_day_of_year = has(Field::DayOfYear) && !has(Field::Month) && !has(Field::Day);

        tracing::trace!(pattern, tokens = items.len(), "compiled timestamp pattern");

        Ok(Self {
            source: Arc::from(pattern),
            items: items.into(),
            use_day_of_year,
        })
    }

    /// Pattern text this was compiled from
    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn items(&self) -> &[FormatItem] {
        &self.items
    }

    /// Whether the date comes from `%j` (the pattern has `%j` but neither `%m` nor `%d`)
    pub fn uses_day_of_year(&self) -> bool {
        self.use_day_of_year
    }
}

impl FromStr for FormatPattern {
    type Err = ConvertError;

    fn from_str(s: &str) -> Result<Self> {
        Self::compile(s)
    }
}

impl fmt::Display for FormatPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Field spec for directive `code`, or `None` if the code (or its width prefix) is invalid
fn directive(code: char, width: Option<usize>) -> Option<FieldSpec> {
    if code == 'f' {
        let width = match width {
            Some(n) => Width::Fixed(n),
            None => Width::Variable { min: 1, max: 9 },
        };
        return Some(FieldSpec {
            field: Field::Fraction,
            width,
            min: 0,
            max: 999_999_999,
        });
    }
    if width.is_some() {
        return None;
    }

    let spec = match code {
        'Y' => FieldSpec::fixed(Field::Year, 4, 0, 9999),
        'y' => FieldSpec::fixed(Field::YearOfCentury, 2, 0, 99),
        'm' => FieldSpec::fixed(Field::Month, 2, 1, 12),
        'd' => FieldSpec::fixed(Field::Day, 2, 1, 31),
        'j' => FieldSpec::fixed(Field::DayOfYear, 3, 1, 366),
        'H' => FieldSpec::fixed(Field::Hour24, 2, 0, 23),
        'I' => FieldSpec::fixed(Field::Hour12, 2, 1, 12),
        'p' => FieldSpec::fixed(Field::Meridiem, 2, 0, 1),
        'M' => FieldSpec::fixed(Field::Minute, 2, 0, 59),
        'S' => FieldSpec::fixed(Field::Second, 2, 0, 59),
        'z' => FieldSpec::fixed(Field::UtcOffset, 5, 0, 2359),
        _ => return None,
    };
    Some(spec)
}
