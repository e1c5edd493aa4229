//! Line classifier and field extractor for device log lines.
//!
//! A role owns a static, ordered table of [`MessagePattern`]s. [`classify`]
//! returns the first pattern whose needle occurs in the line, with its integer
//! fields pulled from the whitespace-tokenized text.
//!
//! Classification is a pure function of the line and the table. A line that
//! matches a needle but whose fields cannot be read is reported as
//! [`Classification::Malformed`] so the caller can drop it without touching
//! any state.

use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Numeric coercion applied after parsing a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// Keep the sign.
    Signed,
    /// Take the absolute value.
    Absolute,
}

/// Where a field's token sits in the tokenized line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// `offset` tokens after the first token equal to `anchor`.
    After { anchor: &'static str, offset: usize },
    /// The final token of the line (edge timestamps).
    Last,
}

/// One integer field of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub locator: Locator,
    pub coercion: Coercion,
}

impl FieldSpec {
    /// Field `offset` tokens after `anchor`, absolute value.
    pub const fn after_abs(anchor: &'static str, offset: usize) -> Self {
        Self {
            locator: Locator::After { anchor, offset },
            coercion: Coercion::Absolute,
        }
    }

    /// Field `offset` tokens after `anchor`, sign preserved.
    pub const fn after(anchor: &'static str, offset: usize) -> Self {
        Self {
            locator: Locator::After { anchor, offset },
            coercion: Coercion::Signed,
        }
    }

    /// Field taken from the last token, sign preserved.
    pub const fn last() -> Self {
        Self {
            locator: Locator::Last,
            coercion: Coercion::Signed,
        }
    }

    fn extract(&self, tokens: &[&str]) -> Result<i64, FieldError> {
        let token = match self.locator {
            Locator::After { anchor, offset } => {
                let idx = tokens
                    .iter()
                    .position(|t| *t == anchor)
                    .ok_or(FieldError::MissingAnchor { anchor })?;
                tokens
                    .get(idx + offset)
                    .copied()
                    .ok_or(FieldError::MissingToken { anchor, offset })?
            }
            Locator::Last => tokens.last().copied().ok_or(FieldError::EmptyLine)?,
        };

        let value: i64 = token.parse().map_err(|_| FieldError::NotInteger {
            token: token.to_string(),
        })?;

        match self.coercion {
            Coercion::Signed => Ok(value),
            Coercion::Absolute => value
                .checked_abs()
                .ok_or(FieldError::Overflow { value }),
        }
    }
}

/// A recognised log message: a needle plus the fields it carries.
///
/// `K` is the caller's pattern identifier, usually a small `Copy` enum.
#[derive(Debug, Clone, Copy)]
pub struct MessagePattern<K: 'static> {
    pub id: K,
    pub needle: &'static str,
    pub fields: &'static [FieldSpec],
}

/// Why a matched line's fields could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("anchor token {anchor:?} not found")]
    MissingAnchor { anchor: &'static str },

    #[error("no token {offset} after anchor {anchor:?}")]
    MissingToken { anchor: &'static str, offset: usize },

    #[error("line has no tokens")]
    EmptyLine,

    #[error("token {token:?} is not an integer")]
    NotInteger { token: String },

    #[error("absolute value of {value} overflows")]
    Overflow { value: i64 },
}

/// A successfully classified line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEvent<K> {
    pub pattern: K,
    /// Extracted values, in the order of the pattern's field specs.
    pub fields: Vec<i64>,
}

impl<K> LineEvent<K> {
    /// Field at `idx`, or 0 for patterns that carry fewer fields.
    pub fn field(&self, idx: usize) -> i64 {
        self.fields.get(idx).copied().unwrap_or(0)
    }
}

/// Outcome of classifying one line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification<K> {
    Matched(LineEvent<K>),
    /// No needle in the table occurs in the line.
    NoMatch,
    /// A needle matched but a field could not be extracted.
    Malformed { pattern: K, reason: FieldError },
}

impl<K> Classification<K> {
    pub fn is_match(&self) -> bool {
        matches!(self, Classification::Matched(_))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Classifier
// ─────────────────────────────────────────────────────────────────────────────

/// Classify `line` against `table`; the first needle found wins.
///
/// Later patterns are never consulted once a needle matches, even if that
/// pattern's fields turn out to be malformed.
pub fn classify<K: Copy>(line: &str, table: &[MessagePattern<K>]) -> Classification<K> {
    let Some(pattern) = table.iter().find(|p| line.contains(p.needle)) else {
        return Classification::NoMatch;
    };

    let tokens: Vec<&str> = line.split_whitespace().collect();
    let fields: Result<Vec<i64>, FieldError> =
        pattern.fields.iter().map(|f| f.extract(&tokens)).collect();

    match fields {
        Ok(fields) => Classification::Matched(LineEvent {
            pattern: pattern.id,
            fields,
        }),
        Err(reason) => Classification::Malformed {
            pattern: pattern.id,
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Id {
        Received,
        Encoded,
        Offset,
        Edge,
        Shutdown,
        DecodedCached,
        Decoded,
    }

    static TABLE: &[MessagePattern<Id>] = &[
        MessagePattern {
            id: Id::Received,
            needle: "Received native packet",
            fields: &[FieldSpec::after_abs("packet", 1)],
        },
        MessagePattern {
            id: Id::Encoded,
            needle: "Encoded packets [",
            fields: &[FieldSpec::after_abs("[", 1), FieldSpec::after_abs("[", 2)],
        },
        MessagePattern {
            id: Id::Offset,
            needle: "Offset to master with",
            fields: &[FieldSpec::after("with", 1)],
        },
        MessagePattern {
            id: Id::Edge,
            needle: "RISING",
            fields: &[FieldSpec::last()],
        },
        MessagePattern {
            id: Id::Shutdown,
            needle: "initiating shutdown task",
            fields: &[],
        },
        MessagePattern {
            id: Id::DecodedCached,
            needle: "Decoded cashed packet",
            fields: &[FieldSpec::after_abs("packet", 1)],
        },
        MessagePattern {
            id: Id::Decoded,
            needle: "Decoded packet",
            fields: &[FieldSpec::after_abs("packet", 1)],
        },
    ];

    fn matched(line: &str) -> LineEvent<Id> {
        match classify(line, TABLE) {
            Classification::Matched(event) => event,
            other => panic!("expected match for {line:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_fixture_lines_extract_expected_fields() {
        let cases: &[(&str, Id, &[i64])] = &[
            ("I (5021) relay: Received native packet 17", Id::Received, &[17]),
            ("I (5021) relay: Received native packet -17", Id::Received, &[17]),
            ("I (6000) relay: Encoded packets [ 3 -9 ]", Id::Encoded, &[3, 9]),
            ("I (7) sync: Offset to master with -1250 us", Id::Offset, &[-1250]),
            ("GPIO4 EDGE RISING 88123", Id::Edge, &[88123]),
            ("I (9) relay: initiating shutdown task", Id::Shutdown, &[]),
            ("I (9) native: Decoded cashed packet 5", Id::DecodedCached, &[5]),
            ("I (9) native: Decoded packet 6", Id::Decoded, &[6]),
        ];
        for (line, id, fields) in cases {
            let event = matched(line);
            assert_eq!(event.pattern, *id, "line {line:?}");
            assert_eq!(event.fields, *fields, "line {line:?}");
        }
    }

    #[test]
    fn test_unknown_line_is_no_match() {
        assert_eq!(classify("boot: ESP-IDF v5.1", TABLE), Classification::NoMatch);
        assert_eq!(classify("", TABLE), Classification::NoMatch);
    }

    #[test]
    fn test_non_numeric_field_is_malformed() {
        let result = classify("Received native packet abc", TABLE);
        assert_eq!(
            result,
            Classification::Malformed {
                pattern: Id::Received,
                reason: FieldError::NotInteger {
                    token: "abc".to_string()
                },
            }
        );
        assert!(!result.is_match());
    }

    #[test]
    fn test_missing_trailing_token_is_malformed() {
        let result = classify("Encoded packets [ 3", TABLE);
        assert!(matches!(
            result,
            Classification::Malformed {
                pattern: Id::Encoded,
                reason: FieldError::MissingToken { anchor: "[", offset: 2 },
            }
        ));
    }

    #[test]
    fn test_needle_without_exact_anchor_is_malformed() {
        // "packet:" is not an exact match for the anchor "packet"
        let result = classify("Received native packet: 4", TABLE);
        assert!(matches!(
            result,
            Classification::Malformed {
                reason: FieldError::MissingAnchor { anchor: "packet" },
                ..
            }
        ));
    }

    #[test]
    fn test_first_match_wins_in_declaration_order() {
        let event = matched("Received native packet 12 initiating shutdown task");
        assert_eq!(event.pattern, Id::Received);
        assert_eq!(event.fields, vec![12]);
    }

    #[test]
    fn test_abs_overflow_is_malformed() {
        let line = format!("Received native packet {}", i64::MIN);
        assert!(matches!(
            classify(&line, TABLE),
            Classification::Malformed {
                reason: FieldError::Overflow { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_anchor_uses_first_occurrence() {
        let event = matched("Received native packet 2 packet 3");
        assert_eq!(event.fields, vec![2]);
    }

    #[test]
    fn test_line_event_field_defaults_to_zero() {
        let event = matched("initiating shutdown task");
        assert_eq!(event.field(0), 0);
    }
}
