use std::borrow::Cow;

/// Columns the resolver matches against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TenderField {
    /// Primary key (uuid)
    Id,
    /// Human-readable tender code
    TenderId,
}

impl TenderField {
    pub fn column(&self) -> &'static str {
        match self {
            TenderField::Id => "id",
            TenderField::TenderId => "tender_id",
        }
    }
}

/// Comparison applied by a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Exact equality
    Eq,
    /// Case-insensitive match (`ILIKE`). The value is literal text; the store
    /// client escapes pattern characters when rendering it.
    ILike,
}

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::ILike => "ilike",
        }
    }
}

/// A single `field op value` test
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Predicate {
    pub field: TenderField,
    pub op: Operator,
    pub value: String,
}

impl Predicate {
    pub fn new(field: TenderField, op: Operator, value: impl Into<String>) -> Self {
        Self {
            field,
            op,
            value: value.into(),
        }
    }
}

/// Disjunction of predicates with a row limit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderFilter {
    pub any_of: Vec<Predicate>,
    pub limit: usize,
}

/// Decode, trim and strip line breaks from a raw identifier
///
/// Malformed percent-encoding falls back to the raw text.
pub fn clean_identifier(raw: &str) -> String {
    let decoded = urlencoding::decode(raw).unwrap_or(Cow::Borrowed(raw));
    decoded
        .trim()
        .chars()
        .filter(|c| *c != '\r' && *c != '\n')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Stores translate `*` to `%` in pattern matches and offer no escape for it
const UNESCAPABLE_PATTERN_CHARS: &[char] = &['*'];

/// Hyphenated 8-4-4-4-12 hex, any case
pub fn is_uuid_shape(value: &str) -> bool {
    value.len() == 36 && uuid::Uuid::try_parse(value).is_ok()
}

/// Spellings of one identifier worth asking the store about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchCandidateSet {
    cleaned: String,
    variants: Vec<String>,
    is_uuid: bool,
}

impl MatchCandidateSet {
    /// Build the candidate set, or `None` when nothing is left after cleaning
    pub fn from_raw(raw: &str) -> Option<Self> {
        let cleaned = clean_identifier(raw);
        if cleaned.is_empty() {
            return None;
        }

        let mut variants: Vec<String> = Vec::with_capacity(4);
        for variant in [
            cleaned.clone(),
            cleaned.to_uppercase(),
            cleaned.to_lowercase(),
            cleaned.chars().filter(|c| !c.is_whitespace()).collect(),
        ] {
            if !variant.is_empty() && !variants.contains(&variant) {
                variants.push(variant);
            }
        }

        let is_uuid = is_uuid_shape(&cleaned);

        Some(Self {
            cleaned,
            variants,
            is_uuid,
        })
    }

    pub fn cleaned(&self) -> &str {
        &self.cleaned
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    pub fn is_uuid(&self) -> bool {
        self.is_uuid
    }

    /// Primary-key match first (uuid only), then `eq` and `ilike` per variant.
    /// Variants that cannot be matched literally by `ilike` only get `eq`.
    pub fn predicates(&self) -> Vec<Predicate> {
        let mut predicates = Vec::with_capacity(self.variants.len() * 2 + 1);

        if self.is_uuid {
            predicates.push(Predicate::new(TenderField::Id, Operator::Eq, self.cleaned.as_str()));
        }

        for variant in &self.variants {
            predicates.push(Predicate::new(TenderField::TenderId, Operator::Eq, variant.as_str()));
            if !variant.contains(UNESCAPABLE_PATTERN_CHARS) {
                predicates.push(Predicate::new(TenderField::TenderId, Operator::ILike, variant.as_str()));
            }
        }

        predicates
    }

    /// Single-row lookup over every predicate
    pub fn filter(&self) -> TenderFilter {
        TenderFilter {
            any_of: self.predicates(),
            limit: 1,
        }
    }
}
