#![forbid(unsafe_code)]

/// Number of value facets stored per record.
pub const FACET_COUNT: usize = 5;

/// One numeric role of a record's value vector.
///
/// Parameters only use [`ValueFacet::Level`]; variables and equations carry all five. For sets the
/// level slot holds an associated-text index instead of a number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ValueFacet {
    Level,
    Marginal,
    Lower,
    Upper,
    Scale,
}

impl ValueFacet {
    /// Facets in storage order.
    pub const ALL: [ValueFacet; FACET_COUNT] = [
        ValueFacet::Level,
        ValueFacet::Marginal,
        ValueFacet::Lower,
        ValueFacet::Upper,
        ValueFacet::Scale,
    ];

    /// Slot of this facet in [`Record::values`].
    pub fn slot(self) -> usize {
        match self {
            ValueFacet::Level => 0,
            ValueFacet::Marginal => 1,
            ValueFacet::Lower => 2,
            ValueFacet::Upper => 3,
            ValueFacet::Scale => 4,
        }
    }

    /// Short token used by requests and responses (`l`, `m`, `lo`, `up`, `s`).
    pub fn token(self) -> &'static str {
        match self {
            ValueFacet::Level => "l",
            ValueFacet::Marginal => "m",
            ValueFacet::Lower => "lo",
            ValueFacet::Upper => "up",
            ValueFacet::Scale => "s",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        ValueFacet::ALL
            .into_iter()
            .find(|facet| facet.token().eq_ignore_ascii_case(token))
    }
}

/// A single record of a symbol: one universe index per dimension plus the value facets.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub keys: Vec<u32>,
    pub values: [f64; FACET_COUNT],
}

impl Record {
    pub fn new(keys: Vec<u32>, values: [f64; FACET_COUNT]) -> Self {
        Self { keys, values }
    }

    /// A record whose level is `level` and whose other facets are zero.
    pub fn with_level(keys: Vec<u32>, level: f64) -> Self {
        let mut values = [0.0; FACET_COUNT];
        values[ValueFacet::Level.slot()] = level;
        Self { keys, values }
    }

    pub fn value(&self, facet: ValueFacet) -> f64 {
        self.values[facet.slot()]
    }

    /// Associated-text index for set records; `None` unless the level slot holds an index of
    /// at least one.
    pub fn text_index(&self) -> Option<u32> {
        let level = self.value(ValueFacet::Level);
        if !level.is_finite() || level < 1.0 {
            return None;
        }
        Some(level as u32)
    }
}
