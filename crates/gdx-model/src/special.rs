//! Special numeric values carried by container records.
//!
//! Containers store five distinguished values besides ordinary finite numbers. Extraction maps
//! them onto IEEE-754 doubles through a fixed table:
//!
//! | Special | f64 |
//! |---------|-----|
//! | `UNDF`  | quiet NaN |
//! | `NA`    | NaN with payload `1954` (see [`NA`]) |
//! | `+INF`  | `f64::INFINITY` |
//! | `-INF`  | `f64::NEG_INFINITY` |
//! | `EPS`   | `0.0` |
//!
//! `EPS` collapses onto zero, so zero-squeezing removes it.

/// "Not available": a NaN whose payload distinguishes it from an undefined value.
pub const NA: f64 = f64::from_bits(0x7FF0_0000_0000_07A2);

/// Whether `value` is the [`NA`] marker (and not some other NaN).
pub fn is_na(value: f64) -> bool {
    value.to_bits() == NA.to_bits()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpecialValue {
    Undef,
    Na,
    PosInf,
    NegInf,
    Eps,
}

impl SpecialValue {
    pub const ALL: [SpecialValue; 5] = [
        SpecialValue::Undef,
        SpecialValue::Na,
        SpecialValue::PosInf,
        SpecialValue::NegInf,
        SpecialValue::Eps,
    ];

    pub fn to_f64(self) -> f64 {
        match self {
            SpecialValue::Undef => f64::NAN,
            SpecialValue::Na => NA,
            SpecialValue::PosInf => f64::INFINITY,
            SpecialValue::NegInf => f64::NEG_INFINITY,
            SpecialValue::Eps => 0.0,
        }
    }

    pub fn token(self) -> &'static str {
        match self {
            SpecialValue::Undef => "UNDF",
            SpecialValue::Na => "NA",
            SpecialValue::PosInf => "+INF",
            SpecialValue::NegInf => "-INF",
            SpecialValue::Eps => "EPS",
        }
    }

    /// Parse a special-value token (case-insensitive). `INF` is accepted for `+INF`.
    pub fn from_token(token: &str) -> Option<Self> {
        match token.trim().to_ascii_uppercase().as_str() {
            "UNDF" | "UNDEF" => Some(SpecialValue::Undef),
            "NA" => Some(SpecialValue::Na),
            "+INF" | "INF" => Some(SpecialValue::PosInf),
            "-INF" => Some(SpecialValue::NegInf),
            "EPS" => Some(SpecialValue::Eps),
            _ => None,
        }
    }
}
