//! Read specifiers.
//!
//! A [`ReadSpec`] is the validated form of a caller's request. It is produced once, either from
//! an untyped key/value object ([`ReadSpec::from_json`]) or through [`ReadSpecBuilder`], and is
//! never mutated afterwards.
//!
//! Recognized request keys:
//!
//! | Key        | Accepted values                                   | Default    |
//! |------------|---------------------------------------------------|------------|
//! | `name`     | string (required)                                 |            |
//! | `dim`      | non-negative integral number                      | unchecked  |
//! | `uels`     | list of per-dimension label lists                 | no filter  |
//! | `form`     | `"sparse"` / `"full"`                             | `sparse`   |
//! | `compress` | bool or `"true"` / `"false"`                      | `false`    |
//! | `field`    | `"l"`, `"m"`, `"lo"`, `"up"`, `"s"`, `"all"`      | `l`        |
//! | `te`       | bool or `"true"` / `"false"`                      | `false`    |
//! | `ts`       | bool or `"true"` / `"false"`                      | `false`    |
//!
//! String tokens are matched case-insensitively.

use std::collections::HashSet;
use std::fmt;

use gdx_model::{ValueFacet, MAX_LABEL_LEN};
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;

use crate::error::{ReadError, ReadResult};

/// Largest symbol dimension a container can hold.
pub const MAX_DIM: usize = 20;

const KNOWN_KEYS: &str = "name, dim, uels, form, compress, field, te, ts";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    #[default]
    Sparse,
    Full,
}

impl Form {
    pub fn token(self) -> &'static str {
        match self {
            Form::Sparse => "sparse",
            Form::Full => "full",
        }
    }
}

/// Which value facet(s) of a variable/equation to emit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldSelection {
    One(ValueFacet),
    /// Every facet, expanded along a synthetic trailing dimension.
    All,
}

impl Default for FieldSelection {
    fn default() -> Self {
        FieldSelection::One(ValueFacet::Level)
    }
}

impl FieldSelection {
    pub fn token(self) -> &'static str {
        match self {
            FieldSelection::One(facet) => facet.token(),
            FieldSelection::All => "all",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        if token.eq_ignore_ascii_case("all") {
            return Some(FieldSelection::All);
        }
        ValueFacet::from_token(token).map(FieldSelection::One)
    }

    pub fn is_all(self) -> bool {
        self == FieldSelection::All
    }
}

impl fmt::Display for FieldSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl Serialize for FieldSelection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.token())
    }
}

/// Call-level switches that are not part of the request itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ReadOptions {
    /// Drop zero-valued records of non-set symbols from sparse output.
    pub squeeze: bool,
    /// Derive output axes from declared symbol domains when no filter is given.
    pub use_domain_info: bool,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            squeeze: true,
            use_domain_info: true,
        }
    }
}

/// A validated extraction request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadSpec {
    name: String,
    dim: Option<usize>,
    form: Form,
    field: Option<FieldSelection>,
    compress: bool,
    text: bool,
    explanatory_text: bool,
    filters: Option<Vec<Vec<String>>>,
}

impl ReadSpec {
    pub fn builder(name: impl Into<String>) -> ReadSpecBuilder {
        ReadSpecBuilder {
            spec: ReadSpec {
                name: name.into(),
                dim: None,
                form: Form::Sparse,
                field: None,
                compress: false,
                text: false,
                explanatory_text: false,
                filters: None,
            },
        }
    }

    /// Validate an untyped request object.
    pub fn from_json(request: &JsonValue) -> ReadResult<Self> {
        let JsonValue::Object(entries) = request else {
            return Err(ReadError::validation(
                "request",
                "read specifier must be a key/value object",
            ));
        };

        let mut name = None;
        let mut dim = None;
        let mut form = Form::Sparse;
        let mut field = None;
        let mut compress = false;
        let mut text = false;
        let mut explanatory_text = false;
        let mut filters = None;

        for (key, value) in entries {
            match key.as_str() {
                "name" => name = Some(parse_name(value)?),
                "dim" => dim = Some(parse_dim(value)?),
                "uels" => filters = Some(parse_filters(value)?),
                "form" => form = parse_form(value)?,
                "compress" => compress = parse_flag("compress", value)?,
                "field" => field = Some(parse_field(value)?),
                "te" => text = parse_flag("te", value)?,
                "ts" => explanatory_text = parse_flag("ts", value)?,
                other => {
                    return Err(ReadError::validation(
                        other,
                        format!("unknown read specifier field; expected one of {KNOWN_KEYS}"),
                    ))
                }
            }
        }

        let Some(name) = name else {
            return Err(ReadError::validation(
                "name",
                "required field 'name' is missing",
            ));
        };

        let spec = ReadSpec {
            name,
            dim,
            form,
            field,
            compress,
            text,
            explanatory_text,
            filters,
        };
        spec.check_combinations()?;
        Ok(spec)
    }

    fn check_combinations(&self) -> ReadResult<()> {
        if self.filters.is_some() && self.compress {
            return Err(ReadError::unsupported(
                "compress",
                "compression is not allowed together with explicit 'uels' filters",
            ));
        }
        if self.filters.is_some() && self.field() == FieldSelection::All {
            return Err(ReadError::unsupported(
                "field",
                "field='all' is not supported together with explicit 'uels' filters",
            ));
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dimension the caller expects the symbol to have, if any.
    pub fn expected_dim(&self) -> Option<usize> {
        self.dim
    }

    pub fn form(&self) -> Form {
        self.form
    }

    /// Selected facet(s); `l` when the request did not say.
    pub fn field(&self) -> FieldSelection {
        self.field.unwrap_or_default()
    }

    /// Whether `field` was given explicitly. Only variables and equations accept it.
    pub fn has_field(&self) -> bool {
        self.field.is_some()
    }

    pub fn compress(&self) -> bool {
        self.compress
    }

    /// `te`: emit set element text.
    pub fn with_text(&self) -> bool {
        self.text
    }

    /// `ts`: emit the symbol's explanatory text.
    pub fn with_explanatory_text(&self) -> bool {
        self.explanatory_text
    }

    /// Per-dimension label allow-lists, if any.
    pub fn filters(&self) -> Option<&[Vec<String>]> {
        self.filters.as_deref()
    }
}

/// Typed construction of a [`ReadSpec`]; [`ReadSpecBuilder::build`] applies the same checks as
/// [`ReadSpec::from_json`].
#[derive(Clone, Debug)]
pub struct ReadSpecBuilder {
    spec: ReadSpec,
}

impl ReadSpecBuilder {
    pub fn dim(mut self, dim: usize) -> Self {
        self.spec.dim = Some(dim);
        self
    }

    pub fn form(mut self, form: Form) -> Self {
        self.spec.form = form;
        self
    }

    pub fn field(mut self, field: FieldSelection) -> Self {
        self.spec.field = Some(field);
        self
    }

    pub fn compress(mut self, compress: bool) -> Self {
        self.spec.compress = compress;
        self
    }

    pub fn text(mut self, text: bool) -> Self {
        self.spec.text = text;
        self
    }

    pub fn explanatory_text(mut self, ts: bool) -> Self {
        self.spec.explanatory_text = ts;
        self
    }

    pub fn filters<I, L, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.spec.filters = Some(
            filters
                .into_iter()
                .map(|labels| labels.into_iter().map(Into::into).collect())
                .collect(),
        );
        self
    }

    pub fn build(self) -> ReadResult<ReadSpec> {
        let spec = self.spec;
        check_name(&spec.name)?;
        if let Some(dim) = spec.dim {
            check_dim(dim as f64)?;
        }
        if let Some(filters) = &spec.filters {
            for (dim, labels) in filters.iter().enumerate() {
                check_filter(dim, labels)?;
            }
        }
        spec.check_combinations()?;
        Ok(spec)
    }
}

fn type_name(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "logical",
        JsonValue::Number(_) => "numeric",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "list",
        JsonValue::Object(_) => "object",
    }
}

fn check_name(name: &str) -> ReadResult<()> {
    if name.is_empty() {
        return Err(ReadError::validation("name", "symbol name must not be empty"));
    }
    if name.chars().count() > MAX_LABEL_LEN {
        return Err(ReadError::validation(
            "name",
            format!("symbol name exceeds {MAX_LABEL_LEN} characters"),
        ));
    }
    Ok(())
}

fn parse_name(value: &JsonValue) -> ReadResult<String> {
    let JsonValue::String(name) = value else {
        return Err(ReadError::validation(
            "name",
            format!("must be a string - found {} instead", type_name(value)),
        ));
    };
    check_name(name)?;
    Ok(name.clone())
}

fn check_dim(dim: f64) -> ReadResult<usize> {
    if dim < 0.0 {
        return Err(ReadError::validation(
            "dim",
            "negative value is not allowed",
        ));
    }
    if dim.fract() != 0.0 || !dim.is_finite() {
        return Err(ReadError::validation(
            "dim",
            "non-integer value is not allowed",
        ));
    }
    if dim > MAX_DIM as f64 {
        return Err(ReadError::validation(
            "dim",
            format!("symbols have at most {MAX_DIM} dimensions"),
        ));
    }
    Ok(dim as usize)
}

fn parse_dim(value: &JsonValue) -> ReadResult<usize> {
    let JsonValue::Number(number) = value else {
        return Err(ReadError::validation(
            "dim",
            format!("must be numeric - found {} instead", type_name(value)),
        ));
    };
    if let Some(dim) = number.as_u64() {
        return check_dim(dim as f64);
    }
    if let Some(dim) = number.as_i64() {
        return check_dim(dim as f64);
    }
    match number.as_f64() {
        Some(dim) => check_dim(dim),
        None => Err(ReadError::validation("dim", "must be numeric")),
    }
}

fn parse_form(value: &JsonValue) -> ReadResult<Form> {
    let JsonValue::String(token) = value else {
        return Err(ReadError::validation(
            "form",
            format!("must be a string - found {} instead", type_name(value)),
        ));
    };
    if token.eq_ignore_ascii_case("full") {
        Ok(Form::Full)
    } else if token.eq_ignore_ascii_case("sparse") {
        Ok(Form::Sparse)
    } else {
        Err(ReadError::validation(
            "form",
            "must be either 'full' or 'sparse'",
        ))
    }
}

fn parse_field(value: &JsonValue) -> ReadResult<FieldSelection> {
    const EXPECTED: &str = "must be in ['l','m','lo','up','s','all']";
    let JsonValue::String(token) = value else {
        return Err(ReadError::validation(
            "field",
            format!("must be a string - found {} instead", type_name(value)),
        ));
    };
    FieldSelection::from_token(token.trim()).ok_or_else(|| ReadError::validation("field", EXPECTED))
}

/// Booleans may arrive as JSON booleans or as `"true"`/`"false"` in any case.
fn parse_flag(field: &'static str, value: &JsonValue) -> ReadResult<bool> {
    match value {
        JsonValue::Bool(flag) => Ok(*flag),
        JsonValue::String(token) if token.eq_ignore_ascii_case("true") => Ok(true),
        JsonValue::String(token) if token.eq_ignore_ascii_case("false") => Ok(false),
        JsonValue::String(_) => Err(ReadError::validation(
            field,
            "must be either 'true' or 'false'",
        )),
        other => Err(ReadError::validation(
            field,
            format!(
                "must be either string or logical - found {} instead",
                type_name(other)
            ),
        )),
    }
}

/// Render a filter label. Integral numbers lose their fractional part (`3.0` -> `"3"`).
fn label_from_json(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(label) => Some(label.clone()),
        JsonValue::Number(number) => {
            if let Some(v) = number.as_i64() {
                return Some(v.to_string());
            }
            if let Some(v) = number.as_u64() {
                return Some(v.to_string());
            }
            let v = number.as_f64()?;
            if v.fract() == 0.0 && v.abs() < 1e15 {
                Some(format!("{}", v as i64))
            } else {
                Some(v.to_string())
            }
        }
        _ => None,
    }
}

fn check_filter(dim: usize, labels: &[String]) -> ReadResult<()> {
    if labels.is_empty() {
        return Err(ReadError::validation(
            "uels",
            format!("empty label list for dimension {} is not allowed", dim + 1),
        ));
    }
    let mut seen = HashSet::with_capacity(labels.len());
    for label in labels {
        if label.is_empty() || label.chars().count() > MAX_LABEL_LEN {
            return Err(ReadError::validation(
                "uels",
                format!(
                    "label '{label}' in dimension {} must have 1..={MAX_LABEL_LEN} characters",
                    dim + 1
                ),
            ));
        }
        if !seen.insert(label.as_str()) {
            return Err(ReadError::validation(
                "uels",
                format!("label '{label}' repeated in dimension {}", dim + 1),
            ));
        }
    }
    Ok(())
}

fn parse_filters(value: &JsonValue) -> ReadResult<Vec<Vec<String>>> {
    let JsonValue::Array(dims) = value else {
        return Err(ReadError::validation("uels", "must be a list"));
    };
    if dims.len() > MAX_DIM {
        return Err(ReadError::validation(
            "uels",
            format!("at most {MAX_DIM} dimensions may be filtered"),
        ));
    }

    let mut filters = Vec::with_capacity(dims.len());
    for (dim, entry) in dims.iter().enumerate() {
        let labels = match entry {
            JsonValue::Null => Vec::new(),
            JsonValue::Array(items) => {
                let mut labels = Vec::with_capacity(items.len());
                for item in items {
                    let Some(label) = label_from_json(item) else {
                        return Err(ReadError::validation(
                            "uels",
                            format!(
                                "labels must be strings or numbers - found {} in dimension {}",
                                type_name(item),
                                dim + 1
                            ),
                        ));
                    };
                    labels.push(label);
                }
                labels
            }
            // A bare scalar is a one-label list.
            other => match label_from_json(other) {
                Some(label) => vec![label],
                None => {
                    return Err(ReadError::validation(
                        "uels",
                        format!("dimension {} must be a list of labels", dim + 1),
                    ))
                }
            },
        };
        check_filter(dim, &labels)?;
        filters.push(labels);
    }
    Ok(filters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_apply_when_only_name_is_given() {
        let spec = ReadSpec::from_json(&json!({"name": "p"})).unwrap();
        assert_eq!(spec.name(), "p");
        assert_eq!(spec.form(), Form::Sparse);
        assert_eq!(spec.field(), FieldSelection::One(ValueFacet::Level));
        assert!(!spec.has_field());
        assert!(!spec.compress());
        assert!(spec.filters().is_none());
        assert_eq!(spec.expected_dim(), None);
    }

    #[test]
    fn numeric_labels_are_rendered_without_fraction() {
        let spec = ReadSpec::from_json(&json!({"name": "p", "uels": [[1, 2.0, 2.5, "x"]]})).unwrap();
        assert_eq!(spec.filters().unwrap()[0], vec!["1", "2", "2.5", "x"]);
    }

    #[test]
    fn builder_applies_combination_checks() {
        let err = ReadSpec::builder("p")
            .filters([["a"]])
            .compress(true)
            .build()
            .unwrap_err();
        assert_eq!(err.field(), Some("compress"));
    }
}
