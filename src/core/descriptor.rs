//! Structural description of a DTO field's target type.
use std::fmt;

use crate::core::{
    date::DateFormat,
    error::{BindingError, BindingResult},
};

/// Base kind of a declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BaseKind {
    String,
    Int,
    Float,
    Bool,
    Array,
    Object,
    /// Untyped: the raw value is assigned verbatim
    Mixed,
    Date,
    /// A single nested DTO, by registered name
    Dto(String),
}

impl BaseKind {
    pub fn name(&self) -> &str {
        match self {
            BaseKind::String => "string",
            BaseKind::Int => "int",
            BaseKind::Float => "float",
            BaseKind::Bool => "bool",
            BaseKind::Array => "array",
            BaseKind::Object => "object",
            BaseKind::Mixed => "mixed",
            BaseKind::Date => "date",
            BaseKind::Dto(name) => name,
        }
    }

    /// Scalar kinds handled by the coercion engine
    pub fn is_scalar(&self) -> bool {
        matches!(
            self,
            BaseKind::String | BaseKind::Int | BaseKind::Float | BaseKind::Bool
        )
    }
}

impl fmt::Display for BaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolved shape of one declared field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescriptor {
    pub base: BaseKind,
    pub nullable: bool,
    /// Element DTO for array-of-DTO fields
    pub element: Option<String>,
    /// Required format for date fields
    pub date_format: Option<String>,
}

impl TypeDescriptor {
    fn of(base: BaseKind) -> Self {
        Self {
            base,
            nullable: false,
            element: None,
            date_format: None,
        }
    }

    pub fn string() -> Self {
        Self::of(BaseKind::String)
    }

    pub fn int() -> Self {
        Self::of(BaseKind::Int)
    }

    pub fn float() -> Self {
        Self::of(BaseKind::Float)
    }

    pub fn bool() -> Self {
        Self::of(BaseKind::Bool)
    }

    pub fn array() -> Self {
        Self::of(BaseKind::Array)
    }

    /// Array whose JSON elements are each hydrated into `element`
    pub fn array_of(element: impl Into<String>) -> Self {
        Self {
            element: Some(element.into()),
            ..Self::of(BaseKind::Array)
        }
    }

    pub fn object() -> Self {
        Self::of(BaseKind::Object)
    }

    pub fn mixed() -> Self {
        Self::of(BaseKind::Mixed)
    }

    pub fn date(format: impl Into<String>) -> Self {
        Self {
            date_format: Some(format.into()),
            ..Self::of(BaseKind::Date)
        }
    }

    pub fn dto(name: impl Into<String>) -> Self {
        Self::of(BaseKind::Dto(name.into()))
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Nested DTO this field depends on, if any
    pub fn referenced_dto(&self) -> Option<&str> {
        match &self.base {
            BaseKind::Dto(name) => Some(name),
            BaseKind::Array => self.element.as_deref(),
            _ => None,
        }
    }

    /// Check the metadata invariants and pre-translate the date format
    pub(crate) fn resolve(&self, field: &str) -> BindingResult<Option<DateFormat>> {
        if self.element.is_some() && self.base != BaseKind::Array {
            return Err(BindingError::binding_spec(
                field,
                "an element type is only allowed on array fields",
            ));
        }

        match (&self.base, &self.date_format) {
            (BaseKind::Date, Some(format)) => DateFormat::parse(field, format).map(Some),
            (BaseKind::Date, None) => Err(BindingError::binding_spec(
                field,
                format!("unable to determine date format for property: {field}"),
            )),
            (_, Some(_)) => Err(BindingError::binding_spec(
                field,
                "a date format is only allowed on date fields",
            )),
            _ => Ok(None),
        }
    }

    /// Human readable type, `?` prefixed when nullable
    pub fn describe(&self) -> String {
        let base = match (&self.base, &self.element) {
            (BaseKind::Array, Some(element)) => format!("{element}[]"),
            (base, _) => base.name().to_string(),
        };

        if self.nullable {
            format!("?{base}")
        } else {
            base
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn describes_types() {
        assert_eq!(TypeDescriptor::string().describe(), "string");
        assert_eq!(TypeDescriptor::int().nullable().describe(), "?int");
        assert_eq!(TypeDescriptor::array_of("Item").describe(), "Item[]");
        assert_eq!(TypeDescriptor::dto("Address").describe(), "Address");
    }

    #[test]
    fn referenced_dto_covers_arrays_and_nested() {
        assert_eq!(TypeDescriptor::array_of("Item").referenced_dto(), Some("Item"));
        assert_eq!(TypeDescriptor::dto("Address").referenced_dto(), Some("Address"));
        assert_eq!(TypeDescriptor::array().referenced_dto(), None);
    }

    #[test]
    fn date_requires_a_format() {
        let mut descriptor = TypeDescriptor::date("Y-m-d");
        assert!(descriptor.resolve("born").unwrap().is_some());

        descriptor.date_format = None;
        assert!(descriptor.resolve("born").is_err());

        let mut descriptor = TypeDescriptor::string();
        descriptor.date_format = Some("Y-m-d".to_string());
        assert!(descriptor.resolve("name").is_err());
    }
}
