//! Hydration orchestrator.
//!
//! Walks a DTO's fields in declaration order, fetches each raw value from the
//! source its binding names, applies the per-source null policy and type
//! rules, and assembles a [`HydratedDto`]. The first failing field aborts the
//! whole hydration.
use std::{collections::HashMap, sync::Arc};

use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::{
    core::{
        coercion::{CoercionMode, coerce},
        descriptor::{BaseKind, TypeDescriptor},
        error::{BindingError, BindingResult},
        json_path::{lookup, shape_of},
        nested,
        schema::{BoundField, Dto, DtoSchema, SchemaRegistry},
        source::{FLAGS_FIELD, SourceKind},
        value::{HydratedDto, HydratedValue},
    },
    metrics,
    ports::{CommandView, EmptyRequest, ParameterValue, RawRequestView},
};

/// Separator used to split a header into an array field
const HEADER_LIST_SEPARATOR: &str = ", ";

/// Everything one hydration reads from. Nested DTOs swap the payload for
/// their JSON fragment and keep the rest.
pub(crate) struct Frame<'a> {
    request: &'a dyn RawRequestView,
    command: Option<&'a dyn CommandView>,
    payload: Option<&'a Value>,
}

/// Stateless hydration engine over a shared schema registry. Cheap to clone.
#[derive(Clone)]
pub struct Hydrator {
    registry: Arc<SchemaRegistry>,
    mode: CoercionMode,
}

impl Hydrator {
    pub fn new(registry: Arc<SchemaRegistry>) -> Self {
        Self {
            registry,
            mode: CoercionMode::default(),
        }
    }

    pub fn with_mode(mut self, mode: CoercionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn registry(&self) -> &Arc<SchemaRegistry> {
        &self.registry
    }

    pub fn mode(&self) -> CoercionMode {
        self.mode
    }

    /// Hydrate `dto` from an HTTP request view
    pub fn hydrate(&self, dto: &str, request: &dyn RawRequestView) -> BindingResult<HydratedDto> {
        let frame = Frame {
            request,
            command: None,
            payload: request.json_payload(),
        };
        self.run(dto, &frame)
    }

    /// Hydrate `dto` from a matched command line. Only the reserved `flags` /
    /// `words` fields have a source here; body-bound fields report a missing body.
    pub fn hydrate_command(
        &self,
        dto: &str,
        command: &dyn CommandView,
    ) -> BindingResult<HydratedDto> {
        let frame = Frame {
            request: &EmptyRequest,
            command: Some(command),
            payload: None,
        };
        self.run(dto, &frame)
    }

    /// Hydrate and convert into the DTO's Rust type.
    ///
    /// A conversion failure traced back to a lenient boolean that stayed a
    /// string is the client's fault and reports as [`BindingError::TypeMismatch`].
    /// Any other failure means the Rust type disagrees with its declaration.
    pub fn hydrate_as<T: Dto>(&self, request: &dyn RawRequestView) -> BindingResult<T> {
        let dto = self.hydrate(T::NAME, request)?;
        let unconverted = self.unconverted_bool(&dto);

        dto.into_typed().map_err(|e| {
            unconverted.unwrap_or_else(|| {
                BindingError::binding_spec(
                    T::NAME,
                    format!("hydrated dto does not match its Rust type: {e}"),
                )
            })
        })
    }

    /// First bool field, nested DTOs included, still holding the raw string
    fn unconverted_bool(&self, dto: &HydratedDto) -> Option<BindingError> {
        let schema = self.registry.get(dto.type_name())?;

        for field in schema.fields() {
            let Some(value) = dto.get(field.name()) else {
                continue;
            };

            let found = match (&field.descriptor.base, value) {
                (BaseKind::Bool, HydratedValue::String(raw)) => {
                    return Some(BindingError::type_mismatch(
                        field.name(),
                        &field.spec.source_key,
                        format!("\"{raw}\""),
                        BaseKind::Bool.name(),
                    ));
                }
                (_, HydratedValue::Dto(nested)) => self
                    .unconverted_bool(nested)
                    .map(|e| e.within(field.name())),
                (_, HydratedValue::DtoList(items)) => {
                    items.iter().enumerate().find_map(|(index, item)| {
                        self.unconverted_bool(item)
                            .map(|e| e.within(&format!("{}.{index}", field.name())))
                    })
                }
                _ => None,
            };

            if found.is_some() {
                return found;
            }
        }

        None
    }

    fn run(&self, dto: &str, frame: &Frame<'_>) -> BindingResult<HydratedDto> {
        let _span = tracing::debug_span!("hydrate", dto).entered();
        let _timer = metrics::HydrationTimer::new(dto);

        let result = self.schema(dto).and_then(|schema| self.hydrate_schema(&schema, frame));

        match &result {
            Ok(_) => metrics::increment_hydration_total(dto, "ok"),
            Err(e) => {
                metrics::increment_hydration_total(dto, "error");
                metrics::increment_binding_error(dto, e.kind());
                if e.is_client_error() {
                    debug!(dto, error = %e, "hydration rejected request");
                } else {
                    warn!(dto, error = %e, "hydration failed on declaration");
                }
            }
        }

        result
    }

    fn schema(&self, dto: &str) -> BindingResult<Arc<DtoSchema>> {
        self.registry
            .get(dto)
            .cloned()
            .ok_or_else(|| BindingError::UnknownDto(dto.to_string()))
    }

    /// Hydrate a nested DTO with `fragment` as its JSON payload
    pub(crate) fn hydrate_fragment(
        &self,
        dto: &str,
        fragment: &Value,
        frame: &Frame<'_>,
    ) -> BindingResult<HydratedDto> {
        let schema = self.schema(dto)?;
        let nested = Frame {
            request: frame.request,
            command: frame.command,
            payload: Some(fragment),
        };
        self.hydrate_schema(&schema, &nested)
    }

    fn hydrate_schema(&self, schema: &DtoSchema, frame: &Frame<'_>) -> BindingResult<HydratedDto> {
        let mut values = Vec::with_capacity(schema.fields().len());

        for field in schema.fields() {
            let value = self.bind_field(field, frame)?;
            debug!(
                dto = schema.name(),
                field = field.name(),
                source = %field.spec.source_kind,
                key = %field.spec.source_key,
                "bound field"
            );
            values.push((field.name().to_string(), value));
        }

        Ok(HydratedDto::new(schema.name(), values))
    }

    fn bind_field(&self, field: &BoundField, frame: &Frame<'_>) -> BindingResult<HydratedValue> {
        let key = field.spec.source_key.as_str();

        match field.spec.source_kind {
            SourceKind::Header => Ok(bind_header(&field.descriptor, frame.request.header(key))),
            SourceKind::Parameter => {
                Ok(bind_parameter(&field.descriptor, frame.request.parameter(key)))
            }
            SourceKind::Var => Ok(bind_var(&field.descriptor, frame.request.var(key))),
            SourceKind::Json => self.bind_json(field, frame),
            SourceKind::FormData => self.bind_form_data(field, frame.request.form_data()),
            SourceKind::Command => bind_command(field, frame.command),
        }
    }

    fn bind_json(&self, field: &BoundField, frame: &Frame<'_>) -> BindingResult<HydratedValue> {
        let descriptor = &field.descriptor;
        let key = field.spec.source_key.as_str();

        let payload = frame.payload.ok_or_else(|| BindingError::MissingBody {
            field: field.name().to_string(),
            source_kind: SourceKind::Json,
        })?;

        let data = lookup(payload, key).filter(|value| !value.is_null());

        if data.is_none() && descriptor.nullable {
            return Ok(HydratedValue::Null);
        }

        if let Some(element) = descriptor.element.as_deref() {
            return nested::bind_dto_list(self, field, element, data, frame);
        }

        match &descriptor.base {
            BaseKind::Mixed => Ok(data.cloned().map_or(HydratedValue::Null, HydratedValue::Json)),
            BaseKind::Object => Ok(HydratedValue::Json(
                data.cloned().unwrap_or_else(|| Value::Object(Map::new())),
            )),
            BaseKind::Date => {
                let raw = match data {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => {
                        return Err(BindingError::type_mismatch(field.name(), key, "null", "date"));
                    }
                };
                parse_date(field, &raw)
            }
            BaseKind::Dto(name) => nested::bind_dto(self, field, name, data, frame),
            base => json_scalar(field, base, data),
        }
    }

    fn bind_form_data(
        &self,
        field: &BoundField,
        form: Option<&HashMap<String, String>>,
    ) -> BindingResult<HydratedValue> {
        let descriptor = &field.descriptor;
        let key = field.spec.source_key.as_str();

        let form = form.ok_or_else(|| BindingError::MissingBody {
            field: field.name().to_string(),
            source_kind: SourceKind::FormData,
        })?;

        let data = form.get(key);

        if descriptor.base == BaseKind::Mixed {
            return Ok(data.map_or(HydratedValue::Null, |value| {
                HydratedValue::Json(Value::String(value.clone()))
            }));
        }

        let Some(raw) = data else {
            return match descriptor.base {
                _ if descriptor.nullable => Ok(HydratedValue::Null),
                BaseKind::Date => parse_date(field, ""),
                _ => Ok(empty_value(descriptor)),
            };
        };

        if descriptor.base == BaseKind::Date {
            return parse_date(field, raw);
        }

        coerce(raw, &descriptor.base, self.mode).map_err(|e| {
            BindingError::type_mismatch(field.name(), key, e.found, e.expected)
        })
    }
}

fn bind_header(descriptor: &TypeDescriptor, raw: Option<String>) -> HydratedValue {
    match (&descriptor.base, raw) {
        (BaseKind::Mixed, raw) => raw.map_or(HydratedValue::Null, |value| {
            HydratedValue::Json(Value::String(value))
        }),
        (_, None) => null_or_empty(descriptor),
        (BaseKind::Array, Some(value)) => HydratedValue::List(
            value
                .split(HEADER_LIST_SEPARATOR)
                .map(str::to_string)
                .collect(),
        ),
        (_, Some(value)) => HydratedValue::String(value),
    }
}

fn bind_parameter(descriptor: &TypeDescriptor, raw: Option<ParameterValue>) -> HydratedValue {
    match (&descriptor.base, raw) {
        (BaseKind::Mixed, raw) => raw.map_or(HydratedValue::Null, |value| {
            HydratedValue::Json(value.to_json())
        }),
        (_, None) => null_or_empty(descriptor),
        (BaseKind::Array, Some(ParameterValue::Single(value))) => HydratedValue::List(vec![value]),
        (BaseKind::Array, Some(ParameterValue::Multiple(values))) => HydratedValue::List(values),
        (_, Some(ParameterValue::Single(value))) => HydratedValue::String(value),
        (_, Some(ParameterValue::Multiple(values))) => match values.into_iter().last() {
            Some(last) => HydratedValue::String(last),
            None => null_or_empty(descriptor),
        },
    }
}

fn bind_var(descriptor: &TypeDescriptor, raw: Option<String>) -> HydratedValue {
    match (&descriptor.base, raw) {
        (BaseKind::Mixed, raw) => raw.map_or(HydratedValue::Null, |value| {
            HydratedValue::Json(Value::String(value))
        }),
        (_, None) => null_or_empty(descriptor),
        (_, Some(value)) => HydratedValue::String(value),
    }
}

fn bind_command(
    field: &BoundField,
    command: Option<&dyn CommandView>,
) -> BindingResult<HydratedValue> {
    let command = command.ok_or_else(|| {
        BindingError::binding_spec(
            field.name(),
            "field is bound to command arguments outside a command invocation",
        )
    })?;

    if field.name() == FLAGS_FIELD {
        let flags = command
            .flags()
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect::<Map<_, _>>();
        return Ok(HydratedValue::Json(Value::Object(flags)));
    }

    let words = command.words().to_vec();
    Ok(match field.descriptor.base {
        BaseKind::Mixed => {
            HydratedValue::Json(Value::Array(words.into_iter().map(Value::String).collect()))
        }
        _ => HydratedValue::List(words),
    })
}

/// Absent value under the null policy: `null` when nullable, otherwise the
/// type's empty value
fn null_or_empty(descriptor: &TypeDescriptor) -> HydratedValue {
    if descriptor.nullable {
        HydratedValue::Null
    } else {
        empty_value(descriptor)
    }
}

fn empty_value(descriptor: &TypeDescriptor) -> HydratedValue {
    match descriptor.base {
        BaseKind::Array => HydratedValue::List(Vec::new()),
        BaseKind::Int => HydratedValue::Int(0),
        BaseKind::Float => HydratedValue::Float(0.0),
        BaseKind::Bool => HydratedValue::Bool(false),
        _ => HydratedValue::String(String::new()),
    }
}

fn parse_date(field: &BoundField, raw: &str) -> BindingResult<HydratedValue> {
    let format = field.date_format().ok_or_else(|| {
        BindingError::binding_spec(
            field.name(),
            format!("unable to determine date format for property: {}", field.name()),
        )
    })?;

    format
        .parse_value(raw)
        .map(HydratedValue::Date)
        .ok_or_else(|| BindingError::DateFormat {
            field: field.name().to_string(),
            format: format.declared().to_string(),
            value: raw.to_string(),
        })
}

/// Type-match guard for primitive json fields
fn json_scalar(
    field: &BoundField,
    base: &BaseKind,
    data: Option<&Value>,
) -> BindingResult<HydratedValue> {
    let mismatch = |found: &str| {
        BindingError::type_mismatch(field.name(), &field.spec.source_key, found, base.name())
    };

    let Some(data) = data else {
        return Err(mismatch("null"));
    };

    let value = match (base, data) {
        (BaseKind::String, Value::String(s)) => HydratedValue::String(s.clone()),
        (BaseKind::Int, Value::Number(n)) if n.is_i64() => {
            n.as_i64().map(HydratedValue::Int).ok_or_else(|| mismatch("integer"))?
        }
        (BaseKind::Float, Value::Number(n)) => {
            n.as_f64().map(HydratedValue::Float).ok_or_else(|| mismatch("double"))?
        }
        (BaseKind::Bool, Value::Bool(b)) => HydratedValue::Bool(*b),
        (BaseKind::Array, Value::Array(_)) => HydratedValue::Json(data.clone()),
        (_, other) => return Err(mismatch(shape_of(other))),
    };

    Ok(value)
}
