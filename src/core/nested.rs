//! Recursive binding of nested DTOs from JSON fragments.
use serde_json::Value;

use crate::core::{
    error::{BindingError, BindingResult},
    hydrator::{Frame, Hydrator},
    json_path::shape_of,
    schema::BoundField,
    value::HydratedValue,
};

/// Hydrate one `element` instance per item of a JSON array, in order
pub(crate) fn bind_dto_list(
    hydrator: &Hydrator,
    field: &BoundField,
    element: &str,
    data: Option<&Value>,
    frame: &Frame<'_>,
) -> BindingResult<HydratedValue> {
    let Some(Value::Array(items)) = data else {
        return Err(mismatch(field, data, "array"));
    };

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            hydrator
                .hydrate_fragment(element, item, frame)
                .map_err(|e| e.within(&format!("{}.{index}", field.name())))
        })
        .collect::<BindingResult<Vec<_>>>()
        .map(HydratedValue::DtoList)
}

/// Hydrate a single nested `name` instance from a JSON object
pub(crate) fn bind_dto(
    hydrator: &Hydrator,
    field: &BoundField,
    name: &str,
    data: Option<&Value>,
    frame: &Frame<'_>,
) -> BindingResult<HydratedValue> {
    match data {
        Some(fragment @ Value::Object(_)) => hydrator
            .hydrate_fragment(name, fragment, frame)
            .map(HydratedValue::Dto)
            .map_err(|e| e.within(field.name())),
        other => Err(mismatch(field, other, "object")),
    }
}

fn mismatch(field: &BoundField, data: Option<&Value>, expected: &str) -> BindingError {
    BindingError::type_mismatch(
        field.name(),
        &field.spec.source_key,
        data.map_or("null", shape_of),
        expected,
    )
}
