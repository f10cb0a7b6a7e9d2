//!
//! ListFormat Runtime Functions
//!
//! Format a materialized list with the formatter's resolved locale data. The
//! list must be an array of strings; any other element is a type error.
//!

use vela_std_core::{
    display_value, list_format_data, Handle, ListFormatData, Value, VelaArray, VelaError, VelaString,
    VelaStruct, TYPE_ID_LIST_PART,
};
use vela_std_intl::ListFormatter;

use crate::context::Context;
use crate::runtime::MethodName;

pub fn format_list(ctx: &Context, list_format: Value, list: Value) -> Result<Handle, VelaError> {
    let (formatter, items) = prepare(ctx, list_format, list, MethodName::ListFormatPrototypeFormat)?;
    Ok(VelaString::new(&formatter.format(&items)))
}

pub fn format_list_to_parts(ctx: &Context, list_format: Value, list: Value) -> Result<Handle, VelaError> {
    let (formatter, items) = prepare(ctx, list_format, list, MethodName::ListFormatPrototypeFormatToParts)?;
    let parts = formatter.format_to_parts(&items).into_iter().map(|part| {
        VelaStruct::new(
            TYPE_ID_LIST_PART,
            [VelaString::new(part.kind.as_str()), VelaString::new(&part.value)],
        )
    });
    Ok(VelaArray::from_values(parts))
}

fn prepare(
    ctx: &Context,
    list_format: Value,
    list: Value,
    method: MethodName,
) -> Result<(ListFormatter, Vec<String>), VelaError> {
    let data: &ListFormatData = list_format_data(&list_format).ok_or_else(|| VelaError::IncompatibleReceiver {
        method: method.as_str(),
        receiver: display_value(list_format),
    })?;
    let formatter = ListFormatter::new(data, ctx.locale_data())?;
    Ok((formatter, string_items(list)?))
}

fn string_items(list: Value) -> Result<Vec<String>, VelaError> {
    let array = list
        .as_array()
        .ok_or_else(|| VelaError::Internal(format!("expected a list, got {}", display_value(list))))?;
    array
        .values()
        .iter()
        .map(|&item| {
            item.as_string()
                .map(|s| s.to_rust_string())
                .ok_or_else(|| VelaError::NotAString {
                    value: display_value(item),
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use vela_std_core::{ListKind, ListStyle, LIST_PART_TYPE_FIELD, LIST_PART_VALUE_FIELD};
    use vela_std_intl::BuiltinLocaleData;

    fn context() -> Context {
        Context::new(Box::new(BuiltinLocaleData), "en")
    }

    fn list(items: &[&str]) -> Handle {
        VelaArray::from_values(items.iter().map(|s| VelaString::new(s)))
    }

    #[test]
    fn test_format_conjunction() {
        let ctx = context();
        let lf = ListFormatData::new("en", ListKind::Conjunction, ListStyle::Long).into_object();
        let out = format_list(&ctx, lf.value(), list(&["a", "b", "c"]).value()).unwrap();
        assert_eq!(out.as_string().unwrap().to_rust_string(), "a, b, and c");
    }

    #[test]
    fn test_format_to_parts_builds_records() {
        let ctx = context();
        let lf = ListFormatData::new("en", ListKind::Disjunction, ListStyle::Long).into_object();
        let out = format_list_to_parts(&ctx, lf.value(), list(&["x", "y"]).value()).unwrap();
        let parts = out.as_array().unwrap();
        assert_eq!(parts.len(), 3);
        let middle = parts.get(1).unwrap();
        let record = middle.as_struct().unwrap();
        assert_eq!(record.type_id, TYPE_ID_LIST_PART);
        let kind = record.field(LIST_PART_TYPE_FIELD).unwrap();
        let value = record.field(LIST_PART_VALUE_FIELD).unwrap();
        assert_eq!(kind.as_string().unwrap().to_rust_string(), "literal");
        assert_eq!(value.as_string().unwrap().to_rust_string(), " or ");
    }

    #[test]
    fn test_non_string_element_is_type_error() {
        let ctx = context();
        let lf = ListFormatData::new("en", ListKind::Conjunction, ListStyle::Long).into_object();
        let items = VelaArray::from_values([VelaString::new("a"), Handle::immediate(Value::smi(5))]);
        let err = format_list(&ctx, lf.value(), items.value()).unwrap_err();
        assert_eq!(err, VelaError::NotAString { value: "5".to_string() });
    }

    #[test]
    fn test_wrong_receiver() {
        let ctx = context();
        let err = format_list(&ctx, Value::NULL, list(&[]).value()).unwrap_err();
        assert!(err.to_string().contains("Intl.ListFormat.prototype.format"));
    }
}
