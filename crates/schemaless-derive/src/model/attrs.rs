//! Attribute parsing for Model derive macro.
//!
//! Handles parsing of struct-level and field-level `#[orm(...)]` attributes.

use crate::sql_ident::{parse_column_ddl, parse_sql_ident};
use syn::{DeriveInput, Result};

/// Struct-level `#[orm(...)]` options.
#[derive(Default)]
pub(super) struct StructAttr {
    pub table: Option<String>,
}

/// Field-level `#[orm(...)]` options.
#[derive(Default)]
pub(super) struct FieldAttr {
    pub is_id: bool,
    pub required: bool,
    pub column: Option<String>,
    pub ddl: Option<String>,
}

impl syn::parse::Parse for StructAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = StructAttr::default();

        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            if ident != "table" {
                return Err(syn::Error::new(
                    ident.span(),
                    format!("unknown model attribute `{ident}` (expected `table`)"),
                ));
            }
            let _: syn::Token![=] = input.parse()?;
            let value: syn::LitStr = input.parse()?;
            attr.table = Some(parse_sql_ident(&value, "table")?);

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

impl syn::parse::Parse for FieldAttr {
    fn parse(input: syn::parse::ParseStream) -> Result<Self> {
        let mut attr = FieldAttr::default();

        // Comma-separated flags (`id`, `required`) or key = "value" pairs
        while !input.is_empty() {
            let ident: syn::Ident = input.parse()?;
            match ident.to_string().as_str() {
                "id" => attr.is_id = true,
                "required" => attr.required = true,
                "column" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    attr.column = Some(parse_sql_ident(&value, "column")?);
                }
                "ddl" => {
                    let _: syn::Token![=] = input.parse()?;
                    let value: syn::LitStr = input.parse()?;
                    attr.ddl = Some(parse_column_ddl(&value)?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!(
                            "unknown field attribute `{other}` (expected `id`, `required`, `column` or `ddl`)"
                        ),
                    ));
                }
            }

            if input.peek(syn::Token![,]) {
                let _: syn::Token![,] = input.parse()?;
            } else {
                break;
            }
        }

        Ok(attr)
    }
}

/// Parse all struct-level `#[orm(...)]` attributes.
pub(super) fn get_struct_attr(input: &DeriveInput) -> Result<StructAttr> {
    let mut merged = StructAttr::default();
    for attr in &input.attrs {
        if attr.path().is_ident("orm") {
            let parsed: StructAttr = attr.parse_args()?;
            if parsed.table.is_some() {
                merged.table = parsed.table;
            }
        }
    }
    Ok(merged)
}

/// Parse all `#[orm(...)]` attributes on a field.
pub(super) fn get_field_attr(field: &syn::Field) -> Result<FieldAttr> {
    let mut merged = FieldAttr::default();
    for attr in &field.attrs {
        if attr.path().is_ident("orm") {
            let parsed: FieldAttr = attr.parse_args()?;
            merged.is_id |= parsed.is_id;
            merged.required |= parsed.required;
            if parsed.column.is_some() {
                merged.column = parsed.column;
            }
            if parsed.ddl.is_some() {
                merged.ddl = parsed.ddl;
            }
        }
    }
    Ok(merged)
}
