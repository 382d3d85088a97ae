//! Derive macro for schemaless
//!
//! Provides `#[derive(Model)]`, which turns a plain struct into a persistable model.

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod common;
mod model;
mod sql_ident;

/// Derive `Model` for a struct.
///
/// # Example
///
/// ```ignore
/// use schemaless::Model;
///
/// #[derive(Model, Default)]
/// struct MapperModelTester {
///     #[orm(required, ddl = "int not null")]
///     user_id: i64,
///     name: String,
///     id: i64,
/// }
/// ```
///
/// # Generated
///
/// - `TABLE: &'static str` - Table name
/// - `COL_*: &'static str` - Column name constants
/// - A getter and a `set_*` setter for each non-key field
/// - `impl schemaless::Model` plus registration in the global schema registry
///
/// # Attributes
///
/// - `#[orm(table = "name")]` - Table name (defaults to the struct name)
/// - `#[orm(id)]` - Mark field as primary key (defaults to the field named `id`)
/// - `#[orm(required)]` - Field must be present when building from a record
/// - `#[orm(column = "name")]` - Column name (defaults to the camelCase field name)
/// - `#[orm(ddl = "int not null")]` - Explicit column declaration
#[proc_macro_derive(Model, attributes(orm))]
pub fn derive_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    model::expand(input)
        .unwrap_or_else(|e| e.to_compile_error())
        .into()
}
