//! Model derive macro implementation
//!
//! ## Module Structure
//!
//! - `attrs`: Struct and field attribute parsing

mod attrs;

use attrs::{get_field_attr, get_struct_attr};

use crate::common::syn_types::is_date_type;
use crate::sql_ident::parse_sql_ident_with_span;
use heck::{ToLowerCamelCase, ToShoutySnakeCase};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::ext::IdentExt;
use syn::spanned::Spanned;
use syn::{Data, DeriveInput, Fields, Result};

/// Method names the `Model` trait already uses; accessors may not shadow them.
const RESERVED_ACCESSORS: &[&str] = &[
    "get",
    "set",
    "id",
    "set_id",
    "fields",
    "field",
    "has_field",
    "from_record",
    "to_record",
    "is_persisted",
];

/// One parsed model field.
struct ModelField<'a> {
    ident: syn::Ident,
    /// Field name without the `r#` prefix.
    name: String,
    ty: &'a syn::Type,
    column: String,
    required: bool,
    ddl: Option<String>,
}

pub fn expand(input: DeriveInput) -> Result<TokenStream> {
    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "Model cannot be derived for generic structs",
        ));
    }

    let struct_attr = get_struct_attr(&input)?;
    let table_name = match struct_attr.table {
        Some(table) => table,
        None => parse_sql_ident_with_span(&name.unraw().to_string(), name.span(), "table")?,
    };

    let fields = match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(fields) => &fields.named,
            _ => {
                return Err(syn::Error::new_spanned(
                    &input,
                    "Model can only be derived for structs with named fields",
                ));
            }
        },
        _ => {
            return Err(syn::Error::new_spanned(
                &input,
                "Model can only be derived for structs",
            ));
        }
    };

    let mut model_fields = Vec::with_capacity(fields.len());
    let mut explicit_id: Option<usize> = None;

    for field in fields.iter() {
        let Some(ident) = field.ident.clone() else {
            return Err(syn::Error::new_spanned(field, "Model fields must be named"));
        };
        let field_name = ident.unraw().to_string();
        let attr = get_field_attr(field)?;

        let column = match attr.column {
            Some(column) => column,
            None => field_name.to_lower_camel_case(),
        };

        if attr.is_id {
            if explicit_id.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "Model allows only one #[orm(id)] field",
                ));
            }
            explicit_id = Some(model_fields.len());
        }

        if is_date_column(&field_name, &column) && !is_date_type(&field.ty) {
            return Err(syn::Error::new(
                field.ty.span(),
                format!(
                    "field `{field_name}` is named as a date and must use a date type \
                     (NaiveDateTime, NaiveDate, DateTime<Utc>, or Option of one)"
                ),
            ));
        }

        model_fields.push(ModelField {
            ident,
            name: field_name,
            ty: &field.ty,
            column,
            required: attr.required,
            ddl: attr.ddl,
        });
    }

    if model_fields.is_empty() {
        return Err(syn::Error::new_spanned(&input, "Model requires at least one field"));
    }

    let pk_index = match explicit_id {
        Some(index) => index,
        None => model_fields
            .iter()
            .position(|f| f.name == "id")
            .ok_or_else(|| {
                syn::Error::new_spanned(
                    &input,
                    "Model requires a primary key: a field named `id` or one marked #[orm(id)]",
                )
            })?,
    };

    let pk = &model_fields[pk_index];
    if pk.required || pk.ddl.is_some() {
        return Err(syn::Error::new_spanned(
            &pk.ident,
            "the primary key is assigned by the store and cannot be `required` or carry a `ddl`",
        ));
    }

    for (i, field) in model_fields.iter().enumerate() {
        if model_fields[..i].iter().any(|f| f.column == field.column) {
            return Err(syn::Error::new_spanned(
                &field.ident,
                format!("column `{}` is declared twice", field.column),
            ));
        }
        if i != pk_index && RESERVED_ACCESSORS.contains(&field.name.as_str()) {
            return Err(syn::Error::new_spanned(
                &field.ident,
                format!(
                    "field name `{}` collides with a Model method; rename the field and keep the column with #[orm(column = \"{}\")]",
                    field.name, field.column
                ),
            ));
        }
    }

    let model_name = name.unraw().to_string();
    let pk_ident = &pk.ident;
    let pk_ty = pk.ty;
    let pk_column = &pk.column;

    let col_consts = model_fields.iter().map(|f| {
        let const_name = format_ident!("COL_{}", f.name.to_shouty_snake_case());
        let column = &f.column;
        quote! { pub const #const_name: &'static str = #column; }
    });

    let accessors = model_fields
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != pk_index)
        .map(|(_, f)| {
            let ident = &f.ident;
            let ty = f.ty;
            let setter = format_ident!("set_{}", f.name);
            let getter_doc = format!("Value of the `{}` column.", f.column);
            quote! {
                #[doc = #getter_doc]
                pub fn #ident(&self) -> &#ty {
                    &self.#ident
                }

                pub fn #setter(&mut self, value: impl ::core::convert::Into<#ty>) -> &mut Self {
                    self.#ident = value.into();
                    self
                }
            }
        });

    let field_defs = model_fields.iter().enumerate().map(|(i, f)| {
        let field_name = &f.name;
        let column = &f.column;
        let required = f.required;
        let primary_key = i == pk_index;
        let ty = f.ty;
        let column_type = if primary_key {
            quote! { schemaless::ColumnType::PrimaryKey }
        } else if let Some(ddl) = &f.ddl {
            quote! { schemaless::ColumnType::Custom(#ddl) }
        } else {
            quote! { <#ty as schemaless::SqlType>::COLUMN_TYPE }
        };
        quote! {
            schemaless::FieldDef {
                name: #field_name,
                column: #column,
                column_type: #column_type,
                required: #required,
                primary_key: #primary_key,
            }
        }
    });

    let take_fields = model_fields.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        quote! { #ident: schemaless::__private::take_field(&mut record, #column)? }
    });

    let record_inserts = model_fields.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        quote! {
            record.insert(
                ::std::string::String::from(#column),
                schemaless::Value::from(::core::clone::Clone::clone(&self.#ident)),
            );
        }
    });

    let get_arms = model_fields.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        quote! {
            #column => ::core::result::Result::Ok(
                schemaless::Value::from(::core::clone::Clone::clone(&self.#ident)),
            ),
        }
    });

    let set_arms = model_fields.iter().map(|f| {
        let ident = &f.ident;
        let column = &f.column;
        quote! {
            #column => {
                self.#ident = value.decode(#column)?;
                ::core::result::Result::Ok(())
            }
        }
    });

    let field_count = model_fields.len();

    Ok(quote! {
        impl #name {
            pub const TABLE: &'static str = #table_name;
            #(#col_consts)*

            #(#accessors)*
        }

        impl schemaless::Model for #name {
            const MODEL: &'static str = #model_name;
            const TABLE: &'static str = #table_name;
            const PRIMARY_KEY: &'static str = #pk_column;

            fn fields() -> &'static [schemaless::FieldDef] {
                static FIELDS: &[schemaless::FieldDef] = &[#(#field_defs),*];
                FIELDS
            }

            fn from_record(mut record: schemaless::Record) -> schemaless::OrmResult<Self> {
                schemaless::__private::validate_record::<Self>(&record)?;
                ::core::result::Result::Ok(Self {
                    #(#take_fields),*
                })
            }

            fn to_record(&self) -> schemaless::Record {
                let mut record = schemaless::Record::with_capacity(#field_count);
                #(#record_inserts)*
                record
            }

            fn get(&self, column: &str) -> schemaless::OrmResult<schemaless::Value> {
                match column {
                    #(#get_arms)*
                    _ => ::core::result::Result::Err(
                        schemaless::OrmError::unknown_property(#model_name, column),
                    ),
                }
            }

            fn set(
                &mut self,
                column: &str,
                value: schemaless::Value,
            ) -> schemaless::OrmResult<()> {
                match column {
                    #(#set_arms)*
                    _ => ::core::result::Result::Err(
                        schemaless::OrmError::unknown_property(#model_name, column),
                    ),
                }
            }

            fn id(&self) -> ::core::option::Option<i64> {
                <#pk_ty as schemaless::IdField>::to_id(&self.#pk_ident)
            }

            fn set_id(&mut self, id: i64) {
                self.#pk_ident = <#pk_ty as schemaless::IdField>::from_id(id);
            }
        }

        // Auto-register this model's schema via inventory
        schemaless::inventory::submit! {
            schemaless::ModelRegistration {
                register_fn: |registry: &mut schemaless::SchemaRegistry| {
                    registry.register::<#name>();
                }
            }
        }
    })
}

/// Columns named like `signupDate` / `signup_date` hold dates.
fn is_date_column(field_name: &str, column: &str) -> bool {
    let camel = column.len() > "Date".len() && column.ends_with("Date");
    let snake = field_name.len() > "_date".len() && field_name.ends_with("_date");
    camel || snake
}
