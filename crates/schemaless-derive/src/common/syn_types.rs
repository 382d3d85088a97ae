//! Type helper utilities for syn type analysis.

/// Extract the inner type T from Option<T>, or return None if not an Option type.
///
/// Recognizes `Option<T>`, `std::option::Option<T>`, and `core::option::Option<T>`.
pub fn option_inner(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let seg = type_path.path.segments.last()?;
    if seg.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
        return None;
    };
    if args.args.len() != 1 {
        return None;
    }
    let syn::GenericArgument::Type(inner) = args.args.first()? else {
        return None;
    };
    Some(inner)
}

/// Check if a type is a chrono date/time type, optionally wrapped in `Option`.
///
/// Recognizes `NaiveDateTime`, `NaiveDate` and `DateTime<Utc>` by their last path
/// segment, so both `chrono::NaiveDate` and a bare `NaiveDate` import match.
pub fn is_date_type(ty: &syn::Type) -> bool {
    let ty = option_inner(ty).unwrap_or(ty);
    let syn::Type::Path(type_path) = ty else {
        return false;
    };
    let Some(seg) = type_path.path.segments.last() else {
        return false;
    };
    match seg.ident.to_string().as_str() {
        "NaiveDateTime" | "NaiveDate" => true,
        "DateTime" => {
            let syn::PathArguments::AngleBracketed(args) = &seg.arguments else {
                return false;
            };
            let Some(syn::GenericArgument::Type(syn::Type::Path(tz))) = args.args.first() else {
                return false;
            };
            tz.path.segments.last().is_some_and(|s| s.ident == "Utc")
        }
        _ => false,
    }
}
