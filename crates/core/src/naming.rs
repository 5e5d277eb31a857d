//! Common naming utilities shared by the resolver, the error taxonomy and the
//! pagination engine.

/// Capitalize the first letter of a string.
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Lower-case the first letter of a string.
pub fn lowercase_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().chain(chars).collect(),
    }
}

/// Normalize a primitive member name to its type name.
///
/// - Capitalizes the first letter (`string` -> `String`)
/// - Capitalizes any embedded `int` (`uint64` -> `UInt64`)
///
/// Names that already start upper-case are returned unchanged.
pub fn normalize_primitive_name(member: &str) -> String {
    if member.chars().next().is_none_or(|c| c.is_uppercase()) {
        return member.to_string();
    }
    capitalize_first(member).replace("int", "Int")
}

/// Derive the canonical identifier of a dotted error code.
///
/// Lower-cases the leading character and replaces dots with underscores:
/// `AuthFailure.SignatureExpire` -> `authFailure_SignatureExpire`.
pub fn error_identifier(code: &str) -> String {
    lowercase_first(code).replace('.', "_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize_first() {
        assert_eq!(capitalize_first("foo"), "Foo");
        assert_eq!(capitalize_first(""), "");
        assert_eq!(capitalize_first("a"), "A");
        assert_eq!(capitalize_first("ABC"), "ABC");
    }

    #[test]
    fn test_lowercase_first() {
        assert_eq!(lowercase_first("SignatureExpire"), "signatureExpire");
        assert_eq!(lowercase_first(""), "");
        assert_eq!(lowercase_first("a"), "a");
    }

    #[test]
    fn test_normalize_primitive_name() {
        assert_eq!(normalize_primitive_name("string"), "String");
        assert_eq!(normalize_primitive_name("int64"), "Int64");
        assert_eq!(normalize_primitive_name("uint64"), "UInt64");
        assert_eq!(normalize_primitive_name("bool"), "Bool");
        assert_eq!(normalize_primitive_name("float"), "Float");
        assert_eq!(normalize_primitive_name("Filter"), "Filter");
    }

    #[test]
    fn test_error_identifier() {
        assert_eq!(
            error_identifier("AuthFailure.SignatureExpire"),
            "authFailure_SignatureExpire"
        );
        assert_eq!(error_identifier("InternalError"), "internalError");
    }
}
