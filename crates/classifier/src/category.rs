use crate::error::{ClassifierError, ClassifierResult};

pub const LOAD_SNAPSHOT_DIRECTIVE: &str = "=loadYML";
pub const DELETE_CATEGORIES_DIRECTIVE: &str = "=delCat";
pub const PURGE_TOKENS_DIRECTIVE: &str = "=purgeTokens";

pub const RESERVED_DIRECTIVES: [&str; 3] = [
    LOAD_SNAPSHOT_DIRECTIVE,
    DELETE_CATEGORIES_DIRECTIVE,
    PURGE_TOKENS_DIRECTIVE,
];

/// Marks an untrain request in the category field.
pub const UNTRAIN_PREFIX: char = '-';

pub fn is_directive(name: &str) -> bool {
    RESERVED_DIRECTIVES.contains(&name)
}

pub fn validate_category(name: &str) -> ClassifierResult<()> {
    if name.is_empty() {
        return Err(ClassifierError::invalid_category(name, "category is empty"));
    }
    if name.starts_with(UNTRAIN_PREFIX) {
        return Err(ClassifierError::invalid_category(
            name,
            format!("categories may not start with '{UNTRAIN_PREFIX}'"),
        ));
    }
    if is_directive(name) {
        return Err(ClassifierError::invalid_category(
            name,
            "category collides with a reserved directive",
        ));
    }
    if name.chars().any(char::is_whitespace) {
        return Err(ClassifierError::invalid_category(
            name,
            "categories may not contain whitespace",
        ));
    }
    Ok(())
}
