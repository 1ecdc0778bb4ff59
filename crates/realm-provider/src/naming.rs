//! Source name normalisation.

/// Turns a snake_case source name into its resultset identifier
/// (`user_role` becomes `UserRole`). Names already in CamelCase are kept.
#[must_use]
pub fn camelize(source: &str) -> String {
    source
        .split(['_', '-'])
        .filter(|part| !part.is_empty())
        .map(|part| {
            let mut chars = part.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect()
}
