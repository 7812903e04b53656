/// Categories offered by the entry menus. Any other non-empty label is a custom category.
pub const PREDEFINED_CATEGORIES: [&str; 8] = [
    "Food",
    "Transport",
    "Entertainment",
    "Shopping",
    "Bills",
    "Health",
    "Education",
    "Other",
];

/// Resolves menu input to a category label: `1`..`8` pick a predefined category,
/// a predefined name in any case is normalized, anything else is returned trimmed.
pub fn resolve_category(input: &str) -> String {
    let input = input.trim();
    if let Ok(choice) = input.parse::<usize>() {
        if (1..=PREDEFINED_CATEGORIES.len()).contains(&choice) {
            return PREDEFINED_CATEGORIES[choice - 1].to_string();
        }
    }
    PREDEFINED_CATEGORIES
        .iter()
        .find(|c| c.eq_ignore_ascii_case(input))
        .map(|c| c.to_string())
        .unwrap_or_else(|| input.to_string())
}
