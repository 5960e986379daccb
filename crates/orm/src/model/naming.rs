//! Naming conventions - model names to table names

/// Convert `PascalCase` (or `camelCase`) to `snake_case`, keeping acronyms together
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_ascii_digit());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && chars.get(i + 1).map_or(false, |next| next.is_lowercase());
            if (prev_lower || acronym_end) && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else if c == '-' || c == ' ' {
            result.push('_');
        } else {
            result.push(c);
        }
    }

    result
}

const IRREGULAR: &[(&str, &str)] = &[
    ("person", "people"),
    ("child", "children"),
    ("man", "men"),
    ("woman", "women"),
    ("mouse", "mice"),
    ("goose", "geese"),
    ("tooth", "teeth"),
    ("foot", "feet"),
];

const UNCOUNTABLE: &[&str] = &["equipment", "information", "money", "news", "series", "species", "sheep", "fish", "data"];

/// English pluralization of a single lowercase word
pub fn pluralize(word: &str) -> String {
    if word.is_empty() || UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    if let Some((_, plural)) = IRREGULAR.iter().find(|(singular, _)| *singular == word) {
        return plural.to_string();
    }

    let consonant_y = word.ends_with('y')
        && !matches!(word.chars().rev().nth(1), Some('a' | 'e' | 'i' | 'o' | 'u'));

    if consonant_y {
        format!("{}ies", &word[..word.len() - 1])
    } else if word.ends_with('s')
        || word.ends_with("sh")
        || word.ends_with("ch")
        || word.ends_with('x')
        || word.ends_with('z')
    {
        format!("{}es", word)
    } else {
        format!("{}s", word)
    }
}

/// Conventional table name for a model: snake_case, last word pluralized
pub fn table_name_for(model_name: &str) -> String {
    let snake = to_snake_case(model_name);
    match snake.rsplit_once('_') {
        Some((head, last)) => format!("{}_{}", head, pluralize(last)),
        None => pluralize(&snake),
    }
}

/// Last path segment of a Rust type name, without generic arguments
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snake_case() {
        assert_eq!(to_snake_case("User"), "user");
        assert_eq!(to_snake_case("UserProfile"), "user_profile");
        assert_eq!(to_snake_case("HTTPRequestLog"), "http_request_log");
        assert_eq!(to_snake_case("blogPost2Draft"), "blog_post2_draft");
    }

    #[test]
    fn test_table_names() {
        assert_eq!(table_name_for("User"), "users");
        assert_eq!(table_name_for("UserProfile"), "user_profiles");
        assert_eq!(table_name_for("Category"), "categories");
        assert_eq!(table_name_for("Day"), "days");
        assert_eq!(table_name_for("Address"), "addresses");
        assert_eq!(table_name_for("Person"), "people");
        assert_eq!(table_name_for("SalesPerson"), "sales_people");
        assert_eq!(table_name_for("News"), "news");
    }

    #[test]
    fn test_short_type_name() {
        assert_eq!(short_type_name("my_app::models::User"), "User");
        assert_eq!(short_type_name("app::Wrapper<app::Inner>"), "Wrapper");
        assert_eq!(short_type_name("Plain"), "Plain");
    }
}
