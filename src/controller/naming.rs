//! Mount paths derived from controller type names.

use once_cell::sync::Lazy;
use regex::Regex;

/// An interior capital that starts a lowercase run: `FooBar` → `Foo_Bar`.
static WORD_START: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\B[A-Z][^A-Z]").expect("word-start regex should be valid"));

/// Controller names served at the root.
const ROOT_NAMES: [&str; 3] = ["Main", "Base", "Index"];

/// `FooBar` → `foo_bar`, `HTMLParser` → `html_parser`.
#[must_use]
pub fn snake_case(name: &str) -> String {
    WORD_START
        .replace_all(name, "_$0")
        .to_lowercase()
        .replace(' ', "_")
}

/// Mount path automap assigns to a controller type.
///
/// Only the last `::` segment counts and the `Controller` suffix is dropped.
/// `Main`, `Base` and `Index` map to `/`; anything else to `/{snake_case}`.
#[must_use]
pub fn derive_mount_path(type_name: &str) -> String {
    let last = type_name.rsplit("::").next().unwrap_or(type_name);
    let name = last.replace("Controller", "");
    if ROOT_NAMES.contains(&name.as_str()) {
        "/".to_string()
    } else {
        format!("/{}", snake_case(&name))
    }
}
