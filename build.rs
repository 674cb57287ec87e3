// build.rs
//
// Compiles the strings in `locales/*.toml` into a `t!` macro so that every
// lookup is checked at compile time. English is always loaded; the selected
// language is layered on top of it.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;

const FALLBACK_LANG: &str = "en";

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=locales");
    println!("cargo:rerun-if-env-changed=ANVIL_LANG");

    let lang = selected_language();
    println!("cargo:rustc-env=ANVIL_LANG_EFFECTIVE={}", lang);

    let mut strings = read_catalogue(FALLBACK_LANG)
        .unwrap_or_else(|e| panic!("locales/{}.toml is required: {}", FALLBACK_LANG, e));
    if lang != FALLBACK_LANG {
        match read_catalogue(&lang) {
            Ok(overrides) => strings.extend(overrides),
            Err(e) => println!(
                "cargo:warning=No usable catalogue for '{}' ({}); using '{}'.",
                lang, e, FALLBACK_LANG
            ),
        }
    }

    let out_dir = env::var("OUT_DIR").expect("cargo sets OUT_DIR for build scripts");
    fs::write(Path::new(&out_dir).join("translations.rs"), render_macro(&strings))
        .expect("failed to write translations.rs");
}

/// A `lang_*` feature wins over `ANVIL_LANG`, which wins over English.
fn selected_language() -> String {
    let mut from_features: Vec<String> = env::vars()
        .filter_map(|(key, _)| key.strip_prefix("CARGO_FEATURE_LANG_").map(str::to_lowercase))
        .collect();
    from_features.sort();
    if let Some(first) = from_features.first() {
        if from_features.len() > 1 {
            println!(
                "cargo:warning=Several language features enabled ({}); using '{}'.",
                from_features.join(", "),
                first
            );
        }
        return first.clone();
    }
    env::var("ANVIL_LANG").unwrap_or_else(|_| FALLBACK_LANG.to_string())
}

fn read_catalogue(lang: &str) -> Result<BTreeMap<String, String>, String> {
    let path = format!("locales/{}.toml", lang);
    let text = fs::read_to_string(&path).map_err(|e| e.to_string())?;
    toml::from_str(&text).map_err(|e| e.to_string())
}

fn render_macro(strings: &BTreeMap<String, String>) -> String {
    let mut code = String::from("#[macro_export]\nmacro_rules! t {\n");
    for (key, value) in strings {
        code.push_str(&format!("    ({:?}) => {{ {:?} }};\n", key, value));
    }
    code.push_str(
        "    ($key:expr) => {{ compile_error!(concat!(\"Missing translation key: \", $key)) }};\n}\n",
    );
    code
}
