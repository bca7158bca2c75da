//! Bridge names, argument labels and constructor tokens.
//!
//! Selectors are mapped to identifiers generators can use directly. External
//! renames are looked up once, when an entity is created; collision
//! resolution later appends suffixes to the result but never looks the name
//! up again.

use std::collections::HashMap;

use crate::context::ResolutionContext;

/// Generator-neutral bridge name of constructor-family methods.
pub const CONSTRUCTOR_MARKER: &str = "constructor";

/// Result of a rename-table lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName {
    pub name: String,
    /// True when a rename entry was found.
    pub renamed: bool,
}

/// Look up `native` in the rename table, first as `{owner}.{native}`, then
/// alone. Without an entry the native name is returned unchanged.
pub fn resolve_bridge_name(ctx: &ResolutionContext, native: &str, owner: &str) -> ResolvedName {
    let qualified = (!owner.is_empty()).then(|| format!("{owner}.{native}"));
    let hit = qualified
        .as_deref()
        .and_then(|key| ctx.renames.get(key))
        .or_else(|| ctx.renames.get(native));

    match hit {
        Some(value) => ResolvedName {
            name: normalize_rename(value),
            renamed: true,
        },
        None => ResolvedName {
            name: native.to_string(),
            renamed: false,
        },
    }
}

/// `Module.name(a:b:)` becomes `name:a:b:`; a leading `init` becomes the
/// constructor marker.
fn normalize_rename(value: &str) -> String {
    let value = value.trim();
    let paren = value.find('(').unwrap_or(value.len());
    let unqualified = match value[..paren].find('.') {
        Some(dot) => &value[dot + 1..],
        None => value,
    };

    let colon_style = match unqualified.split_once('(') {
        Some((base, rest)) => {
            let labels = rest.trim_end_matches(')');
            if labels.is_empty() {
                base.to_string()
            } else {
                format!("{base}:{labels}")
            }
        }
        None => unqualified.to_string(),
    };

    match colon_style.strip_prefix("init") {
        Some(rest) if rest.is_empty() || rest.starts_with(':') => {
            format!("{CONSTRUCTOR_MARKER}{rest}")
        }
        _ => colon_style,
    }
}

/// Memory-management family of a method, by selector convention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodFamily {
    None,
    Alloc,
    Copy,
    MutableCopy,
    New,
    Init,
}

impl MethodFamily {
    /// The caller owns objects returned by these families.
    pub fn owns_returned(&self) -> bool {
        !matches!(self, MethodFamily::None)
    }
}

/// Family of `selector`; the prefix must end at a camel-case boundary.
pub fn method_family(selector: &str) -> MethodFamily {
    const FAMILIES: [(&str, MethodFamily); 5] = [
        ("mutableCopy", MethodFamily::MutableCopy),
        ("alloc", MethodFamily::Alloc),
        ("copy", MethodFamily::Copy),
        ("new", MethodFamily::New),
        ("init", MethodFamily::Init),
    ];
    let name = selector.trim_start_matches('_');
    for (prefix, family) in FAMILIES {
        if let Some(rest) = name.strip_prefix(prefix)
            && rest.chars().next().is_none_or(|c| !c.is_ascii_lowercase())
        {
            return family;
        }
    }
    MethodFamily::None
}

/// Core Foundation create rule: `Create` or `Copy` as a whole word.
pub fn follows_create_rule(function: &str) -> bool {
    ["Create", "Copy"].iter().any(|word| {
        function.match_indices(word).any(|(pos, _)| {
            function[pos + word.len()..]
                .chars()
                .next()
                .is_none_or(|c| !c.is_ascii_lowercase())
        })
    })
}

/// Names derived for one entity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DerivedNames {
    pub bridge_name: String,
    pub argument_labels: Vec<String>,
    pub constructor_tokens: Vec<String>,
    pub renamed: bool,
}

/// Names of a non-method entity: the first colon part is the bridge name,
/// the rest are argument labels.
pub fn entity_names(ctx: &ResolutionContext, native: &str, owner: &str) -> DerivedNames {
    let resolved = resolve_bridge_name(ctx, native, owner);
    let mut parts = selector_parts(&resolved.name);
    let bridge_name = if parts.is_empty() {
        native.to_string()
    } else {
        parts.remove(0)
    };
    DerivedNames {
        renamed: resolved.renamed && bridge_name != native,
        bridge_name,
        argument_labels: parts,
        constructor_tokens: Vec::new(),
    }
}

/// Names of a method with selector `selector` declared in `owner`.
///
/// Constructor-family methods get the constructor marker as bridge name and
/// their tokens as labels. Other methods join the selector parts in camel
/// case. A trailing error-output parameter drops the last part.
pub fn method_names(
    ctx: &ResolutionContext,
    selector: &str,
    owner: &str,
    has_error_param: bool,
) -> DerivedNames {
    let resolved = resolve_bridge_name(ctx, selector, owner);
    let default = default_method_names(selector, has_error_param);
    if !resolved.renamed {
        return default;
    }

    let mut parts = selector_parts(&resolved.name);
    let derived = if parts.first().is_some_and(|p| p == CONSTRUCTOR_MARKER) {
        parts.remove(0);
        DerivedNames {
            bridge_name: CONSTRUCTOR_MARKER.to_string(),
            argument_labels: parts.clone(),
            constructor_tokens: parts,
            renamed: false,
        }
    } else {
        DerivedNames {
            bridge_name: camel_join(&parts),
            argument_labels: parts,
            constructor_tokens: Vec::new(),
            renamed: false,
        }
    };
    DerivedNames {
        renamed: derived.bridge_name != default.bridge_name
            || derived.argument_labels != default.argument_labels,
        ..derived
    }
}

fn default_method_names(selector: &str, has_error_param: bool) -> DerivedNames {
    if method_family(selector) == MethodFamily::Init {
        let tokens = constructor_tokens(selector, has_error_param);
        return DerivedNames {
            bridge_name: CONSTRUCTOR_MARKER.to_string(),
            argument_labels: tokens.clone(),
            constructor_tokens: tokens,
            renamed: false,
        };
    }

    let mut parts = selector_parts(selector);
    let first = parts.first().cloned().unwrap_or_default();
    if has_error_param {
        parts.pop();
    }
    DerivedNames {
        bridge_name: if parts.is_empty() { first } else { camel_join(&parts) },
        argument_labels: parts,
        constructor_tokens: Vec::new(),
        renamed: false,
    }
}

/// Tokens of an `init...` selector: `initWithName:age:` gives `[name, age]`.
pub fn constructor_tokens(selector: &str, has_error_param: bool) -> Vec<String> {
    let rest = selector.trim_start_matches('_');
    let rest = rest.strip_prefix("init").unwrap_or(rest);
    let rest = rest.strip_prefix("With").unwrap_or(rest);

    let mut tokens: Vec<String> = rest
        .split(':')
        .filter(|t| !t.is_empty())
        .map(normalize_token)
        .collect();
    if has_error_param {
        tokens.pop();
    }

    let mut seen: HashMap<String, usize> = HashMap::new();
    tokens
        .into_iter()
        .map(|token| {
            let count = seen.entry(token.clone()).or_insert(0);
            *count += 1;
            if *count == 1 {
                token
            } else {
                format!("{token}{count}")
            }
        })
        .collect()
}

/// Lowercase the leading capital run of a token, keeping the capital that
/// starts the next word (`URLString` gives `urlString`).
///
/// Equivalent to lowercasing the first letter and each following capital,
/// stopping at the first non-capital or at a capital that sits right before
/// a lowercase letter. A bare plural `s` after the run does not start a word
/// (`URLs` gives `urls`).
fn normalize_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    let run = chars.iter().take_while(|c| c.is_ascii_uppercase()).count();
    let rest: String = chars[run..].iter().collect();
    let next_word = chars.get(run).is_some_and(char::is_ascii_lowercase);
    let lower_count = if run > 1 && rest != "s" && next_word {
        run - 1
    } else {
        run
    };

    let mut out: String = chars[..lower_count]
        .iter()
        .map(char::to_ascii_lowercase)
        .collect();
    out.extend(&chars[lower_count..]);

    if out.len() > 3 && out.ends_with("Url") {
        out.truncate(out.len() - 3);
        out.push_str("URL");
    } else if out.len() > 2 && out.ends_with("Id") {
        out.truncate(out.len() - 2);
        out.push_str("ID");
    }
    out
}

/// Non-empty colon-separated parts.
pub fn selector_parts(selector: &str) -> Vec<String> {
    selector
        .split(':')
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}

/// `[doThing, withValue]` gives `doThingWithValue`.
fn camel_join(parts: &[String]) -> String {
    let mut out = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            out.push_str(part);
            continue;
        }
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    out
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn ctx() -> ResolutionContext {
        ResolutionContext::default()
    }

    #[test]
    fn test_resolve_without_entry_is_identity() {
        let resolved = resolve_bridge_name(&ctx(), "initWithName:age:", "Person");
        assert_eq!(resolved.name, "initWithName:age:");
        assert!(!resolved.renamed);
    }

    #[test]
    fn test_resolve_prefers_owner_key() {
        let ctx = ctx()
            .with_rename("description", "summary")
            .with_rename("NSObject.description", "debugText");
        assert_eq!(resolve_bridge_name(&ctx, "description", "NSObject").name, "debugText");
        assert_eq!(resolve_bridge_name(&ctx, "description", "NSView").name, "summary");
        assert_eq!(resolve_bridge_name(&ctx, "description", "").name, "summary");
    }

    #[test]
    fn test_normalize_rename() {
        assert_eq!(normalize_rename("Foundation.contains(_:)"), "contains:_:");
        assert_eq!(normalize_rename("init(string:)"), "constructor:string:");
        assert_eq!(normalize_rename("CGRect.init(x:y:width:height:)"), "constructor:x:y:width:height:");
        assert_eq!(normalize_rename("reload()"), "reload");
        assert_eq!(normalize_rename("initialize"), "initialize");
        assert_eq!(normalize_rename("Widget"), "Widget");
    }

    #[test]
    fn test_normalize_token() {
        assert_eq!(normalize_token("URLString"), "urlString");
        assert_eq!(normalize_token("HTTPBody"), "httpBody");
        assert_eq!(normalize_token("URLs"), "urls");
        assert_eq!(normalize_token("Name"), "name");
        assert_eq!(normalize_token("X"), "x");
        assert_eq!(normalize_token("bytes"), "bytes");
        assert_eq!(normalize_token("ObjectId"), "objectID");
    }

    #[test]
    fn test_method_family() {
        assert_eq!(method_family("initWithFrame:"), MethodFamily::Init);
        assert_eq!(method_family("init"), MethodFamily::Init);
        assert_eq!(method_family("initialize"), MethodFamily::None);
        assert_eq!(method_family("copyWithZone:"), MethodFamily::Copy);
        assert_eq!(method_family("mutableCopy"), MethodFamily::MutableCopy);
        assert_eq!(method_family("newObject"), MethodFamily::New);
        assert_eq!(method_family("newsletter"), MethodFamily::None);
        assert_eq!(method_family("_allocWithZone:"), MethodFamily::Alloc);
        assert!(!MethodFamily::None.owns_returned());
    }

    #[test]
    fn test_create_rule() {
        assert!(follows_create_rule("CGColorCreate"));
        assert!(follows_create_rule("CFStringCreateCopy"));
        assert!(follows_create_rule("CGPathCreateMutableCopy"));
        assert!(!follows_create_rule("CGColorGetAlpha"));
        assert!(!follows_create_rule("CFCreated"));
    }

    #[test]
    fn test_constructor_tokens() {
        assert_eq!(constructor_tokens("initWithName:age:", false), vec!["name", "age"]);
        assert_eq!(constructor_tokens("init", false), Vec::<String>::new());
        assert_eq!(constructor_tokens("initWithURL:", false), vec!["url"]);
        assert_eq!(
            constructor_tokens("initWithURLString:fileUrl:ownerId:", false),
            vec!["urlString", "fileURL", "ownerID"]
        );
        assert_eq!(
            constructor_tokens("initWithValue:value:value:", false),
            vec!["value", "value2", "value3"]
        );
        assert_eq!(
            constructor_tokens("initWithContentsOfURL:error:", true),
            vec!["contentsOfURL"]
        );
    }

    #[test]
    fn test_method_names_for_constructor() {
        let names = method_names(&ctx(), "initWithName:age:", "Person", false);
        assert_eq!(names.bridge_name, CONSTRUCTOR_MARKER);
        assert_eq!(names.constructor_tokens, vec!["name", "age"]);
        assert_eq!(names.argument_labels, vec!["name", "age"]);
        assert!(!names.renamed);
    }

    #[test]
    fn test_method_names_join_parts() {
        let names = method_names(&ctx(), "doThing:withValue:", "Worker", false);
        assert_eq!(names.bridge_name, "doThingWithValue");
        assert_eq!(names.argument_labels, vec!["doThing", "withValue"]);
        assert!(names.constructor_tokens.is_empty());

        let with_error = method_names(&ctx(), "writeToFile:atomically:error:", "Data", true);
        assert_eq!(with_error.bridge_name, "writeToFileAtomically");
        assert_eq!(with_error.argument_labels.len(), 2);

        let only_error = method_names(&ctx(), "removeItemAndReturnError:", "Store", true);
        assert_eq!(only_error.bridge_name, "removeItemAndReturnError");
        assert!(only_error.argument_labels.is_empty());
    }

    #[test]
    fn test_method_names_with_rename() {
        let ctx = ctx()
            .with_rename("NSURL.initWithString:", "init(string:)")
            .with_rename("NSURL.checkResourceIsReachableAndReturnError:", "isReachable()");

        let ctor = method_names(&ctx, "initWithString:", "NSURL", false);
        assert_eq!(ctor.bridge_name, CONSTRUCTOR_MARKER);
        assert_eq!(ctor.constructor_tokens, vec!["string"]);
        assert!(!ctor.renamed);

        let renamed = method_names(&ctx, "checkResourceIsReachableAndReturnError:", "NSURL", true);
        assert_eq!(renamed.bridge_name, "isReachable");
        assert!(renamed.renamed);
    }

    #[test]
    fn test_entity_names() {
        let ctx = ctx().with_rename("CGRectMake", "CGRect.init(x:y:width:height:)");
        let names = entity_names(&ctx, "CGRectMake", "");
        assert_eq!(names.bridge_name, CONSTRUCTOR_MARKER);
        assert_eq!(names.argument_labels, vec!["x", "y", "width", "height"]);
        assert!(names.renamed);

        let plain = entity_names(&ctx, "CGPointMake", "");
        assert_eq!(plain.bridge_name, "CGPointMake");
        assert!(!plain.renamed);
    }
}
