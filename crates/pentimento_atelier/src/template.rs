//! Template usage scanning and rewriting.
//!
//! Both passes stream the template through `lol_html`. The scan collects what
//! the markup needs from the script (tags, directives, identifiers, refs, i18n
//! functions); the rewrite normalizes `$`-prefixed globals in expressions and
//! then renames components and directives in the rewritten markup.

use std::cell::RefCell;
use std::collections::BTreeSet;

use lol_html::html_content::ContentType;
use lol_html::{doc_text, element, rewrite_str, RewriteStrSettings};
use once_cell::sync::Lazy;
use pentimento_carton::{hyphenate, CompactString};
use pentimento_croquis::{split_store_path, Features, FlagSet, ROOT_NAMESPACE};
use regex::{Captures, Regex};

use crate::registry::StoreRegistry;

pub use lol_html::errors::RewritingError;

static MUSTACHE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{([\s\S]*?)\}\}").unwrap());
static STRING_LITERAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"'(?:[^'\\]|\\.)*'|"(?:[^"\\]|\\.)*""#).unwrap());
static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^.\w$])([A-Za-z_$][\w$]*)").unwrap());
static I18N_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w$.])\$(tc|te|tm|t|d|n|rt)(\s*\()").unwrap());
static LOCALE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\w$.])\$i18n\.locale\b").unwrap());
static CONFIG: Lazy<Regex> = Lazy::new(|| Regex::new(r"(^|[^\w$.])\$config\b").unwrap());
static STORE_STATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^|[^\w$.])\$store\.state\.([A-Za-z_$][\w$]*)(?:\.([A-Za-z_$][\w$]*))?").unwrap()
});
static STORE_GETTER_PATH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(^|[^\w$.])\$store\.getters\[\s*['"]([^'"]+)['"]\s*\]"#).unwrap()
});
static STORE_GETTER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(^|[^\w$.])\$store\.getters\.([A-Za-z_$][\w$]*)").unwrap());

/// Directives compiled by Vue itself.
const BUILTIN_DIRECTIVES: &[&str] = &[
    "if", "else", "else-if", "for", "show", "model", "bind", "on", "slot", "html", "text",
    "once", "pre", "cloak", "memo", "is",
];

/// What the markup references.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TemplateUsage {
    /// Tag names as written
    pub tags: BTreeSet<String>,
    /// Custom directive names, kebab-case, without `v-`
    pub directives: BTreeSet<String>,
    /// Free identifiers in expressions and interpolations
    pub identifiers: BTreeSet<String>,
    /// Static `ref="..."` names
    pub refs: BTreeSet<CompactString>,
    /// i18n functions called through `$t(..)` and friends, locale and runtime config reads
    pub flags: FlagSet,
    /// Namespaces reached through `$store.getters['ns/x']`
    pub store_namespaces: BTreeSet<CompactString>,
    /// Markup that could not be scanned; every query answers yes
    pub opaque: bool,
}

impl TemplateUsage {
    /// Usage of markup that was not scanned (a failed rewrite, `lang="pug"`).
    pub fn opaque() -> Self {
        Self {
            opaque: true,
            ..Default::default()
        }
    }

    /// Whether a component is used, in Pascal or kebab spelling.
    pub fn uses_component(&self, name: &str) -> bool {
        if self.opaque {
            return true;
        }
        let kebab = hyphenate(name);
        self.tags
            .iter()
            .any(|tag| tag == name || tag.eq_ignore_ascii_case(&kebab))
    }

    /// Whether a custom directive bound as `local` (`vRipple`, `Ripple`) is used.
    pub fn uses_directive(&self, local: &str) -> bool {
        self.opaque || self.directives.contains(&directive_attr_name(local))
    }

    #[inline]
    pub fn uses_identifier(&self, name: &str) -> bool {
        self.opaque || self.identifiers.contains(name)
    }

    /// Whether a script binding is referenced by the markup in any form.
    pub fn references(&self, name: &str) -> bool {
        self.uses_identifier(name) || self.uses_component(name) || self.uses_directive(name)
    }

    fn scan_expression(&mut self, expression: &str) {
        let stripped = STRING_LITERAL.replace_all(expression, "''");
        for caps in IDENTIFIER.captures_iter(&stripped) {
            let name = &caps[2];
            if !name.starts_with('$') {
                self.identifiers.insert(name.to_string());
            }
        }
        for caps in I18N_CALL.captures_iter(expression) {
            self.flags
                .i18n
                .insert(CompactString::new(i18n_name(&caps[2])));
        }
        if LOCALE.is_match(expression) {
            self.flags.insert(Features::LOCALE);
        }
        if CONFIG.is_match(expression) {
            self.flags.insert(Features::RUNTIME_CONFIG);
        }
        for caps in STORE_GETTER_PATH.captures_iter(expression) {
            let (namespace, _) = split_store_path(&caps[2]);
            self.store_namespaces.insert(CompactString::new(namespace));
        }
        if STORE_GETTER.is_match(expression) {
            self.store_namespaces
                .insert(CompactString::new(ROOT_NAMESPACE));
        }
    }
}

/// Scan the markup without changing it.
pub fn scan_template(content: &str) -> Result<TemplateUsage, RewritingError> {
    let usage = RefCell::new(TemplateUsage::default());
    let text = RefCell::new(String::new());

    {
        let usage = &usage;
        let text = &text;
        rewrite_str(
            content,
            RewriteStrSettings {
                element_content_handlers: vec![element!("*", move |el| {
                    let mut usage = usage.borrow_mut();
                    usage.tags.insert(el.tag_name_preserve_case());
                    for attr in el.attributes() {
                        let name = attr.name_preserve_case();
                        let value = attr.value();
                        if name == "ref" {
                            usage.refs.insert(CompactString::new(value.trim()));
                            continue;
                        }
                        if let Some(directive) = custom_directive(&name) {
                            usage.directives.insert(directive.to_string());
                        }
                        if is_expression_attr(&name) {
                            usage.scan_expression(&value);
                        }
                    }
                    Ok(())
                })],
                document_content_handlers: vec![doc_text!(move |chunk| {
                    let mut buffer = text.borrow_mut();
                    buffer.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let mut usage = usage.borrow_mut();
                        for caps in MUSTACHE.captures_iter(&buffer) {
                            usage.scan_expression(&caps[1]);
                        }
                        buffer.clear();
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )?;
    }

    Ok(usage.into_inner())
}

/// Component and directive renames applied to the markup.
#[derive(Debug, Clone, Default)]
pub struct TemplateRenames {
    /// `(from, to)` component names in Pascal case
    pub components: Vec<(String, String)>,
    /// `(from, to)` directive bindings (`Ripple` → `vWave`)
    pub directives: Vec<(String, String)>,
}

/// Rewrite the markup. Returns the new markup and the store namespaces whose
/// instance it now references.
pub fn rewrite_template(
    content: &str,
    registry: &StoreRegistry,
    renames: &TemplateRenames,
) -> Result<(String, BTreeSet<CompactString>), RewritingError> {
    let normalizer = Normalizer {
        registry,
        stores: RefCell::new(BTreeSet::new()),
    };
    let text = RefCell::new(String::new());

    let output = {
        let normalizer = &normalizer;
        let text = &text;
        rewrite_str(
            content,
            RewriteStrSettings {
                element_content_handlers: vec![element!("*", move |el| {
                    let updates: Vec<(String, String)> = el
                        .attributes()
                        .iter()
                        .filter_map(|attr| {
                            let name = attr.name_preserve_case();
                            if !is_expression_attr(&name) {
                                return None;
                            }
                            let value = attr.value();
                            let normalized = normalizer.expression(&value);
                            (normalized != value).then_some((name, normalized))
                        })
                        .collect();
                    for (name, value) in updates {
                        el.set_attribute(&name, &value)?;
                    }
                    Ok(())
                })],
                document_content_handlers: vec![doc_text!(move |chunk| {
                    let mut buffer = text.borrow_mut();
                    buffer.push_str(chunk.as_str());
                    if chunk.last_in_text_node() {
                        let normalized = MUSTACHE
                            .replace_all(&buffer, |caps: &Captures| {
                                format!("{{{{{}}}}}", normalizer.expression(&caps[1]))
                            })
                            .into_owned();
                        chunk.replace(&normalized, ContentType::Html);
                        buffer.clear();
                    } else {
                        chunk.remove();
                    }
                    Ok(())
                })],
                ..RewriteStrSettings::new()
            },
        )?
    };

    let output = apply_renames(&output, renames);
    Ok((output, normalizer.stores.into_inner()))
}

struct Normalizer<'r> {
    registry: &'r StoreRegistry,
    stores: RefCell<BTreeSet<CompactString>>,
}

impl Normalizer<'_> {
    fn instance(&self, namespace: &str) -> String {
        self.stores
            .borrow_mut()
            .insert(CompactString::new(namespace));
        self.registry.resolve(namespace).instance
    }

    fn expression(&self, expression: &str) -> String {
        let out = LOCALE.replace_all(expression, "${1}locale");
        let out = I18N_CALL.replace_all(&out, |caps: &Captures| {
            format!("{}{}{}", &caps[1], i18n_name(&caps[2]), &caps[3])
        });
        let out = CONFIG.replace_all(&out, "${1}config");
        let out = STORE_STATE.replace_all(&out, |caps: &Captures| {
            let segment = &caps[2];
            let name = caps.get(3).map(|m| m.as_str());
            let target = if self.registry.contains(segment) {
                let instance = self.instance(segment);
                match name {
                    Some(name) => format!("{}.{}", instance, name),
                    None => instance,
                }
            } else {
                let instance = self.instance(ROOT_NAMESPACE);
                match name {
                    Some(name) => format!("{}.{}.{}", instance, segment, name),
                    None => format!("{}.{}", instance, segment),
                }
            };
            format!("{}{}", &caps[1], target)
        });
        let out = STORE_GETTER_PATH.replace_all(&out, |caps: &Captures| {
            let (namespace, name) = split_store_path(&caps[2]);
            format!("{}{}.{}", &caps[1], self.instance(namespace), name)
        });
        let out = STORE_GETTER.replace_all(&out, |caps: &Captures| {
            format!("{}{}.{}", &caps[1], self.instance(ROOT_NAMESPACE), &caps[2])
        });
        out.into_owned()
    }
}

fn apply_renames(markup: &str, renames: &TemplateRenames) -> String {
    let mut out = markup.to_string();

    for (from, to) in &renames.components {
        let kebab = hyphenate(from);
        let pattern = format!(
            r"<(/?)({}|{})([\s/>])",
            regex::escape(from),
            regex::escape(&kebab)
        );
        let Ok(tag) = Regex::new(&pattern) else {
            continue;
        };
        out = tag
            .replace_all(&out, |caps: &Captures| {
                let name = if &caps[2] == from.as_str() {
                    to.clone()
                } else {
                    hyphenate(to)
                };
                format!("<{}{}{}", &caps[1], name, &caps[3])
            })
            .into_owned();
    }

    for (from, to) in &renames.directives {
        let (from, to) = (directive_attr_name(from), directive_attr_name(to));
        if from == to {
            continue;
        }
        let pattern = format!(r"(\s)v-{}([\s:.=/>])", regex::escape(&from));
        let Ok(attr) = Regex::new(&pattern) else {
            continue;
        };
        out = attr
            .replace_all(&out, format!("${{1}}v-{}${{2}}", to).as_str())
            .into_owned();
    }

    out
}

/// `vRipple` and `Ripple` are both used as `v-ripple`.
pub fn directive_attr_name(local: &str) -> String {
    let bare = match local.strip_prefix('v') {
        Some(rest) if rest.starts_with(|c: char| c.is_ascii_uppercase()) => rest,
        _ => local,
    };
    hyphenate(bare).to_ascii_lowercase()
}

/// `$tc` is merged into `t`.
fn i18n_name(name: &str) -> &str {
    match name {
        "tc" => "t",
        other => other,
    }
}

fn is_expression_attr(name: &str) -> bool {
    name.starts_with(':') || name.starts_with('@') || name.starts_with('#') || name.starts_with("v-")
}

fn custom_directive(attr: &str) -> Option<&str> {
    let rest = attr.strip_prefix("v-")?;
    let name = rest.split([':', '.']).next()?;
    (!name.is_empty() && !BUILTIN_DIRECTIVES.contains(&name) && !name.contains('['))
        .then_some(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pentimento_carton::FxHashMap;

    #[test]
    fn test_scan_collects_usage() {
        let usage = scan_template(
            r#"
  <div :class="{ active: isActive }" @click="toggle(item.id)">
    <VBtn v-ripple.center ref="button">{{ $t('save') }}</VBtn>
    <user-card v-if="user" :user="user" />
    <p>{{ count + 1 }} {{ $i18n.locale }}</p>
    <span v-tooltip:top="'hint text'">{{ $store.getters['cart/total'] }}</span>
  </div>
"#,
        )
        .unwrap();

        assert!(usage.uses_component("VBtn"));
        assert!(usage.uses_component("UserCard"));
        assert!(usage.uses_directive("Ripple"));
        assert!(usage.uses_directive("vTooltip"));
        assert!(!usage.uses_directive("vFocus"));
        for name in ["isActive", "toggle", "item", "user", "count"] {
            assert!(usage.uses_identifier(name), "{}", name);
        }
        assert!(!usage.uses_identifier("id"));
        assert!(!usage.uses_identifier("hint"));
        assert!(usage.refs.contains("button"));
        assert!(usage.flags.i18n.contains("t"));
        assert!(usage.flags.has(Features::LOCALE));
        assert!(usage.store_namespaces.contains("cart"));
    }

    #[test]
    fn test_rewrite_normalizes_expressions() {
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), ["cart"]);
        let (out, stores) = rewrite_template(
            r#"<p :title="$tc('items', n)">{{ $t('hello') }} {{ $store.state.cart.items.length }} {{ $config.siteName }}</p>"#,
            &registry,
            &TemplateRenames::default(),
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<p :title="t('items', n)">{{ t('hello') }} {{ cartStore.items.length }} {{ config.siteName }}</p>"#
        );
        assert!(stores.contains("cart"));
    }

    #[test]
    fn test_rewrite_unregistered_state_goes_to_root() {
        let registry = StoreRegistry::snapshot(&FxHashMap::default(), [] as [&str; 0]);
        let (out, stores) = rewrite_template(
            "<p>{{ $store.state.theme }}</p>",
            &registry,
            &TemplateRenames::default(),
        )
        .unwrap();
        assert_eq!(out, "<p>{{ rootStore.theme }}</p>");
        assert!(stores.contains("root"));
    }

    #[test]
    fn test_component_renames() {
        let registry = StoreRegistry::default();
        let renames = TemplateRenames {
            components: vec![("VBtn".into(), "AcmeButton".into())],
            directives: vec![("Ripple".into(), "vWave".into())],
        };
        let (out, _) = rewrite_template(
            r#"<VBtn v-ripple>a</VBtn><v-btn>b</v-btn><VBtnGroup/><v-btn/>"#,
            &registry,
            &renames,
        )
        .unwrap();
        assert_eq!(
            out,
            r#"<AcmeButton v-wave>a</AcmeButton><acme-button>b</acme-button><VBtnGroup/><acme-button/>"#
        );
    }

    #[test]
    fn test_untouched_markup_is_preserved() {
        let registry = StoreRegistry::default();
        let source = "\n  <div class='x'>\n    <Foo :a=\"b\" />\n    plain &amp; text\n  </div>\n";
        let (out, stores) =
            rewrite_template(source, &registry, &TemplateRenames::default()).unwrap();
        assert_eq!(out, source);
        assert!(stores.is_empty());
    }

    #[test]
    fn test_directive_attr_name() {
        assert_eq!(directive_attr_name("vRipple"), "ripple");
        assert_eq!(directive_attr_name("Ripple"), "ripple");
        assert_eq!(directive_attr_name("ClickOutside"), "click-outside");
        assert_eq!(directive_attr_name("visible"), "visible");
    }
}
