use std::sync::LazyLock;

use fancy_regex::Regex;
use tracing::trace;

use crate::dom::{Dom, NodeId, has_class};
use crate::{Error, Result};

// A lone `#id`, `.class`, or bare tag token; anything else goes through the
// full selector engine.
static SIMPLE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([#.]?)(-?[A-Za-z_][A-Za-z0-9_-]*)$").expect("simple token pattern")
});

/// Resolves `selector` to matching elements in document order, optionally
/// scoped to the descendants of `context`.
///
/// Dispatch prefers the cheapest applicable lookup: the id index for `#id`,
/// a subtree scan for `.class` and bare tags, and the selector engine for
/// everything else. An `#id` lookup is document-global even when a context
/// is given, matching the platform id-lookup contract. Zero matches is an
/// empty vector, never an error; an empty selector fails.
pub(crate) fn resolve(dom: &Dom, selector: &str, context: Option<NodeId>) -> Result<Vec<NodeId>> {
    let trimmed = selector.trim();
    if trimmed.is_empty() {
        return Err(Error::InvalidSelector(selector.into()));
    }

    if let Ok(Some(caps)) = SIMPLE_TOKEN.captures(trimmed) {
        let sigil = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        let name = caps.get(2).map(|m| m.as_str()).unwrap_or("");
        match sigil {
            "#" => {
                trace!(selector = trimmed, strategy = "id", "resolve");
                return Ok(dom.by_id(name).into_iter().collect());
            }
            "." => {
                trace!(selector = trimmed, strategy = "class", "resolve");
                return Ok(scan(dom, context, |dom, node| {
                    dom.element(node).is_some_and(|el| has_class(el, name))
                }));
            }
            _ => {
                trace!(selector = trimmed, strategy = "tag", "resolve");
                return Ok(scan(dom, context, |dom, node| {
                    dom.tag_name(node)
                        .is_some_and(|tag| tag.eq_ignore_ascii_case(name))
                }));
            }
        }
    }

    trace!(selector = trimmed, strategy = "engine", "resolve");
    match context {
        Some(root) => dom.query_selector_all_from(root, trimmed),
        None => dom.query_selector_all(trimmed),
    }
}

fn scan<F>(dom: &Dom, context: Option<NodeId>, predicate: F) -> Vec<NodeId>
where
    F: Fn(&Dom, NodeId) -> bool,
{
    let candidates = match context {
        Some(root) => {
            let mut out = Vec::new();
            dom.collect_elements_descendants_dfs(root, &mut out);
            out
        }
        None => dom.all_element_nodes(),
    };
    candidates
        .into_iter()
        .filter(|node| predicate(dom, *node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::html::parse_html;

    const PAGE: &str = r#"
        <article id="post-1">
            <span class="spanzy">a</span>
            <span class="spanzy">b</span>
        </article>
        <p class="spanzy">outside</p>
    "#;

    #[test]
    fn id_token_uses_the_index() -> Result<()> {
        let dom = parse_html(PAGE)?;

        let found = resolve(&dom, "#post-1", None)?;
        assert_eq!(found, vec![dom.by_id("post-1").expect("indexed")]);
        Ok(())
    }

    #[test]
    fn id_lookup_stays_document_global_under_context() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let paragraph = resolve(&dom, "p", None)?[0];

        // post-1 is not inside the paragraph, yet the id path still finds it.
        let found = resolve(&dom, "#post-1", Some(paragraph))?;
        assert_eq!(found.len(), 1);
        Ok(())
    }

    #[test]
    fn class_token_scans_in_document_order() -> Result<()> {
        let dom = parse_html(PAGE)?;

        let found = resolve(&dom, ".spanzy", None)?;
        assert_eq!(found.len(), 3);
        let tags: Vec<_> = found.iter().filter_map(|id| dom.tag_name(*id)).collect();
        assert_eq!(tags, vec!["span", "span", "p"]);
        Ok(())
    }

    #[test]
    fn class_token_respects_context() -> Result<()> {
        let dom = parse_html(PAGE)?;
        let article = dom.by_id("post-1").expect("indexed");

        let found = resolve(&dom, ".spanzy", Some(article))?;
        assert_eq!(found.len(), 2);
        Ok(())
    }

    #[test]
    fn tag_token_is_case_insensitive() -> Result<()> {
        let dom = parse_html(PAGE)?;

        assert_eq!(resolve(&dom, "SPAN", None)?.len(), 2);
        assert_eq!(resolve(&dom, "span", None)?.len(), 2);
        Ok(())
    }

    #[test]
    fn compound_selectors_fall_back_to_the_engine() -> Result<()> {
        let dom = parse_html(PAGE)?;

        let found = resolve(&dom, "article .spanzy", None)?;
        assert_eq!(found.len(), 2);

        let grouped = resolve(&dom, "#post-1, p.spanzy", None)?;
        assert_eq!(grouped.len(), 2);
        Ok(())
    }

    #[test]
    fn zero_matches_is_empty_not_an_error() -> Result<()> {
        let dom = parse_html(PAGE)?;

        assert!(resolve(&dom, "#missing", None)?.is_empty());
        assert!(resolve(&dom, ".missing", None)?.is_empty());
        assert!(resolve(&dom, "missing", None)?.is_empty());
        Ok(())
    }

    #[test]
    fn blank_selector_fails() {
        let dom = parse_html(PAGE).expect("fixture parses");

        assert!(matches!(
            resolve(&dom, "   ", None),
            Err(Error::InvalidSelector(_))
        ));
    }
}
