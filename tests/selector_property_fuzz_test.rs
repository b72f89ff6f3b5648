use std::panic::AssertUnwindSafe;

use proptest::collection::vec;
use proptest::prelude::*;
use proptest::test_runner::{TestCaseError, TestCaseResult};
use zest_dom::{Document, Error};

fn tag_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("div"),
        Just("span"),
        Just("p"),
        Just("section"),
        Just("em"),
        Just("li"),
    ]
    .prop_map(str::to_string)
    .boxed()
}

fn class_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("alpha"),
        Just("beta"),
        Just("gamma"),
        Just("wide"),
        Just("sel"),
    ]
    .prop_map(str::to_string)
    .boxed()
}

fn element_strategy() -> BoxedStrategy<(String, Vec<String>)> {
    (tag_strategy(), vec(class_strategy(), 0..=2)).boxed()
}

fn page_strategy() -> BoxedStrategy<Vec<(String, Vec<String>)>> {
    vec(element_strategy(), 1..=12).boxed()
}

fn render_page(elements: &[(String, Vec<String>)]) -> String {
    let mut out = String::new();
    for (index, (tag, classes)) in elements.iter().enumerate() {
        if classes.is_empty() {
            out.push_str(&format!("<{tag}>n{index}</{tag}>"));
        } else {
            out.push_str(&format!(
                "<{tag} class=\"{}\">n{index}</{tag}>",
                classes.join(" ")
            ));
        }
    }
    out
}

fn garbage_selector_strategy() -> BoxedStrategy<String> {
    prop_oneof![
        Just("".to_string()),
        Just("   ".to_string()),
        Just(">".to_string()),
        Just("div >".to_string()),
        Just("a,,b".to_string()),
        Just("[unclosed".to_string()),
        Just(":nth-child(".to_string()),
        Just("p:hover".to_string()),
        "[#.\\[\\]():>+~,*a-z0-9 -]{0,24}",
    ]
    .boxed()
}

fn open_page(elements: &[(String, Vec<String>)]) -> Result<Document, TestCaseError> {
    Document::from_html(&render_page(elements))
        .map_err(|err| TestCaseError::fail(err.to_string()))
}

fn select_nodes(doc: &Document, selector: &str) -> Result<Vec<zest_dom::NodeId>, TestCaseError> {
    doc.select(selector)
        .map(|collection| collection.nodes().to_vec())
        .map_err(|err| TestCaseError::fail(err.to_string()))
}

fn assert_counts_match(elements: &[(String, Vec<String>)]) -> TestCaseResult {
    let doc = open_page(elements)?;

    for tag in ["div", "span", "p", "section", "em", "li"] {
        let expected = elements.iter().filter(|(t, _)| t == tag).count();
        prop_assert_eq!(select_nodes(&doc, tag)?.len(), expected, "tag {}", tag);
        prop_assert_eq!(
            select_nodes(&doc, &tag.to_ascii_uppercase())?.len(),
            expected,
            "uppercase tag {}",
            tag
        );
    }

    for class in ["alpha", "beta", "gamma", "wide", "sel"] {
        let expected = elements
            .iter()
            .filter(|(_, classes)| classes.iter().any(|c| c == class))
            .count();
        prop_assert_eq!(
            select_nodes(&doc, &format!(".{class}"))?.len(),
            expected,
            "class {}",
            class
        );
    }
    Ok(())
}

fn assert_fast_path_agrees_with_engine(elements: &[(String, Vec<String>)]) -> TestCaseResult {
    let doc = open_page(elements)?;

    // A selector group goes through the engine even when each branch is a
    // lone token, which otherwise takes the fast path. Both must agree.
    for selector in ["div", "span", ".alpha", ".sel"] {
        let fast = select_nodes(&doc, selector)?;
        let engine = select_nodes(&doc, &format!("{selector}, {selector}"))?;
        prop_assert_eq!(fast, engine, "selector {}", selector);
    }
    Ok(())
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        failure_persistence: None,
        .. ProptestConfig::default()
    })]

    #[test]
    fn resolved_counts_match_the_generated_page(elements in page_strategy()) {
        assert_counts_match(&elements)?;
    }

    #[test]
    fn fast_paths_agree_with_the_engine(elements in page_strategy()) {
        assert_fast_path_agrees_with_engine(&elements)?;
    }

    #[test]
    fn class_mutation_round_trips(elements in page_strategy(), class in class_strategy()) {
        let doc = open_page(&elements)?;
        let total = elements.len();

        doc.select("*").map_err(|err| TestCaseError::fail(err.to_string()))?
            .add_class("marker");
        prop_assert_eq!(select_nodes(&doc, ".marker")?.len(), total);

        doc.select(".marker").map_err(|err| TestCaseError::fail(err.to_string()))?
            .remove_class("marker")
            .remove_class(&class);
        prop_assert_eq!(select_nodes(&doc, ".marker")?.len(), 0);
        prop_assert_eq!(select_nodes(&doc, &format!(".{class}"))?.len(), 0);
    }

    #[test]
    fn arbitrary_selector_text_never_panics(selector in garbage_selector_strategy()) {
        let doc = Document::from_html("<div class=\"alpha\"><span>x</span></div>")
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        let outcome = std::panic::catch_unwind(AssertUnwindSafe(|| {
            doc.select(selector.as_str()).map(|collection| collection.len())
        }));
        prop_assert!(outcome.is_ok(), "select panicked for {:?}", selector);
        if let Ok(Err(err)) = outcome {
            prop_assert!(
                matches!(err, Error::InvalidSelector(_)),
                "unexpected error kind for {:?}: {}",
                selector,
                err
            );
        }
    }
}
