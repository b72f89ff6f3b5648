use zest_dom::{Document, Error};

const PAGE: &str = r#"
<main>
  <article id="post-1" class="post">
    <h2>Title</h2>
    <span class="spanzy">one</span>
    <span class="spanzy">two</span>
    <p class="body">Body text</p>
  </article>
  <aside id="related">
    <span class="spanzy">three</span>
  </aside>
</main>
"#;

#[test]
fn fast_paths_and_engine_see_the_same_document() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    assert_eq!(doc.select("#post-1")?.len(), 1);
    assert_eq!(doc.select(".spanzy")?.len(), 3);
    assert_eq!(doc.select("span")?.len(), 3);
    assert_eq!(doc.select("SPAN")?.len(), 3);

    assert_eq!(doc.select("article .spanzy")?.len(), 2);
    assert_eq!(doc.select("#post-1, #related")?.len(), 2);
    Ok(())
}

#[test]
fn missing_matches_yield_empty_collections() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    let none = doc.select(".nope")?;
    assert!(none.is_empty());
    assert!(matches!(none.text(), Err(Error::EmptyCollection(_))));
    assert!(matches!(none.inner_html(), Err(Error::EmptyCollection(_))));
    assert!(matches!(none.client_rect(), Err(Error::EmptyCollection(_))));
    Ok(())
}

#[test]
fn blank_selector_is_invalid() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    assert!(matches!(doc.select(""), Err(Error::InvalidSelector(_))));
    assert!(matches!(doc.select("   "), Err(Error::InvalidSelector(_))));
    Ok(())
}

#[test]
fn class_changes_are_visible_to_later_lookups() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    doc.select(".spanzy")?.add_class("active");
    assert_eq!(doc.select(".active")?.len(), 3);
    assert_eq!(doc.select("span.active")?.len(), 3);

    doc.select(".spanzy")?.remove_class("active");
    assert_eq!(doc.select(".active")?.len(), 0);
    Ok(())
}

#[test]
fn toggle_class_twice_is_identity() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let mut spans = doc.select(".spanzy")?;

    let before = spans.has_class("spanzy")?;
    spans.toggle_class("spanzy").toggle_class("spanzy");
    assert_eq!(spans.has_class("spanzy")?, before);
    assert_eq!(doc.select(".spanzy")?.len(), 3);
    Ok(())
}

#[test]
fn attribute_ops_round_trip() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let mut spans = doc.select(".spanzy")?;

    spans.set_attribute("data-state", "seen");
    assert_eq!(spans.get_attribute("data-state")?.as_deref(), Some("seen"));
    assert_eq!(doc.select(r#"[data-state="seen"]"#)?.len(), 3);

    spans.remove_attribute("data-state");
    assert_eq!(spans.get_attribute("data-state")?, None);
    Ok(())
}

#[test]
fn find_scopes_to_each_element_and_composes_the_selector() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    let inside_article = doc.select("article")?.find(".spanzy")?;
    assert_eq!(inside_article.len(), 2);
    assert_eq!(inside_article.selector(), Some("article .spanzy"));
    assert_eq!(
        inside_article.nodes(),
        doc.select("article .spanzy")?.nodes()
    );

    let inside_aside = doc.select("#related")?.find(".spanzy")?;
    assert_eq!(inside_aside.len(), 1);
    assert_eq!(inside_aside.text()?, "three");

    assert!(matches!(
        doc.select("article")?.find("  "),
        Err(Error::InvalidSelector(_))
    ));
    Ok(())
}

#[test]
fn traversal_walks_the_element_tree() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let spans = doc.select(".spanzy")?;

    let parents = spans.parents();
    assert_eq!(parents.len(), 3);

    let parent = spans.parent();
    assert_eq!(parent.len(), 1);
    assert_eq!(parent.get_attribute("id")?.as_deref(), Some("post-1"));

    let article = doc.select("#post-1")?;
    assert_eq!(article.children().len(), 4);
    assert_eq!(article.child().text()?, "Title");

    let heading = doc.select("h2")?;
    assert_eq!(heading.siblings().len(), 3);
    assert_eq!(heading.next().text()?, "one");
    assert!(matches!(
        heading.previous().text(),
        Err(Error::EmptyCollection(_))
    ));

    assert_eq!(spans.first().text()?, "one");
    assert_eq!(spans.last().text()?, "three");
    Ok(())
}

#[test]
fn filter_and_combine_build_new_collections() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let spans = doc.select(".spanzy")?;

    let evens = spans.filter(|index, _| index % 2 == 0);
    assert_eq!(evens.len(), 2);
    assert_eq!(spans.len(), 3);

    let mut spans = spans;
    let mut visited = 0;
    spans.each(|index, _| visited = index + 1);
    assert_eq!(visited, 3);

    let with_body = spans.combine(&[".body", ""])?;
    assert_eq!(with_body.len(), 4);
    assert_eq!(spans.len(), 3);
    Ok(())
}

#[test]
fn structural_mutation_updates_serialized_markup() -> zest_dom::Result<()> {
    let doc = Document::from_html(r#"<div id="host"><i>mid</i></div>"#)?;
    let mut host = doc.select("#host")?;

    host.prepend("<a>start</a>")
        .append("<b>end</b>")
        .before("<s>pre</s>")
        .after("<u>post</u>");
    assert_eq!(
        doc.to_html(),
        "<s>pre</s><div id=\"host\"><a>start</a><i>mid</i><b>end</b></div><u>post</u>"
    );

    host.html("<em>only</em>");
    assert_eq!(host.inner_html()?, "<em>only</em>");
    assert_eq!(host.outer_html()?, "<div id=\"host\"><em>only</em></div>");

    host.empty();
    assert_eq!(host.inner_html()?, "");
    Ok(())
}

#[test]
fn remove_detaches_elements_for_good() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let mut spans = doc.select(".spanzy")?;

    spans.remove();
    assert_eq!(spans.len(), 0);
    assert_eq!(doc.select(".spanzy")?.len(), 0);
    assert_eq!(doc.select("span")?.len(), 0);
    assert_eq!(doc.select("#post-1")?.children().len(), 2);
    Ok(())
}

#[test]
fn contains_checks_the_first_element_subtree() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    let article = doc.select("#post-1")?;
    assert!(article.contains(".spanzy")?);
    assert!(!article.contains("ul")?);
    Ok(())
}

#[test]
fn geometry_comes_from_inline_style() -> zest_dom::Result<()> {
    let doc = Document::from_html(
        r#"<div id="box" style="top: 10px; left: 20px; width: 200px; height: 100px;"></div>"#,
    )?;
    let boxed = doc.select("#box")?;

    let rect = boxed.client_rect()?;
    assert_eq!(rect.right, 220.0);
    assert_eq!(rect.bottom, 110.0);
    assert!(boxed.in_viewport()?);

    doc.set_viewport(100.0, 100.0);
    assert!(!boxed.in_viewport()?);
    Ok(())
}

#[test]
fn selecting_through_an_existing_collection_keeps_its_shape() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let spans = doc.select(".spanzy")?;

    let again = doc.select(&spans)?;
    assert_eq!(again.len(), 3);
    assert_eq!(again.selector(), Some(".spanzy"));

    let by_nodes = doc.select(spans.nodes().to_vec())?;
    assert_eq!(by_nodes.len(), 3);
    assert_eq!(by_nodes.selector(), None);
    Ok(())
}
