use std::cell::{Cell, RefCell};
use std::rc::Rc;

use zest_dom::Document;

const PAGE: &str = r#"
<article id="post-1">
  <span class="spanzy">one</span>
  <span class="spanzy">two</span>
  <p class="body">text</p>
</article>
"#;

#[test]
fn bubbling_reaches_ancestor_listeners() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let hits = Rc::new(Cell::new(0u32));

    let seen = hits.clone();
    doc.select("#post-1")?
        .add_event("click", move |_| seen.set(seen.get() + 1));

    doc.dispatch(".spanzy", "click")?;
    assert_eq!(hits.get(), 2);
    Ok(())
}

#[test]
fn capture_listeners_run_before_target_and_bubble() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let order = Rc::new(RefCell::new(Vec::new()));

    let log = order.clone();
    doc.select("#post-1")?
        .add_event_capture("click", move |_| log.borrow_mut().push("capture"));
    let log = order.clone();
    doc.select("#post-1")?
        .add_event("click", move |_| log.borrow_mut().push("bubble"));
    let log = order.clone();
    doc.select(".spanzy")?
        .first()
        .add_event("click", move |_| log.borrow_mut().push("target"));

    let states = doc.dispatch(".spanzy:first-child", "click")?;
    assert_eq!(states.len(), 1);
    assert_eq!(*order.borrow(), vec!["capture", "target", "bubble"]);
    Ok(())
}

#[test]
fn delegated_listeners_filter_by_the_event_target() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let hits = Rc::new(Cell::new(0u32));

    let seen = hits.clone();
    doc.select("#post-1")?
        .on("click", ".spanzy", move |_| seen.set(seen.get() + 1));

    doc.dispatch(".spanzy", "click")?;
    assert_eq!(hits.get(), 2);

    doc.dispatch(".body", "click")?;
    assert_eq!(hits.get(), 2);
    Ok(())
}

#[test]
fn blank_delegate_selector_binds_nothing() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let hits = Rc::new(Cell::new(0u32));

    let seen = hits.clone();
    doc.select("#post-1")?
        .on("click", "  ", move |_| seen.set(seen.get() + 1));

    doc.dispatch(".spanzy", "click")?;
    assert_eq!(hits.get(), 0);
    Ok(())
}

#[test]
fn stop_propagation_halts_ancestors_but_not_the_current_node() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut first_span = doc.select(".spanzy")?.first();
    let log = order.clone();
    first_span.add_event("click", move |event| {
        log.borrow_mut().push("stop");
        event.stop_propagation();
    });
    let log = order.clone();
    first_span.add_event("click", move |_| log.borrow_mut().push("sibling"));

    let log = order.clone();
    doc.select("#post-1")?
        .add_event("click", move |_| log.borrow_mut().push("ancestor"));

    first_span.trigger("click");
    assert_eq!(*order.borrow(), vec!["stop", "sibling"]);
    Ok(())
}

#[test]
fn stop_immediate_propagation_halts_the_current_node_too() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut first_span = doc.select(".spanzy")?.first();
    let log = order.clone();
    first_span.add_event("click", move |event| {
        log.borrow_mut().push("stop");
        event.stop_immediate_propagation();
    });
    let log = order.clone();
    first_span.add_event("click", move |_| log.borrow_mut().push("sibling"));

    first_span.trigger("click");
    assert_eq!(*order.borrow(), vec!["stop"]);
    Ok(())
}

#[test]
fn prevent_default_is_reported_per_target() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    doc.select(".spanzy")?
        .first()
        .add_event("submit", |event| event.prevent_default());

    let states = doc.dispatch(".spanzy", "submit")?;
    assert_eq!(states.len(), 2);
    assert!(states[0].default_prevented());
    assert!(!states[1].default_prevented());
    Ok(())
}

#[test]
fn remove_event_unbinds_only_the_named_event() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let clicks = Rc::new(Cell::new(0u32));
    let keys = Rc::new(Cell::new(0u32));

    let mut spans = doc.select(".spanzy")?;
    let seen = clicks.clone();
    spans.add_event("click", move |_| seen.set(seen.get() + 1));
    let seen = keys.clone();
    spans.add_event("keydown", move |_| seen.set(seen.get() + 1));

    doc.dispatch(".spanzy", "click")?;
    doc.dispatch(".spanzy", "keydown")?;
    assert_eq!((clicks.get(), keys.get()), (2, 2));

    spans.remove_event("click");
    doc.dispatch(".spanzy", "click")?;
    doc.dispatch(".spanzy", "keydown")?;
    assert_eq!((clicks.get(), keys.get()), (2, 4));

    spans.remove_all_events();
    doc.dispatch(".spanzy", "keydown")?;
    assert_eq!(keys.get(), 4);
    Ok(())
}

#[test]
fn removal_only_affects_handlers_this_collection_registered() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let hits = Rc::new(Cell::new(0u32));

    let mut mine = doc.select(".spanzy")?;
    let mut theirs = doc.select(".spanzy")?;
    let seen = hits.clone();
    mine.add_event("click", move |_| seen.set(seen.get() + 1));
    let seen = hits.clone();
    theirs.add_event("click", move |_| seen.set(seen.get() + 1));

    mine.remove_event("click");
    doc.dispatch(".spanzy", "click")?;
    assert_eq!(hits.get(), 2);
    Ok(())
}

#[test]
fn handlers_may_mutate_the_document_during_dispatch() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;

    let inner = doc.clone();
    doc.select(".spanzy")?.add_event("click", move |_| {
        if let Ok(mut body) = inner.select(".body") {
            body.add_class("touched");
        }
    });

    doc.dispatch(".spanzy", "click")?;
    assert_eq!(doc.select(".touched")?.len(), 1);
    Ok(())
}

#[test]
fn method_hooks_fire_in_registration_order() -> zest_dom::Result<()> {
    let doc = Document::from_html(PAGE)?;
    let order = Rc::new(RefCell::new(Vec::new()));

    let mut spans = doc.select(".spanzy")?;
    let log = order.clone();
    spans.listen("hide", move || log.borrow_mut().push("first"));
    let log = order.clone();
    spans.listen("hide", move || log.borrow_mut().push("second"));

    spans.hide().show();
    assert_eq!(*order.borrow(), vec!["first", "second"]);

    spans.stop_listening("hide");
    spans.hide();
    assert_eq!(order.borrow().len(), 2);
    Ok(())
}
