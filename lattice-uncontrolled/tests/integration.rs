//! Integration Tests for Uncontrolled Components
//!
//! These tests verify that the store, the sanitizer, the binder and the host
//! work together: a mounted node follows its atoms one facet at a time.

use std::sync::Arc;

use lattice_uncontrolled::{
    host, register, sanitize, uncontrolled, Atom, AtomError, AtomState, Displayable, Element,
    Error, Mutation, Prop, Props, RegisterOptions, Scope, Store,
};
use lattice_uncontrolled::store::scope;

fn style(name: &str, value: &str) -> Mutation {
    Mutation::Style {
        name: name.to_string(),
        value: value.to_string(),
    }
}

/// Test that an atom change writes only the facet bound to it.
#[test]
fn atom_change_updates_only_bound_style() {
    let store = Store::new();
    let x = Atom::new(100);

    let vnode = uncontrolled("div").render(
        Props::new()
            .store(store.clone())
            .class_name("box")
            .style("position", "relative")
            .style("left", &x),
    );

    // Static props never carry atoms
    assert_eq!(
        vnode.props().get("style").and_then(Prop::as_map).map(|s| s.len()),
        Some(1)
    );

    let element = host::mount(&vnode).unwrap();
    assert_eq!(element.class_name(), "box");
    assert_eq!(element.style("position").as_deref(), Some("relative"));
    assert_eq!(element.style("left").as_deref(), Some("100px"));
    element.take_mutations();

    store.set(&x, 120).unwrap();
    assert_eq!(element.take_mutations(), vec![style("left", "120px")]);

    // Same value, no write
    store.set(&x, 120).unwrap();
    assert!(element.take_mutations().is_empty());

    // Unmounted nodes no longer follow the atom
    host::unmount(&vnode);
    store.set(&x, 140).unwrap();
    assert!(element.take_mutations().is_empty());
    assert_eq!(store.listener_count(x.id()), 0);
}

/// Test that a derived atom drives the text of a node.
#[test]
fn derived_atom_drives_text() {
    let store = Store::new();
    let count = Atom::new(1);
    let label = Atom::derived({
        let count = count.clone();
        move |get| Ok(format!("Count: {}", get.get(&count)?))
    });

    let vnode = uncontrolled("span").render(Props::new().store(store.clone()).children(&label));
    let element = host::mount(&vnode).unwrap();
    assert_eq!(element.text_content(), "Count: 1");

    store.set(&count, 2).unwrap();
    assert_eq!(element.text_content(), "Count: 2");

    host::unmount(&vnode);
}

/// Test that an async atom shows its placeholder until it resolves.
#[tokio::test]
async fn pending_text_until_loaded() {
    let store = Store::new();
    let name = Atom::<String>::pending();

    let vnode = uncontrolled("p").render(
        Props::new()
            .store(store.clone())
            .pending("Loading...")
            .children(&name),
    );
    let element = host::mount(&vnode).unwrap();
    assert_eq!(element.text_content(), "Loading...");

    let (tx, rx) = tokio::sync::oneshot::channel::<String>();
    let task = store
        .load(&name, async move { rx.await.map_err(|_| AtomError::new("sender dropped")) })
        .unwrap();

    tx.send("Ada".to_string()).unwrap();
    task.await.unwrap().unwrap();

    assert_eq!(element.text_content(), "Ada");
    assert!(matches!(store.read(&name).unwrap(), AtomState::Resolved(ref v) if v == "Ada"));
}

/// Test that a failed atom surfaces to whoever wrote it.
#[test]
fn failure_reaches_the_writer() {
    let store = Store::new();
    let title = Atom::new("ok");

    let vnode = uncontrolled("a").render(Props::new().store(store.clone()).set("title", &title));
    let element = host::mount(&vnode).unwrap();
    assert_eq!(element.attribute("title").as_deref(), Some("ok"));

    let err = store
        .set_state(&title, AtomState::Failed(AtomError::new("offline")))
        .unwrap_err();
    assert!(matches!(err, Error::Atom { atom, .. } if atom == title.id()));
    assert_eq!(element.attribute("title").as_deref(), Some("ok"));
}

/// Test that mounting over an already failed atom fails.
#[test]
fn mount_fails_on_failed_atom() {
    let store = Store::new();
    let class_name = Atom::new("idle");
    store
        .set_state(&class_name, AtomState::Failed(AtomError::new("broken")))
        .unwrap();

    let vnode = uncontrolled("div").render(Props::new().store(store).class_name(&class_name));
    assert!(matches!(host::mount(&vnode), Err(Error::Atom { .. })));
}

/// Test that the component factory hands out one component per tag.
#[test]
fn one_component_per_tag() {
    let section = uncontrolled("section");
    assert!(Arc::ptr_eq(&section, &uncontrolled("section")));
    assert!(!Arc::ptr_eq(&section, &uncontrolled("aside")));
}

/// Test that a scope selects its own store.
#[test]
fn scope_selects_store() {
    let scope = Scope::new("integration/scope_selects_store");
    let scoped = Store::new();
    scope::provide(Some(scope.clone()), scoped.clone());

    let color = Atom::new("red");
    let binder = register(RegisterOptions::new().scope(scope.clone()).class_name(&color));
    assert!(binder.store().ptr_eq(&scoped));

    let element = Element::new("div");
    binder.attach(Some(&element)).unwrap();
    assert_eq!(element.class_name(), "red");

    // The default store is a different store
    scope::default_store().set(&color, "blue").unwrap();
    assert_eq!(element.class_name(), "red");

    scoped.set(&color, "green").unwrap();
    assert_eq!(element.class_name(), "green");

    binder.detach();
    scope::clear(Some(&scope));
}

/// Test that sanitizing strips atoms while keeping untouched branches.
#[test]
fn sanitize_strips_atoms() {
    let stable = Prop::map([("position", Prop::from("relative"))]);
    let props = Prop::map([
        ("a", Prop::from(Atom::new(1))),
        ("b", Prop::from(2)),
        ("layout", stable.clone()),
        ("items", Prop::list([Prop::from(Atom::new(3)), Prop::from("x")])),
    ]);

    let clean = sanitize(&props).unwrap();
    assert_eq!(
        clean.as_map().unwrap().keys().collect::<Vec<_>>(),
        ["b", "layout", "items"]
    );
    assert!(clean.get("layout").unwrap().same(&stable));

    let items = clean.get("items").and_then(Prop::as_list).unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].as_scalar(), Some(&Displayable::from("x")));

    // Nothing to strip, nothing copied
    assert!(sanitize(&clean).unwrap().same(&clean));
    assert!(sanitize(&Prop::from(Atom::new(0))).is_none());
}
