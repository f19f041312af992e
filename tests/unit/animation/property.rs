use super::*;
use crate::scene::text::Text;

#[test]
fn numeric_slots_come_first() {
    let numeric: Vec<_> = PropertyId::ALL.into_iter().filter(|p| p.is_numeric()).collect();
    assert_eq!(numeric.len(), 10);
    assert_eq!(numeric.last(), Some(&PropertyId::Alpha));
    assert!(!PropertyId::StartPosition.is_numeric());
    for id in PropertyId::ALL {
        assert_eq!(PropertyId::ALL[id.index()], id);
        assert_eq!(PropertyId::from_name(id.as_str()), Some(id));
    }
}

#[test]
fn defaults_fit_their_slots() {
    let v = PropertyValues::default();
    for id in PropertyId::ALL {
        assert!(v.get(id).fits(id), "{id:?}");
    }
    assert_eq!(v.number(PropertyId::ScaleX), 1.0);
    assert!(v.flag(PropertyId::Visible));
    assert!(!v.flag(PropertyId::Off));
}

#[test]
fn mask_operations() {
    let a: PropertyMask = [PropertyId::X, PropertyId::Alpha].into_iter().collect();
    let b = a | PropertyMask::of(PropertyId::Off);
    assert!(b.is_superset(a));
    assert!(!a.is_superset(b));
    assert_eq!(b.iter().count(), 3);
    assert!(PropertyMask::EMPTY.is_empty());
}

#[test]
fn capture_then_apply_round_trips_node_state() {
    let mut node = Node::new(NodeKind::Text(Text::new("hi")));
    node.set_position(3.0, 4.0);
    node.set_alpha(0.25);
    let captured = PropertyValues::capture(&node);
    assert_eq!(captured.number(PropertyId::X), 3.0);
    assert_eq!(captured.get(PropertyId::Text), &PropertyValue::from("hi"));

    let mut other = Node::new(NodeKind::Text(Text::new("")));
    let all: PropertyMask = PropertyId::ALL.into_iter().collect();
    captured.apply(&mut other, all);
    assert_eq!(other.params(), node.params());
    assert_eq!(other.alpha(), 0.25);
    assert_eq!(other.text().map(Text::content), Some("hi"));
}

#[test]
fn apply_only_touches_masked_slots() {
    let mut node = Node::new(NodeKind::Container);
    node.dirty = crate::scene::node::DirtyFlags::empty();
    let mut v = PropertyValues::default();
    v.set(PropertyId::X, 10.0.into());
    v.set(PropertyId::Y, 20.0.into());
    v.apply(&mut node, PropertyMask::of(PropertyId::X));
    assert_eq!(node.params().x, 10.0);
    assert_eq!(node.params().y, 0.0);
    assert!(node.dirty().contains(crate::scene::node::DirtyFlags::TRANSFORM));
}

#[test]
fn props_builder_replaces_duplicates() {
    let p = Props::new().x(1.0).alpha(0.5).x(2.0);
    assert_eq!(p.entries().len(), 2);
    assert_eq!(p.entries()[0], (PropertyId::X, PropertyValue::Number(2.0)));
    assert!(p.mask().contains(PropertyId::Alpha));
}
