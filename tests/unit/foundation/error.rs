use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        FlitterError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        FlitterError::animation("x")
            .to_string()
            .contains("animation error:")
    );
    assert!(FlitterError::scene("x").to_string().contains("scene error:"));
    assert!(
        FlitterError::render("x")
            .to_string()
            .contains("render error:")
    );
    assert!(
        FlitterError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = FlitterError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn contract_holds_silently() {
    crate::contract!(1 + 1 == 2, "arithmetic");
}

#[cfg(debug_assertions)]
#[test]
#[should_panic(expected = "invariant violated: node 3 is stale")]
fn contract_panics_in_debug() {
    crate::contract!(false, "node {} is stale", 3);
}
