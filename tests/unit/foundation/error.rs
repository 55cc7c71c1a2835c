use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        TileStoreError::config("x")
            .to_string()
            .contains("config error:")
    );
    assert!(
        TileStoreError::allocation("x")
            .to_string()
            .contains("allocation error:")
    );
    assert!(
        TileStoreError::ownership("x")
            .to_string()
            .contains("ownership error:")
    );
    assert!(
        TileStoreError::dispatch("x")
            .to_string()
            .contains("dispatch error:")
    );
    assert!(
        TileStoreError::render("x")
            .to_string()
            .contains("render error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = TileStoreError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
