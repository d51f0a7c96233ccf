use rand::{distributions::Alphanumeric, Rng};

/// Customer-facing order code, e.g. `ORD-7K2QX9MB`.
pub fn generate_reference() -> String {
    let code: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(8)
        .map(char::from)
        .collect();

    format!("ORD-{}", code.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_has_prefix_and_eight_symbols() {
        let reference = generate_reference();
        assert!(reference.starts_with("ORD-"));
        assert_eq!(reference.len(), 12);
        assert!(reference[4..]
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }
}
