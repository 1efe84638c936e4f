use rand::Rng;

/// Generate a referral code when the admin does not supply one.
/// Uppercased alphanumerics, long enough that collisions surface as a
/// unique-constraint error rather than needing a retry loop.
pub fn generate_referral_code() -> String {
    use rand::distr::Alphanumeric;
    use rand::rng;

    let mut rng = rng();
    (0..10)
        .map(|_| (rng.sample(Alphanumeric) as char).to_ascii_uppercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_codes_are_well_formed() {
        let code = generate_referral_code();
        assert_eq!(code.len(), 10);
        assert!(code.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_eq!(code, code.to_ascii_uppercase());
    }
}
