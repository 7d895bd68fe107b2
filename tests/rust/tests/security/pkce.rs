//! PKCE exchange-side verification tests.

use authmux_gateway::PkceChallenge;

#[test]
fn test_generated_pair_verifies() {
    let pkce = PkceChallenge::generate();
    assert!(PkceChallenge::verify(&pkce.verifier, &pkce.challenge));
}

#[test]
fn test_wrong_verifier_rejected() {
    let pkce = PkceChallenge::generate();
    let other = PkceChallenge::generate();
    assert!(!PkceChallenge::verify(&other.verifier, &pkce.challenge));
}

#[test]
fn test_known_vector() {
    // RFC 7636 appendix B
    let verifier = "dBjftJeZ4CVP-mB92K27uhbUJU1p1r_wW1gFWFOEjXk";
    let challenge = "E9Melhoa2OwvFrEMTJguCHaoeK1t8URWbuGJSstw-cM";
    assert_eq!(PkceChallenge::compute_challenge(verifier), challenge);
    assert!(PkceChallenge::verify(verifier, challenge));
}

#[test]
fn test_method_is_s256() {
    assert_eq!(PkceChallenge::generate().method, "S256");
}
