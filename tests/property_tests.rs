//! Property-based tests
//!
//! These tests verify:
//! - Username syntax agrees with `^[a-z][-a-z0-9]*$` for arbitrary input
//! - Existing accounts are always refused, whatever their spelling
//! - Platform enums round-trip through their string forms
//! - A default account that stays logged in is never removed

mod common;

use proptest::prelude::*;

use adminswap::platform::{DeleteMechanism, OsFamily, classify, resolve_default_account};
use adminswap::validation::validate_syntax;
use adminswap::{
    DecommissionOutcome, Decommissioner, Host, PlatformProfile, SkipReason, UsernameRejection,
    validate_username,
};
use common::{Fixture, ScriptedPrompter};

/// Straightforward restatement of the username pattern.
fn matches_pattern(s: &str) -> bool {
    let bytes = s.as_bytes();
    !bytes.is_empty()
        && bytes[0].is_ascii_lowercase()
        && bytes[1..]
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
}

// =============================================================================
// Username Validation
// =============================================================================

proptest! {
    /// Any name matching the pattern is accepted when nobody owns it.
    #[test]
    fn valid_names_accepted(name in "[a-z][-a-z0-9]{0,30}") {
        let fixture = Fixture::new();
        prop_assert_eq!(validate_username(&name, &fixture.accounts()), Ok(()));
    }

    /// Syntax check agrees with the pattern on arbitrary strings.
    #[test]
    fn syntax_agrees_with_pattern(s in "\\PC{0,12}") {
        prop_assert_eq!(validate_syntax(&s).is_ok(), matches_pattern(&s));
    }

    /// Uppercase, digits and hyphens can never lead.
    #[test]
    fn bad_first_character_rejected(first in "[A-Z0-9-]", rest in "[a-z0-9-]{0,10}") {
        let name = format!("{first}{rest}");
        let rejected = matches!(
            validate_syntax(&name),
            Err(UsernameRejection::InvalidStart(_))
        );
        prop_assert!(rejected);
    }

    /// An existing account is refused even though its name is valid.
    #[test]
    fn existing_names_rejected(name in "[a-z][-a-z0-9]{0,15}") {
        let fixture = Fixture::new();
        fixture.add_account(&name);
        prop_assert_eq!(
            validate_username(&name, &fixture.accounts()),
            Err(UsernameRejection::AlreadyExists(name.clone()))
        );
    }
}

// =============================================================================
// Platform
// =============================================================================

fn family_strategy() -> impl Strategy<Value = OsFamily> {
    prop_oneof![
        Just(OsFamily::Debian),
        Just(OsFamily::Rhel),
        Just(OsFamily::Unknown),
    ]
}

proptest! {
    /// OsFamily: to_string → parse round-trip is identity
    #[test]
    fn family_roundtrip(family in family_strategy()) {
        let parsed: OsFamily = family.to_string().parse().expect("Should parse");
        prop_assert_eq!(family, parsed);
    }

    /// Every family resolves to a group and a deletion tool that keeps homes.
    #[test]
    fn profile_is_complete(family in family_strategy(), id in "[a-z]{1,8}") {
        let profile = PlatformProfile::for_family(family, id);
        prop_assert!(["sudo", "wheel"].contains(&profile.admin_group.as_str()));
        prop_assert!(matches!(
            profile.delete_mechanism,
            DeleteMechanism::Deluser | DeleteMechanism::Userdel
        ));
    }

    /// Unrecognised identifiers classify as Unknown.
    #[test]
    fn unknown_ids_are_unknown(id in "zz[a-z]{0,6}", like in "(qq[a-z]{0,4} ?){0,3}") {
        prop_assert_eq!(classify(&id, &like), OsFamily::Unknown);
    }

    /// The resolved default account is never root or empty.
    #[test]
    fn default_account_never_root(
        explicit in proptest::option::of("(root|[a-z]{0,8}| )"),
        hint in proptest::option::of("(root|[a-z]{0,8}| )"),
    ) {
        let name = resolve_default_account(explicit.as_deref(), hint.as_deref());
        prop_assert!(!name.is_empty());
        prop_assert_ne!(name, "root");
    }
}

// =============================================================================
// Decommissioning
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// However many times the operator retries, a session that never ends
    /// means the account is never removed.
    #[test]
    fn logged_in_account_never_removed(retries in 0usize..6) {
        let fixture = Fixture::with_ubuntu();
        fixture.add_account("alice");
        fixture.script_sessions("ubuntu", &vec![true; retries + 1]);

        let mut answers = vec!["y".to_string(), "y".to_string()];
        answers.extend(std::iter::repeat_n("y".to_string(), retries));
        answers.push("n".to_string());

        let profile = PlatformProfile::for_family(OsFamily::Debian, "ubuntu");
        let mut runner = fixture.runner();
        let accounts = fixture.accounts();
        let mut prompter = ScriptedPrompter::new(answers);
        let mut host = Host {
            runner: &mut runner,
            accounts: &accounts,
            prompter: &mut prompter,
        };

        let mut coordinator = Decommissioner::new(&profile, "ubuntu", "alice");
        let outcome = coordinator.run(&mut host).expect("decommission");

        prop_assert_eq!(outcome, DecommissionOutcome::Skipped(SkipReason::StillLoggedIn));
        prop_assert_eq!(fixture.count("who"), retries + 1);
        prop_assert!(!fixture.ran("pkill"));
        prop_assert!(!fixture.ran("deluser"));
        prop_assert!(fixture.has_account("ubuntu"));
    }
}
