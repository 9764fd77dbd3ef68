//! Property-based tests for the state machine
//!
//! These tests verify key invariants hold across all possible inputs.

use super::state::*;
use super::transition::*;
use super::*;
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_identity() -> impl Strategy<Value = UserIdentity> {
    (
        "u-[0-9]{4}",
        "[A-Z][a-z]{2,8} [A-Z][a-z]{2,10}",
        "[0-9]{9}",
        prop_oneof![Just(100u32), Just(250u32), Just(1000u32)],
    )
        .prop_map(|(customer_id, name, phone_number, current_plan_mbps)| UserIdentity {
            customer_id,
            name,
            phone_number,
            current_plan_mbps,
        })
}

fn arb_profile() -> impl Strategy<Value = CustomerProfile> {
    (arb_identity(), "[a-z]{3,8}@example\\.com").prop_map(|(identity, email)| CustomerProfile {
        customer_id: identity.customer_id,
        name: identity.name,
        phone_number: identity.phone_number,
        email,
        current_plan_mbps: identity.current_plan_mbps,
    })
}

fn arb_offer() -> impl Strategy<Value = Offer> {
    ("offer-[0-9a-f]{8}", proptest::option::of(100u32..2000), -500i64..500).prop_map(
        |(offer_id, offered_plan_mbps, price_delta_czk)| Offer {
            offer_id,
            customer_id: "u-1001".to_string(),
            current_plan_mbps: 100,
            offered_plan_mbps,
            price_delta_czk,
            description: "Upgrade internet speed".to_string(),
            valid_until: "2026-12-31".to_string(),
        },
    )
}

fn arb_timestamp() -> impl Strategy<Value = chrono::DateTime<Utc>> {
    // Whole seconds keep the generated values representable in RFC 3339
    (1_600_000_000i64..1_900_000_000).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_decision() -> impl Strategy<Value = Decision> {
    (
        any::<bool>(),
        any::<bool>(),
        "(EXT|MOCK)-[0-9A-F]{8}",
        proptest::option::of("[0-9a-f]{8}"),
        arb_timestamp(),
    )
        .prop_map(
            |(accept_offer, persist_to_db, external_reference, request_id, created_at)| Decision {
                accept_offer,
                persist_to_db,
                receipt: SubmissionReceipt {
                    status: SubmissionStatus::from_acceptance(accept_offer),
                    external_reference,
                    saved_to_db: request_id.is_some(),
                    request_id,
                    created_at,
                },
            },
        )
}

fn arb_event() -> impl Strategy<Value = Event> {
    prop_oneof![
        arb_profile().prop_map(|profile| Event::InfoDownloaded { profile }),
        arb_offer().prop_map(|offer| Event::OfferPrepared { offer }),
        arb_decision().prop_map(|decision| Event::Submitted { decision }),
        any::<bool>().prop_map(|accept_offer| Event::SubmissionFailed { accept_offer }),
        Just(Event::LoggedOut),
    ]
}

fn arb_stage() -> impl Strategy<Value = Stage> {
    prop::sample::select(Stage::ALL.to_vec())
}

fn arb_flow_state() -> impl Strategy<Value = FlowState> {
    (
        "conv-[0-9a-f]{32}",
        arb_stage(),
        arb_identity(),
        proptest::option::of(arb_profile()),
        proptest::option::of(arb_offer()),
        proptest::option::of(arb_decision()),
        0u32..3,
        arb_timestamp(),
    )
        .prop_map(
            |(conversation_id, stage, identity, profile, offer, decision, failed, at)| FlowState {
                conversation_id,
                stage,
                identity,
                profile,
                offer,
                decision,
                failed_submissions: failed,
                created_at: at,
                updated_at: at,
            },
        )
}

fn forward_events() -> impl Strategy<Value = Vec<Event>> {
    (arb_profile(), arb_offer(), any::<bool>(), arb_decision()).prop_map(
        |(profile, mut offer, accept, mut decision)| {
            offer.offered_plan_mbps = Some(250);
            decision.accept_offer = accept;
            vec![
                Event::InfoDownloaded { profile },
                Event::OfferPrepared { offer },
                Event::Submitted { decision },
                Event::LoggedOut,
            ]
        },
    )
}

fn fresh_state(identity: UserIdentity) -> FlowState {
    FlowState::authenticated("conv-prop", identity, Utc::now())
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    // Stage never moves backward, whatever the client sends
    #[test]
    fn prop_stage_is_monotonic(
        identity in arb_identity(),
        events in proptest::collection::vec(arb_event(), 0..20)
    ) {
        let mut state = fresh_state(identity);
        let now = Utc::now();

        for event in events {
            let before = state.stage;
            match transition(&state, event, now) {
                Ok(next) => {
                    prop_assert!(next.stage >= before, "{:?} -> {:?}", before, next.stage);
                    state = next;
                }
                Err(_) => { /* Rejected call leaves the state untouched */ }
            }
        }
    }

    // A rejected precondition means transition rejects too
    #[test]
    fn prop_check_and_transition_agree(
        state in arb_flow_state(),
        event in arb_event()
    ) {
        let checked = check(&state, event.action());
        let result = transition(&state, event, Utc::now());
        prop_assert_eq!(checked.is_ok(), result.is_ok());
        if let Err(e) = checked {
            prop_assert_eq!(result.unwrap_err(), e);
        }
    }

    // After N successful steps the stage is the Nth stage of the fixed order
    #[test]
    fn prop_nth_step_reaches_nth_stage(
        identity in arb_identity(),
        events in forward_events(),
        steps in 0usize..=4
    ) {
        let mut state = fresh_state(identity);
        let now = Utc::now();

        for event in events.into_iter().take(steps) {
            state = transition(&state, event, now).unwrap();
        }
        prop_assert_eq!(state.stage, Stage::ALL[steps]);
    }

    // Identity and offer never change once written
    #[test]
    fn prop_identity_and_offer_are_write_once(
        identity in arb_identity(),
        prefix in forward_events(),
        noise in proptest::collection::vec(arb_event(), 0..12)
    ) {
        let mut state = fresh_state(identity.clone());
        let now = Utc::now();

        // Reach offer_prepared, then throw arbitrary events at it
        for event in prefix.into_iter().take(2) {
            state = transition(&state, event, now).unwrap();
        }
        let offer = state.offer.clone();

        for event in noise {
            if let Ok(next) = transition(&state, event, now) {
                state = next;
            }
            prop_assert_eq!(&state.identity, &identity);
            prop_assert_eq!(&state.offer, &offer);
        }
    }

    // Nothing moves a logged-out conversation
    #[test]
    fn prop_logged_out_is_inert(
        mut state in arb_flow_state(),
        event in arb_event()
    ) {
        state.stage = Stage::LoggedOut;
        let result = transition(&state, event, Utc::now());
        prop_assert!(
            matches!(result, Err(TransitionError::Terminal { .. })),
            "Logged out conversation accepted an event"
        );
    }

    // The JSON form kept by the durable store is lossless
    #[test]
    fn prop_flow_state_json_is_lossless(state in arb_flow_state()) {
        let json = serde_json::to_string(&state).unwrap();
        let restored: FlowState = serde_json::from_str(&json).unwrap();
        prop_assert_eq!(restored, state);
    }
}
