mod common;

use std::collections::BTreeSet;

use common::{FixedAssigner, ForgetfulAssigner, party_election};
use legislature_sim::model::*;
use legislature_sim::scenario::{Scenario, procedure_effect};
use legislature_sim::{Id, SequenceGenerator, Signal, SignalLog};

#[test]
fn requests_reach_the_collaborator_sorted() {
    let mut s = Scenario::new();
    let people = s.people(3);
    let chair = s.role("Chair", Permissions::default());
    let whip = s.role("Whip", Permissions::default());
    let appoint_whip = s.governmental(
        "Appoint whip",
        vec![procedure_effect(ProcedureEffectKind::ElectAppointed, vec![whip], 0)],
    );
    let nominate_chair = s.governmental(
        "Nominate chair",
        vec![procedure_effect(
            ProcedureEffectKind::ElectNominated,
            vec![chair, Id::MEMBER],
            1,
        )],
    );
    let elect = party_election(&mut s);
    s.ballot("Budget");
    let assigner = FixedAssigner::default().with_role(people[1], chair);
    let log = assigner.log.clone();
    let mut ctx = s.build_with(SequenceGenerator::new(vec![1]), assigner);

    ctx.start_setup();

    let batches = log.borrow();
    assert_eq!(batches.len(), 1, "one batch per bundle");
    let order: Vec<(ElectionKind, Option<Id>)> =
        batches[0].iter().map(|r| (r.kind, r.procedure)).collect();
    assert_eq!(
        order,
        vec![
            (ElectionKind::Party, Some(elect)),
            (ElectionKind::Appointed, Some(appoint_whip)),
            (ElectionKind::Nominated, Some(nominate_chair)),
        ]
    );
    let nomination = &batches[0][2];
    assert_eq!(nomination.target, chair);
    assert_eq!(nomination.filters, vec![Id::MEMBER]);
    assert!(nomination.random);
    assert_eq!(
        ctx.state().roles[&people[1]],
        BTreeSet::from([chair, Id::MEMBER])
    );
}

#[test]
fn elected_roles_feed_permissions() {
    let mut s = Scenario::new();
    let people = s.people(2);
    let chair = s.role(
        "Chair",
        Permissions {
            can_vote: true,
            votes: 3,
            can_speak: true,
        },
    );
    s.governmental(
        "Appoint chair",
        vec![procedure_effect(ProcedureEffectKind::ElectAppointed, vec![chair], 0)],
    );
    s.ballot("Budget");
    let assigner = FixedAssigner::default().with_role(people[0], chair);
    let mut ctx = s.build_with(SequenceGenerator::new(vec![1]), assigner);
    ctx.start_setup();

    assert_eq!(ctx.permissions()[&people[0]].votes, 3);
    assert_eq!(ctx.permissions()[&people[1]].votes, 1);
}

#[test]
fn member_role_survives_a_forgetful_collaborator() {
    let mut s = Scenario::new();
    s.people(2);
    party_election(&mut s);
    s.ballot("Budget");
    let mut ctx = s.build_with(SequenceGenerator::new(vec![1]), ForgetfulAssigner);
    ctx.start_setup();

    for roles in ctx.state().roles.values() {
        assert_eq!(roles, &BTreeSet::from([Id::MEMBER]));
    }
    assert!(ctx.state().factions.is_empty());
}

#[test]
fn founding_a_party_shuffles_members() {
    let mut s = Scenario::new();
    s.people(2);
    let greens = s.party("Greens", false);
    let b = s
        .ballot("Charter")
        .on_pass(BallotEffectKind::FoundParty, vec![greens], 0)
        .id();
    let assigner = FixedAssigner::default();
    let log = assigner.log.clone();
    let mut ctx = s.build_with(SequenceGenerator::new(vec![1]), assigner);

    ctx.start_setup();
    ctx.start_ballot(b);
    ctx.end_ballot(true);

    assert!(ctx.state().active_parties.contains(&greens));
    let batches = log.borrow();
    assert_eq!(
        batches.last().map(Vec::as_slice),
        Some(
            &[ElectionRequest {
                kind: ElectionKind::Party,
                procedure: None,
                target: Id::MEMBER,
                filters: vec![greens],
                random: true,
            }][..]
        )
    );
}

#[test]
fn dissolving_a_party_deactivates_it() {
    let mut s = Scenario::new();
    s.people(1);
    let reds = s.party("Reds", true);
    let b = s
        .ballot("Ban")
        .on_pass(BallotEffectKind::DissolveParty, vec![reds], 0)
        .id();
    let mut ctx = s.build();
    ctx.start_setup();
    ctx.start_ballot(b);
    ctx.end_ballot(true);
    assert!(!ctx.state().active_parties.contains(&reds));
}

#[test]
fn election_signals_bracket_the_assignment() {
    let mut s = Scenario::new();
    let people = s.people(2);
    let reds = s.party("Reds", true);
    party_election(&mut s);
    s.ballot("Budget");
    let assigner = FixedAssigner::default().with_party(people[0], reds);
    let log = SignalLog::new();
    let mut ctx = s.build_with(SequenceGenerator::new(vec![1]), assigner);
    ctx.add_observer(Box::new(log.clone()));
    ctx.start_setup();

    assert_eq!(
        log.kinds(),
        vec!["election_preparing", "election_completed", "permissions_updated"]
    );
    let signals = log.signals();
    let Signal::ElectionPreparing { factions, .. } = &signals[0] else {
        panic!("expected election_preparing first");
    };
    assert!(factions.is_empty(), "preparing carries the old maps");
    let Signal::ElectionCompleted { factions, .. } = &signals[1] else {
        panic!("expected election_completed second");
    };
    assert_eq!(factions[&people[0]].party, Some(reds));
}
