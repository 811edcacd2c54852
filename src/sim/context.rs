//! The simulation context: owns all mutable state and drives the phase
//! machine.
//!
//! Call order for a run:
//!
//! 1. [`SimulationContext::initialize`] with the people taking part.
//! 2. [`SimulationContext::start_setup`] fires governmental procedures.
//! 3. For each ballot: [`start_ballot`](SimulationContext::start_ballot), any
//!    number of votes and declarations, then
//!    [`end_ballot`](SimulationContext::end_ballot), which returns the next
//!    ballot or `None` once the run is over.
//!
//! Calling a phase method out of order is a host bug and panics.

use std::collections::{BTreeMap, BTreeSet};

use super::confirm::{self, ConfirmationResult, Rejection};
use super::generator::Generator;
use super::signal::{BallotRecord, Observer, Signal};
use super::state::{BallotContext, SimulationState};
use super::tally::{TallySummary, Vote, VoteTally};
use crate::config::SimulationConfig;
use crate::error::ConfigError;
use crate::id::Id;
use crate::model::{
    Assignments, Ballot, Composition, ElectionAssigner, ElectionRequest, NameTable,
    PermissionOverride, Permissions, Person, Procedure, ProcedureKind, compose_permissions,
    sort_requests,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BallotStage {
    /// Votes and declarations are both accepted.
    Declaring,
    /// Declarations are closed; only votes are accepted.
    Deciding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    /// Setup or a previous ballot has finished. `next` is the ballot the
    /// links chose, or `None` before the first ballot.
    AwaitingBallot { next: Option<Id> },
    Ballot { id: Id, stage: BallotStage },
    /// No link matched after the last ballot.
    Terminal,
}

/// What an effect bundle touched, so observers are told once per bundle.
#[derive(Debug, Clone, Copy, Default)]
pub(super) struct Changes {
    pub permissions: bool,
    pub currencies: bool,
    pub procedures: bool,
}

/// Where a procedure effect is being applied from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Scope {
    Setup,
    /// A targeted procedure firing as a ballot starts.
    BallotStart { first: bool },
    Declared { person: Id },
}

impl Scope {
    pub fn actor(self) -> Option<Id> {
        match self {
            Scope::Declared { person } => Some(person),
            _ => None,
        }
    }

    /// Currency changes and procedure activation from targeted procedures
    /// are held back on the first ballot after setup.
    pub fn suppresses_carryover(self) -> bool {
        self == Scope::BallotStart { first: true }
    }
}

pub struct SimulationContext {
    pub(super) config: SimulationConfig,
    pub(super) role_table: BTreeMap<Id, Permissions>,
    pub(super) state: SimulationState,
    pub(super) ballot: BallotContext,
    pub(super) phase: Phase,
    pub(super) permissions: BTreeMap<Id, Permissions>,
    /// Overrides from governmental procedures; kept for the whole run.
    pub(super) standing_overrides: Vec<PermissionOverride>,
    /// Overrides from targeted and declared procedures; reset per ballot.
    pub(super) ballot_overrides: Vec<PermissionOverride>,
    /// Per-person compositions from the latest ballot limit.
    pub(super) person_overrides: Vec<(Id, Composition)>,
    pub(super) pending_elections: Vec<ElectionRequest>,
    pub(super) ballots_started: u32,
    pub(super) history: Vec<BallotRecord>,
    pub(super) generator: Box<dyn Generator>,
    assigner: Box<dyn ElectionAssigner>,
    observers: Vec<Box<dyn Observer>>,
}

impl SimulationContext {
    /// Validate `config` and build a context in the `Uninitialized` phase.
    pub fn new(
        config: SimulationConfig,
        generator: Box<dyn Generator>,
        assigner: Box<dyn ElectionAssigner>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            role_table: config.role_table(),
            state: SimulationState::from_config(&config),
            config,
            ballot: BallotContext::default(),
            phase: Phase::Uninitialized,
            permissions: BTreeMap::new(),
            standing_overrides: Vec::new(),
            ballot_overrides: Vec::new(),
            person_overrides: Vec::new(),
            pending_elections: Vec::new(),
            ballots_started: 0,
            history: Vec::new(),
            generator,
            assigner,
            observers: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Box<dyn Observer>) {
        self.observers.push(observer);
    }

    /// Register the people taking part. Each starts with only the `MEMBER`
    /// role and no faction.
    ///
    /// # Panics
    /// Panics unless the context is `Uninitialized`.
    pub fn initialize(&mut self, people: Vec<Person>) -> Result<(), ConfigError> {
        assert_eq!(
            self.phase,
            Phase::Uninitialized,
            "initialize: context already initialized"
        );
        let mut roster = BTreeMap::new();
        for person in people {
            let id = person.id;
            if id.is_reserved() {
                return Err(ConfigError::ReservedId { space: "person", id });
            }
            if roster.insert(id, person).is_some() {
                return Err(ConfigError::DuplicateId { space: "person", id });
            }
        }
        self.state.roles = roster
            .keys()
            .map(|&id| (id, BTreeSet::from([Id::MEMBER])))
            .collect();
        self.state.people = roster;
        self.phase = Phase::Initialized;
        tracing::debug!(people = self.state.people.len(), "context initialized");
        Ok(())
    }

    /// Apply every governmental procedure once, run any elections they ask
    /// for and compose the first permission map.
    ///
    /// # Panics
    /// Panics unless the context is `Initialized`.
    pub fn start_setup(&mut self) {
        assert_eq!(
            self.phase,
            Phase::Initialized,
            "start_setup: context must be initialized first"
        );
        let governmental: Vec<Procedure> = self
            .config
            .procedures
            .iter()
            .filter(|p| matches!(p.kind, ProcedureKind::Governmental))
            .cloned()
            .collect();
        tracing::debug!(procedures = governmental.len(), "setup started");

        let mut changes = Changes {
            permissions: true,
            currencies: !self.state.currencies.is_empty(),
            procedures: false,
        };
        for procedure in &governmental {
            for effect in &procedure.effects {
                self.apply_procedure_effect(procedure.id, effect, Scope::Setup, &mut changes);
            }
        }
        self.settle(changes);
        self.phase = Phase::AwaitingBallot { next: None };
    }

    /// Open ballot `id`: reset the per-ballot state, fire the active targeted
    /// procedures that apply to it, then recompose permissions.
    ///
    /// # Panics
    /// Panics if no ballot is awaited, if `id` is not the ballot the previous
    /// links chose, or if `id` is unknown.
    pub fn start_ballot(&mut self, id: Id) {
        match self.phase {
            Phase::AwaitingBallot { next } => assert!(
                next.is_none_or(|n| n == id),
                "start_ballot: expected ballot {next:?}, got {id}"
            ),
            other => panic!("start_ballot: cannot start a ballot in phase {other:?}"),
        }
        assert!(
            self.config.ballot(id).is_some(),
            "start_ballot: ballot {id} not found"
        );

        let first = self.ballots_started == 0;
        self.ballots_started += 1;
        self.ballot = BallotContext::new(id);
        let mut changes = Changes {
            permissions: !self.ballot_overrides.is_empty() || !self.person_overrides.is_empty(),
            ..Changes::default()
        };
        self.ballot_overrides.clear();
        self.person_overrides.clear();
        self.state.current_ballot = Some(id);
        self.phase = Phase::Ballot {
            id,
            stage: BallotStage::Declaring,
        };

        let targeted: Vec<Procedure> = self
            .config
            .procedures
            .iter()
            .filter(|p| {
                matches!(p.kind, ProcedureKind::Targeted { .. })
                    && self.state.active_procedures.contains(&p.id)
                    && p.applies_to_ballot(id)
            })
            .cloned()
            .collect();
        tracing::debug!(ballot = %id, first, targeted = targeted.len(), "ballot started");

        for procedure in &targeted {
            for effect in &procedure.effects {
                self.apply_procedure_effect(
                    procedure.id,
                    effect,
                    Scope::BallotStart { first },
                    &mut changes,
                );
            }
        }
        self.settle(changes);
    }

    /// Record `person`'s vote on the live ballot. A person who cannot vote
    /// may still abstain; any other vote from them is refused and `false` is
    /// returned.
    ///
    /// # Panics
    /// Panics outside a ballot or if `person` is unknown.
    pub fn cast_vote(&mut self, person: Id, vote: Vote) -> bool {
        self.expect_ballot("cast_vote");
        let permissions = self
            .permissions
            .get(&person)
            .unwrap_or_else(|| panic!("cast_vote: person {person} not found"));
        if !permissions.can_vote && vote != Vote::Abstain {
            tracing::debug!(person = %person, ?vote, "vote refused");
            return false;
        }
        self.ballot.tally.record(person, vote);
        true
    }

    /// Stop accepting declarations on the live ballot.
    ///
    /// # Panics
    /// Panics outside a ballot.
    pub fn close_declarations(&mut self) {
        let (id, _) = self.expect_ballot("close_declarations");
        self.phase = Phase::Ballot {
            id,
            stage: BallotStage::Deciding,
        };
    }

    /// Whether `person` could pay the fixed cost of declaring `procedure`
    /// right now.
    ///
    /// # Panics
    /// Panics if `procedure` is unknown.
    pub fn can_afford(&self, person: Id, procedure: Id) -> bool {
        match self.procedure_def(procedure).confirmation() {
            Some(confirmation) => confirm::can_afford(
                confirmation,
                self.owned_currency(person),
                &self.state.currencies,
            ),
            None => false,
        }
    }

    /// `person` declares `procedure` on the live ballot. On confirmation its
    /// effects apply immediately; the result tells the host what happened.
    ///
    /// # Panics
    /// Panics outside a ballot, if `person` or `procedure` is unknown, if the
    /// procedure is not declarable, or if a fixed currency cost cannot be
    /// paid (check [`can_afford`](Self::can_afford) first).
    pub fn declare_procedure(&mut self, person: Id, procedure: Id) -> ConfirmationResult {
        let (ballot, stage) = self.expect_ballot("declare_procedure");
        assert!(
            self.state.people.contains_key(&person),
            "declare_procedure: person {person} not found"
        );
        let def = self.procedure_def(procedure).clone();
        let ProcedureKind::Declared {
            confirmation,
            declarers,
            ..
        } = &def.kind
        else {
            panic!("declare_procedure: procedure {procedure} is not declarable");
        };

        let refusal = if stage == BallotStage::Deciding {
            Some(Rejection::DeclarationsClosed)
        } else if !def.applies_to_ballot(ballot) {
            Some(Rejection::NotApplicable)
        } else if self.ballot.declared.contains(&procedure) {
            Some(Rejection::AlreadyDeclared)
        } else if !declarers.is_empty()
            && !self.state.roles[&person].iter().any(|r| declarers.contains(r))
        {
            Some(Rejection::NotPermitted)
        } else {
            None
        };
        if let Some(reason) = refusal {
            tracing::debug!(person = %person, procedure = %procedure, ?reason, "declaration refused");
            return ConfirmationResult::Rejected { reason };
        }

        let owned = self.owned_currency(person);
        let live = self.ballot.tally.is_decided(&self.permissions);
        let before = self.state.currencies.clone();
        let result = confirm::try_confirm(
            *confirmation,
            owned,
            &mut self.state.currencies,
            live,
            self.generator.as_mut(),
        );
        tracing::debug!(person = %person, procedure = %procedure, ?result, "procedure declared");

        let mut changes = Changes {
            currencies: before != self.state.currencies,
            ..Changes::default()
        };
        if result.is_confirmed() {
            self.ballot.declared.push(procedure);
            for effect in &def.effects {
                self.apply_procedure_effect(
                    procedure,
                    effect,
                    Scope::Declared { person },
                    &mut changes,
                );
            }
        }
        self.settle(changes);
        result
    }

    /// `Some(true)` once the live ballot has passed, `Some(false)` once it
    /// has failed, `None` while undecided.
    ///
    /// # Panics
    /// Panics outside a ballot.
    pub fn is_decided(&self) -> Option<bool> {
        self.expect_ballot("is_decided");
        self.ballot.tally.is_decided(&self.permissions)
    }

    /// Outcome of an incident ballot, read from its resolution condition.
    ///
    /// # Panics
    /// Panics outside a ballot or if the live ballot is not an incident.
    pub fn incident_outcome(&self) -> bool {
        let (id, _) = self.expect_ballot("incident_outcome");
        let ballot = self.ballot_def(id);
        let resolution = ballot
            .resolution
            .as_ref()
            .filter(|_| ballot.incident)
            .unwrap_or_else(|| panic!("incident_outcome: ballot {id} is not an incident"));
        resolution
            .forced_vote()
            .unwrap_or_else(|| resolution.evaluate(&self.condition_state()))
    }

    /// Close the live ballot with the host's verdict. Applies the matching
    /// result effects, records the ballot, and follows the links.
    ///
    /// Returns the next ballot, or `None` when no link matched and the run
    /// is over.
    ///
    /// # Panics
    /// Panics outside a ballot.
    pub fn end_ballot(&mut self, is_pass: bool) -> Option<Id> {
        let (id, _) = self.expect_ballot("end_ballot");
        let result = self.ballot_def(id).result(is_pass).clone();

        let mut changes = Changes::default();
        for effect in &result.effects {
            self.apply_ballot_effect(effect, &mut changes);
        }
        if is_pass {
            self.state.passed_ballots.insert(id);
        }

        let record = BallotRecord {
            ballot: id,
            passed: is_pass,
            tally: self.ballot.tally.summary(&self.permissions),
            declared: self.ballot.declared.clone(),
        };
        self.history.push(record.clone());
        self.emit(Signal::BallotVoted { record });
        self.settle(changes);

        let next = result.next_ballot(&self.condition_state());
        self.state.current_ballot = None;
        self.phase = match next {
            Some(next) => Phase::AwaitingBallot { next: Some(next) },
            None => Phase::Terminal,
        };
        tracing::info!(ballot = %id, passed = is_pass, next = ?next, "ballot ended");
        next
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn permissions(&self) -> &BTreeMap<Id, Permissions> {
        &self.permissions
    }

    pub fn tally(&self) -> &VoteTally {
        &self.ballot.tally
    }

    pub fn tally_summary(&self) -> TallySummary {
        self.ballot.tally.summary(&self.permissions)
    }

    /// Procedures declared successfully on the live ballot.
    pub fn declared(&self) -> &[Id] {
        &self.ballot.declared
    }

    /// One record per ended ballot, oldest first.
    pub fn history(&self) -> &[BallotRecord] {
        &self.history
    }

    /// Names for display, including the people taking part.
    pub fn names(&self) -> NameTable {
        let mut names = self.config.name_table();
        names.people = self
            .state
            .people
            .values()
            .map(|p| (p.id, p.name.clone()))
            .collect();
        names
    }

    /// The currency `person` spends from: their party's if it has one, else
    /// their region's, else the state's.
    pub fn owned_currency(&self, person: Id) -> Option<Id> {
        let membership = self.state.membership(person);
        membership
            .party
            .and_then(|p| self.config.party_currency(p))
            .or_else(|| membership.region.and_then(|r| self.config.region_currency(r)))
            .or_else(|| self.config.state_currency())
    }

    pub(super) fn condition_state(&self) -> crate::model::ConditionState<'_> {
        self.state.condition_state(self.ballot.tally.forced)
    }

    fn expect_ballot(&self, caller: &str) -> (Id, BallotStage) {
        match self.phase {
            Phase::Ballot { id, stage } => (id, stage),
            other => panic!("{caller}: no ballot in progress (phase {other:?})"),
        }
    }

    fn ballot_def(&self, id: Id) -> &Ballot {
        self.config
            .ballot(id)
            .unwrap_or_else(|| panic!("ballot {id} not found"))
    }

    fn procedure_def(&self, id: Id) -> &Procedure {
        self.config
            .procedure(id)
            .unwrap_or_else(|| panic!("procedure {id} not found"))
    }

    fn emit(&mut self, signal: Signal) {
        tracing::trace!(kind = signal.kind_str(), "signal");
        for observer in &mut self.observers {
            observer.notify(&signal);
        }
    }

    /// Finish an effect bundle: run queued elections, recompose if anything
    /// could have moved permissions, then tell observers what changed.
    pub(super) fn settle(&mut self, changes: Changes) {
        let elected = self.run_elections();
        if elected || changes.permissions {
            self.recompose();
        }
        if changes.currencies {
            self.emit(Signal::CurrenciesModified {
                currencies: self.state.currencies.clone(),
            });
        }
        if changes.procedures {
            self.emit(Signal::ProceduresModified {
                active: self.state.active_procedures.clone(),
            });
        }
    }

    fn recompose(&mut self) {
        let overrides: Vec<PermissionOverride> = self
            .standing_overrides
            .iter()
            .chain(&self.ballot_overrides)
            .cloned()
            .collect();
        self.permissions = compose_permissions(
            &self.state.roles,
            &self.role_table,
            &overrides,
            &self.person_overrides,
        );
        self.emit(Signal::PermissionsUpdated {
            permissions: self.permissions.clone(),
        });
    }

    fn run_elections(&mut self) -> bool {
        if self.pending_elections.is_empty() {
            return false;
        }
        let mut requests = std::mem::take(&mut self.pending_elections);
        sort_requests(&mut requests);
        tracing::info!(count = requests.len(), "issuing elections");

        self.emit(Signal::ElectionPreparing {
            requests: requests.clone(),
            roles: self.state.roles.clone(),
            factions: self.state.factions.clone(),
        });
        let assignments = self
            .assigner
            .assign(&requests, &self.state.election_snapshot());
        self.replace_assignments(assignments);
        self.emit(Signal::ElectionCompleted {
            roles: self.state.roles.clone(),
            factions: self.state.factions.clone(),
        });
        true
    }

    /// Take the collaborator's maps wholesale. Everyone keeps `MEMBER`;
    /// entries for unknown people are dropped.
    fn replace_assignments(&mut self, mut assignments: Assignments) {
        let mut roles = BTreeMap::new();
        let mut factions = BTreeMap::new();
        for &person in self.state.people.keys() {
            let mut held = assignments.roles.remove(&person).unwrap_or_else(|| {
                tracing::warn!(person = %person, "election returned no roles; keeping MEMBER only");
                BTreeSet::new()
            });
            held.insert(Id::MEMBER);
            roles.insert(person, held);
            if let Some(membership) = assignments.factions.remove(&person) {
                factions.insert(person, membership);
            }
        }
        for stray in assignments.roles.keys().chain(assignments.factions.keys()) {
            tracing::warn!(person = %stray, "election assigned an unknown person; ignored");
        }
        self.state.roles = roles;
        self.state.factions = factions;
    }
}
