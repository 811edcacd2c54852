use crate::config::SimulationConfig;
use crate::id::{Id, IdGenerator};
use crate::model::*;
use crate::sim::{Generator, SequenceGenerator, SimulationContext};

/// Build a procedure effect, panicking on an invalid combination.
pub fn procedure_effect(kind: ProcedureEffectKind, targets: Vec<Id>, value: i8) -> ProcedureEffect {
    ProcedureEffect::new(kind, targets, value).unwrap_or_else(|e| panic!("scenario: {e}"))
}

/// Build a ballot effect, panicking on an invalid combination.
pub fn ballot_effect(kind: BallotEffectKind, targets: Vec<Id>, value: i8) -> BallotEffect {
    BallotEffect::new(kind, targets, value).unwrap_or_else(|e| panic!("scenario: {e}"))
}

// -- Builder-style ref types --

/// Typed reference to a ballot in a [`Scenario`], enabling chained edits.
///
/// Created by [`Scenario::ballot`] (creation) or [`Scenario::ballot_mut`] (mutation).
/// Call [`.id()`](BallotRef::id) to terminate the chain and extract the ballot ID.
pub struct BallotRef<'a> {
    scenario: &'a mut Scenario,
    id: Id,
}

impl<'a> BallotRef<'a> {
    fn data_mut(&mut self) -> &mut Ballot {
        let id = self.id;
        self.scenario
            .config
            .ballots
            .iter_mut()
            .find(|b| b.id == id)
            .unwrap_or_else(|| panic!("BallotRef: ballot {id} not found"))
    }

    pub fn on_pass(mut self, kind: BallotEffectKind, targets: Vec<Id>, value: i8) -> Self {
        self.data_mut().pass.effects.push(ballot_effect(kind, targets, value));
        self
    }

    pub fn on_fail(mut self, kind: BallotEffectKind, targets: Vec<Id>, value: i8) -> Self {
        self.data_mut().fail.effects.push(ballot_effect(kind, targets, value));
        self
    }

    pub fn pass_link(mut self, condition: Condition, target: LinkTarget) -> Self {
        self.data_mut().pass.links.push(Link { condition, target });
        self
    }

    pub fn fail_link(mut self, condition: Condition, target: LinkTarget) -> Self {
        self.data_mut().fail.links.push(Link { condition, target });
        self
    }

    /// Unconditional link to `next` from both outcomes.
    pub fn then(self, next: Id) -> Self {
        self.pass_link(Condition::Always, LinkTarget::Ballot(next))
            .fail_link(Condition::Always, LinkTarget::Ballot(next))
    }

    /// Mark as an incident resolved by `resolution`.
    pub fn incident(mut self, resolution: Condition) -> Self {
        let b = self.data_mut();
        b.incident = true;
        b.resolution = Some(resolution);
        self
    }

    /// Escape hatch: apply an arbitrary closure to the ballot.
    pub fn with(mut self, f: impl FnOnce(&mut Ballot)) -> Self { f(self.data_mut()); self }

    /// Terminate the chain and return the ballot ID.
    pub fn id(self) -> Id { self.id }
}

/// Fluent builder for rule configurations and contexts.
///
/// Allocates ids per id space, so tests name things instead of numbering
/// them. Used by tests for deterministic setup.
pub struct Scenario {
    config: SimulationConfig,
    people: Vec<Person>,
    person_ids: IdGenerator,
    role_ids: IdGenerator,
    faction_ids: IdGenerator,
    currency_ids: IdGenerator,
    procedure_ids: IdGenerator,
    ballot_ids: IdGenerator,
}

impl Default for Scenario {
    fn default() -> Self {
        Self::new()
    }
}

impl Scenario {
    /// An empty scenario where `MEMBER` can vote.
    pub fn new() -> Self {
        let mut config = SimulationConfig::default();
        config.roles.push(RoleDef {
            id: Id::MEMBER,
            name: "Member".to_string(),
            permissions: Permissions {
                can_vote: true,
                ..Permissions::default()
            },
        });
        Self {
            config,
            people: Vec::new(),
            person_ids: IdGenerator::new(),
            role_ids: IdGenerator::new(),
            faction_ids: IdGenerator::new(),
            currency_ids: IdGenerator::new(),
            procedure_ids: IdGenerator::new(),
            ballot_ids: IdGenerator::new(),
        }
    }

    // -- People and roles --

    pub fn person(&mut self, name: &str) -> Id {
        let id = self.person_ids.next_id();
        self.people.push(Person::new(id, name));
        id
    }

    /// Add `n` people named `P0`, `P1`, ...
    pub fn people(&mut self, n: u8) -> Vec<Id> {
        (0..n).map(|i| self.person(&format!("P{i}"))).collect()
    }

    pub fn role(&mut self, name: &str, permissions: Permissions) -> Id {
        let id = self.role_ids.next_id();
        self.config.roles.push(RoleDef {
            id,
            name: name.to_string(),
            permissions,
        });
        id
    }

    /// Replace the base permissions of a configured or named role.
    pub fn role_permissions(&mut self, role: Id, permissions: Permissions) -> &mut Self {
        match self.config.roles.iter_mut().find(|r| r.id == role) {
            Some(def) => def.permissions = permissions,
            None => self.config.roles.push(RoleDef {
                id: role,
                name: format!("role {role}"),
                permissions,
            }),
        }
        self
    }

    // -- Factions and currencies --

    pub fn party(&mut self, name: &str, active: bool) -> Id {
        let id = self.faction_ids.next_id();
        self.config.parties.push(FactionDef {
            id,
            name: name.to_string(),
            active,
        });
        id
    }

    pub fn region(&mut self, name: &str, active: bool) -> Id {
        let id = self.faction_ids.next_id();
        self.config.regions.push(FactionDef {
            id,
            name: name.to_string(),
            active,
        });
        id
    }

    pub fn currency(&mut self, name: &str, owner: CurrencyOwner, initial: i8) -> Id {
        let id = self.currency_ids.next_id();
        self.config.currencies.push(CurrencyDef {
            id,
            name: name.to_string(),
            owner,
            initial,
        });
        id
    }

    // -- Procedures --

    pub fn procedure(&mut self, name: &str, kind: ProcedureKind, effects: Vec<ProcedureEffect>) -> Id {
        let id = self.procedure_ids.next_id();
        self.config.procedures.push(Procedure {
            id,
            name: name.to_string(),
            kind,
            effects,
        });
        id
    }

    pub fn governmental(&mut self, name: &str, effects: Vec<ProcedureEffect>) -> Id {
        self.procedure(name, ProcedureKind::Governmental, effects)
    }

    /// A targeted procedure for every ballot.
    pub fn targeted(&mut self, name: &str, active: bool, effects: Vec<ProcedureEffect>) -> Id {
        self.procedure(
            name,
            ProcedureKind::Targeted {
                ballots: Vec::new(),
                active,
            },
            effects,
        )
    }

    /// A declared procedure anyone may use on any ballot.
    pub fn declared(
        &mut self,
        name: &str,
        confirmation: Confirmation,
        effects: Vec<ProcedureEffect>,
    ) -> Id {
        self.procedure(
            name,
            ProcedureKind::Declared {
                confirmation,
                declarers: Vec::new(),
                ballots: Vec::new(),
            },
            effects,
        )
    }

    // -- Ballots --

    pub fn ballot(&mut self, name: &str) -> BallotRef<'_> {
        let id = self.ballot_ids.next_id();
        self.config.ballots.push(Ballot {
            id,
            name: name.to_string(),
            pass: BallotResult::default(),
            fail: BallotResult::default(),
            incident: false,
            resolution: None,
        });
        BallotRef { scenario: self, id }
    }

    pub fn ballot_mut(&mut self, id: Id) -> BallotRef<'_> {
        BallotRef { scenario: self, id }
    }

    // -- Finishing --

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut SimulationConfig {
        &mut self.config
    }

    pub fn build_config(self) -> SimulationConfig {
        self.config
    }

    /// Build an initialized context that keeps every election result as is
    /// and draws from `generator`.
    pub fn build_with(
        self,
        generator: impl Generator + 'static,
        assigner: impl ElectionAssigner + 'static,
    ) -> SimulationContext {
        let mut ctx = SimulationContext::new(self.config, Box::new(generator), Box::new(assigner))
            .unwrap_or_else(|e| panic!("scenario: invalid config: {e}"));
        ctx.initialize(self.people)
            .unwrap_or_else(|e| panic!("scenario: invalid people: {e}"));
        ctx
    }

    /// Build an initialized context with a generator that always yields 1.
    pub fn build(self) -> SimulationContext {
        self.build_with(SequenceGenerator::new(vec![1]), RetainAssignments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_allocated_per_space() {
        let mut s = Scenario::new();
        let p = s.person("Ada");
        let party = s.party("Reds", true);
        let region = s.region("North", true);
        let b0 = s.ballot("First").id();
        let b1 = s.ballot("Second").id();
        s.ballot_mut(b0).then(b1);

        assert_eq!(p, Id(0));
        assert_eq!((party, region), (Id(0), Id(1)), "parties and regions share a space");
        assert_eq!((b0, b1), (Id(0), Id(1)));
        assert_eq!(s.config().ballots[0].pass.links.len(), 1);
        assert!(s.config().validate().is_ok());
    }

    #[test]
    fn build_initializes_people() {
        let mut s = Scenario::new();
        s.people(3);
        s.ballot("Only");
        let ctx = s.build();
        assert_eq!(ctx.state().people.len(), 3);
        assert!(ctx.state().roles.values().all(|r| r.contains(&Id::MEMBER)));
    }
}
