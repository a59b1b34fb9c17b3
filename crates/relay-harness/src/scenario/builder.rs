//! Scenario builder API.
//!
//! Provides a declarative API for constructing scenario tests that enforce
//! the Oracle Pattern.

use tracing::debug;

use crate::{
    recorder::Recorder,
    scenario::{OracleFn, World},
};

/// One scripted step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Deliver these bytes to the relay
    Deliver(Vec<u8>),
    /// Attach a recording handler under this name
    Attach(String),
    /// Attach a recording handler that fails on `poison`
    AttachFailing {
        /// Handler name
        name: String,
        /// Payload that makes the handler fail
        poison: Vec<u8>,
    },
}

/// Scenario builder.
///
/// Add deliveries and attachments in the order they should happen. Must call
/// `.oracle()` to get a [`RunnableScenario`] that can be executed.
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

impl Scenario {
    /// Create a new scenario with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), steps: Vec::new() }
    }

    /// Deliver a payload.
    pub fn deliver(mut self, payload: impl AsRef<[u8]>) -> Self {
        self.steps.push(Step::Deliver(payload.as_ref().to_vec()));
        self
    }

    /// Deliver several payloads, in order.
    pub fn deliver_all<I, P>(mut self, payloads: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        self.steps.extend(payloads.into_iter().map(|p| Step::Deliver(p.as_ref().to_vec())));
        self
    }

    /// Attach a recording handler.
    pub fn attach(mut self, name: impl Into<String>) -> Self {
        self.steps.push(Step::Attach(name.into()));
        self
    }

    /// Attach a recording handler that fails on `poison`.
    pub fn attach_failing(mut self, name: impl Into<String>, poison: impl AsRef<[u8]>) -> Self {
        self.steps.push(Step::AttachFailing { name: name.into(), poison: poison.as_ref().to_vec() });
        self
    }

    /// Scripted steps so far.
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Set the oracle function and return a runnable scenario.
    ///
    /// The oracle is mandatory - you cannot run a scenario without
    /// verification.
    pub fn oracle(self, oracle: OracleFn) -> RunnableScenario {
        RunnableScenario { scenario: self, oracle }
    }
}

/// A scenario with an oracle function that can be executed.
pub struct RunnableScenario {
    scenario: Scenario,
    oracle: OracleFn,
}

impl RunnableScenario {
    /// Scenario name.
    pub fn name(&self) -> &str {
        &self.scenario.name
    }

    /// Execute the scenario.
    ///
    /// Steps run in order against a fresh relay. Handler errors do not abort
    /// the run; they are recorded in the world so the oracle can check them.
    /// Fails if two handlers share a name, or if the oracle rejects the
    /// final world.
    pub fn run(self) -> Result<(), String> {
        let name = self.scenario.name;
        let mut world = World::new();

        for (index, step) in self.scenario.steps.into_iter().enumerate() {
            debug!(scenario = %name, index, ?step, "step");

            let result = match step {
                Step::Deliver(payload) => world.relay_mut().deliver(payload),
                Step::Attach(handler) => {
                    let (recorder, received) = Recorder::new();
                    world
                        .add_handler(handler, received)
                        .map_err(|reason| failure(&name, &reason))?;
                    world.relay_mut().attach(recorder)
                },
                Step::AttachFailing { name: handler, poison } => {
                    let (recorder, received) = Recorder::failing_on(poison);
                    world
                        .add_handler(handler, received)
                        .map_err(|reason| failure(&name, &reason))?;
                    world.relay_mut().attach(recorder)
                },
            };

            if let Err(error) = result {
                world.record_error(index, error);
            }
        }

        (self.oracle)(&world).map_err(|reason| failure(&name, &reason))
    }
}

fn failure(scenario: &str, reason: &str) -> String {
    format!("Scenario '{scenario}': {reason}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_requires_oracle() {
        // This should compile - oracle provided
        let _scenario = Scenario::new("test").deliver(b"x").oracle(Box::new(|_world| Ok(())));

        // This should NOT compile - no oracle
        // let scenario = Scenario::new("test").deliver(b"x");
        // scenario.run(); // ERROR: no method `run` on type `Scenario`
    }

    #[test]
    fn scenario_records_steps_in_order() {
        let scenario = Scenario::new("steps").deliver(b"a").attach("h").deliver_all([b"b", b"c"]);
        assert_eq!(scenario.steps(), &[
            Step::Deliver(b"a".to_vec()),
            Step::Attach("h".into()),
            Step::Deliver(b"b".to_vec()),
            Step::Deliver(b"c".to_vec()),
        ]);
    }

    #[test]
    fn oracle_failure_names_scenario() {
        let result = Scenario::new("doomed")
            .attach("h")
            .oracle(Box::new(|_world| Err("nope".to_string())))
            .run();

        assert_eq!(result, Err("Scenario 'doomed': nope".to_string()));
    }

    #[test]
    fn duplicate_handler_name_is_rejected() {
        let result = Scenario::new("twice")
            .deliver(b"a")
            .attach("h")
            .attach("h")
            .oracle(Box::new(|_world| Ok(())))
            .run();

        assert_eq!(result, Err("Scenario 'twice': handler 'h' attached twice".to_string()));
    }

    #[test]
    fn handler_names_follow_attach_order() {
        let result = Scenario::new("order")
            .attach("first")
            .attach_failing("second", b"x")
            .attach("third")
            .oracle(Box::new(|world| {
                assert_eq!(world.handler_names(), ["first", "second", "third"]);
                Ok(())
            }))
            .run();

        assert!(result.is_ok(), "{result:?}");
    }

    #[test]
    fn handler_errors_are_recorded_not_fatal() {
        let result = Scenario::new("errors")
            .attach_failing("h", b"bad")
            .deliver(b"bad")
            .deliver(b"good")
            .oracle(Box::new(|world| {
                assert_eq!(world.errors().len(), 1);
                assert_eq!(world.errors()[0].step, 1);
                assert!(world.received("h").unwrap().matches(&[b"good"]));
                Ok(())
            }))
            .run();

        assert!(result.is_ok(), "{result:?}");
    }
}
