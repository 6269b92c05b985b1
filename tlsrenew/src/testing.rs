use std::cell::RefCell;

use anyhow::{anyhow, Result};

use crate::command::{CommandOutput, CommandRunner, Invocation};

type Handler = Box<dyn Fn(&Invocation) -> Result<CommandOutput>>;

/// Scripted runner that records every invocation.
pub(crate) struct FakeRunner {
    calls: RefCell<Vec<Invocation>>,
    handlers: Vec<(String, String, Handler)>,
}

impl FakeRunner {
    pub(crate) fn new() -> Self {
        Self {
            calls: RefCell::new(vec![]),
            handlers: vec![],
        }
    }

    /// Answers invocations of `program` whose arguments include `keyword`.
    pub(crate) fn on(
        mut self,
        program: &str,
        keyword: &str,
        handler: impl Fn(&Invocation) -> Result<CommandOutput> + 'static,
    ) -> Self {
        self.handlers
            .push((program.to_string(), keyword.to_string(), Box::new(handler)));
        self
    }

    /// Appends the handlers of `other`, which lose to the existing ones.
    pub(crate) fn merge(mut self, other: FakeRunner) -> Self {
        self.handlers.extend(other.handlers);
        self
    }

    pub(crate) fn calls(&self) -> Vec<Invocation> {
        self.calls.borrow().clone()
    }

    pub(crate) fn called(&self, program: &str, keyword: &str) -> bool {
        self.calls
            .borrow()
            .iter()
            .any(|inv| matches(inv, program, keyword))
    }
}

fn matches(inv: &Invocation, program: &str, keyword: &str) -> bool {
    let program_matches =
        inv.program == program || inv.program.ends_with(&format!("/{program}"));
    program_matches && inv.args.iter().any(|arg| arg == keyword)
}

impl CommandRunner for FakeRunner {
    fn run(&self, invocation: &Invocation) -> Result<CommandOutput> {
        self.calls.borrow_mut().push(invocation.clone());
        let (_, _, handler) = self
            .handlers
            .iter()
            .find(|(program, keyword, _)| matches(invocation, program, keyword))
            .ok_or_else(|| anyhow!("unexpected invocation: {invocation}"))?;
        handler(invocation)
    }
}
