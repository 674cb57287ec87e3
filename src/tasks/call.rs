// src/tasks/call.rs

use crate::core::{attributes::Attributes, project::TaskContext, registry::Task};
use anyhow::Result;

/// Runs another target of the same project in a fresh sub-project.
///
/// `param.<name>` attributes become user properties of the sub-project, so
/// they win over anything the called target sets.
///
/// A call whose target (or one of its dependencies) is still waiting on an
/// enclosing call fails with a circular dependency.
#[derive(Debug, Default)]
pub struct Call {
    target: String,
    inherit_all: bool,
    inherit_refs: bool,
    params: Vec<(String, String)>,
}

impl Task for Call {
    fn configure(&mut self, attributes: &Attributes) -> Result<()> {
        attributes.check_known("call", &["target", "inheritall", "inheritrefs", "param."])?;
        self.target = attributes.required("target")?.to_string();
        self.inherit_all = attributes.get_bool("inheritall", true)?;
        self.inherit_refs = attributes.get_bool("inheritrefs", false)?;
        self.params = attributes
            .with_prefix("param.")
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Ok(())
    }

    fn execute(&mut self, ctx: &mut TaskContext<'_>) -> Result<()> {
        let caller = ctx.target_name().to_string();
        let project = ctx.project_mut();
        let mut sub = project.create_subproject(self.inherit_all, self.inherit_refs);
        sub.enter_call(&caller);
        sub.check_call_cycle(&self.target)?;
        for (name, value) in &self.params {
            sub.set_user_property(name, value);
        }

        let listeners = project.events_mut().take_listeners();
        sub.events_mut().restore_listeners(listeners);
        let mut guard = scopeguard::guard((project, sub), |(project, mut sub)| {
            let listeners = sub.events_mut().take_listeners();
            project.events_mut().restore_listeners(listeners);
        });
        let (_, sub) = &mut *guard;
        sub.execute_target(&self.target)?;
        Ok(())
    }
}
