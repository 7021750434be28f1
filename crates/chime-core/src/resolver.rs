//! Runner selection.
//!
//! Given a resolved command, picks the function to call:
//!
//! 1. a named runner whose name equals the subcommand path;
//! 2. with sub-identifier dispatch, a named runner whose name equals the
//!    first positional argument (which is then consumed);
//! 3. the default runner for the interaction shape.
//!
//! Reserved default names are never matched by steps 1 and 2.

use crate::command::{CommandDescriptor, Runner};

/// The selected runner and the positional arguments it should receive.
pub struct RunnerChoice {
    pub name: String,
    pub runner: Runner,
    pub args: Vec<String>,
}

impl std::fmt::Debug for RunnerChoice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerChoice")
            .field("name", &self.name)
            .field("args", &self.args)
            .finish_non_exhaustive()
    }
}

/// Selects the runner for an invocation. Returns `None` when the command has
/// no applicable runner at all.
pub fn select_runner(
    command: &CommandDescriptor,
    default: Option<&str>,
    subcommand: Option<&str>,
    mut args: Vec<String>,
) -> Option<RunnerChoice> {
    if let Some(path) = subcommand.filter(|p| command.has_named_runner(p)) {
        let runner = command.runner(path)?.clone();
        return Some(RunnerChoice {
            name: path.to_string(),
            runner,
            args,
        });
    }

    if command.supports_sub_id_dispatch() {
        if let Some(first) = args.first().filter(|a| command.has_named_runner(a)) {
            let name = first.clone();
            let runner = command.runner(&name)?.clone();
            args.remove(0);
            return Some(RunnerChoice { name, runner, args });
        }
    }

    let name = default?;
    let runner = command.runner(name)?.clone();
    Some(RunnerChoice {
        name: name.to_string(),
        runner,
        args,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::defaults;
    use crate::error::HandlerError;
    use crate::invocation::Invocation;

    async fn noop(_inv: Invocation) -> Result<(), HandlerError> {
        Ok(())
    }

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_should_prefer_subcommand_runner() {
        let cmd = CommandDescriptor::new("notify")
            .on_command(noop)
            .on("notify enable", noop);
        let choice =
            select_runner(&cmd, Some(defaults::COMMAND), Some("notify enable"), vec![]).expect("runner");
        assert_eq!(choice.name, "notify enable");
    }

    #[test]
    fn test_should_fall_back_to_default_for_unknown_subcommand() {
        let cmd = CommandDescriptor::new("notify").on_command(noop);
        let choice =
            select_runner(&cmd, Some(defaults::COMMAND), Some("notify disable"), vec![]).expect("runner");
        assert_eq!(choice.name, defaults::COMMAND);
    }

    #[test]
    fn test_should_not_match_reserved_name_as_subcommand() {
        let cmd = CommandDescriptor::new("x").on_command(noop).on_modal(noop);
        let choice = select_runner(&cmd, Some(defaults::COMMAND), Some("modal"), vec![]).expect("runner");
        assert_eq!(choice.name, defaults::COMMAND);
    }

    #[test]
    fn test_should_consume_identifier_segment() {
        let cmd = CommandDescriptor::new("share")
            .sub_id_dispatch()
            .on_component(noop)
            .on("twitter", noop);
        let choice = select_runner(
            &cmd,
            Some(defaults::COMPONENT),
            None,
            args(&["twitter", "12345", "1"]),
        )
        .expect("runner");
        assert_eq!(choice.name, "twitter");
        assert_eq!(choice.args, ["12345", "1"]);
    }

    #[test]
    fn test_should_keep_segment_without_sub_id_dispatch() {
        let cmd = CommandDescriptor::new("share")
            .on_component(noop)
            .on("twitter", noop);
        let choice = select_runner(&cmd, Some(defaults::COMPONENT), None, args(&["twitter", "1"]))
            .expect("runner");
        assert_eq!(choice.name, defaults::COMPONENT);
        assert_eq!(choice.args, ["twitter", "1"]);
    }

    #[test]
    fn test_should_keep_segment_that_names_no_runner() {
        let cmd = CommandDescriptor::new("share").sub_id_dispatch().on_component(noop);
        let choice = select_runner(&cmd, Some(defaults::COMPONENT), None, args(&["reddit", "1"]))
            .expect("runner");
        assert_eq!(choice.name, defaults::COMPONENT);
        assert_eq!(choice.args, ["reddit", "1"]);
    }

    #[test]
    fn test_should_not_dispatch_to_reserved_name_from_identifier() {
        let cmd = CommandDescriptor::new("share")
            .sub_id_dispatch()
            .on_command(noop)
            .on_component(noop);
        let choice = select_runner(&cmd, Some(defaults::COMPONENT), None, args(&["command"]))
            .expect("runner");
        assert_eq!(choice.name, defaults::COMPONENT);
        assert_eq!(choice.args, ["command"]);
    }

    #[test]
    fn test_should_return_none_without_applicable_runner() {
        let cmd = CommandDescriptor::new("ping").on_command(noop);
        assert!(select_runner(&cmd, Some(defaults::COMPONENT), None, vec![]).is_none());
        assert!(select_runner(&cmd, None, None, vec![]).is_none());
    }
}
