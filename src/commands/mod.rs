pub type CmdResult<T> = textfix::Result<(T, i32)>;

pub(crate) struct GlobalArgs {}

pub mod patch;
pub mod rewrite;
pub mod rules;

/// Dispatch a command to its handler and map result to JSON.
macro_rules! dispatch {
    ($args:expr, $global:expr, $module:ident) => {
        crate::output::map_cmd_result_to_json($module::run($args, $global))
    };
}

pub(crate) fn run_json(
    command: crate::Commands,
    global: &GlobalArgs,
) -> (textfix::Result<serde_json::Value>, i32) {
    crate::tty::status("textfix is working...");

    match command {
        crate::Commands::Rewrite(args) => dispatch!(args, global, rewrite),
        crate::Commands::Patch(args) => dispatch!(args, global, patch),
        crate::Commands::Rules(args) => dispatch!(args, global, rules),
    }
}
