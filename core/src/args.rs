//! The structured input handed to every action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Accumulator merged across an extends chain.
pub type PipeResult = Map<String, Value>;

/// Parsed input of one invocation.
///
/// Created fresh at the leaf command for each run. Options and flags are keyed
/// by canonical name (see [`Flag::name`](crate::Flag::name)).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CommandArgs {
    /// Positional values, in argv order.
    pub args: Vec<String>,
    /// Resolved option values, including applied defaults.
    pub options: BTreeMap<String, Value>,
    /// Flags that were present on argv.
    pub flags: BTreeMap<String, bool>,
    /// Results resolved by the extensions that ran before this action.
    pub pipe_result: PipeResult,
}

impl CommandArgs {
    /// Option value by canonical name.
    pub fn option(&self, name: &str) -> Option<&Value> {
        self.options.get(name)
    }

    /// Option value as a string slice, when it is a string.
    pub fn option_str(&self, name: &str) -> Option<&str> {
        self.options.get(name).and_then(Value::as_str)
    }

    /// Whether a flag was set.
    pub fn flag(&self, name: &str) -> bool {
        self.flags.get(name).copied().unwrap_or(false)
    }

    /// Shallow-merges `result` into the pipe result; incoming keys win.
    pub(crate) fn absorb(&mut self, result: PipeResult) {
        for (key, value) in result {
            self.pipe_result.insert(key, value);
        }
    }
}
