//! Built-in commands.
//!
//! Each submodule contributes one [`CommandDescriptor`]:
//! - [`ping`]: `/ping`, immediate reply then an edit with the round trip
//! - [`share`]: `/share`, buttons and a modal addressed by compact identifiers
//! - [`settings`]: `/settings notify enable|disable` with autocomplete
//! - [`stats`]: `/stats`, private, deferred reply filled in afterwards

use chime_core::CommandDescriptor;

pub mod ping;
pub mod settings;
pub mod share;
pub mod stats;

/// Every built-in command, in registration order.
pub fn builtin() -> Vec<CommandDescriptor> {
    vec![
        ping::command(),
        share::command(),
        settings::command(),
        stats::command(),
    ]
}
