mod core;
mod history;
mod state;

#[cfg(test)]
mod tests;

pub use state::{
    ConversationController, ConversationSlot, Effect, IdentityChange, PendingSend, SendOptions,
    StreamTicket,
};

use state::ActiveStream;
