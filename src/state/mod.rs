pub mod conversation;
pub mod message;
pub mod session;

pub use conversation::{
    ConversationController, ConversationSlot, Effect, IdentityChange, PendingSend, SendOptions,
    StreamTicket,
};
pub use message::{Message, Role, Transcript};
pub use session::{SessionError, SessionUpdate, StreamBuffers, StreamGate, StreamSession};
