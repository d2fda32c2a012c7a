use crate::runtime::UiUpdate;

use super::context::RuntimeContext;
use super::frontend::{ScrollAction, UserInputEvent};

pub trait RuntimeMode {
    fn on_user_input(&mut self, input: String, ctx: &mut RuntimeContext);
    fn on_model_update(&mut self, update: UiUpdate, ctx: &mut RuntimeContext);
    fn on_interrupt(&mut self, _ctx: &mut RuntimeContext) {}
    fn on_scroll(&mut self, _action: ScrollAction) {}
    fn on_frontend_event(&mut self, event: UserInputEvent, ctx: &mut RuntimeContext) {
        match event {
            UserInputEvent::Text(text) => self.on_user_input(text, ctx),
            UserInputEvent::Interrupt => self.on_interrupt(ctx),
            UserInputEvent::Scroll(action) => self.on_scroll(action),
        }
    }
    fn is_turn_in_progress(&self) -> bool;
    /// Whether submitting `input` now would be acted on. Frontends keep the
    /// typed text when this is false.
    fn accepts_input(&self, _input: &str) -> bool {
        true
    }
}
