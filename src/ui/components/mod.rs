mod confirm;
mod form;
mod input;
mod key_result;

pub use confirm::ConfirmPrompt;
pub use form::{Form, FormEvent};
pub use input::TextInput;
pub use key_result::KeyResult;
