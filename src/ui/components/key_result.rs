/// Outcome of offering a key to a component.
///
/// Views try components first and fall through to their own bindings on
/// `NotHandled`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyResult<T> {
  /// Consumed, nothing for the parent to do
  Handled,
  /// Consumed, and the parent has an event to act on
  Event(T),
  /// Not consumed
  NotHandled,
}
