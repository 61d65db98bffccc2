mod sign_in;
mod user_form;
mod user_list;

pub use sign_in::SignInView;
pub use user_form::UserFormView;
pub use user_list::UserListView;
