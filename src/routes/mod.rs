/// Router Module Index
///
/// Routes are split by who may reach them. Access control is applied per module:
/// a layer for authenticated routes, the ownership gate inside owner-route handlers.

/// Routes open to every viewer. Some pages change shape for logged-in users.
pub mod public;

/// Routes protected by the `AuthUser` middleware. Anonymous viewers are
/// redirected to login with `next` set.
pub mod authenticated;

/// Routes restricted to the author of the addressed note or comment.
/// Non-owners get 404, anonymous viewers are redirected to login.
pub mod owner;
