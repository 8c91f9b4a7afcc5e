/// Router Module Index
///
/// Organizes the application's routing logic into guard-segregated modules. Each
/// module maps to one tier of the navigation rules, and the matching guard layer
/// is applied to the whole module when the router is assembled, so no individual
/// route can accidentally escape its tier.

/// Routes with no guard at all: the entry redirect, health, token refresh and docs.
pub mod public;

/// Routes for signed-out visitors only (login, register). Wrapped in the
/// `require_anonymous` guard: a signed-in visitor is sent to the dashboard.
pub mod anonymous;

/// Routes requiring a resolved session. Wrapped in the `require_session` guard:
/// visitors without one are sent to the login page.
pub mod authenticated;

/// Routes restricted to profiles carrying the 'admin' role. Wrapped in the
/// `require_admin` guard: everyone else is sent to the dashboard.
pub mod admin;
