/// Router Module Index
///
/// Splits routes by access level. Access control is attached to whole routers in
/// `create_router`, so a handler cannot end up exposed by being registered in the wrong place.

/// Routes reachable without a session: health check, page shell, legacy redirect.
pub mod public;

/// JSON API routes behind the authorization gate.
pub mod authenticated;
