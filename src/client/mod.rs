// Setrans: Client Module
//
// With the `selinux` feature on a Unix target, `Client` talks to mcstransd.
// Otherwise it is a stub whose operations all succeed with empty results.

#[cfg(all(feature = "selinux", unix))]
mod dispatcher;
#[cfg(all(feature = "selinux", unix, test))]
pub(crate) mod fixture;
#[cfg(all(feature = "selinux", unix))]
mod handle;
#[cfg(not(all(feature = "selinux", unix)))]
mod stub;

#[cfg(all(feature = "selinux", unix))]
pub use handle::Client;
#[cfg(not(all(feature = "selinux", unix)))]
pub use stub::Client;

/// Whether the real daemon client was compiled in.
pub const ENABLED: bool = cfg!(all(feature = "selinux", unix));
