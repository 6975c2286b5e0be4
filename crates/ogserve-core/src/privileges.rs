use crate::error::{OgError, Result};

/// Effective uid of the current process. Root is uid 0.
#[cfg(unix)]
pub fn effective_uid() -> u32 {
    // SAFETY: geteuid takes no arguments and cannot fail.
    unsafe { libc::geteuid() }
}

/// Platforms without a root uid never trip the guard.
#[cfg(not(unix))]
pub fn effective_uid() -> u32 {
    u32::MAX
}

/// The decision itself, split out so it can be tested under any uid.
pub fn check_uid(euid: u32, allow_root: bool) -> Result<()> {
    if euid == 0 && !allow_root {
        return Err(OgError::RunningAsRoot);
    }
    Ok(())
}

/// Refuse to start when running as root, unless the override is set.
pub fn enforce_unprivileged(allow_root: bool) -> Result<()> {
    check_uid(effective_uid(), allow_root)
}
