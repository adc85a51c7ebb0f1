//! Accessibility trust checks and the System Settings deep link

use crate::Result;
use tracing::debug;

/// Deep link to the Accessibility list under Privacy & Security
pub const ACCESSIBILITY_SETTINGS_URL: &str =
    "x-apple.systempreferences:com.apple.preference.security?Privacy_Accessibility";

/// How to ask the system whether this process is trusted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrustCheck {
    /// Query only
    Silent,
    /// Query and show the system prompt when the process is untrusted
    Prompt,
}

/// Whether TileSnap may control other applications' windows
pub fn is_accessibility_permission_granted() -> Result<bool> {
    platform::is_trusted(TrustCheck::Silent)
}

/// Ask for accessibility trust, showing the system prompt if needed.
///
/// Returns the trust state at the time of the call; approval granted in the
/// prompt only shows up on a later check.
pub fn prompt_accessibility_permission() -> Result<bool> {
    platform::is_trusted(TrustCheck::Prompt)
}

/// Open System Settings at the Accessibility list so the user can approve TileSnap
pub fn open_accessibility_settings() -> Result<()> {
    debug!(url = ACCESSIBILITY_SETTINGS_URL, "Opening System Settings");
    platform::open_url(ACCESSIBILITY_SETTINGS_URL)
}

#[cfg(target_os = "macos")]
mod platform {
    use super::TrustCheck;
    use crate::{Result, TileSnapError};
    use anyhow::Context;
    use core_foundation::base::TCFType;
    use core_foundation::boolean::CFBoolean;
    use core_foundation::dictionary::CFDictionary;
    use core_foundation::string::CFString;
    use core_foundation_sys::dictionary::CFDictionaryRef;
    use core_foundation_sys::string::CFStringRef;

    #[link(name = "ApplicationServices", kind = "framework")]
    extern "C" {
        fn AXIsProcessTrusted() -> bool;
        fn AXIsProcessTrustedWithOptions(options: CFDictionaryRef) -> bool;
        static kAXTrustedCheckOptionPrompt: CFStringRef;
    }

    pub(super) fn is_trusted(check: TrustCheck) -> Result<bool> {
        let trusted = match check {
            TrustCheck::Silent => unsafe { AXIsProcessTrusted() },
            TrustCheck::Prompt => {
                let key = unsafe { CFString::wrap_under_get_rule(kAXTrustedCheckOptionPrompt) };
                let options = CFDictionary::from_CFType_pairs(&[(key, CFBoolean::true_value())]);
                unsafe { AXIsProcessTrustedWithOptions(options.as_concrete_TypeRef()) }
            }
        };
        Ok(trusted)
    }

    pub(super) fn open_url(url: &str) -> Result<()> {
        let status = std::process::Command::new("open")
            .arg(url)
            .status()
            .context("failed to launch open")?;

        if status.success() {
            Ok(())
        } else {
            Err(TileSnapError::MacOSAPIError(format!("open {url} returned {status}")).into())
        }
    }
}

/// Off macOS trust comes from `TILESNAP_PERMISSION_ACCESSIBILITY=true`, which
/// lets the CLI and tests exercise the permission gate.
#[cfg(not(target_os = "macos"))]
mod platform {
    use super::TrustCheck;
    use crate::{Result, TileSnapError};

    pub(super) const PERMISSION_ENV: &str = "TILESNAP_PERMISSION_ACCESSIBILITY";

    pub(super) fn is_trusted(check: TrustCheck) -> Result<bool> {
        if check == TrustCheck::Prompt {
            tracing::debug!("No trust prompt on this platform; reading {PERMISSION_ENV}");
        }
        Ok(std::env::var(PERMISSION_ENV)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false))
    }

    pub(super) fn open_url(url: &str) -> Result<()> {
        Err(TileSnapError::MacOSAPIError(format!(
            "cannot open {url}: System Settings is macOS only"
        ))
        .into())
    }
}
