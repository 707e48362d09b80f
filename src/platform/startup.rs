//! Run-on-startup registry entry management

use tracing::{debug, warn};
use windows::core::PCWSTR;
use windows::Win32::System::Registry::{
    RegCloseKey, RegDeleteValueW, RegOpenKeyExW, RegQueryValueExW, RegSetValueExW, HKEY,
    HKEY_CURRENT_USER, KEY_QUERY_VALUE, KEY_SET_VALUE, REG_SZ,
};

const RUN_KEY: &str = "SOFTWARE\\Microsoft\\Windows\\CurrentVersion\\Run";
const APP_NAME: &str = "minivol";

fn wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}

/// Check whether the startup entry is currently present
pub fn is_startup_enabled() -> bool {
    unsafe {
        let subkey = wide(RUN_KEY);
        let mut hkey = HKEY(std::ptr::null_mut());
        if RegOpenKeyExW(
            HKEY_CURRENT_USER,
            PCWSTR(subkey.as_ptr()),
            0,
            KEY_QUERY_VALUE,
            &mut hkey,
        )
        .is_err()
        {
            return false;
        }

        let name = wide(APP_NAME);
        let found = RegQueryValueExW(hkey, PCWSTR(name.as_ptr()), None, None, None, None).is_ok();
        let _ = RegCloseKey(hkey);
        found
    }
}

/// Enable or disable launching on Windows startup
///
/// Returns true when the registry now reflects the requested state.
pub fn set_startup_enabled(enable: bool) -> bool {
    unsafe {
        let subkey = wide(RUN_KEY);
        let mut hkey = HKEY(std::ptr::null_mut());
        if RegOpenKeyExW(
            HKEY_CURRENT_USER,
            PCWSTR(subkey.as_ptr()),
            0,
            KEY_SET_VALUE,
            &mut hkey,
        )
        .is_err()
        {
            warn!("failed to open startup registry key");
            return false;
        }

        let name = wide(APP_NAME);
        let ok = if enable {
            match executable_path() {
                Some(path) => {
                    let value = wide(&path);
                    // REG_SZ data is the raw UTF-16 bytes including the terminator
                    let bytes = std::slice::from_raw_parts(
                        value.as_ptr() as *const u8,
                        value.len() * std::mem::size_of::<u16>(),
                    );
                    let result =
                        RegSetValueExW(hkey, PCWSTR(name.as_ptr()), 0, REG_SZ, Some(bytes));
                    if result.is_ok() {
                        debug!("startup entry set to {}", path);
                        true
                    } else {
                        warn!("failed to write startup entry");
                        false
                    }
                }
                None => {
                    warn!("could not determine executable path for startup entry");
                    false
                }
            }
        } else {
            // Deleting an absent value still means "disabled"
            let result = RegDeleteValueW(hkey, PCWSTR(name.as_ptr()));
            result.is_ok() || !is_value_present(hkey, &name)
        };

        let _ = RegCloseKey(hkey);
        ok
    }
}

fn is_value_present(hkey: HKEY, name: &[u16]) -> bool {
    unsafe { RegQueryValueExW(hkey, PCWSTR(name.as_ptr()), None, None, None, None).is_ok() }
}

fn executable_path() -> Option<String> {
    std::env::current_exe()
        .ok()
        .map(|p| p.to_string_lossy().into_owned())
}
