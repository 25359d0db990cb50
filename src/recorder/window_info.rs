//! Foreground window lookup: NSWorkspace frontmost app, then its frontmost
//! on-screen window from CGWindowList.

use core_foundation::base::{CFType, TCFType};
use core_foundation::dictionary::{CFDictionary, CFDictionaryRef};
use core_foundation::number::CFNumber;
use core_foundation::string::CFString;
use core_graphics::display::*;
use objc2_app_kit::NSWorkspace;

use super::window_title::{ForegroundWindow, WindowError};

/// Reads `kCGWindowName` of the frontmost app's topmost normal-layer window.
///
/// Window names of other processes are only visible with Screen Recording
/// permission; without it the title comes back empty.
pub struct FrontmostWindow;

impl ForegroundWindow for FrontmostWindow {
    fn foreground_title(&self) -> Result<String, WindowError> {
        get_frontmost_window_title()
    }
}

fn number_field(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<i32> {
    dict.find(CFString::new(key)).and_then(|v| {
        let num: CFNumber = unsafe { CFNumber::wrap_under_get_rule(v.as_CFTypeRef() as _) };
        num.to_i32()
    })
}

fn string_field(dict: &CFDictionary<CFString, CFType>, key: &str) -> Option<String> {
    dict.find(CFString::new(key)).map(|v| {
        let s: CFString = unsafe { CFString::wrap_under_get_rule(v.as_CFTypeRef() as _) };
        s.to_string()
    })
}

pub fn get_frontmost_window_title() -> Result<String, WindowError> {
    let workspace = NSWorkspace::sharedWorkspace();
    let frontmost = workspace
        .frontmostApplication()
        .ok_or(WindowError::NoFrontmostApp)?;
    let pid = frontmost.processIdentifier();

    let window_list = unsafe {
        CGWindowListCopyWindowInfo(
            kCGWindowListOptionOnScreenOnly | kCGWindowListExcludeDesktopElements,
            kCGNullWindowID,
        )
    };
    if window_list.is_null() {
        return Err(WindowError::NoWindows);
    }

    let windows: Vec<CFDictionaryRef> = unsafe {
        let count = core_foundation::array::CFArrayGetCount(window_list as _);
        (0..count)
            .map(|i| core_foundation::array::CFArrayGetValueAtIndex(window_list as _, i) as CFDictionaryRef)
            .collect()
    };

    // Front-to-back order: the first layer-0 window of the frontmost app is
    // the one with focus.
    let mut found = None;
    for window_dict in windows {
        let dict = unsafe { CFDictionary::<CFString, CFType>::wrap_under_get_rule(window_dict) };

        if number_field(&dict, "kCGWindowOwnerPID") != Some(pid) {
            continue;
        }
        if number_field(&dict, "kCGWindowLayer").unwrap_or(0) != 0 {
            continue;
        }

        found = Some(string_field(&dict, "kCGWindowName").unwrap_or_default());
        break;
    }

    unsafe {
        core_foundation::base::CFRelease(window_list as _);
    }

    found.ok_or(WindowError::NoWindows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frontmost_lookup_does_not_panic() {
        // Headless runs have no frontmost app; only the error shape is checked.
        match FrontmostWindow.foreground_title() {
            Ok(title) => println!("frontmost window: '{title}'"),
            Err(err) => assert!(!err.to_string().is_empty()),
        }
    }
}
