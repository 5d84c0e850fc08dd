//! FFI bindings for Imsoniack
//!
//! C-compatible entry points for scoring samples on a device or inside a host
//! application. Strings are null-terminated UTF-8; every returned string is
//! allocated here and must be released with `imsoniack_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use crate::pipeline::{assess_sample, sample_to_record};
use crate::schema::Validator;

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Score one JSON sample and return the enriched record as JSON.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns a newly allocated string that must be freed with `imsoniack_free_string`.
/// - Returns NULL on error; call `imsoniack_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn imsoniack_score_sample(json: *const c_char) -> *mut c_char {
    clear_last_error();

    let json_str = match cstr_to_string(json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid JSON string pointer");
            return ptr::null_mut();
        }
    };

    match sample_to_record(json_str) {
        Ok(record) => string_to_cstr(&record),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Compute only the sleep score (0-100) of one JSON sample.
///
/// # Safety
/// - `json` must be a valid null-terminated C string.
/// - Returns -1 on error; call `imsoniack_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn imsoniack_sleep_score(json: *const c_char) -> i32 {
    clear_last_error();

    let Some(json_str) = cstr_to_string(json) else {
        set_last_error("Invalid JSON string pointer");
        return -1;
    };

    match Validator::validate_bytes(json_str.as_bytes()) {
        Ok(sample) => assess_sample(&sample).sleep_score as i32,
        Err(e) => {
            set_last_error(&e.to_string());
            -1
        }
    }
}

/// Free a string returned by Imsoniack functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by an Imsoniack function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn imsoniack_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

/// Get the last error message.
///
/// # Safety
/// - The returned pointer is valid until the next Imsoniack call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn imsoniack_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn imsoniack_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
