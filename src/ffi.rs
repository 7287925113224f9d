//! FFI bindings for Focus Sentinel
//!
//! This module provides C-compatible functions for driving a session coordinator
//! from other languages. All functions use C strings (null-terminated), exchange
//! JSON, and return allocated memory that must be freed by the caller using
//! `sentinel_free_string`.

use std::cell::RefCell;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::ptr;

use serde::Serialize;

use crate::config::SentinelConfig;
use crate::coordinator::SessionCoordinator;
use crate::error::{ConfigError, SessionError};
use crate::types::{BehaviorCategory, FrameObservation};

// Thread-local storage for the last error message
thread_local! {
    static LAST_ERROR: RefCell<Option<CString>> = const { RefCell::new(None) };
}

/// Set the last error message
fn set_last_error(msg: &str) {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = CString::new(msg).ok();
    });
}

/// Clear the last error message
fn clear_last_error() {
    LAST_ERROR.with(|e| {
        *e.borrow_mut() = None;
    });
}

/// Helper to convert C string to Rust string
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    CStr::from_ptr(ptr).to_str().ok().map(|s| s.to_string())
}

/// Helper to convert Rust string to C string (caller must free)
fn string_to_cstr(s: &str) -> *mut c_char {
    match CString::new(s) {
        Ok(cstr) => cstr.into_raw(),
        Err(_) => ptr::null_mut(),
    }
}

/// Serialize a response to a C string, recording any failure as the last error
fn json_to_cstr<T: Serialize>(value: &T) -> *mut c_char {
    match serde_json::to_string(value) {
        Ok(json) => string_to_cstr(&json),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

// ============================================================================
// Coordinator API
// ============================================================================

/// Opaque handle to a SessionCoordinator
pub struct SentinelHandle {
    coordinator: SessionCoordinator,
}

/// Create a coordinator.
///
/// # Safety
/// - `config_json` may be NULL for the default configuration, otherwise it must be
///   a valid null-terminated C string holding a JSON configuration object.
/// - Must be freed with `sentinel_coordinator_free`.
/// - Returns NULL on error; call `sentinel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sentinel_coordinator_new(config_json: *const c_char) -> *mut SentinelHandle {
    clear_last_error();

    let config = match cstr_to_string(config_json) {
        None => SentinelConfig::default(),
        Some(json) => match serde_json::from_str::<SentinelConfig>(&json) {
            Ok(config) => config,
            Err(e) => {
                set_last_error(&SessionError::from(e).to_string());
                return ptr::null_mut();
            }
        },
    };

    if let Err(e) = config.validate() {
        let reason = match e {
            ConfigError::Invalid(reason) => reason,
            other => other.to_string(),
        };
        set_last_error(&SessionError::InvalidConfig(reason).to_string());
        return ptr::null_mut();
    }

    let handle = Box::new(SentinelHandle {
        coordinator: SessionCoordinator::new(config),
    });
    Box::into_raw(handle)
}

/// Free a coordinator.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sentinel_coordinator_new`.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sentinel_coordinator_free(handle: *mut SentinelHandle) {
    if !handle.is_null() {
        drop(Box::from_raw(handle));
    }
}

/// Start a monitoring session.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sentinel_coordinator_new`.
/// - `session_id` may be NULL (an id is generated) or a valid null-terminated C string.
/// - Returns a newly allocated JSON string that must be freed with `sentinel_free_string`.
/// - Returns NULL on error; call `sentinel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sentinel_start_session(
    handle: *const SentinelHandle,
    session_id: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null coordinator pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;
    match handle.coordinator.start_session(cstr_to_string(session_id)) {
        Ok(started) => json_to_cstr(&started),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Stop the active session and return its report.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sentinel_coordinator_new`.
/// - Returns a newly allocated JSON string that must be freed with `sentinel_free_string`.
/// - Returns NULL on error; call `sentinel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sentinel_stop_session(handle: *const SentinelHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null coordinator pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;
    match handle.coordinator.stop_session() {
        Ok(report) => json_to_cstr(&report),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Ingest a frame given as JSON (`{"timestamp", "present", "category"}`).
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sentinel_coordinator_new`.
/// - `frame_json` must be a valid null-terminated C string.
/// - Returns a newly allocated JSON string that must be freed with `sentinel_free_string`.
/// - Returns NULL on error; call `sentinel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sentinel_ingest_frame(
    handle: *const SentinelHandle,
    frame_json: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null coordinator pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;

    let json_str = match cstr_to_string(frame_json) {
        Some(s) => s,
        None => {
            set_last_error("Invalid frame string pointer");
            return ptr::null_mut();
        }
    };

    let frame: FrameObservation = match serde_json::from_str(&json_str) {
        Ok(frame) => frame,
        Err(e) => {
            set_last_error(&SessionError::from(e).to_string());
            return ptr::null_mut();
        }
    };

    match handle.coordinator.ingest(&frame) {
        Ok(outcome) => json_to_cstr(&outcome),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Ingest a frame stamped with the coordinator's clock.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sentinel_coordinator_new`.
/// - `category` may be NULL (treated as FOCUSED) or a valid null-terminated C string.
/// - Returns a newly allocated JSON string that must be freed with `sentinel_free_string`.
/// - Returns NULL on error; call `sentinel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sentinel_ingest_frame_now(
    handle: *const SentinelHandle,
    is_present: bool,
    category: *const c_char,
) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null coordinator pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;
    let category = cstr_to_string(category)
        .map(BehaviorCategory::from)
        .unwrap_or_default();

    match handle.coordinator.ingest_frame_now(is_present, category) {
        Ok(outcome) => json_to_cstr(&outcome),
        Err(e) => {
            set_last_error(&e.to_string());
            ptr::null_mut()
        }
    }
}

/// Get the live status.
///
/// # Safety
/// - `handle` must be a valid pointer returned by `sentinel_coordinator_new`.
/// - Returns a newly allocated JSON string that must be freed with `sentinel_free_string`.
/// - Returns NULL on error; call `sentinel_last_error` to get the error message.
#[no_mangle]
pub unsafe extern "C" fn sentinel_status(handle: *const SentinelHandle) -> *mut c_char {
    clear_last_error();

    if handle.is_null() {
        set_last_error("Null coordinator pointer");
        return ptr::null_mut();
    }

    let handle = &*handle;
    json_to_cstr(&handle.coordinator.status())
}

// ============================================================================
// Memory Management
// ============================================================================

/// Free a string returned by Sentinel functions.
///
/// # Safety
/// - `ptr` must be a valid pointer returned by a Sentinel function, or NULL.
/// - After calling this function, the pointer is invalid.
#[no_mangle]
pub unsafe extern "C" fn sentinel_free_string(ptr: *mut c_char) {
    if !ptr.is_null() {
        drop(CString::from_raw(ptr));
    }
}

// ============================================================================
// Error Handling
// ============================================================================

/// Get the last error message.
///
/// # Safety
/// - Returns a pointer to a thread-local error string.
/// - The returned pointer is valid until the next Sentinel function call on this thread.
/// - Do NOT free the returned pointer.
/// - Returns NULL if no error occurred.
#[no_mangle]
pub unsafe extern "C" fn sentinel_last_error() -> *const c_char {
    LAST_ERROR.with(|e| match &*e.borrow() {
        Some(cstr) => cstr.as_ptr(),
        None => ptr::null(),
    })
}

/// Get the Sentinel library version.
///
/// # Safety
/// - Returns a pointer to a static string. Do NOT free.
#[no_mangle]
pub unsafe extern "C" fn sentinel_version() -> *const c_char {
    static VERSION: &[u8] = concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes();
    VERSION.as_ptr() as *const c_char
}
