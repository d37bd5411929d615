use core::ffi::c_void;

pub type LpStr = *mut u8;
pub type LpCStr = *const u8;
pub type LpCByte = *const u8;
pub type LpByte = *mut u8;
pub type LpCVoid = *const c_void;
pub type LpVoid = *mut c_void;
