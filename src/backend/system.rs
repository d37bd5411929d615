use std::borrow::Cow;
use std::env;
use std::ffi::{c_void, CStr, CString};
use std::ptr::{null, null_mut};

use ffi_types::functions::{symbols, ScardApiFunctionTable};
use ffi_types::{Dword, ScardContext, ScardHandle, ScardIoRequest, ScardReaderState, ScardStatus};

use super::{PcscBackend, Pci};
use crate::env::SCARD_LIB_PATH_ENV;
use crate::platform::NativeWord;
use crate::{Error, Result};

/// Handle of the dynamically loaded native library.
struct Library(*mut c_void);

cfg_if::cfg_if! {
    if #[cfg(windows)] {
        use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};

        impl Library {
            fn open(path: &str) -> Result<Self> {
                let c_path = CString::new(path)?;

                // SAFETY: `c_path` is a valid NUL-terminated string.
                let handle = unsafe { LoadLibraryA(c_path.as_ptr().cast()) };

                if handle.is_null() {
                    return Err(Error::Library(format!("can not load the smart card library: {path}")));
                }

                Ok(Self(handle.cast()))
            }

            fn symbol(&self, name: &str) -> Result<*const c_void> {
                let c_name = CString::new(name)?;

                // SAFETY: the module handle is checked in `open`, `c_name` is a valid NUL-terminated string.
                let symbol = unsafe { GetProcAddress(self.0.cast(), c_name.as_ptr().cast()) }
                    .map_or(null(), |symbol| symbol as *const c_void);

                checked_symbol(symbol, name)
            }
        }
    } else {
        impl Library {
            fn open(path: &str) -> Result<Self> {
                let c_path = CString::new(path)?;

                // SAFETY: `c_path` is a valid NUL-terminated string.
                let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_LOCAL | libc::RTLD_LAZY) };

                if handle.is_null() {
                    return Err(Error::Library(format!("can not load the smart card library: {path}")));
                }

                Ok(Self(handle))
            }

            fn symbol(&self, name: &str) -> Result<*const c_void> {
                let c_name = CString::new(name)?;

                // SAFETY: the library handle is checked in `open`, `c_name` is a valid NUL-terminated string.
                let symbol = unsafe { libc::dlsym(self.0, c_name.as_ptr()) }.cast_const();

                checked_symbol(symbol, name)
            }
        }
    }
}

fn checked_symbol(symbol: *const c_void, name: &str) -> Result<*const c_void> {
    trace!(?symbol, symbol_name = name);

    if symbol.is_null() {
        return Err(Error::Library(format!("the smart card library does not export {name}")));
    }

    Ok(symbol)
}

/// The native smart card library of the host: WinSCard on Windows, pcsc-lite elsewhere.
///
/// The library path can be overridden with the [SCARD_LIB_PATH_ENV] environment variable.
#[derive(Debug)]
pub struct SystemBackend {
    api: ScardApiFunctionTable,
}

// SAFETY: the table only holds function pointers and pointers to immutable PCI blocks exported by a library that is
// never unloaded. The native functions themselves are thread-safe across handles.
unsafe impl Send for SystemBackend {}
// SAFETY: see above.
unsafe impl Sync for SystemBackend {}

impl SystemBackend {
    /// Loads the configured (or default) native library.
    pub fn load() -> Result<Self> {
        let path = if let Ok(path) = env::var(SCARD_LIB_PATH_ENV) {
            Cow::Owned(path)
        } else {
            Cow::Borrowed(symbols::DEFAULT_LIBRARY)
        };
        debug!(?path, "Loading smart card library");

        Self::load_from(&path)
    }

    /// Loads the native library from `path` and resolves every entry point.
    pub fn load_from(path: &str) -> Result<Self> {
        let library = Library::open(path)?;

        macro_rules! load_fn {
            ($name:expr) => {{
                let fn_ptr = library.symbol($name)?;

                // SAFETY:
                // - `fn_ptr` is a non-null function address resolved from the library.
                // - The target type is the matching prototype from `ffi_types::functions`.
                //   We are responsible for the function signature correctness.
                #[allow(clippy::missing_transmute_annotations)]
                let function = unsafe { std::mem::transmute::<*const c_void, _>(fn_ptr) };

                function
            }};
        }

        macro_rules! load_io_request {
            ($name:expr) => {{
                library.symbol($name)?.cast::<ScardIoRequest>()
            }};
        }

        let api = ScardApiFunctionTable {
            SCardEstablishContext: load_fn!(symbols::SCARD_ESTABLISH_CONTEXT),
            SCardReleaseContext: load_fn!(symbols::SCARD_RELEASE_CONTEXT),
            SCardIsValidContext: load_fn!(symbols::SCARD_IS_VALID_CONTEXT),
            SCardCancel: load_fn!(symbols::SCARD_CANCEL),
            SCardListReaders: load_fn!(symbols::SCARD_LIST_READERS),
            SCardConnect: load_fn!(symbols::SCARD_CONNECT),
            SCardReconnect: load_fn!(symbols::SCARD_RECONNECT),
            SCardDisconnect: load_fn!(symbols::SCARD_DISCONNECT),
            SCardBeginTransaction: load_fn!(symbols::SCARD_BEGIN_TRANSACTION),
            SCardEndTransaction: load_fn!(symbols::SCARD_END_TRANSACTION),
            SCardStatus: load_fn!(symbols::SCARD_STATUS),
            SCardGetStatusChange: load_fn!(symbols::SCARD_GET_STATUS_CHANGE),
            SCardTransmit: load_fn!(symbols::SCARD_TRANSMIT),
            SCardControl: load_fn!(symbols::SCARD_CONTROL),
            SCardGetAttrib: load_fn!(symbols::SCARD_GET_ATTRIB),

            g_rgSCardT0Pci: load_io_request!(symbols::SCARD_T0_PCI),
            g_rgSCardT1Pci: load_io_request!(symbols::SCARD_T1_PCI),
            g_rgSCardRawPci: load_io_request!(symbols::SCARD_RAW_PCI),
        };
        debug!(path, "Smart card library is loaded");

        Ok(Self { api })
    }

    fn pci(&self, pci: Pci) -> *const ScardIoRequest {
        match pci {
            Pci::T0 => self.api.g_rgSCardT0Pci,
            Pci::T1 => self.api.g_rgSCardT1Pci,
            Pci::Raw => self.api.g_rgSCardRawPci,
        }
    }
}

/// Makes sure the native library never writes past the end of `buf`.
fn clamp_len(len: &mut Dword, buf: &Option<&mut [u8]>) {
    if let Some(buf) = buf {
        let capacity = Dword::from_u64(buf.len() as u64).unwrap_or(Dword::MAX);
        *len = (*len).min(capacity);
    }
}

fn buf_len(buf: &[u8]) -> Dword {
    Dword::from_u64(buf.len() as u64).unwrap_or(Dword::MAX)
}

fn out_ptr(buf: &mut Option<&mut [u8]>) -> *mut u8 {
    buf.as_mut().map_or(null_mut(), |buf| buf.as_mut_ptr())
}

impl PcscBackend for SystemBackend {
    fn establish_context(&self, scope: Dword, context: &mut ScardContext) -> ScardStatus {
        // SAFETY: the reserved parameters must be null, `context` is a valid out pointer.
        unsafe { (self.api.SCardEstablishContext)(scope, null(), null(), context) }
    }

    fn release_context(&self, context: ScardContext) -> ScardStatus {
        // SAFETY: FFI call with no outstanding preconditions. The library validates the handle.
        unsafe { (self.api.SCardReleaseContext)(context) }
    }

    fn is_valid_context(&self, context: ScardContext) -> ScardStatus {
        // SAFETY: FFI call with no outstanding preconditions. The library validates the handle.
        unsafe { (self.api.SCardIsValidContext)(context) }
    }

    fn cancel(&self, context: ScardContext) -> ScardStatus {
        // SAFETY: FFI call with no outstanding preconditions. The library validates the handle.
        unsafe { (self.api.SCardCancel)(context) }
    }

    fn list_readers(
        &self,
        context: ScardContext,
        groups: Option<&[u8]>,
        mut readers: Option<&mut [u8]>,
        readers_len: &mut Dword,
    ) -> ScardStatus {
        clamp_len(readers_len, &readers);

        // SAFETY:
        // - `groups` is either null or a multi-string that ends with two NUL bytes.
        // - `readers` is either null or a buffer of at least `readers_len` bytes.
        unsafe {
            (self.api.SCardListReaders)(
                context,
                groups.map_or(null(), |groups| groups.as_ptr()),
                out_ptr(&mut readers),
                readers_len,
            )
        }
    }

    fn connect(
        &self,
        context: ScardContext,
        reader: &CStr,
        share_mode: Dword,
        preferred_protocols: Dword,
        card: &mut ScardHandle,
        active_protocol: &mut Dword,
    ) -> ScardStatus {
        // SAFETY: `reader` is NUL-terminated, `card` and `active_protocol` are valid out pointers.
        unsafe {
            (self.api.SCardConnect)(
                context,
                reader.as_ptr().cast(),
                share_mode,
                preferred_protocols,
                card,
                active_protocol,
            )
        }
    }

    fn reconnect(
        &self,
        card: ScardHandle,
        share_mode: Dword,
        preferred_protocols: Dword,
        initialization: Dword,
        active_protocol: &mut Dword,
    ) -> ScardStatus {
        // SAFETY: `active_protocol` is a valid out pointer.
        unsafe { (self.api.SCardReconnect)(card, share_mode, preferred_protocols, initialization, active_protocol) }
    }

    fn disconnect(&self, card: ScardHandle, disposition: Dword) -> ScardStatus {
        // SAFETY: FFI call with no outstanding preconditions. The library validates the handle.
        unsafe { (self.api.SCardDisconnect)(card, disposition) }
    }

    fn begin_transaction(&self, card: ScardHandle) -> ScardStatus {
        // SAFETY: FFI call with no outstanding preconditions. The library validates the handle.
        unsafe { (self.api.SCardBeginTransaction)(card) }
    }

    fn end_transaction(&self, card: ScardHandle, disposition: Dword) -> ScardStatus {
        // SAFETY: FFI call with no outstanding preconditions. The library validates the handle.
        unsafe { (self.api.SCardEndTransaction)(card, disposition) }
    }

    fn status(
        &self,
        card: ScardHandle,
        mut reader_names: Option<&mut [u8]>,
        reader_names_len: &mut Dword,
        state: &mut Dword,
        protocol: &mut Dword,
        mut atr: Option<&mut [u8]>,
        atr_len: &mut Dword,
    ) -> ScardStatus {
        clamp_len(reader_names_len, &reader_names);
        clamp_len(atr_len, &atr);

        // SAFETY: every buffer is either null or at least as long as its clamped length parameter,
        // every other pointer is a valid out pointer.
        unsafe {
            (self.api.SCardStatus)(
                card,
                out_ptr(&mut reader_names),
                reader_names_len,
                state,
                protocol,
                out_ptr(&mut atr),
                atr_len,
            )
        }
    }

    fn get_status_change(
        &self,
        context: ScardContext,
        timeout: Dword,
        reader_states: &mut [ScardReaderState],
    ) -> ScardStatus {
        // SAFETY: `reader_states` holds `reader_states.len()` initialized structures whose reader names outlive
        // the call.
        unsafe {
            (self.api.SCardGetStatusChange)(
                context,
                timeout,
                reader_states.as_mut_ptr(),
                Dword::from_u64(reader_states.len() as u64).unwrap_or(Dword::MAX),
            )
        }
    }

    fn transmit(
        &self,
        card: ScardHandle,
        pci: Pci,
        send: &[u8],
        recv: &mut [u8],
        recv_len: &mut Dword,
    ) -> ScardStatus {
        *recv_len = (*recv_len).min(buf_len(recv));

        // SAFETY:
        // - The PCI block is exported by the library and lives as long as it.
        // - `send` and `recv` are valid for their lengths, the receive PCI is optional.
        unsafe {
            (self.api.SCardTransmit)(
                card,
                self.pci(pci),
                send.as_ptr(),
                buf_len(send),
                null_mut(),
                recv.as_mut_ptr(),
                recv_len,
            )
        }
    }

    fn control(
        &self,
        card: ScardHandle,
        control_code: Dword,
        send: Option<&[u8]>,
        mut recv: Option<&mut [u8]>,
        bytes_returned: &mut Dword,
    ) -> ScardStatus {
        let recv_len = recv.as_deref().map_or(0, buf_len);

        // SAFETY: both buffers are either null with a zero length or valid for their lengths,
        // `bytes_returned` is a valid out pointer.
        unsafe {
            (self.api.SCardControl)(
                card,
                control_code,
                send.map_or(null(), |send| send.as_ptr().cast()),
                send.map_or(0, buf_len),
                out_ptr(&mut recv).cast(),
                recv_len,
                bytes_returned,
            )
        }
    }

    fn get_attrib(
        &self,
        card: ScardHandle,
        attr_id: Dword,
        mut attr: Option<&mut [u8]>,
        attr_len: &mut Dword,
    ) -> ScardStatus {
        clamp_len(attr_len, &attr);

        // SAFETY: `attr` is either null or at least `attr_len` bytes long.
        unsafe { (self.api.SCardGetAttrib)(card, attr_id, out_ptr(&mut attr), attr_len) }
    }
}
