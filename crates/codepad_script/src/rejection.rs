//! Unhandled promise rejections
//!
//! QuickJS reports every rejection without a handler, and again when a
//! handler is attached later. The log keeps the ones still unhandled so the
//! runtime can fail the run once the job queue settles.

use crate::runtime::describe;
use rquickjs::{qjs, Ctx, Value};
use std::cell::RefCell;
use std::ffi::{c_int, c_void};
use std::ptr::NonNull;

#[derive(Debug, Default)]
pub(crate) struct RejectionLog {
    // Promise object address and reason, in rejection order.
    unhandled: RefCell<Vec<(usize, String)>>,
}

impl RejectionLog {
    /// Route rejection notifications from `ctx`'s runtime into `log`.
    ///
    /// # Safety
    ///
    /// `log` must stay at the same address and outlive the runtime.
    pub unsafe fn install(ctx: &Ctx<'_>, log: &RejectionLog) {
        let rt = qjs::JS_GetRuntime(ctx.as_raw().as_ptr());
        qjs::JS_SetHostPromiseRejectionTracker(
            rt,
            Some(track_rejection),
            log as *const RejectionLog as *mut c_void,
        );
    }

    /// Reason of the earliest rejection that is still unhandled. Clears the log.
    pub fn take_unhandled(&self) -> Option<String> {
        let mut unhandled = self.unhandled.borrow_mut();
        let first = unhandled.first().map(|(_, reason)| reason.clone());
        unhandled.clear();
        first
    }

    fn rejected(&self, promise: usize, reason: String) {
        self.unhandled.borrow_mut().push((promise, reason));
    }

    fn handled(&self, promise: usize) {
        self.unhandled.borrow_mut().retain(|(key, _)| *key != promise);
    }
}

unsafe extern "C" fn track_rejection(
    ctx: *mut qjs::JSContext,
    promise: qjs::JSValue,
    reason: qjs::JSValue,
    is_handled: c_int,
    opaque: *mut c_void,
) {
    let Some(log) = (opaque as *const RejectionLog).as_ref() else {
        return;
    };
    let key = qjs::JS_VALUE_GET_PTR(promise) as usize;
    if is_handled != 0 {
        log.handled(key);
        return;
    }
    let Some(ctx) = NonNull::new(ctx) else {
        return;
    };
    // Called with the runtime lock held by the evaluation that rejected.
    let ctx = Ctx::from_raw(ctx);
    let reason = Value::from_raw(ctx, qjs::JS_DupValue(reason));
    log.rejected(key, describe(&reason));
}
