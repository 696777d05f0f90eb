//! Error taxonomy for property evaluation and run configuration.
//!
//! Falsifications and discards are *outcomes*, not errors: they travel as
//! [`PropResult`](crate::prop_result::PropResult) values. The variants here cover
//! what can go wrong around a check: bad configuration caught before the first
//! iteration, a check that returned an explicit error, and recovered panics.

use std::any::Any;
use std::backtrace::Backtrace;
use std::cell::RefCell;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

/// Type alias for fallible configuration and registry operations
pub type PropertyResult<T> = Result<T, PropertyError>;

/// Errors surfaced by the property engine
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PropertyError {
    #[error("Invalid test parameters: {0}")]
    InvalidParameters(String),

    #[error("Invalid property configuration: {0}")]
    Configuration(String),

    #[error("No generator registered or synthesizable for type {type_name}")]
    NoGenerator { type_name: &'static str },

    #[error("{0}")]
    Check(String),

    #[error("Check panicked: {message}")]
    Panic { message: String, backtrace: String },
}

impl PropertyError {
    /// Build a `Panic` error from a payload recovered by `catch_unwind`.
    ///
    /// Uses the backtrace recorded at the panic site on this thread when
    /// [`catch_panic`] armed the hook, otherwise captures one here.
    pub fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let backtrace = PANIC_BACKTRACE
            .with(|slot| slot.borrow_mut().take())
            .unwrap_or_else(|| Backtrace::force_capture().to_string());
        PropertyError::Panic {
            message: panic_message(payload.as_ref()),
            backtrace,
        }
    }

    /// Stack trace attached to this error, if any
    pub fn stack(&self) -> Option<&str> {
        match self {
            PropertyError::Panic { backtrace, .. } => Some(backtrace),
            _ => None,
        }
    }
}

thread_local! {
    static PANIC_BACKTRACE: RefCell<Option<String>> = const { RefCell::new(None) };
}

static PANIC_HOOK: Once = Once::new();

/// Chain a hook in front of the current panic hook that records the stack
/// while the panicking frames are still live.
fn install_panic_hook() {
    PANIC_HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            let backtrace = Backtrace::force_capture().to_string();
            let _ = PANIC_BACKTRACE.try_with(|slot| *slot.borrow_mut() = Some(backtrace));
            previous(info);
        }));
    });
}

/// Run `f`, turning a panic into [`PropertyError::Panic`] with the stack of the panic site.
pub fn catch_panic<R>(f: impl FnOnce() -> R) -> PropertyResult<R> {
    install_panic_hook();
    PANIC_BACKTRACE.with(|slot| slot.borrow_mut().take());
    panic::catch_unwind(AssertUnwindSafe(f)).map_err(PropertyError::from_panic)
}

/// Render a panic payload the way the default panic hook would.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&'static str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "Box<dyn Any>".to_string()
    }
}
