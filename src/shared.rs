//! Interrupt-safe access to a single shared driver instance.
//!
//! The protocol core is strictly single-threaded, but on most embedded
//! hosts the transport's notification callback runs in interrupt context
//! while `send_message` is called from the main loop. This module wraps one
//! global [`AmdtpDriver`] in a `critical_section::Mutex` so both contexts
//! can reach it without racing.
//!
//! Enabled by the `shared-driver` feature (on by default).

use crate::driver::AmdtpDriver;
use crate::transport::{MessageSink, Transport};
use core::cell::RefCell;
use critical_section::Mutex;

/// A critical-section mutex holding at most one driver.
pub type SharedAmdtpDriver<T, S> = Mutex<RefCell<Option<AmdtpDriver<T, S>>>>;

/// Initializes the global static cell for the shared driver.
///
/// # Returns
/// * An empty mutable ref-cell, to be filled by
///   [`global_amdtp_driver_setup`] once the transport exists.
///
/// # Example
/// ```rust
/// use amdtp::shared::{SharedAmdtpDriver, global_amdtp_driver_init};
/// use amdtp::transport::{Channel, MessageSink, Transport};
///
/// # #[derive(Debug)]
/// # struct Gatt;
/// # impl Transport for Gatt {
/// #     type Error = core::convert::Infallible;
/// #     fn send(&mut self, _: Channel, _: &[u8]) -> Result<(), Self::Error> { Ok(()) }
/// #     fn mtu(&self) -> u16 { 23 }
/// # }
/// # #[derive(Debug)]
/// # struct App;
/// # impl MessageSink for App { fn deliver(&mut self, _: &[u8]) {} }
/// static AMDTP_DRIVER: SharedAmdtpDriver<Gatt, App> = global_amdtp_driver_init();
/// ```
pub const fn global_amdtp_driver_init<T: Transport, S: MessageSink>() -> SharedAmdtpDriver<T, S> {
    Mutex::new(RefCell::new(None))
}

/// Places a freshly constructed driver into the global cell.
///
/// # Arguments
/// * The global static cell
/// * The GATT transport
/// * The application message handler
///
/// Call once the connection is up, before the first notification can
/// arrive. A previous instance, if any, is dropped.
pub fn global_amdtp_driver_setup<T: Transport, S: MessageSink>(
    global_driver: &'static SharedAmdtpDriver<T, S>,
    transport: T,
    sink: S,
) {
    critical_section::with(|cs| {
        let _ = global_driver
            .borrow(cs)
            .replace(Some(AmdtpDriver::new(transport, sink)));
    });
}

/// Runs `f` against the shared driver inside a critical section.
///
/// Returns `None` if [`global_amdtp_driver_setup`] has not run yet. Keep
/// the closure short; the whole protocol step executes with interrupts
/// masked.
///
/// # Example
/// ```rust
/// use amdtp::shared::{
///     SharedAmdtpDriver, global_amdtp_driver_init, global_amdtp_driver_setup,
///     with_amdtp_driver,
/// };
/// use amdtp::transport::{Channel, MessageSink, Transport};
///
/// # #[derive(Debug)]
/// # struct Gatt;
/// # impl Transport for Gatt {
/// #     type Error = core::convert::Infallible;
/// #     fn send(&mut self, _: Channel, _: &[u8]) -> Result<(), Self::Error> { Ok(()) }
/// #     fn mtu(&self) -> u16 { 23 }
/// # }
/// # #[derive(Debug)]
/// # struct App;
/// # impl MessageSink for App { fn deliver(&mut self, _: &[u8]) {} }
/// static AMDTP_DRIVER: SharedAmdtpDriver<Gatt, App> = global_amdtp_driver_init();
///
/// global_amdtp_driver_setup(&AMDTP_DRIVER, Gatt, App);
/// let sent = with_amdtp_driver(&AMDTP_DRIVER, |driver| driver.send_message(b"HELLO"));
/// assert!(matches!(sent, Some(Ok(()))));
/// ```
pub fn with_amdtp_driver<T: Transport, S: MessageSink, R>(
    global_driver: &'static SharedAmdtpDriver<T, S>,
    f: impl FnOnce(&mut AmdtpDriver<T, S>) -> R,
) -> Option<R> {
    critical_section::with(|cs| global_driver.borrow(cs).borrow_mut().as_mut().map(f))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::Channel;
    use core::convert::Infallible;

    #[derive(Debug)]
    struct NullTransport;

    impl Transport for NullTransport {
        type Error = Infallible;

        fn send(&mut self, _channel: Channel, _chunk: &[u8]) -> Result<(), Self::Error> {
            Ok(())
        }

        fn mtu(&self) -> u16 {
            23
        }
    }

    #[derive(Debug)]
    struct NullSink;

    impl MessageSink for NullSink {
        fn deliver(&mut self, _payload: &[u8]) {}
    }

    #[test]
    fn access_before_setup_yields_none() {
        static DRIVER: SharedAmdtpDriver<NullTransport, NullSink> = global_amdtp_driver_init();
        assert!(with_amdtp_driver(&DRIVER, |driver| driver.is_busy()).is_none());
    }

    #[test]
    fn setup_then_send_through_the_shared_cell() {
        static DRIVER: SharedAmdtpDriver<NullTransport, NullSink> = global_amdtp_driver_init();
        global_amdtp_driver_setup(&DRIVER, NullTransport, NullSink);

        let sent = with_amdtp_driver(&DRIVER, |driver| driver.send_message(b"HELLO"));
        assert!(matches!(sent, Some(Ok(()))));
        assert_eq!(with_amdtp_driver(&DRIVER, |driver| driver.is_busy()), Some(true));
    }
}
