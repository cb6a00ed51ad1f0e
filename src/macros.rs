//! Internal logging macros.
//!
//! Forward to `log` and/or `defmt` when the matching feature is enabled and
//! compile to nothing otherwise. Only scalar arguments are logged so the
//! same format strings work for both backends.

macro_rules! trace {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::trace!($($arg)*);
        #[cfg(feature = "defmt-0-3")]
        ::defmt::trace!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        {
            let _ = core::format_args!($($arg)*);
        }
    }};
}

macro_rules! debug {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::debug!($($arg)*);
        #[cfg(feature = "defmt-0-3")]
        ::defmt::debug!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        {
            let _ = core::format_args!($($arg)*);
        }
    }};
}

macro_rules! amdtp_warn {
    ($($arg:tt)*) => {{
        #[cfg(feature = "log")]
        ::log::warn!($($arg)*);
        #[cfg(feature = "defmt-0-3")]
        ::defmt::warn!($($arg)*);
        #[cfg(not(any(feature = "log", feature = "defmt-0-3")))]
        {
            let _ = core::format_args!($($arg)*);
        }
    }};
}

pub(crate) use {amdtp_warn as warn, debug, trace};
