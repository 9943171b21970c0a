//! Unified logging macro for knx-codec.
//!
//! Dispatches to `defmt::` or `log::` based on the active feature flags and
//! compiles to nothing when neither backend is enabled, so the codec core
//! stays dependency-free on targets without a logger.
//!
//! # Usage
//!
//! ```rust,ignore
//! knx_log!(trace, "decoding block {}", name);
//! knx_log!(debug, "rejecting frame: unknown service {}", code);
//! ```

/// Unified logging macro - selects `defmt::` or `log::` based on features.
#[macro_export]
#[cfg(feature = "defmt")]
macro_rules! knx_log {
    (trace, $($arg:tt)*) => { defmt::trace!($($arg)*) };
    (debug, $($arg:tt)*) => { defmt::debug!($($arg)*) };
    (info, $($arg:tt)*) => { defmt::info!($($arg)*) };
    (warn, $($arg:tt)*) => { defmt::warn!($($arg)*) };
    (error, $($arg:tt)*) => { defmt::error!($($arg)*) };
}

#[macro_export]
#[cfg(all(not(feature = "defmt"), feature = "log"))]
macro_rules! knx_log {
    (trace, $($arg:tt)*) => { log::trace!($($arg)*) };
    (debug, $($arg:tt)*) => { log::debug!($($arg)*) };
    (info, $($arg:tt)*) => { log::info!($($arg)*) };
    (warn, $($arg:tt)*) => { log::warn!($($arg)*) };
    (error, $($arg:tt)*) => { log::error!($($arg)*) };
}

#[macro_export]
#[cfg(all(not(feature = "defmt"), not(feature = "log")))]
macro_rules! knx_log {
    ($level:ident, $($arg:tt)*) => {{}};
}
