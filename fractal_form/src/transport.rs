//! The collaborators of the controller: the collector that receives the
//! finalized records, and the clock.

use chrono::{DateTime, FixedOffset, Local};

use crate::config::{FormRecord, TransportError};

/// Sends a finalized record to the collector.
///
/// Delivery is best effort. The historical collector does not return a
/// readable response, so `Ok` only means that no transport-level error
/// happened: an accepted record and a silently dropped one look the same.
pub trait Transport {
    fn deliver(&self, record: &FormRecord) -> Result<(), TransportError>;
}

impl<F> Transport for F
where
    F: Fn(&FormRecord) -> Result<(), TransportError>,
{
    fn deliver(&self, record: &FormRecord) -> Result<(), TransportError> {
        self(record)
    }
}

pub trait Clock {
    fn now(&self) -> DateTime<FixedOffset>;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> DateTime<FixedOffset> {
        (**self).now()
    }
}

/// The local wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<FixedOffset> {
        Local::now().into()
    }
}

/// Time of day as shown on the forms (pt-BR): `14:05`.
pub fn format_time(t: &DateTime<FixedOffset>) -> String {
    t.format("%H:%M").to_string()
}

/// Date as shown on the forms (pt-BR): `18/10/2026`.
pub fn format_date(t: &DateTime<FixedOffset>) -> String {
    t.format("%d/%m/%Y").to_string()
}
