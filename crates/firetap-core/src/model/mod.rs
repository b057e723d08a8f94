// ── Canonical domain model ──
//
// Every type here is schema-independent: whichever firmware generation
// produced the raw payload, consumers only ever see these shapes.

pub mod device_id;
pub mod reading;
pub mod timeline;

pub use device_id::DeviceId;
pub use reading::{ButtonEvent, GasStatus, Reading, ReadingId, ReadingStatus};
pub use timeline::Timeline;
