/// A physical copy of a key on one storage device.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Replica {
    /// Device that holds (or will hold) the bytes.
    pub devid: u64,

    /// Location as reported by the tracker.
    pub location: String,
}

impl Replica {
    pub fn new(devid: u64, location: impl Into<String>) -> Self {
        Self {
            devid,
            location: location.into(),
        }
    }
}
