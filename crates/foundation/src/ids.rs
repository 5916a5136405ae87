/// Token handed out when a listener is registered on a map surface.
///
/// Removal requires the same token, so a listener can never be detached by
/// accident through another registration of the same callback.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub fn new(n: u64) -> Self {
        ListenerId(n)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}
