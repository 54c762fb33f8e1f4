/// Host-dependent settings a [`Document`](crate::Document) lays data out with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayoutOptions {
    /// Packed VRM of the host; `None` disables version gating.
    pub host_vrm: Option<i64>,
    /// CCSID for one-byte char fields that declare none.
    pub default_ccsid: u32,
    /// CCSID for `chartype="twobyte"` fields that declare none.
    pub default_two_byte_ccsid: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            host_vrm: None,
            default_ccsid: 1208,
            default_two_byte_ccsid: 13488,
        }
    }
}

impl LayoutOptions {
    pub fn with_host_vrm(mut self, vrm: i64) -> Self {
        self.host_vrm = Some(vrm);
        self
    }

    pub fn with_default_ccsid(mut self, ccsid: u32) -> Self {
        self.default_ccsid = ccsid;
        self
    }

    pub fn with_default_two_byte_ccsid(mut self, ccsid: u32) -> Self {
        self.default_two_byte_ccsid = ccsid;
        self
    }
}
