//! Modem identification
//!
//! After boot the node asks the modem who it is with the V.25ter
//! identification commands and keeps the answers for the log.

use heapless::String;

use crate::response::Response;

/// Capacity of each identity field
pub const MAX_IDENTITY_LEN: usize = 32;

/// One identification query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum IdentityField {
    Manufacturer,
    Model,
    Revision,
    Imei,
}

impl IdentityField {
    /// Queries in the order they are sent
    pub const ALL: [IdentityField; 4] = [
        IdentityField::Manufacturer,
        IdentityField::Model,
        IdentityField::Revision,
        IdentityField::Imei,
    ];

    /// Command name for [`AtCommand::execute`](crate::AtCommand::execute)
    pub fn command(&self) -> &'static str {
        match self {
            IdentityField::Manufacturer => "+GMI",
            IdentityField::Model => "+GMM",
            IdentityField::Revision => "+GMR",
            IdentityField::Imei => "+GSN",
        }
    }
}

/// What the modem reported about itself
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ModemIdentity {
    pub manufacturer: String<MAX_IDENTITY_LEN>,
    pub model: String<MAX_IDENTITY_LEN>,
    pub revision: String<MAX_IDENTITY_LEN>,
    pub imei: String<MAX_IDENTITY_LEN>,
}

impl ModemIdentity {
    /// Store the answer to one query
    ///
    /// Takes the first information line, cut to [`MAX_IDENTITY_LEN`].
    /// Returns false when the response has no usable line; the field is
    /// left unchanged.
    pub fn record(&mut self, field: IdentityField, response: &Response<'_>) -> bool {
        let Some(value) = response.first_info() else {
            return false;
        };
        let value = value.strip_prefix("Revision:").unwrap_or(value).trim();
        let slot = match field {
            IdentityField::Manufacturer => &mut self.manufacturer,
            IdentityField::Model => &mut self.model,
            IdentityField::Revision => &mut self.revision,
            IdentityField::Imei => &mut self.imei,
        };
        slot.clear();
        for c in value.chars() {
            if slot.push(c).is_err() {
                break;
            }
        }
        true
    }

    /// Check if every field was answered
    pub fn is_complete(&self) -> bool {
        !(self.manufacturer.is_empty()
            || self.model.is_empty()
            || self.revision.is_empty()
            || self.imei.is_empty())
    }
}
