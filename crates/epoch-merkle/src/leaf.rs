use ancora_primitives::{Buf20, Buf32, Buf64};

/// Fixed-order fields of the epoch-data leaf (spec.md §4.8, leaf 0).
/// `winner_solution_hash` is a 20-byte SHA-1 digest (spec.md §4.7 step 3)
/// but the leaf encoding reserves 32 bytes for it; the extra 12 bytes are
/// zero-padded on the left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EpochDataFields {
    pub chain_id: u32,
    pub protocol_id: u32,
    pub epoch_number: u64,
    pub start_block: u64,
    pub end_block: u64,
    pub checksum_root: Buf32,
    pub previous_epoch_hash: Buf32,
    pub attested_epoch_number: u64,
    pub attested_checksum_root: Buf32,
    pub winner_public_key: Buf32,
    pub winner_matching_bits: u16,
    pub winner_salt: Buf32,
    pub winner_solution_hash: Buf20,
    pub winner_graffiti: Vec<u8>,
}

/// Encodes the epoch-data leaf. `graffiti` is padded with trailing zeros (or
/// truncated, which should never happen for a validated submission) to
/// exactly `graffiti_length` bytes so the leaf has a fixed width.
pub fn encode_epoch_data_leaf(fields: &EpochDataFields, graffiti_length: usize) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&fields.chain_id.to_be_bytes());
    out.extend_from_slice(&fields.protocol_id.to_be_bytes());
    out.extend_from_slice(&fields.epoch_number.to_be_bytes());
    out.extend_from_slice(&fields.start_block.to_be_bytes());
    out.extend_from_slice(&fields.end_block.to_be_bytes());
    out.extend_from_slice(fields.checksum_root.as_slice());
    out.extend_from_slice(fields.previous_epoch_hash.as_slice());
    out.extend_from_slice(&fields.attested_epoch_number.to_be_bytes());
    out.extend_from_slice(fields.attested_checksum_root.as_slice());
    out.extend_from_slice(fields.winner_public_key.as_slice());
    out.extend_from_slice(&fields.winner_matching_bits.to_be_bytes());
    out.extend_from_slice(fields.winner_salt.as_slice());
    out.extend_from_slice(&[0u8; 12]);
    out.extend_from_slice(fields.winner_solution_hash.as_slice());
    let mut graffiti = fields.winner_graffiti.clone();
    graffiti.resize(graffiti_length, 0);
    out.extend_from_slice(&graffiti);
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttestationLeafType {
    Real,
    Empty,
}

impl AttestationLeafType {
    fn tag(self) -> u8 {
        match self {
            AttestationLeafType::Real => 0,
            AttestationLeafType::Empty => 1,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttestationLeafFields {
    pub leaf_type: AttestationLeafType,
    pub block_number: u64,
    pub checksum_root: Buf32,
    pub signature: Buf64,
    pub timestamp: u64,
    pub public_key: Buf32,
}

pub fn encode_attestation_leaf(fields: &AttestationLeafFields) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 8 + 32 + 64 + 8 + 32);
    out.push(fields.leaf_type.tag());
    out.extend_from_slice(&fields.block_number.to_be_bytes());
    out.extend_from_slice(fields.checksum_root.as_slice());
    out.extend_from_slice(fields.signature.as_slice());
    out.extend_from_slice(&fields.timestamp.to_be_bytes());
    out.extend_from_slice(fields.public_key.as_slice());
    out
}

/// A deterministic filler leaf used when an epoch collects fewer than
/// `MIN_ATTESTATIONS_PER_EPOCH` real attestations (spec.md §4.7 step 5).
pub fn empty_attestation_leaf(block_number: u64) -> AttestationLeafFields {
    AttestationLeafFields {
        leaf_type: AttestationLeafType::Empty,
        block_number,
        checksum_root: Buf32::ZERO,
        signature: Buf64::ZERO,
        timestamp: 0,
        public_key: Buf32::ZERO,
    }
}
