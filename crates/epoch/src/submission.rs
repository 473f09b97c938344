use ancora_primitives::{Buf20, Buf32, EpochNumber};
use sha1::{Digest, Sha1};

fn sha1_20(bytes: &[u8]) -> Buf20 {
    let mut hasher = Sha1::new();
    hasher.update(bytes);
    let digest: [u8; 20] = hasher.finalize().into();
    Buf20::new(digest)
}

/// `SHA-1(target)` (spec.md §4.7 step 2).
pub fn target_hash(target: Buf32) -> Buf20 {
    sha1_20(target.as_slice())
}

/// For `N = 0` the target is the zero hash; otherwise it's the
/// `checksum_root` of the last block of epoch `N-1`, supplied by the
/// caller (spec.md §4.7 step 1).
pub fn target_for_epoch(epoch_number: EpochNumber, previous_epoch_final_checksum_root: Buf32) -> Buf32 {
    if epoch_number == 0 {
        Buf32::ZERO
    } else {
        previous_epoch_final_checksum_root
    }
}

/// An as-yet-unvalidated submission, as read from the base chain.
#[derive(Clone, Debug)]
pub struct SubmissionInput {
    pub public_key: Buf32,
    pub salt: Buf32,
    pub graffiti: Vec<u8>,
    pub declared_epoch_number: EpochNumber,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidSubmission {
    pub public_key: Buf32,
    pub salt: Buf32,
    pub graffiti: Vec<u8>,
    pub candidate: Buf20,
    pub matching_bits: u32,
}

/// `SHA-1(target ∥ public_key ∥ salt)` (spec.md §4.7 step 3), independent
/// of whether the result meets `MIN_DIFFICULTY`. Exposed so callers that
/// need a submission's candidate hash before its epoch is finalized (e.g.
/// to cache it on the stored [submission
/// record](ancora_storage::SubmissionRecord)) don't have to duplicate the
/// preimage layout.
pub fn candidate_hash(target: Buf32, public_key: Buf32, salt: Buf32) -> Buf20 {
    let mut preimage = Vec::with_capacity(32 + 32 + 32);
    preimage.extend_from_slice(target.as_slice());
    preimage.extend_from_slice(public_key.as_slice());
    preimage.extend_from_slice(salt.as_slice());
    sha1_20(&preimage)
}

/// Checks one submission against `target`/`target_hash` for epoch
/// `expected_epoch` (spec.md §4.7 step 3). Returns `None` for anything
/// invalid rather than an error: an invalid submission just isn't a
/// candidate, it isn't a processing failure.
pub fn validate_submission(
    target: Buf32,
    target_hash: Buf20,
    expected_epoch: EpochNumber,
    min_difficulty: u32,
    graffiti_length: usize,
    submission: &SubmissionInput,
) -> Option<ValidSubmission> {
    if submission.declared_epoch_number != expected_epoch {
        return None;
    }
    if submission.graffiti.len() > graffiti_length {
        return None;
    }

    let candidate = candidate_hash(target, submission.public_key, submission.salt);
    let matching_bits = candidate.matching_bits(&target_hash);

    if matching_bits < min_difficulty {
        return None;
    }

    Some(ValidSubmission {
        public_key: submission.public_key,
        salt: submission.salt,
        graffiti: submission.graffiti.clone(),
        candidate,
        matching_bits,
    })
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Winner {
    pub public_key: Buf32,
    pub salt: Buf32,
    pub graffiti: Vec<u8>,
    pub solution_hash: Buf20,
    pub matching_bits: u32,
}

/// Picks the valid submission with the highest `matching_bits`, breaking
/// ties by the lexicographically smallest `candidate` (spec.md §4.7 step
/// 4). Falls back to the genesis proposer if no submission is valid.
pub fn select_winner(valid: &[ValidSubmission], genesis_proposer_public_key: Buf32) -> Winner {
    let best = valid.iter().max_by(|a, b| {
        a.matching_bits.cmp(&b.matching_bits).then_with(|| b.candidate.cmp(&a.candidate))
    });

    match best {
        Some(s) => Winner {
            public_key: s.public_key,
            salt: s.salt,
            graffiti: s.graffiti.clone(),
            solution_hash: s.candidate,
            matching_bits: s.matching_bits,
        },
        None => Winner {
            public_key: genesis_proposer_public_key,
            salt: Buf32::ZERO,
            graffiti: Vec::new(),
            solution_hash: Buf20::ZERO,
            matching_bits: 0,
        },
    }
}
