/// Raw, undecoded block header bytes. Wire encoding is the RPC
/// collaborator's concern (spec.md §1 "Explicit non-goals"); the indexer
/// only ever forwards these bytes to the block processor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawHeader(pub Vec<u8>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawBlock(pub Vec<u8>);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawTransaction(pub Vec<u8>);

/// How much of a block to fetch, mirroring the base-chain RPC's verbosity
/// levels: hashes only, or hashes plus full transaction bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockVerbosity {
    IdsOnly,
    Full,
}
