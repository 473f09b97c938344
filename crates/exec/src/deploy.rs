use ancora_primitives::{sha256_concat, Buf32, ContractAddress};

/// Derives the deterministic address of a contract deployed by `deployer`
/// with the given `salt` and bytecode hash (spec.md §4.6 "DeployAt"),
/// truncating the 32-byte digest to the 20-byte address width.
pub fn derive_contract_address(
    deployer: ContractAddress,
    salt: Buf32,
    bytecode_hash: Buf32,
) -> ContractAddress {
    let digest = sha256_concat(&[deployer.as_slice(), salt.as_slice(), bytecode_hash.as_slice()]);
    ContractAddress::try_from(&digest.as_slice()[..ContractAddress::LEN])
        .expect("sha256 digest is wider than a contract address")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_for_same_inputs() {
        let deployer = ContractAddress::new([1u8; 20]);
        let salt = Buf32::new([2u8; 32]);
        let code_hash = Buf32::new([3u8; 32]);
        assert_eq!(
            derive_contract_address(deployer, salt, code_hash),
            derive_contract_address(deployer, salt, code_hash)
        );
    }

    #[test]
    fn differs_when_salt_differs() {
        let deployer = ContractAddress::new([1u8; 20]);
        let code_hash = Buf32::new([3u8; 32]);
        let a = derive_contract_address(deployer, Buf32::new([4u8; 32]), code_hash);
        let b = derive_contract_address(deployer, Buf32::new([5u8; 32]), code_hash);
        assert_ne!(a, b);
    }
}
